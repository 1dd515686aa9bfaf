//! Free-text answers to a pending [`Dialog`]

use teloxide::{
    types::{MessageId, User},
    utils::html,
};
use tracing::info;

use crate::handlers::callbacks::action::{AdminAction, CallbackAction};
use crate::handlers::callbacks::admin::{deliver_code, show_listing};
use crate::handlers::display::{send_media, Screen};
use crate::handlers::{keyboards, qualify_referral, track_event};
use crate::models::engagement::event_types;
use crate::models::promo::{parse_bulk_upload, parse_code_line};
use crate::models::{ListingFieldValue, MediaItem, RequestKind};
use crate::services::channel::{CatalogButtonPost, ChannelPostDraft};
use crate::state::Dialog;
use crate::utils::errors::{Result, StayBuddyError};
use crate::utils::helpers::is_http_url;
use crate::utils::logging::{log_admin_action, log_user_action};

const THANKS_TEXT: &str = "✅ Thank you! The manager will get back to you soon.";

pub(super) async fn handle(screen: &Screen<'_>, user: &User, dialog: Dialog, text: &str) -> Result<()> {
    let ctx = screen.ctx;
    let user_id = screen.user_id;
    let text = text.trim();
    if text.is_empty() {
        return screen.notice("✍️ The message is empty, please try again.").await;
    }

    let requester = match &user.username {
        Some(username) => format!("{} (@{})", user.full_name(), username),
        None => user.full_name(),
    };

    match dialog {
        Dialog::EntryDate => {
            ctx.dialogs.remove(user_id);
            let request_id = ctx.db.requests.create_entry_request(user_id, text).await?;
            track_event(ctx, user_id, event_types::ENTRY_DATE, serde_json::json!({ "request_id": request_id })).await;
            log_user_action(user_id, "entry_date_request", Some(&request_id.to_string()));

            let notification = format!(
                "🗓 <b>Entry date request #{}</b>\nFrom: {}\n\n{}",
                request_id,
                html::escape(&requester),
                html::escape(text)
            );
            ctx.services
                .notification_relay
                .notify_admins(
                    &notification,
                    Some(keyboards::request_notification(RequestKind::EntryDate, request_id)),
                )
                .await;
            screen.replace(THANKS_TEXT, keyboards::main_menu(screen.is_admin())).await
        }
        Dialog::StayDates { listing_id } => {
            ctx.dialogs.remove(user_id);
            let request_id = ctx
                .db
                .requests
                .create_date_request(user_id, listing_id, text)
                .await?;
            track_event(
                ctx,
                user_id,
                event_types::SUBMIT_DATES,
                serde_json::json!({ "listing_id": listing_id, "request_id": request_id }),
            )
            .await;
            qualify_referral(ctx, user_id).await;

            let title = ctx
                .db
                .listings
                .find_by_id(listing_id)
                .await?
                .map(|listing| listing.title)
                .unwrap_or_else(|| format!("#{}", listing_id));
            let notification = format!(
                "📅 <b>Date request #{}</b>\nListing: {}\nFrom: {}\n\n{}",
                request_id,
                html::escape(&title),
                html::escape(&requester),
                html::escape(text)
            );
            ctx.services
                .notification_relay
                .notify_admins(
                    &notification,
                    Some(keyboards::request_notification(RequestKind::Dates, request_id)),
                )
                .await;
            screen
                .replace(
                    THANKS_TEXT,
                    keyboards::back_to(CallbackAction::ListingCard { listing_id, page: 1 }),
                )
                .await
        }
        Dialog::ReplyToAdmin => {
            ctx.dialogs.remove(user_id);
            let notification = format!(
                "💬 <b>Reply from {}</b> (id {})\n\n{}",
                html::escape(&requester),
                user_id,
                html::escape(text)
            );
            ctx.services
                .notification_relay
                .notify_admins(&notification, None)
                .await;
            screen.notice("✅ Sent to the manager.").await
        }
        Dialog::AdminReply {
            kind,
            request_id,
            user_id: recipient,
        } => {
            ctx.dialogs.remove(user_id);
            let delivered = ctx
                .services
                .notification_relay
                .send_to_user_with(
                    recipient,
                    &format!("💬 <b>Message from the manager</b>\n\n{}", html::escape(text)),
                    Some(keyboards::reply_to_admin()),
                )
                .await;
            ctx.db.requests.mark_handled(kind, request_id, user_id).await?;
            log_admin_action(user_id, "request_reply", Some(&request_id.to_string()), Some(kind.code()));
            let result = if delivered {
                "✅ Reply sent, the request is marked handled."
            } else {
                "⚠️ The guest could not be reached. The request is marked handled."
            };
            screen
                .replace(
                    result,
                    keyboards::back_to(CallbackAction::Admin(AdminAction::Requests(kind))),
                )
                .await
        }
        Dialog::ManualPromo {
            kind,
            request_id,
            user_id: recipient,
        } => {
            let code = text.to_string();
            if !ctx.db.promos.assign_code(&code, recipient).await? {
                return screen
                    .notice("⚠️ This code already belongs to someone else. Type another one.")
                    .await;
            }
            ctx.dialogs.remove(user_id);
            match ctx.db.requests.find(kind, request_id).await? {
                Some(request) => deliver_code(screen, &request, &code).await,
                None => Err(StayBuddyError::RequestNotFound { request_id }),
            }
        }
        Dialog::EditListingField { listing_id, field } => {
            let value = match ListingFieldValue::parse(field, text) {
                Ok(value) => value,
                Err(e) => return screen.notice(&format!("⚠️ {}", html::escape(&e.to_string()))).await,
            };
            ctx.db.listings.update_field(listing_id, &value).await?;
            ctx.dialogs.remove(user_id);
            log_admin_action(user_id, "listing_field", Some(&listing_id.to_string()), Some(field.code()));
            show_listing(screen, listing_id).await
        }
        Dialog::AddPromoCode => {
            let (code, kind) = match parse_code_line(text) {
                Ok(parsed) => parsed,
                Err(e) => return screen.notice(&format!("⚠️ {}", html::escape(&e.to_string()))).await,
            };
            ctx.dialogs.remove(user_id);
            let result = if ctx.db.promos.add_code(&code, kind).await? {
                log_admin_action(user_id, "promo_add", Some(&code), Some(kind.as_str()));
                format!("✅ Code <code>{}</code> added as {}.", html::escape(&code), kind)
            } else {
                format!("⚠️ Code <code>{}</code> already exists.", html::escape(&code))
            };
            screen.replace(&result, keyboards::admin_codes()).await
        }
        Dialog::BulkPromoCodes => {
            let (kind, codes) = match parse_bulk_upload(text) {
                Ok(parsed) => parsed,
                Err(e) => return screen.notice(&format!("⚠️ {}", html::escape(&e.to_string()))).await,
            };
            ctx.dialogs.remove(user_id);
            let added = ctx.db.promos.add_codes(&codes, kind).await?;
            log_admin_action(user_id, "promo_bulk", Some(kind.as_str()), Some(&added.to_string()));
            info!(kind = %kind, added = added, submitted = codes.len(), "Bulk promo upload");
            let result = format!(
                "✅ Added {} of {} {} codes. Duplicates were skipped.",
                added,
                codes.len(),
                kind
            );
            screen.replace(&result, keyboards::admin_codes()).await
        }
        Dialog::BroadcastText { segment } | Dialog::BroadcastConfirm { segment, .. } => {
            let body = html::escape(text);
            ctx.dialogs.insert(
                user_id,
                Dialog::BroadcastConfirm {
                    segment,
                    text: body.clone(),
                },
            );
            let preview = format!(
                "📣 <b>Preview</b> · {}\n\n{}\n\nSend it? Type a new text to replace it.",
                segment.label(),
                body
            );
            screen.replace(&preview, keyboards::admin_broadcast_confirm()).await
        }
        Dialog::CatalogLink => {
            if !is_http_url(text) {
                return screen
                    .notice("⚠️ The link must start with http:// or https://.")
                    .await;
            }
            let stored = ctx
                .db
                .engagement
                .latest_event_payload(event_types::CHANNEL_CATALOG_BUTTON)
                .await?
                .and_then(CatalogButtonPost::from_payload);
            let Some(mut post) = stored else {
                ctx.dialogs.remove(user_id);
                return screen
                    .replace(
                        "⚠️ There is no catalog button post yet. Publish one first.",
                        keyboards::admin_channel(),
                    )
                    .await;
            };
            let keyboard = keyboards::channel_link("🏙 Catalog", text);
            if keyboard.inline_keyboard.is_empty() {
                return screen.notice("⚠️ This is not a valid link.").await;
            }
            ctx.services
                .notification_relay
                .edit_buttons(post.channel_id, MessageId(post.message_id), keyboard)
                .await?;
            ctx.dialogs.remove(user_id);
            post.catalog_url = text.to_string();
            track_event(ctx, user_id, event_types::CHANNEL_CATALOG_BUTTON, post.to_payload()).await;
            log_admin_action(user_id, "channel_catalog_link", Some(&post.message_id.to_string()), None);
            screen
                .replace("✅ The catalog button now opens the new link.", keyboards::admin_channel())
                .await
        }
        Dialog::ChannelPost(mut draft) => {
            draft.set_text(text)?;
            let Some((media, caption)) = draft.ready() else {
                return Ok(());
            };
            send_media(
                screen.bot,
                screen.chat_id,
                media,
                &html::escape(caption),
                Some(keyboards::channel_post_preview()),
            )
            .await?;
            ctx.dialogs.insert(user_id, Dialog::ChannelPost(draft));
            Ok(())
        }
    }
}

/// A photo or video for the custom channel post.
pub(super) async fn post_media(screen: &Screen<'_>, mut draft: ChannelPostDraft, item: MediaItem) -> Result<()> {
    let count = draft.add_media(item)?;
    screen.ctx.dialogs.insert(screen.user_id, Dialog::ChannelPost(draft));
    screen
        .prompt(
            &format!("📎 Media added: {}. Send more or press Done.", count),
            keyboards::channel_post_media(),
        )
        .await
}
