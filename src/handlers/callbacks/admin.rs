//! Admin panel callbacks
//!
//! The dispatcher has already checked the sender against the admin list.

use teloxide::{prelude::*, utils::html};
use tracing::{info, warn};

use super::action::{AdminAction, CallbackAction};
use crate::handlers::display::{
    clear_prompt, listing_post_text, notice, send_main, send_main_media, send_media, Screen,
};
use crate::handlers::{keyboards, track_event};
use crate::models::engagement::event_types;
use crate::models::{GuestRequest, Listing, PromoKind, RequestKind, StatsReport};
use crate::services::channel::{CatalogButtonPost, ChannelPostDraft};
use crate::services::giveaway::DrawOutcome;
use crate::state::Dialog;
use crate::utils::errors::{Result, StayBuddyError};
use crate::utils::helpers::{format_timestamp, truncate_text, whatsapp_link};
use crate::utils::logging::log_admin_action;

use super::catalog::CAPTION_LIMIT;

const ADMIN_LISTINGS_LIMIT: i64 = 30;
const ADMIN_REQUESTS_LIMIT: i64 = 20;
const PROMO_PICK_LIMIT: i64 = 10;

pub const ADMIN_TEXT: &str = "🛠 <b>Admin panel</b>";

pub(super) async fn handle(screen: &Screen<'_>, action: AdminAction) -> Result<()> {
    let ctx = screen.ctx;
    let admin_id = screen.user_id;

    match action {
        AdminAction::Menu => {
            ctx.dialogs.remove(admin_id);
            screen.show(ADMIN_TEXT, keyboards::admin_menu()).await
        }

        // Listings
        AdminAction::Listings => {
            let listings = ctx.db.listings.list_all(ADMIN_LISTINGS_LIMIT).await?;
            let text = format!("🏙 <b>Listings</b> ({})\n\n🟢 shown · ⚪️ hidden", listings.len());
            screen.show(&text, keyboards::admin_listings(&listings)).await
        }
        AdminAction::ListingOpen(listing_id) => show_listing(screen, listing_id).await,
        AdminAction::ListingToggle(listing_id) => {
            let active = ctx.db.listings.toggle_active(listing_id).await?;
            log_admin_action(
                admin_id,
                "listing_toggle",
                Some(&listing_id.to_string()),
                Some(if active { "shown" } else { "hidden" }),
            );
            show_listing(screen, listing_id).await
        }
        AdminAction::ListingField { listing_id, field } => {
            ctx.dialogs
                .insert(admin_id, Dialog::EditListingField { listing_id, field });
            let text = format!(
                "✏️ Send the new <b>{}</b> for listing #{}.\nFor links, send <code>-</code> to clear.",
                field.label(),
                listing_id
            );
            screen
                .show(&text, keyboards::back_to(admin_back(AdminAction::ListingOpen(listing_id))))
                .await
        }
        AdminAction::ListingAdd => {
            ctx.dialogs.remove(admin_id);
            let prompt = ctx.wizard.start_create(admin_id);
            super::wizard::send_step(screen, &prompt).await
        }
        AdminAction::ListingWizard(listing_id) => {
            let listing = find_listing(screen, listing_id).await?;
            ctx.dialogs.remove(admin_id);
            let prompt = ctx.wizard.start_edit(admin_id, &listing);
            super::wizard::send_step(screen, &prompt).await
        }
        AdminAction::ListingPostPreview(listing_id) => {
            let listing = find_listing(screen, listing_id).await?;
            let text = listing_post_text(&listing, &ctx.settings.contacts);
            let keyboard = keyboards::admin_post_preview(listing_id);
            match listing.media().first() {
                Some(primary) if text.chars().count() <= CAPTION_LIMIT => {
                    send_main_media(screen.bot, ctx, screen.chat_id, primary, &text, keyboard).await?;
                }
                _ => {
                    send_main(screen.bot, ctx, screen.chat_id, &text, keyboard).await?;
                }
            }
            Ok(())
        }
        AdminAction::ListingPublish(listing_id) => {
            let listing = find_listing(screen, listing_id).await?;
            let Some(channel_id) = ctx.services.notification_relay.channel_id() else {
                return screen.notice("⚠️ No channel is configured.").await;
            };
            publish_listing(screen, &listing, ChatId(channel_id)).await?;
            log_admin_action(admin_id, "listing_publish", Some(&listing_id.to_string()), None);
            screen.notice("📢 The listing post is published.").await
        }

        // Promo codes
        AdminAction::Codes => {
            screen
                .show(
                    "🎟 <b>Promo codes</b>\n\nKinds: welcome, giveaway, manual, referral_reward.",
                    keyboards::admin_codes(),
                )
                .await
        }
        AdminAction::CodeAdd => {
            ctx.dialogs.insert(admin_id, Dialog::AddPromoCode);
            screen
                .show(
                    "➕ Send one code as <code>CODE|KIND</code>, e.g. <code>SUMMER10|welcome</code>.",
                    keyboards::back_to(admin_back(AdminAction::Codes)),
                )
                .await
        }
        AdminAction::CodeBulk => {
            ctx.dialogs.insert(admin_id, Dialog::BulkPromoCodes);
            screen
                .show(
                    "📥 Send the kind on the first line, then one code per line.\nDuplicates are skipped.",
                    keyboards::back_to(admin_back(AdminAction::Codes)),
                )
                .await
        }
        AdminAction::CodeList => {
            let summary = ctx.db.promos.pool_summary().await?;
            let lines: Vec<String> = PromoKind::ALL
                .iter()
                .map(|kind| {
                    let (free, total) = summary
                        .iter()
                        .find(|row| row.kind == kind.as_str())
                        .map(|row| (row.free, row.total))
                        .unwrap_or((0, 0));
                    format!("• {}: {} free of {}", kind, free, total)
                })
                .collect();
            let text = format!("📋 <b>Promo pools</b>\n\n{}", lines.join("\n"));
            screen.show(&text, keyboards::admin_codes()).await
        }

        // Giveaway
        AdminAction::Giveaway => {
            let candidates = ctx.db.engagement.giveaway_candidates().await?;
            let has_codes = ctx.db.promos.has_free(PromoKind::Giveaway).await?;
            let text = format!(
                "🎉 <b>Giveaway</b>\n\nParticipants without a win: {}\nFree giveaway codes: {}",
                candidates.len(),
                if has_codes { "yes" } else { "no" }
            );
            screen.show(&text, keyboards::admin_giveaway()).await
        }
        AdminAction::Draw => {
            let text = match ctx.services.giveaway_service.draw().await? {
                DrawOutcome::NoParticipants => "Nobody is taking part yet.".to_string(),
                DrawOutcome::NoCodes => "⚠️ No free giveaway codes. Add some first.".to_string(),
                DrawOutcome::Winner {
                    user_id,
                    code,
                    notified,
                } => {
                    log_admin_action(admin_id, "giveaway_draw", Some(&user_id.to_string()), Some(&code));
                    format!(
                        "🏆 Winner: <a href=\"tg://user?id={}\">{}</a>\nCode: <code>{}</code>\n{}",
                        user_id,
                        user_id,
                        html::escape(&code),
                        if notified {
                            "The winner has been notified."
                        } else {
                            "⚠️ The winner could not be reached."
                        }
                    )
                }
            };
            screen.show(&text, keyboards::admin_giveaway()).await
        }

        AdminAction::Stats => {
            let report = ctx.db.stats_report().await?;
            screen
                .show(&stats_text(&report), keyboards::back_to(admin_back(AdminAction::Menu)))
                .await
        }

        // Broadcast
        AdminAction::Broadcast => {
            ctx.dialogs.remove(admin_id);
            screen
                .show("📣 <b>Broadcast</b>\n\nWho should get it?", keyboards::admin_broadcast_segments())
                .await
        }
        AdminAction::BroadcastSegment(segment) => {
            ctx.dialogs.insert(admin_id, Dialog::BroadcastText { segment });
            let text = format!("📣 Segment: <b>{}</b>\n\nSend the message text.", segment.label());
            screen
                .show(&text, keyboards::back_to(admin_back(AdminAction::Broadcast)))
                .await
        }
        AdminAction::BroadcastSend => {
            let Some(Dialog::BroadcastConfirm { segment, text }) = ctx.dialogs.remove(admin_id) else {
                return screen.notice("Nothing to send. Start the broadcast again.").await;
            };
            let recipients = ctx.db.users.segment_recipients(segment).await?;
            screen
                .notice(&format!("🚀 Sending to {} users…", recipients.len()))
                .await?;

            let report = ctx.services.notification_relay.broadcast(&recipients, &text).await;
            if !report.unreachable.is_empty() {
                ctx.db.users.mark_blocked(&report.unreachable).await?;
            }
            log_admin_action(
                admin_id,
                "broadcast",
                Some(segment.code()),
                Some(&format!("sent={} unreachable={}", report.sent, report.unreachable.len())),
            );
            screen
                .replace(
                    &format!(
                        "✅ Broadcast finished.\nDelivered: {}\nUnreachable: {}",
                        report.sent,
                        report.unreachable.len()
                    ),
                    keyboards::admin_menu(),
                )
                .await
        }

        // Requests
        AdminAction::Requests(kind) => {
            let requests = ctx.db.requests.list_recent(kind, ADMIN_REQUESTS_LIMIT).await?;
            let text = format!("{} <b>{}</b> ({})", kind_icon(kind), kind.label(), requests.len());
            screen.show(&text, keyboards::admin_requests(kind, &requests)).await
        }
        AdminAction::RequestOpen { kind, request_id } => {
            let request = find_request(screen, kind, request_id).await?;
            screen
                .show(&request_text(kind, &request), keyboards::admin_request(kind, request_id))
                .await
        }
        AdminAction::RequestReply { kind, request_id } => {
            let request = find_request(screen, kind, request_id).await?;
            ctx.dialogs.insert(
                admin_id,
                Dialog::AdminReply {
                    kind,
                    request_id,
                    user_id: request.user_id,
                },
            );
            let text = format!("✍️ Type the reply to {}.", html::escape(&request.requester()));
            screen
                .show(&text, keyboards::back_to(admin_back(AdminAction::RequestOpen { kind, request_id })))
                .await
        }
        AdminAction::RequestPromo { kind, request_id } => {
            find_request(screen, kind, request_id).await?;
            let codes = ctx.db.promos.list_free(PromoKind::Manual, PROMO_PICK_LIMIT).await?;
            let text = if codes.is_empty() {
                "🎁 No free manual codes. Type one instead."
            } else {
                "🎁 Pick a code or type one."
            };
            screen
                .show(text, keyboards::admin_promo_pick(kind, request_id, &codes))
                .await
        }
        AdminAction::RequestPromoPick {
            kind,
            request_id,
            code_id,
        } => {
            let request = find_request(screen, kind, request_id).await?;
            match ctx.db.promos.assign_by_id(code_id, request.user_id).await? {
                Some(code) => deliver_code(screen, &request, &code).await,
                None => screen.notice("⚠️ That code has just been taken. Pick another one.").await,
            }
        }
        AdminAction::RequestPromoManual { kind, request_id } => {
            let request = find_request(screen, kind, request_id).await?;
            ctx.dialogs.insert(
                admin_id,
                Dialog::ManualPromo {
                    kind,
                    request_id,
                    user_id: request.user_id,
                },
            );
            screen
                .show(
                    "⌨️ Type the promo code to send.",
                    keyboards::back_to(admin_back(AdminAction::RequestOpen { kind, request_id })),
                )
                .await
        }
        AdminAction::RequestDone { kind, request_id } => {
            ctx.db.requests.mark_handled(kind, request_id, admin_id).await?;
            log_admin_action(admin_id, "request_done", Some(&request_id.to_string()), Some(kind.code()));
            let request = find_request(screen, kind, request_id).await?;
            screen
                .show(&request_text(kind, &request), keyboards::admin_request(kind, request_id))
                .await
        }

        // Channel
        AdminAction::Channel => {
            screen
                .show(
                    "📢 <b>Channel</b>\n\nPublish buttons and posts to the channel.",
                    keyboards::admin_channel(),
                )
                .await
        }
        AdminAction::ChannelPublish => {
            let published = ctx
                .services
                .notification_relay
                .publish(
                    "🏙 Pick an apartment and book it in a couple of taps:",
                    Some(keyboards::channel_buttons(
                        &ctx.settings.storefront.booking_url,
                        &catalog_url(screen),
                    )),
                )
                .await?;
            if published {
                log_admin_action(admin_id, "channel_buttons", None, None);
                screen.notice("📢 Buttons are published.").await
            } else {
                screen.notice(NO_CHANNEL_TEXT).await
            }
        }
        AdminAction::ChannelPin => {
            let booking_url = &ctx.settings.storefront.booking_url;
            let keyboard = keyboards::channel_link("📅 Book", booking_url);
            if keyboard.inline_keyboard.is_empty() {
                return Err(StayBuddyError::InvalidInput(
                    "The booking link is not a valid URL.".to_string(),
                ));
            }
            let outcome = ctx
                .services
                .notification_relay
                .publish_pinned(
                    "⚡️ <b>Quick booking</b>\n\nPick your dates and book in a couple of taps.",
                    keyboard,
                )
                .await?;
            let Some((message_id, pinned)) = outcome else {
                return screen.notice(NO_CHANNEL_TEXT).await;
            };
            let channel_id = ctx.services.notification_relay.channel_id().unwrap_or_default();
            track_event(
                ctx,
                admin_id,
                event_types::CHANNEL_BOOKING_BUTTON,
                serde_json::json!({
                    "channel_id": channel_id,
                    "message_id": message_id.0,
                    "booking_url": booking_url,
                }),
            )
            .await;
            log_admin_action(admin_id, "channel_pin", Some(&message_id.0.to_string()), None);
            if pinned {
                screen.notice("📌 The booking post is published and pinned.").await
            } else {
                screen
                    .notice("⚠️ The booking post is published but could not be pinned. Give the bot the pin right.")
                    .await
            }
        }
        AdminAction::ChannelCatalog => {
            let catalog_url = catalog_url(screen);
            let keyboard = keyboards::channel_link("🏙 Catalog", &catalog_url);
            if keyboard.inline_keyboard.is_empty() {
                return Err(StayBuddyError::InvalidInput(
                    "The catalog link is not a valid URL.".to_string(),
                ));
            }
            let published = ctx
                .services
                .notification_relay
                .publish_message("🏙 All apartments in one place:", Some(keyboard))
                .await?;
            let Some(message) = published else {
                return screen.notice(NO_CHANNEL_TEXT).await;
            };
            let post = CatalogButtonPost {
                channel_id: message.chat.id.0,
                message_id: message.id.0,
                catalog_url,
            };
            track_event(ctx, admin_id, event_types::CHANNEL_CATALOG_BUTTON, post.to_payload()).await;
            log_admin_action(admin_id, "channel_catalog", Some(&post.message_id.to_string()), None);
            screen.notice("🏙 The catalog button is published.").await
        }
        AdminAction::ChannelCatalogLink => {
            ctx.dialogs.insert(admin_id, Dialog::CatalogLink);
            screen
                .show(
                    "🔗 Send the new catalog link. It must start with http:// or https://.",
                    keyboards::back_to(admin_back(AdminAction::Channel)),
                )
                .await
        }
        AdminAction::ChannelPost => {
            ctx.dialogs.insert(admin_id, Dialog::ChannelPost(ChannelPostDraft::new()));
            screen
                .show(
                    "📝 <b>Custom post</b>\n\nSend photos or videos, then press Done.",
                    keyboards::channel_post_media(),
                )
                .await
        }
        AdminAction::ChannelPostDone => {
            let mut draft = post_draft(screen)?;
            draft.finish_media()?;
            ctx.dialogs.insert(admin_id, Dialog::ChannelPost(draft));
            clear_prompt(screen.bot, ctx, screen.chat_id).await;
            screen
                .show(
                    "✍️ Now send the post text.",
                    keyboards::back_to(admin_back(AdminAction::ChannelPostCancel)),
                )
                .await
        }
        AdminAction::ChannelPostPublish => {
            let draft = post_draft(screen)?;
            let Some((media, text)) = draft.ready() else {
                return Err(StayBuddyError::InvalidInput("The post is not finished yet.".to_string()));
            };
            let Some(channel_id) = ctx.services.notification_relay.channel_id() else {
                return screen.notice(NO_CHANNEL_TEXT).await;
            };
            let whatsapp = ctx.settings.contacts.whatsapp.as_deref().and_then(whatsapp_link);
            let keyboard = keyboards::channel_post_buttons(
                &ctx.bot_username,
                &ctx.settings.storefront.booking_url,
                ctx.settings.manager_link().as_deref(),
                whatsapp.as_deref(),
            );
            send_media(screen.bot, ChatId(channel_id), media, &html::escape(text), Some(keyboard)).await?;
            ctx.dialogs.remove(admin_id);
            log_admin_action(admin_id, "channel_post", None, Some(&draft.media_count().to_string()));
            info!(channel_id = channel_id, media = draft.media_count(), "Custom post published to channel");
            screen.replace("✅ The post is published.", keyboards::admin_channel()).await
        }
        AdminAction::ChannelPostCancel => {
            ctx.dialogs.remove(admin_id);
            clear_prompt(screen.bot, ctx, screen.chat_id).await;
            screen.show("📢 <b>Channel</b>\n\nThe post was discarded.", keyboards::admin_channel()).await
        }
    }
}

const NO_CHANNEL_TEXT: &str = "⚠️ No channel is configured.";

/// Catalog link for channel buttons: the configured one or the bot itself.
fn catalog_url(screen: &Screen<'_>) -> String {
    let ctx = screen.ctx;
    ctx.settings
        .storefront
        .catalog_url
        .clone()
        .unwrap_or_else(|| format!("https://t.me/{}", ctx.bot_username))
}

fn post_draft(screen: &Screen<'_>) -> Result<ChannelPostDraft> {
    match screen.ctx.dialogs.get(screen.user_id) {
        Some(Dialog::ChannelPost(draft)) => Ok(draft),
        _ => Err(StayBuddyError::InvalidInput(
            "The post draft has expired, start a new one.".to_string(),
        )),
    }
}

fn admin_back(action: AdminAction) -> CallbackAction {
    CallbackAction::Admin(action)
}

fn kind_icon(kind: RequestKind) -> &'static str {
    match kind {
        RequestKind::Dates => "📅",
        RequestKind::EntryDate => "🗓",
    }
}

async fn find_listing(screen: &Screen<'_>, listing_id: i64) -> Result<Listing> {
    screen
        .ctx
        .db
        .listings
        .find_by_id(listing_id)
        .await?
        .ok_or(StayBuddyError::ListingNotFound { listing_id })
}

async fn find_request(screen: &Screen<'_>, kind: RequestKind, request_id: i64) -> Result<GuestRequest> {
    screen
        .ctx
        .db
        .requests
        .find(kind, request_id)
        .await?
        .ok_or(StayBuddyError::RequestNotFound { request_id })
}

pub(crate) async fn show_listing(screen: &Screen<'_>, listing_id: i64) -> Result<()> {
    let listing = find_listing(screen, listing_id).await?;
    let none = || "none".to_string();
    let text = format!(
        "🏙 <b>#{} {}</b>\n\n\
         Status: {}\n\
         Sort order: {}\n\
         Guests: up to {}\n\
         Tags: {}\n\
         Map: {}\n\
         Channel post: {}\n\
         Media: {}",
        listing.id,
        html::escape(&listing.title),
        if listing.is_active { "🟢 shown" } else { "⚪️ hidden" },
        listing.sort_order,
        listing.guests_max,
        if listing.tags.is_empty() { none() } else { html::escape(&listing.tags.join(", ")) },
        if listing.map_url.is_empty() { none() } else { html::escape(&listing.map_url) },
        if listing.channel_post_url.is_empty() {
            none()
        } else {
            html::escape(&listing.channel_post_url)
        },
        listing.media().len()
    );
    screen.show(&text, keyboards::admin_listing(&listing)).await
}

async fn publish_listing(screen: &Screen<'_>, listing: &Listing, channel: ChatId) -> Result<()> {
    let ctx = screen.ctx;
    let text = listing_post_text(listing, &ctx.settings.contacts);
    let keyboard = keyboards::listing_post(
        &listing.map_url,
        &ctx.bot_username,
        ctx.settings.manager_link().as_deref(),
    );

    match listing.media().first() {
        Some(primary) if text.chars().count() <= CAPTION_LIMIT => {
            send_media(screen.bot, channel, primary, &text, Some(keyboard)).await?;
        }
        _ => {
            screen
                .bot
                .send_message(channel, text)
                .parse_mode(teloxide::types::ParseMode::Html)
                .reply_markup(keyboard)
                .await?;
        }
    }
    info!(listing_id = listing.id, channel_id = channel.0, "Listing published to channel");
    Ok(())
}

fn request_text(kind: RequestKind, request: &GuestRequest) -> String {
    let mut text = format!(
        "{} <b>{} #{}</b>\n\nFrom: {}\nReceived: {}\n",
        kind_icon(kind),
        kind.label(),
        request.id,
        html::escape(&request.requester()),
        format_timestamp(request.created_at)
    );
    if let Some(title) = &request.listing_title {
        text.push_str(&format!("Listing: {}\n", html::escape(title)));
    }
    text.push_str(&format!("\n{}\n", html::escape(&truncate_text(&request.raw_text, 3000))));
    if request.is_handled() {
        text.push_str("\n✅ Handled");
        if let Some(handled_at) = request.handled_at {
            text.push_str(&format!(" {}", format_timestamp(handled_at)));
        }
    } else {
        text.push_str("\n🆕 New");
    }
    text
}

/// Send a promo code to the requester and report the result to the admin.
pub async fn deliver_code(screen: &Screen<'_>, request: &GuestRequest, code: &str) -> Result<()> {
    let delivered = screen
        .ctx
        .services
        .notification_relay
        .send_to_user(
            request.user_id,
            &format!(
                "🎁 The manager sent you a promo code: <code>{}</code>",
                html::escape(code)
            ),
        )
        .await;
    log_admin_action(
        screen.user_id,
        "promo_sent",
        Some(&request.user_id.to_string()),
        Some(code),
    );
    if !delivered {
        warn!(user_id = request.user_id, "Promo code assigned but not delivered");
    }
    let text = if delivered {
        format!("✅ Code <code>{}</code> sent to {}.", html::escape(code), html::escape(&request.requester()))
    } else {
        format!(
            "⚠️ Code <code>{}</code> is assigned, but {} could not be reached.",
            html::escape(code),
            html::escape(&request.requester())
        )
    };
    notice(screen.bot, screen.chat_id, &text).await?;
    Ok(())
}

fn stats_text(report: &StatsReport) -> String {
    let mut text = String::from("📊 <b>Stats</b>\n");
    for window in &report.windows {
        text.push_str(&format!(
            "\n<b>Last {} days</b>\nNew users: {}\nActive users: {}\nBooking clicks: {}\nDate requests: {}\n",
            window.days, window.new_users, window.active_users, window.clicks, window.requests
        ));
    }
    if !report.top_listings.is_empty() {
        text.push_str("\n<b>Top listings by clicks</b>\n");
        for (position, top) in report.top_listings.iter().enumerate() {
            text.push_str(&format!(
                "{}. {} · {} clicks\n",
                position + 1,
                html::escape(&top.title),
                top.clicks
            ));
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{StatsWindow, TopListing};
    use chrono::Utc;

    #[test]
    fn test_stats_text_lists_windows_and_top() {
        let report = StatsReport {
            windows: vec![StatsWindow {
                days: 7,
                new_users: 3,
                active_users: 10,
                clicks: 4,
                requests: 1,
            }],
            top_listings: vec![TopListing {
                listing_id: 1,
                title: "Loft & Co".to_string(),
                clicks: 4,
            }],
        };
        let text = stats_text(&report);
        assert!(text.contains("Last 7 days"));
        assert!(text.contains("New users: 3"));
        assert!(text.contains("1. Loft &amp; Co"));
    }

    #[test]
    fn test_request_text_status() {
        let request = GuestRequest {
            id: 5,
            user_id: 42,
            listing_id: Some(1),
            listing_title: Some("Loft".to_string()),
            raw_text: "12-15 June".to_string(),
            status: crate::models::request::STATUS_NEW.to_string(),
            admin_id: None,
            full_name: Some("Anna".to_string()),
            username: None,
            created_at: Utc::now(),
            handled_at: None,
        };
        let text = request_text(RequestKind::Dates, &request);
        assert!(text.contains("#5"));
        assert!(text.contains("Listing: Loft"));
        assert!(text.contains("🆕 New"));
    }
}
