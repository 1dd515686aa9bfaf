//! Message handlers module
//!
//! Routes text, uploads and shared contacts. A pending dialog wins over an
//! active wizard, which wins over contact handling; anything left gets a
//! hint to use the buttons.

mod dialog;

use teloxide::{prelude::*, types::Message};
use tracing::debug;

use crate::handlers::callbacks::{wizard::render_reply, HOME_TEXT};
use crate::handlers::display::Screen;
use crate::handlers::{keyboards, qualify_referral};
use crate::middleware::logging::message_type;
use crate::models::{MediaItem, MediaKind};
use crate::state::{AppContext, Dialog, StepInput};
use crate::utils::errors::Result;
use crate::utils::logging::log_user_action;

/// Handle incoming private messages
pub async fn handle_message(bot: &Bot, msg: &Message, ctx: &AppContext) -> Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    let user_id = user.id.0 as i64;
    let screen = Screen::new(bot, ctx, user_id, None);

    if let Err(e) = ctx.services.user_service.touch(user_id).await {
        debug!(user_id = user_id, error = %e, "Could not refresh last seen");
    }

    if let Some(pending) = ctx.dialogs.get(user_id) {
        if pending.is_admin_only() && !ctx.is_admin(user_id) {
            ctx.dialogs.remove(user_id);
        } else if let Some(text) = msg.text() {
            return dialog::handle(&screen, user, pending, text).await;
        } else if let Dialog::ChannelPost(draft) = pending {
            return match media_item(msg) {
                Some(item) => dialog::post_media(&screen, draft, item).await,
                None => screen.notice("📎 Send a photo or a video.").await,
            };
        } else if !ctx.wizard.is_active(user_id) {
            return screen.notice("✍️ Please answer with a text message.").await;
        }
    }

    if ctx.wizard.is_active(user_id) && ctx.is_admin(user_id) {
        if let Some(input) = wizard_input(msg) {
            let reply = ctx.wizard.submit(user_id, input)?;
            return render_reply(&screen, reply).await;
        }
    }

    if let Some(contact) = msg.contact() {
        if contact.user_id.is_some_and(|id| id != user.id) {
            return screen.notice("Please share your own contact.").await;
        }
        let phone = ctx
            .services
            .user_service
            .save_phone(user_id, &contact.phone_number)
            .await?;
        log_user_action(user_id, "phone_shared", None);
        qualify_referral(ctx, user_id).await;
        debug!(user_id = user_id, phone = %phone, "Phone saved");
        return screen.notice("📞 Thanks, your phone number is saved.").await;
    }

    debug!(user_id = user_id, message_type = message_type(msg), "Unrouted message");
    screen.notice("Please use the buttons below 👇").await?;
    screen
        .replace(HOME_TEXT, keyboards::main_menu(ctx.is_admin(user_id)))
        .await
}

/// Wizard input carried by a message, if any.
pub fn wizard_input(msg: &Message) -> Option<StepInput> {
    if let Some(text) = msg.text() {
        return Some(StepInput::Text(text.to_string()));
    }
    media_item(msg).map(StepInput::Upload)
}

/// The uploaded photo, video or document of a message.
pub fn media_item(msg: &Message) -> Option<MediaItem> {
    if let Some(photos) = msg.photo() {
        // Sizes are ascending; keep the largest
        return photos
            .last()
            .map(|photo| MediaItem::new(MediaKind::Photo, photo.file.id.clone()));
    }
    if let Some(video) = msg.video() {
        return Some(MediaItem::new(MediaKind::Video, video.file.id.clone()));
    }
    if let Some(document) = msg.document() {
        let kind = MediaKind::from_mime(document.mime_type.as_ref().map(|mime| mime.essence_str()));
        return Some(MediaItem::new(kind, document.file.id.clone()));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn message(content: serde_json::Value) -> Message {
        let mut value = json!({
            "message_id": 10,
            "date": 1640995200,
            "chat": { "id": 5, "first_name": "Op", "type": "private" },
            "from": { "id": 5, "is_bot": false, "first_name": "Op" }
        });
        if let (Some(base), Some(extra)) = (value.as_object_mut(), content.as_object()) {
            base.extend(extra.clone());
        }
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_photo_upload_keeps_largest_size() {
        let msg = message(json!({
            "photo": [
                { "file_id": "small", "file_unique_id": "s", "file_size": 100, "width": 90, "height": 90 },
                { "file_id": "large", "file_unique_id": "l", "file_size": 9000, "width": 1280, "height": 960 }
            ]
        }));
        assert_eq!(
            wizard_input(&msg),
            Some(StepInput::Upload(MediaItem::new(MediaKind::Photo, "large")))
        );
    }

    #[test]
    fn test_video_and_document_uploads() {
        let video = message(json!({
            "video": {
                "file_id": "clip", "file_unique_id": "c", "file_size": 500,
                "width": 640, "height": 360, "duration": 12
            }
        }));
        assert_eq!(media_item(&video), Some(MediaItem::new(MediaKind::Video, "clip")));

        let image_doc = message(json!({
            "document": {
                "file_id": "scan", "file_unique_id": "d", "file_size": 700,
                "file_name": "flat.jpg", "mime_type": "image/jpeg"
            }
        }));
        assert_eq!(media_item(&image_doc), Some(MediaItem::new(MediaKind::Photo, "scan")));

        let pdf = message(json!({
            "document": {
                "file_id": "rules", "file_unique_id": "r", "file_size": 700,
                "file_name": "rules.pdf", "mime_type": "application/pdf"
            }
        }));
        assert_eq!(media_item(&pdf), Some(MediaItem::new(MediaKind::Document, "rules")));
    }

    #[test]
    fn test_text_is_not_media() {
        let msg = message(json!({ "text": "Sea view" }));
        assert_eq!(media_item(&msg), None);
        assert_eq!(wizard_input(&msg), Some(StepInput::Text("Sea view".to_string())));
    }
}
