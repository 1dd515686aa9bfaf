//! Update logging middleware
//!
//! Traces every inbound update before it is routed.

use teloxide::types::{Message, Update, UpdateKind};
use tracing::{debug, info};

/// Short classification of an inbound message, also used by the router.
pub fn message_type(message: &Message) -> &'static str {
    if message.text().is_some() {
        "text"
    } else if message.photo().is_some() {
        "photo"
    } else if message.video().is_some() {
        "video"
    } else if message.document().is_some() {
        "document"
    } else if message.contact().is_some() {
        "contact"
    } else {
        "other"
    }
}

/// Log incoming update
pub fn log_update(update: &Update) {
    match &update.kind {
        UpdateKind::Message(message) => {
            info!(
                user_id = message.from.as_ref().map(|u| u.id.0),
                chat_id = message.chat.id.0,
                message_id = message.id.0,
                message_type = message_type(message),
                "Message received"
            );
            if let Some(text) = message.text() {
                debug!(chat_id = message.chat.id.0, text = %text, "Message text");
            }
        }
        UpdateKind::CallbackQuery(callback) => {
            info!(
                user_id = callback.from.id.0,
                callback_data = callback.data.as_deref().unwrap_or("none"),
                "Callback query received"
            );
        }
        _ => {
            debug!(update_id = update.id.0, "Other update type received");
        }
    }
}
