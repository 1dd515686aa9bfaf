//! Screen management
//!
//! Each private chat shows one anchored welcome message, one main screen
//! and at most one live wizard prompt. The chat id of a private chat is the
//! user id, which keys the [`DisplayTracker`](crate::state::DisplayTracker).

use teloxide::{
    prelude::*,
    types::{ChatId, InlineKeyboardMarkup, InputFile, MessageId, ParseMode},
    utils::html,
    ApiError, RequestError,
};
use tracing::{debug, warn};
use url::Url;

use crate::config::settings::ContactsConfig;
use crate::models::{Listing, MediaItem, MediaKind};
use crate::state::AppContext;
use crate::utils::errors::Result;
use crate::utils::helpers::{tel_link, telegram_link, whatsapp_link};

/// The chat a handler answers in, with the message the action came from.
#[derive(Clone, Copy)]
pub struct Screen<'a> {
    pub bot: &'a Bot,
    pub ctx: &'a AppContext,
    pub chat_id: ChatId,
    pub user_id: i64,
    /// Message carrying the pressed button.
    pub source: Option<MessageId>,
}

impl<'a> Screen<'a> {
    pub fn new(bot: &'a Bot, ctx: &'a AppContext, user_id: i64, source: Option<MessageId>) -> Self {
        Self {
            bot,
            ctx,
            chat_id: ChatId(user_id),
            user_id,
            source,
        }
    }

    pub async fn show(&self, text: &str, keyboard: InlineKeyboardMarkup) -> Result<()> {
        show_screen(self.bot, self.ctx, self.chat_id, self.source, text, keyboard).await
    }

    /// Always send a new main screen, even when the source could be edited.
    pub async fn replace(&self, text: &str, keyboard: InlineKeyboardMarkup) -> Result<()> {
        send_main(self.bot, self.ctx, self.chat_id, text, keyboard).await?;
        Ok(())
    }

    pub async fn notice(&self, text: &str) -> Result<()> {
        notice(self.bot, self.chat_id, text).await?;
        Ok(())
    }

    pub async fn prompt(&self, text: &str, keyboard: InlineKeyboardMarkup) -> Result<()> {
        send_prompt(self.bot, self.ctx, self.chat_id, text, keyboard).await
    }

    pub fn is_admin(&self) -> bool {
        self.ctx.is_admin(self.user_id)
    }
}

/// Delete a message, logging instead of failing.
pub async fn delete_quietly(bot: &Bot, chat_id: ChatId, message_id: MessageId) {
    if let Err(e) = bot.delete_message(chat_id, message_id).await {
        debug!(chat_id = chat_id.0, message_id = message_id.0, error = %e, "Could not delete message");
    }
}

/// Send a plain HTML message that is not tracked as a screen.
pub async fn notice(bot: &Bot, chat_id: ChatId, text: &str) -> Result<Message> {
    Ok(bot
        .send_message(chat_id, text)
        .parse_mode(ParseMode::Html)
        .await?)
}

/// Send a new main screen and remove the one it replaces.
pub async fn send_main(
    bot: &Bot,
    ctx: &AppContext,
    chat_id: ChatId,
    text: &str,
    keyboard: InlineKeyboardMarkup,
) -> Result<Message> {
    let sent = bot
        .send_message(chat_id, text)
        .parse_mode(ParseMode::Html)
        .reply_markup(keyboard)
        .await?;
    track_main(bot, ctx, chat_id, sent.id).await;
    Ok(sent)
}

/// Like [`send_main`] with a media item as the screen body.
pub async fn send_main_media(
    bot: &Bot,
    ctx: &AppContext,
    chat_id: ChatId,
    item: &MediaItem,
    caption: &str,
    keyboard: InlineKeyboardMarkup,
) -> Result<Message> {
    let sent = send_media(bot, chat_id, item, caption, Some(keyboard)).await?;
    track_main(bot, ctx, chat_id, sent.id).await;
    Ok(sent)
}

async fn track_main(bot: &Bot, ctx: &AppContext, chat_id: ChatId, message_id: MessageId) {
    if let Some(previous) = ctx.display.replace_main(chat_id.0, message_id) {
        delete_quietly(bot, chat_id, previous).await;
    }
}

/// Show a text screen. A button press on the current main screen edits it
/// in place; anything else sends a fresh screen.
pub async fn show_screen(
    bot: &Bot,
    ctx: &AppContext,
    chat_id: ChatId,
    source: Option<MessageId>,
    text: &str,
    keyboard: InlineKeyboardMarkup,
) -> Result<()> {
    let state = ctx.display.get(chat_id.0);
    if let Some(message_id) = source.filter(|id| state.main == Some(*id) && state.anchor != Some(*id)) {
        let edited = bot
            .edit_message_text(chat_id, message_id, text)
            .parse_mode(ParseMode::Html)
            .reply_markup(keyboard.clone())
            .await;
        match edited {
            Ok(_) | Err(RequestError::Api(ApiError::MessageNotModified)) => return Ok(()),
            // Media screens have no text to edit.
            Err(e) => debug!(chat_id = chat_id.0, error = %e, "Edit failed, sending a new screen"),
        }
    }
    send_main(bot, ctx, chat_id, text, keyboard).await?;
    Ok(())
}

/// Send a media item the way its kind requires. External links go out as
/// photos by URL and fall back to a text message when the link is invalid.
pub async fn send_media(
    bot: &Bot,
    chat_id: ChatId,
    item: &MediaItem,
    caption: &str,
    keyboard: Option<InlineKeyboardMarkup>,
) -> Result<Message> {
    let file = match item.kind {
        MediaKind::ExternalUrl => match Url::parse(&item.value) {
            Ok(url) => InputFile::url(url),
            Err(e) => {
                warn!(value = %item.value, error = %e, "Invalid media link, sending text instead");
                let mut request = bot.send_message(chat_id, caption).parse_mode(ParseMode::Html);
                if let Some(keyboard) = keyboard {
                    request = request.reply_markup(keyboard);
                }
                return Ok(request.await?);
            }
        },
        _ => InputFile::file_id(item.value.clone()),
    };

    let message = match item.kind {
        MediaKind::Video => {
            let mut request = bot.send_video(chat_id, file).caption(caption).parse_mode(ParseMode::Html);
            if let Some(keyboard) = keyboard {
                request = request.reply_markup(keyboard);
            }
            request.await?
        }
        MediaKind::Document => {
            let mut request = bot.send_document(chat_id, file).caption(caption).parse_mode(ParseMode::Html);
            if let Some(keyboard) = keyboard {
                request = request.reply_markup(keyboard);
            }
            request.await?
        }
        MediaKind::Photo | MediaKind::ExternalUrl => {
            let mut request = bot.send_photo(chat_id, file).caption(caption).parse_mode(ParseMode::Html);
            if let Some(keyboard) = keyboard {
                request = request.reply_markup(keyboard);
            }
            request.await?
        }
    };
    Ok(message)
}

/// Send a wizard prompt, superseding the previous one.
pub async fn send_prompt(
    bot: &Bot,
    ctx: &AppContext,
    chat_id: ChatId,
    text: &str,
    keyboard: InlineKeyboardMarkup,
) -> Result<()> {
    let sent = bot
        .send_message(chat_id, text)
        .parse_mode(ParseMode::Html)
        .reply_markup(keyboard)
        .await?;
    if let Some(previous) = ctx.display.replace_prompt(chat_id.0, sent.id) {
        delete_quietly(bot, chat_id, previous).await;
    }
    Ok(())
}

pub async fn clear_prompt(bot: &Bot, ctx: &AppContext, chat_id: ChatId) {
    if let Some(previous) = ctx.display.take_prompt(chat_id.0) {
        delete_quietly(bot, chat_id, previous).await;
    }
}

/// Send the welcome message and pin it as the chat's anchor.
pub async fn send_welcome(bot: &Bot, ctx: &AppContext, chat_id: ChatId, keyboard: InlineKeyboardMarkup) -> Result<()> {
    let text = html::escape(&ctx.settings.storefront.welcome_text);

    let image = ctx.settings.storefront.welcome_image.as_deref().map(str::trim);
    let sent = match image.filter(|value| !value.is_empty()) {
        Some(image) => {
            let file = match Url::parse(image) {
                Ok(url) => InputFile::url(url),
                Err(_) => InputFile::file(image),
            };
            let photo = bot
                .send_photo(chat_id, file)
                .caption(text.clone())
                .parse_mode(ParseMode::Html)
                .reply_markup(keyboard.clone())
                .await;
            match photo {
                Ok(message) => message,
                Err(e) => {
                    warn!(error = %e, "Welcome image failed, sending text only");
                    notice_with(bot, chat_id, &text, keyboard).await?
                }
            }
        }
        None => notice_with(bot, chat_id, &text, keyboard).await?,
    };

    ctx.display.set_anchor(chat_id.0, sent.id);
    Ok(())
}

async fn notice_with(bot: &Bot, chat_id: ChatId, text: &str, keyboard: InlineKeyboardMarkup) -> Result<Message> {
    Ok(bot
        .send_message(chat_id, text)
        .parse_mode(ParseMode::Html)
        .reply_markup(keyboard)
        .await?)
}

/// Card text for a listing, also used as the media caption.
pub fn listing_card_text(listing: &Listing) -> String {
    let details = listing.details();
    let mut text = format!("🏙 <b>{}</b>\n", html::escape(listing.header()));

    if !listing.address_short.is_empty() {
        text.push_str(&format!("📍 {}\n", html::escape(&listing.address_short)));
    }
    text.push_str(&format!("👥 Up to {} guests", listing.guests_max));
    if listing.price_from > 0 {
        text.push_str(&format!(" · from {}", listing.price_from));
    }
    text.push('\n');

    if !details.short_desc.is_empty() {
        text.push_str(&format!("\n{}\n", html::escape(&details.short_desc)));
    }
    if !details.quote_desc.is_empty() {
        text.push_str(&format!("\n<blockquote>{}</blockquote>\n", html::escape(&details.quote_desc)));
    }
    let features = if details.features_text.is_empty() {
        &listing.amenities
    } else {
        &details.features_text
    };
    if !features.is_empty() {
        text.push_str(&format!("\n✨ {}\n", html::escape(features)));
    }
    if !listing.tags.is_empty() {
        let tags: Vec<String> = listing.tags.iter().map(|tag| format!("#{}", html::escape(tag))).collect();
        text.push_str(&format!("\n{}", tags.join(" ")));
    }
    text
}

/// Channel post text: the card plus manager contacts.
pub fn listing_post_text(listing: &Listing, contacts: &ContactsConfig) -> String {
    let mut text = listing_card_text(listing);

    let mut lines = Vec::new();
    if let Some(phone) = contacts.phone.as_deref().filter(|phone| tel_link(phone).is_some()) {
        lines.push(format!("📞 {}", html::escape(phone)));
    }
    if let Some(link) = contacts.username.as_deref().and_then(telegram_link) {
        lines.push(format!("✈️ <a href=\"{}\">Telegram</a>", link));
    }
    if let Some(link) = contacts.whatsapp.as_deref().and_then(whatsapp_link) {
        lines.push(format!("💬 <a href=\"{}\">WhatsApp</a>", html::escape(&link)));
    }
    if !lines.is_empty() {
        text.push_str("\n\n");
        text.push_str(&lines.join("\n"));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sqlx::types::Json;

    use crate::models::ListingDetails;

    fn listing() -> Listing {
        Listing {
            id: 1,
            title: "Loft".to_string(),
            address_short: "Main st. 1".to_string(),
            guests_max: 4,
            amenities: "Wi-Fi".to_string(),
            tags: vec!["parking".to_string()],
            price_from: 0,
            channel_post_url: String::new(),
            map_url: String::new(),
            is_active: true,
            sort_order: 0,
            details_json: Json(ListingDetails {
                header_text: "Loft <by the river>".to_string(),
                short_desc: "Nice place".to_string(),
                ..ListingDetails::default()
            }),
            media_urls: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_card_text_escapes_and_falls_back_to_amenities() {
        let text = listing_card_text(&listing());
        assert!(text.contains("Loft &lt;by the river&gt;"));
        assert!(text.contains("Up to 4 guests"));
        assert!(!text.contains("from 0"));
        assert!(text.contains("✨ Wi-Fi"));
        assert!(text.contains("#parking"));
    }

    #[test]
    fn test_post_text_contacts() {
        let contacts = ContactsConfig {
            phone: Some("+7 900 000-00-00".to_string()),
            username: Some("@manager".to_string()),
            whatsapp: None,
        };
        let text = listing_post_text(&listing(), &contacts);
        assert!(text.contains("📞 +7 900 000-00-00"));
        assert!(text.contains("https://t.me/manager"));
        assert!(!text.contains("WhatsApp"));
    }
}
