//! Notification relay
//!
//! Every outbound message that is not a direct reply goes through here:
//! operator notifications, direct messages to users, paced broadcasts and
//! channel posts. Delivery failures never abort a batch; recipients that
//! could not be reached are reported back so the caller can mark them.

use std::fmt;
use std::num::NonZeroU32;
use std::sync::Arc;

use futures::future::join_all;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardMarkup, MessageId, ParseMode};
use teloxide::{ApiError, RequestError};
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::utils::errors::Result;
use crate::utils::logging::log_delivery_failure;

/// Result of a broadcast.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub sent: usize,
    pub unreachable: Vec<i64>,
}

/// Whether a send error means the recipient can no longer be reached.
pub fn is_unreachable(error: &RequestError) -> bool {
    matches!(
        error,
        RequestError::Api(
            ApiError::BotBlocked
                | ApiError::UserDeactivated
                | ApiError::ChatNotFound
                | ApiError::BotKicked
                | ApiError::CantInitiateConversation
        )
    )
}

#[derive(Clone)]
pub struct NotificationRelay {
    bot: Bot,
    admin_targets: Vec<i64>,
    channel_id: Option<i64>,
    limiter: Arc<DefaultDirectRateLimiter>,
}

impl fmt::Debug for NotificationRelay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationRelay")
            .field("admin_targets", &self.admin_targets)
            .field("channel_id", &self.channel_id)
            .finish_non_exhaustive()
    }
}

impl NotificationRelay {
    pub fn new(bot: Bot, settings: &Settings) -> Self {
        Self::with_targets(
            bot,
            settings.admin_targets(),
            settings.bot.channel_id,
            settings.notifications.messages_per_second,
        )
    }

    pub fn with_targets(
        bot: Bot,
        admin_targets: Vec<i64>,
        channel_id: Option<i64>,
        messages_per_second: u32,
    ) -> Self {
        let rate = NonZeroU32::new(messages_per_second).unwrap_or(NonZeroU32::MIN);
        Self {
            bot,
            admin_targets,
            channel_id,
            limiter: Arc::new(RateLimiter::direct(Quota::per_second(rate))),
        }
    }

    pub fn bot(&self) -> &Bot {
        &self.bot
    }

    pub fn channel_id(&self) -> Option<i64> {
        self.channel_id
    }

    /// Send `text` with optional buttons to one chat.
    pub async fn send(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> std::result::Result<Message, RequestError> {
        let request = self
            .bot
            .send_message(ChatId(chat_id), text)
            .parse_mode(ParseMode::Html);
        match keyboard {
            Some(keyboard) => request.reply_markup(keyboard).await,
            None => request.await,
        }
    }

    /// Notify every operator concurrently. Returns how many were reached.
    pub async fn notify_admins(&self, text: &str, keyboard: Option<InlineKeyboardMarkup>) -> usize {
        let sends = self
            .admin_targets
            .iter()
            .map(|&admin_id| {
                let keyboard = keyboard.clone();
                async move { (admin_id, self.send(admin_id, text, keyboard).await) }
            });

        let mut delivered = 0;
        for (admin_id, result) in join_all(sends).await {
            match result {
                Ok(_) => delivered += 1,
                Err(e) => log_delivery_failure(admin_id, "admin_notification", &e.to_string()),
            }
        }
        debug!(delivered = delivered, targets = self.admin_targets.len(), "Admins notified");
        delivered
    }

    /// Direct message to a user. False when it could not be delivered.
    pub async fn send_to_user(&self, user_id: i64, text: &str) -> bool {
        self.send_to_user_with(user_id, text, None).await
    }

    pub async fn send_to_user_with(
        &self,
        user_id: i64,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> bool {
        match self.send(user_id, text, keyboard).await {
            Ok(_) => true,
            Err(e) => {
                log_delivery_failure(user_id, "direct_message", &e.to_string());
                false
            }
        }
    }

    /// Send `text` to every recipient at the configured pace.
    pub async fn broadcast(&self, recipients: &[i64], text: &str) -> BroadcastReport {
        info!(recipients = recipients.len(), "Broadcast started");
        let mut report = BroadcastReport::default();

        for &user_id in recipients {
            self.limiter.until_ready().await;
            match self.send(user_id, text, None).await {
                Ok(_) => report.sent += 1,
                Err(e) => {
                    if !is_unreachable(&e) {
                        warn!(user_id = user_id, error = %e, "Broadcast send failed");
                    }
                    report.unreachable.push(user_id);
                }
            }
        }

        info!(
            sent = report.sent,
            unreachable = report.unreachable.len(),
            "Broadcast finished"
        );
        report
    }

    /// Post to the public channel if one is configured.
    pub async fn announce(&self, text: &str) -> bool {
        self.publish(text, None).await.unwrap_or_else(|e| {
            warn!(error = %e, "Channel announcement failed");
            false
        })
    }

    /// Post with buttons to the public channel. `Ok(false)` when no channel is configured.
    pub async fn publish(&self, text: &str, keyboard: Option<InlineKeyboardMarkup>) -> Result<bool> {
        Ok(self.publish_message(text, keyboard).await?.is_some())
    }

    /// Like [`publish`](Self::publish), returning the channel message.
    pub async fn publish_message(
        &self,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<Option<Message>> {
        let Some(channel_id) = self.channel_id else {
            debug!("No channel configured, skipping publish");
            return Ok(None);
        };
        Ok(Some(self.send(channel_id, text, keyboard).await?))
    }

    /// Publish and pin silently. The flag tells whether the pin held; a
    /// post that could not be pinned stays published.
    pub async fn publish_pinned(
        &self,
        text: &str,
        keyboard: InlineKeyboardMarkup,
    ) -> Result<Option<(MessageId, bool)>> {
        let Some(message) = self.publish_message(text, Some(keyboard)).await? else {
            return Ok(None);
        };
        let pinned = match self
            .bot
            .pin_chat_message(message.chat.id, message.id)
            .disable_notification(true)
            .await
        {
            Ok(_) => true,
            Err(e) => {
                warn!(chat_id = message.chat.id.0, message_id = message.id.0, error = %e, "Could not pin channel post");
                false
            }
        };
        Ok(Some((message.id, pinned)))
    }

    /// Replace the buttons under an already published post.
    pub async fn edit_buttons(
        &self,
        chat_id: i64,
        message_id: MessageId,
        keyboard: InlineKeyboardMarkup,
    ) -> Result<()> {
        let edited = self
            .bot
            .edit_message_reply_markup(ChatId(chat_id), message_id)
            .reply_markup(keyboard)
            .await;
        match edited {
            Ok(_) | Err(RequestError::Api(ApiError::MessageNotModified)) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
