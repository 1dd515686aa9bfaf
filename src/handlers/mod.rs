//! Bot handlers module
//!
//! This module contains all Telegram bot handlers organized by type:
//! - Command handlers for bot commands
//! - Callback handlers for inline keyboard interactions
//! - Message handlers for text, media and contacts
//!
//! [`schema`] wires them into the dispatcher. Each endpoint is an error
//! boundary: a failure is logged and the user gets a generic message.

pub mod callbacks;
pub mod commands;
pub mod display;
pub mod keyboards;
pub mod messages;

use std::sync::Arc;

use teloxide::{
    dispatching::{UpdateFilterExt, UpdateHandler},
    prelude::*,
    types::{CallbackQuery, ChatId, Update},
};
use tracing::{debug, error, warn};

pub use callbacks::handle_callback_query;
pub use commands::{handle_command, Command};
pub use messages::handle_message;

use crate::middleware::logging::log_update;
use crate::services::Qualification;
use crate::state::AppContext;
use crate::utils::errors::{ErrorSeverity, Result, StayBuddyError};

type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;
type HandlerResult = std::result::Result<(), HandlerError>;

/// Build the update handler tree
pub fn schema() -> UpdateHandler<HandlerError> {
    dptree::entry()
        .inspect(|update: Update| log_update(&update))
        .branch(
            Update::filter_message()
                .filter(|msg: Message| msg.chat.is_private())
                .branch(
                    dptree::entry()
                        .filter_command::<Command>()
                        .endpoint(command_endpoint),
                )
                .branch(dptree::endpoint(message_endpoint)),
        )
        .branch(Update::filter_callback_query().endpoint(callback_endpoint))
}

async fn command_endpoint(bot: Bot, msg: Message, cmd: Command, ctx: Arc<AppContext>) -> HandlerResult {
    let result = handle_command(&bot, &msg, cmd, &ctx).await;
    report_failure(&bot, msg.chat.id, "command", result).await;
    Ok(())
}

async fn message_endpoint(bot: Bot, msg: Message, ctx: Arc<AppContext>) -> HandlerResult {
    let result = handle_message(&bot, &msg, &ctx).await;
    report_failure(&bot, msg.chat.id, "message", result).await;
    Ok(())
}

async fn callback_endpoint(bot: Bot, query: CallbackQuery, ctx: Arc<AppContext>) -> HandlerResult {
    let chat_id = ChatId(query.from.id.0 as i64);
    let result = handle_callback_query(bot.clone(), query, &ctx).await;
    report_failure(&bot, chat_id, "callback", result).await;
    Ok(())
}

/// Log a failed action and tell the user something went wrong.
async fn report_failure(bot: &Bot, chat_id: ChatId, kind: &str, result: Result<()>) {
    let Err(e) = result else {
        return;
    };

    match e.severity() {
        ErrorSeverity::Info => debug!(chat_id = chat_id.0, kind = kind, error = %e, "Action rejected"),
        ErrorSeverity::Warning => warn!(chat_id = chat_id.0, kind = kind, error = %e, "Action failed"),
        ErrorSeverity::Error | ErrorSeverity::Critical => {
            error!(chat_id = chat_id.0, kind = kind, error = %e, severity = %e.severity(), "Action failed")
        }
    }

    let text = match &e {
        StayBuddyError::InvalidInput(reason) => format!("⚠️ {}", teloxide::utils::html::escape(reason)),
        other => other.user_message().to_string(),
    };
    if let Err(send_error) = display::notice(bot, chat_id, &text).await {
        warn!(chat_id = chat_id.0, error = %send_error, "Could not report failure to user");
    }
}

/// Record an engagement event. Failures are logged only.
pub(crate) async fn track_event(ctx: &AppContext, user_id: i64, event_type: &str, details: serde_json::Value) {
    if let Err(e) = ctx.db.engagement.log_event(Some(user_id), event_type, details).await {
        warn!(user_id = user_id, event_type = event_type, error = %e, "Failed to log event");
    }
}

/// Run referral qualification for a meaningful action. Failures are logged only.
pub(crate) async fn qualify_referral(ctx: &AppContext, user_id: i64) {
    match ctx.services.referral_service.maybe_qualify(user_id).await {
        Ok(Qualification::Qualified { inviter_id, .. }) => {
            debug!(user_id = user_id, inviter_id = inviter_id, "Referral qualified");
        }
        Ok(_) => {}
        Err(e) => warn!(user_id = user_id, error = %e, "Referral qualification failed"),
    }
}
