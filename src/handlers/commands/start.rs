//! Start command handler
//!
//! Registers the user, records a referral from a `ref_` deep link and sends
//! the anchored welcome message.

use teloxide::prelude::*;
use tracing::{debug, info};

use crate::handlers::{display, keyboards};
use crate::models::UpsertUserRequest;
use crate::state::AppContext;
use crate::utils::errors::{Result, StayBuddyError};

/// Handle /start command - main entry point for every user
pub async fn handle_start(bot: &Bot, msg: &Message, arg: &str, ctx: &AppContext) -> Result<()> {
    let user = msg
        .from
        .as_ref()
        .ok_or_else(|| StayBuddyError::InvalidInput("No user in message".to_string()))?;
    let user_id = user.id.0 as i64;

    debug!(user_id = user_id, start_arg = arg, "Processing /start command");

    let request = UpsertUserRequest {
        telegram_id: user_id,
        username: user.username.clone(),
        full_name: Some(user.full_name()),
    };
    ctx.services.user_service.register(request, arg).await?;
    ctx.dialogs.remove(user_id);

    display::send_welcome(bot, ctx, msg.chat.id, keyboards::welcome()).await?;
    info!(user_id = user_id, start_arg = arg, "User started the bot");
    Ok(())
}
