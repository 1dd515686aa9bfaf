//! Privacy and data deletion

use teloxide::prelude::*;
use tracing::info;

use crate::handlers::display;
use crate::state::AppContext;
use crate::utils::errors::{Result, StayBuddyError};

const PRIVACY_TEXT: &str = "🔒 <b>Privacy</b>\n\n\
    We store your Telegram id, name and username, the phone number if you share it, \
    your date requests, promo codes and which apartments you looked at. \
    The data is used only to answer your requests and improve the catalog.\n\n\
    Send /delete_me to erase it.";

pub async fn handle_privacy(bot: &Bot, msg: &Message) -> Result<()> {
    display::notice(bot, msg.chat.id, PRIVACY_TEXT).await?;
    Ok(())
}

/// Erase the sender's data and forget their in-memory state.
pub async fn handle_delete_me(bot: &Bot, msg: &Message, ctx: &AppContext) -> Result<()> {
    let user = msg
        .from
        .as_ref()
        .ok_or_else(|| StayBuddyError::InvalidInput("No user in message".to_string()))?;
    let user_id = user.id.0 as i64;

    ctx.services.user_service.delete(user_id).await?;
    ctx.dialogs.remove(user_id);
    ctx.filters.remove(user_id);
    ctx.wizard.cancel(user_id);
    ctx.throttle.clear_user(user_id);

    info!(user_id = user_id, "User data deleted on request");
    display::notice(
        bot,
        msg.chat.id,
        "🗑 Your data has been deleted. Send /start if you want to come back.",
    )
    .await?;
    Ok(())
}
