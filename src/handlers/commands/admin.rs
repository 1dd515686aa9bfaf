//! Admin command handler

use teloxide::prelude::*;

use crate::handlers::callbacks::admin::ADMIN_TEXT;
use crate::handlers::{display, keyboards};
use crate::state::AppContext;
use crate::utils::errors::{Result, StayBuddyError};
use crate::utils::logging::log_admin_action;

/// Handle /admin command
pub async fn handle_admin_panel(bot: &Bot, msg: &Message, ctx: &AppContext) -> Result<()> {
    let user = msg
        .from
        .as_ref()
        .ok_or_else(|| StayBuddyError::InvalidInput("No user in message".to_string()))?;
    ctx.admin.check_admin_auth(user)?;

    let admin_id = user.id.0 as i64;
    ctx.dialogs.remove(admin_id);
    log_admin_action(admin_id, "open_panel", None, None);
    display::send_main(bot, ctx, msg.chat.id, ADMIN_TEXT, keyboards::admin_menu()).await?;
    Ok(())
}
