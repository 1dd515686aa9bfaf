//! Help command handler

use teloxide::prelude::*;

use crate::handlers::display;
use crate::utils::errors::Result;

const HELP_TEXT: &str = "🤖 <b>StayBuddy help</b>\n\n\
    /start - open the menu\n\
    /help - show this message\n\
    /privacy - how we handle your data\n\
    /delete_me - delete everything we store about you\n\n\
    Browse the catalog, ask for dates and book with the buttons under each message.";

/// Handle /help command
pub async fn handle_help(bot: &Bot, msg: &Message) -> Result<()> {
    display::notice(bot, msg.chat.id, HELP_TEXT).await?;
    Ok(())
}
