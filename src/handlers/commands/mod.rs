//! Command handlers module
//!
//! This module contains handlers for all bot commands like /start, /help, etc.

pub mod admin;
pub mod help;
pub mod privacy;
pub mod start;

use teloxide::{prelude::*, utils::command::BotCommands};

use crate::state::AppContext;
use crate::utils::errors::Result;

/// All available bot commands
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "StayBuddy commands:")]
pub enum Command {
    #[command(description = "open the bot")]
    Start(String),
    #[command(description = "show help")]
    Help,
    #[command(description = "how we handle your data")]
    Privacy,
    #[command(rename = "delete_me", description = "delete everything we store about you")]
    DeleteMe,
    #[command(description = "admin panel (admins only)")]
    Admin,
}

/// Main command dispatcher
pub async fn handle_command(bot: &Bot, msg: &Message, cmd: Command, ctx: &AppContext) -> Result<()> {
    match cmd {
        Command::Start(arg) => start::handle_start(bot, msg, arg.trim(), ctx).await,
        Command::Help => help::handle_help(bot, msg).await,
        Command::Privacy => privacy::handle_privacy(bot, msg).await,
        Command::DeleteMe => privacy::handle_delete_me(bot, msg, ctx).await,
        Command::Admin => admin::handle_admin_panel(bot, msg, ctx).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            Command::parse("/start ref_u1a2b3c4d", "staybuddy_bot").ok(),
            Some(Command::Start("ref_u1a2b3c4d".to_string()))
        );
        assert_eq!(
            Command::parse("/start", "staybuddy_bot").ok(),
            Some(Command::Start(String::new()))
        );
        assert_eq!(Command::parse("/delete_me", "staybuddy_bot").ok(), Some(Command::DeleteMe));
        assert!(Command::parse("/events", "staybuddy_bot").is_err());
    }
}
