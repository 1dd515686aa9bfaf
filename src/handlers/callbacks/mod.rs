//! Callback query handlers module
//!
//! This module contains handlers for all inline keyboard button callbacks

pub mod action;
pub(crate) mod admin;
pub(crate) mod catalog;
mod promo;
pub(crate) mod wizard;

use teloxide::{prelude::*, types::CallbackQuery};
use tracing::{debug, warn};

use self::action::CallbackAction;
use super::display::Screen;
use super::keyboards;
use crate::state::{AppContext, Dialog};
use crate::utils::errors::Result;

pub const HOME_TEXT: &str = "🏠 <b>Main menu</b>\n\nPick what you need below.";

const RULES_TEXT: &str = "📘 <b>House rules</b>\n\n\
    • Check-in from 14:00, check-out until 12:00.\n\
    • No smoking and no parties.\n\
    • Quiet hours from 22:00 to 08:00.\n\
    • Pets only where the listing says so.\n\n\
    The manager confirms every booking personally.";

/// Main callback query dispatcher
pub async fn handle_callback_query(bot: Bot, query: CallbackQuery, ctx: &AppContext) -> Result<()> {
    let user_id = query.from.id.0 as i64;
    let source = query.message.as_ref().map(|message| message.id());

    // Answer first so the button stops spinning
    if let Err(e) = bot.answer_callback_query(query.id.clone()).await {
        warn!(error = %e, user_id = user_id, "Failed to answer callback query");
    }

    let Some(data) = query.data.as_deref() else {
        return Ok(());
    };
    let Some(action) = CallbackAction::parse(data) else {
        warn!(user_id = user_id, data = %data, "Unknown callback data");
        return Ok(());
    };
    debug!(user_id = user_id, action = ?action, "Dispatching callback");

    if let Err(e) = ctx.services.user_service.touch(user_id).await {
        debug!(user_id = user_id, error = %e, "Could not refresh last seen");
    }

    let screen = Screen::new(&bot, ctx, user_id, source);
    match action {
        CallbackAction::Home | CallbackAction::StartMenu => show_home(&screen).await,
        CallbackAction::EntryDate => {
            ctx.dialogs.insert(user_id, Dialog::EntryDate);
            screen
                .show(
                    "🗓 <b>Entry date</b>\n\nWhen would you like to check in? Write the date and the number of guests.",
                    keyboards::home_only(),
                )
                .await
        }
        CallbackAction::Rules => screen.show(RULES_TEXT, keyboards::home_only()).await,
        CallbackAction::ReplyToAdmin => {
            ctx.dialogs.insert(user_id, Dialog::ReplyToAdmin);
            screen.notice("✍️ Type your answer to the manager.").await
        }
        CallbackAction::Noop => Ok(()),

        CallbackAction::Catalog { .. }
        | CallbackAction::FilterOpen
        | CallbackAction::FilterGuests(_)
        | CallbackAction::FilterTag(_)
        | CallbackAction::FilterReset
        | CallbackAction::FilterApply
        | CallbackAction::ListingCard { .. }
        | CallbackAction::ListingMedia { .. }
        | CallbackAction::BookListing { .. }
        | CallbackAction::Booking { .. }
        | CallbackAction::StayDates { .. } => catalog::handle(&screen, action).await,

        CallbackAction::PromoMenu
        | CallbackAction::PromoWelcome
        | CallbackAction::PromoReferral
        | CallbackAction::PromoMine
        | CallbackAction::Cabinet
        | CallbackAction::GiveawayMenu
        | CallbackAction::GiveawayRules
        | CallbackAction::GiveawayJoin
        | CallbackAction::RemindersOff => promo::handle(&screen, action).await,

        CallbackAction::Wizard(action) => {
            ctx.admin.check_admin_auth(&query.from)?;
            wizard::handle(&screen, action).await
        }
        CallbackAction::Admin(action) => {
            ctx.admin.check_admin_auth(&query.from)?;
            admin::handle(&screen, action).await
        }
    }
}

/// Show the main menu and drop any pending dialog.
pub async fn show_home(screen: &Screen<'_>) -> Result<()> {
    screen.ctx.dialogs.remove(screen.user_id);
    screen
        .show(HOME_TEXT, keyboards::main_menu(screen.is_admin()))
        .await
}
