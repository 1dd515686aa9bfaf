//! Services module
//!
//! Business logic between the handlers and the repositories.

pub mod catalog;
pub mod channel;
pub mod giveaway;
pub mod notification;
pub mod promo;
pub mod referral;
pub mod reminders;
pub mod user;

// Re-export commonly used services
pub use catalog::{CatalogFilter, CatalogPage, CatalogService, GuestBucket};
pub use channel::{CatalogButtonPost, ChannelPostDraft, PostStage};
pub use giveaway::{DrawOutcome, GiveawayService};
pub use notification::{BroadcastReport, NotificationRelay};
pub use promo::{PromoService, WelcomeClaim};
pub use referral::{Qualification, ReferralService};
pub use reminders::{ReminderScheduler, ReminderSweep, SweepReport};
pub use user::UserService;

use std::time::Duration;

use teloxide::Bot;

use crate::config::settings::Settings;
use crate::database::DatabaseService;

/// Service factory for creating and managing all services
#[derive(Debug, Clone)]
pub struct ServiceFactory {
    pub user_service: UserService,
    pub catalog_service: CatalogService,
    pub promo_service: PromoService,
    pub referral_service: ReferralService,
    pub giveaway_service: GiveawayService,
    pub notification_relay: NotificationRelay,
    pub reminder_sweep: ReminderSweep,
}

impl ServiceFactory {
    /// Create a new ServiceFactory with all services initialized
    pub fn new(bot: Bot, settings: &Settings, db: DatabaseService) -> Self {
        let notification_relay = NotificationRelay::new(bot, settings);

        Self {
            user_service: UserService::new(db.clone()),
            catalog_service: CatalogService::new(db.listings.clone(), settings.storefront.page_size),
            promo_service: PromoService::new(db.promos.clone()),
            referral_service: ReferralService::new(
                db.clone(),
                notification_relay.clone(),
                settings.storefront.strict_phone_mode,
            ),
            giveaway_service: GiveawayService::new(db.clone(), notification_relay.clone()),
            reminder_sweep: ReminderSweep::new(db, notification_relay.clone(), settings.reminders.clone()),
            notification_relay,
        }
    }

    /// Scheduler for the reminder sweep, not yet started.
    pub fn reminder_scheduler(&self, settings: &Settings) -> ReminderScheduler {
        ReminderScheduler::new(
            self.reminder_sweep.clone(),
            Duration::from_secs(settings.reminders.interval_seconds.max(1)),
        )
    }
}
