//! StayBuddy Telegram Bot
//!
//! A Telegram storefront for short-term rental listings. Guests browse a
//! filtered catalog, ask for dates, collect promo codes and invite friends;
//! operators manage listings through a step wizard, answer requests, run
//! giveaways and broadcasts from the same chat.

#![allow(non_snake_case)]

pub mod config;
pub mod database;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{Result, StayBuddyError};

// Re-export main components for easy access
pub use database::DatabaseService;
pub use services::ServiceFactory;
pub use state::{AppContext, WizardEngine};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
