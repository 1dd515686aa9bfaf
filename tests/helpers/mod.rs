//! Test helpers module
//!
//! Mock Telegram API, in-memory stores, a throwaway PostgreSQL and a few
//! fixtures shared by the integration tests.

#![allow(dead_code, unused_imports)]

pub mod database_helper;
pub mod memory;
pub mod telegram_mock;

pub use database_helper::*;
pub use memory::*;
pub use telegram_mock::*;

use chrono::Utc;
use sqlx::types::Json;
use StayBuddy::models::{Listing, ListingDetails};

pub const TEST_BOT_TOKEN: &str = "12345:test_token";

/// Active listing with the given capacity and tags.
pub fn listing(id: i64, guests_max: i32, tags: &[&str]) -> Listing {
    let now = Utc::now();
    Listing {
        id,
        title: format!("Listing {}", id),
        address_short: format!("Street {}", id),
        guests_max,
        amenities: String::new(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        price_from: 0,
        channel_post_url: String::new(),
        map_url: String::new(),
        is_active: true,
        sort_order: 0,
        details_json: Json(ListingDetails::default()),
        media_urls: Vec::new(),
        created_at: now,
        updated_at: now,
    }
}
