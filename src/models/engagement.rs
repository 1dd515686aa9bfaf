//! Referral, giveaway, analytics and broadcast models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Analytics event names written to the `events` table.
pub mod event_types {
    pub const START: &str = "start";
    pub const VIEW_LISTING: &str = "view_apartment";
    pub const SUBMIT_DATES: &str = "submit_dates";
    pub const ENTRY_DATE: &str = "entry_date";
    pub const PROMO_WELCOME: &str = "promo_welcome";
    pub const GIVEAWAY_JOIN: &str = "giveaway_join";
    pub const REMINDERS_OFF: &str = "reminders_off";
    pub const CHANNEL_BOOKING_BUTTON: &str = "channel_booking_button";
    pub const CHANNEL_CATALOG_BUTTON: &str = "channel_catalog_button";
}

/// Click source for the book button on a listing card.
pub const CLICK_SOURCE_CARD: &str = "apartment_card";

/// Click source for the generic booking button shown on `screen`.
pub fn booking_click_source(screen: &str) -> String {
    format!("booking_{}", screen)
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Referral {
    pub id: i64,
    pub inviter_id: i64,
    pub invitee_id: i64,
    pub qualified: bool,
    pub qualified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GiveawayEntry {
    pub id: i64,
    pub user_id: i64,
    pub is_winner: bool,
    pub winner_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Audience of an operator broadcast. Blocked users are never included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BroadcastSegment {
    All,
    /// Not seen for more than a week.
    Inactive,
    /// Opened a listing card but never clicked a booking link.
    ViewedNotBooked,
}

impl BroadcastSegment {
    pub const ALL: [BroadcastSegment; 3] = [
        BroadcastSegment::All,
        BroadcastSegment::Inactive,
        BroadcastSegment::ViewedNotBooked,
    ];

    pub fn code(self) -> &'static str {
        match self {
            BroadcastSegment::All => "all",
            BroadcastSegment::Inactive => "inactive",
            BroadcastSegment::ViewedNotBooked => "view_no_book",
        }
    }

    pub fn parse(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|segment| segment.code() == code)
    }

    pub fn label(self) -> &'static str {
        match self {
            BroadcastSegment::All => "Everyone",
            BroadcastSegment::Inactive => "Inactive for 7+ days",
            BroadcastSegment::ViewedNotBooked => "Viewed but did not book",
        }
    }
}

/// Activity counters over the last `days` days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsWindow {
    pub days: i32,
    pub new_users: i64,
    pub active_users: i64,
    pub clicks: i64,
    pub requests: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TopListing {
    pub listing_id: i64,
    pub title: String,
    pub clicks: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsReport {
    pub windows: Vec<StatsWindow>,
    pub top_listings: Vec<TopListing>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_codes() {
        for segment in BroadcastSegment::ALL {
            assert_eq!(BroadcastSegment::parse(segment.code()), Some(segment));
        }
        assert_eq!(BroadcastSegment::parse("vip"), None);
    }

    #[test]
    fn test_booking_click_source() {
        assert_eq!(booking_click_source("catalog"), "booking_catalog");
    }
}
