//! Date and entry-date request models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// The two request queues operators work through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestKind {
    /// Stay dates for a specific listing.
    Dates,
    /// Arrival date question asked from the welcome screen.
    EntryDate,
}

impl RequestKind {
    /// Short tag used in callback data.
    pub fn code(self) -> &'static str {
        match self {
            RequestKind::Dates => "d",
            RequestKind::EntryDate => "e",
        }
    }

    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "d" => Some(RequestKind::Dates),
            "e" => Some(RequestKind::EntryDate),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RequestKind::Dates => "Date request",
            RequestKind::EntryDate => "Entry date request",
        }
    }
}

pub const STATUS_NEW: &str = "new";
pub const STATUS_HANDLED: &str = "handled";

/// A request row joined with the requester and, for date requests, the listing.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GuestRequest {
    pub id: i64,
    pub user_id: i64,
    pub listing_id: Option<i64>,
    pub listing_title: Option<String>,
    pub raw_text: String,
    pub status: String,
    pub admin_id: Option<i64>,
    pub full_name: Option<String>,
    pub username: Option<String>,
    pub created_at: DateTime<Utc>,
    pub handled_at: Option<DateTime<Utc>>,
}

impl GuestRequest {
    pub fn is_handled(&self) -> bool {
        self.status == STATUS_HANDLED
    }

    pub fn requester(&self) -> String {
        match (&self.full_name, &self.username) {
            (Some(name), Some(username)) => format!("{} (@{})", name, username),
            (Some(name), None) => name.clone(),
            (None, Some(username)) => format!("@{}", username),
            (None, None) => format!("id {}", self.user_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_codes() {
        for kind in [RequestKind::Dates, RequestKind::EntryDate] {
            assert_eq!(RequestKind::parse(kind.code()), Some(kind));
        }
        assert_eq!(RequestKind::parse("x"), None);
    }
}
