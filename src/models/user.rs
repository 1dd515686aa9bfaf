//! User model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A person who has talked to the bot. `telegram_id` is the key every other
/// table refers to as `user_id`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub telegram_id: i64,
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub ref_code: Option<String>,
    pub inviter_id: Option<i64>,
    pub is_blocked: bool,
    pub reminders_opt_out: bool,
    pub created_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
    pub last_reminder_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertUserRequest {
    pub telegram_id: i64,
    pub username: Option<String>,
    pub full_name: Option<String>,
}

impl User {
    /// Name suitable for operator-facing messages.
    pub fn display_name(&self) -> String {
        match (&self.full_name, &self.username) {
            (Some(name), Some(username)) => format!("{} (@{})", name, username),
            (Some(name), None) => name.clone(),
            (None, Some(username)) => format!("@{}", username),
            (None, None) => format!("id {}", self.telegram_id),
        }
    }
}

/// Numbers shown in the personal cabinet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CabinetSummary {
    pub invited: i64,
    pub qualified: i64,
    pub codes: i64,
}
