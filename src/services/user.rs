//! User service implementation
//!
//! Registration on `/start`, referral attribution, contact sharing, the
//! personal cabinet and data deletion.

use tracing::{debug, info};

use crate::database::DatabaseService;
use crate::models::engagement::event_types;
use crate::models::user::{CabinetSummary, UpsertUserRequest, User};
use crate::utils::errors::Result;
use crate::utils::helpers::{generate_ref_code, normalize_phone};

/// Prefix of a referral start argument: `/start ref_<code>`.
pub const REF_PREFIX: &str = "ref_";

/// Extract the referral code from a `/start` argument.
pub fn parse_start_arg(arg: &str) -> Option<&str> {
    arg.trim()
        .strip_prefix(REF_PREFIX)
        .map(str::trim)
        .filter(|code| !code.is_empty())
}

#[derive(Debug, Clone)]
pub struct UserService {
    db: DatabaseService,
}

impl UserService {
    pub fn new(db: DatabaseService) -> Self {
        Self { db }
    }

    /// Register a new user or refresh an existing one, then attribute a
    /// referral from the start argument if it names someone else.
    pub async fn register(&self, request: UpsertUserRequest, start_arg: &str) -> Result<User> {
        let telegram_id = request.telegram_id;
        let user = self.db.users.upsert(&request, &generate_ref_code()).await?;
        self.db
            .engagement
            .log_event(
                Some(telegram_id),
                event_types::START,
                serde_json::json!({ "arg": start_arg }),
            )
            .await?;

        if let Some(code) = parse_start_arg(start_arg) {
            self.attribute_inviter(&user, code).await?;
        }

        debug!(user_id = telegram_id, "User registered");
        Ok(user)
    }

    async fn attribute_inviter(&self, user: &User, code: &str) -> Result<()> {
        if user.inviter_id.is_some() || user.ref_code.as_deref() == Some(code) {
            return Ok(());
        }
        let Some(inviter) = self.db.users.find_by_ref_code(code).await? else {
            debug!(user_id = user.telegram_id, code = code, "Unknown referral code");
            return Ok(());
        };
        if inviter.telegram_id == user.telegram_id {
            return Ok(());
        }

        if self
            .db
            .users
            .set_inviter_if_absent(user.telegram_id, inviter.telegram_id)
            .await?
        {
            self.db
                .engagement
                .create_referral(inviter.telegram_id, user.telegram_id)
                .await?;
            info!(
                inviter_id = inviter.telegram_id,
                invitee_id = user.telegram_id,
                "Referral recorded"
            );
        }
        Ok(())
    }

    pub async fn get(&self, telegram_id: i64) -> Result<Option<User>> {
        self.db.users.find_by_telegram_id(telegram_id).await
    }

    pub async fn touch(&self, telegram_id: i64) -> Result<()> {
        self.db.users.touch(telegram_id).await
    }

    /// Store a shared phone number in normalized form.
    pub async fn save_phone(&self, telegram_id: i64, phone: &str) -> Result<String> {
        let normalized = normalize_phone(phone);
        self.db.users.set_phone(telegram_id, &normalized).await?;
        Ok(normalized)
    }

    pub async fn cabinet(&self, telegram_id: i64) -> Result<CabinetSummary> {
        let (invited, qualified) = self.db.engagement.referral_stats(telegram_id).await?;
        let codes = self.db.promos.count_for_user(telegram_id).await?;
        Ok(CabinetSummary {
            invited,
            qualified,
            codes,
        })
    }

    pub async fn opt_out_of_reminders(&self, telegram_id: i64) -> Result<()> {
        self.db.users.set_reminders_opt_out(telegram_id, true).await?;
        self.db
            .engagement
            .log_event(Some(telegram_id), event_types::REMINDERS_OFF, serde_json::json!({}))
            .await
    }

    pub async fn delete(&self, telegram_id: i64) -> Result<()> {
        self.db.delete_user_data(telegram_id).await
    }
}

/// `https://t.me/<bot>?start=ref_<code>`
pub fn referral_link(bot_username: &str, ref_code: &str) -> String {
    format!(
        "https://t.me/{}?start={}{}",
        bot_username.trim_start_matches('@'),
        REF_PREFIX,
        ref_code
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_start_arg() {
        assert_eq!(parse_start_arg("ref_u1a2b3c4d"), Some("u1a2b3c4d"));
        assert_eq!(parse_start_arg(" ref_abc "), Some("abc"));
        assert_eq!(parse_start_arg("ref_"), None);
        assert_eq!(parse_start_arg("promo"), None);
        assert_eq!(parse_start_arg(""), None);
    }

    #[test]
    fn test_referral_link() {
        assert_eq!(
            referral_link("@stay_bot", "u12345678"),
            "https://t.me/stay_bot?start=ref_u12345678"
        );
    }
}
