//! Analytics, click, referral and giveaway repository implementation

use sqlx::PgPool;
use tracing::debug;

use crate::models::engagement::{GiveawayEntry, Referral, TopListing};
use crate::utils::errors::StayBuddyError;

#[derive(Clone)]
#[derive(Debug)]
pub struct EngagementRepository {
    pool: PgPool,
}

impl EngagementRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Append an analytics event
    pub async fn log_event(
        &self,
        user_id: Option<i64>,
        event_type: &str,
        payload: serde_json::Value,
    ) -> Result<(), StayBuddyError> {
        sqlx::query("INSERT INTO events (user_id, event_type, payload, created_at) VALUES ($1, $2, $3, NOW())")
            .bind(user_id)
            .bind(event_type)
            .bind(payload)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Payload of the newest event of a type
    pub async fn latest_event_payload(&self, event_type: &str) -> Result<Option<serde_json::Value>, StayBuddyError> {
        let payload = sqlx::query_scalar::<_, serde_json::Value>(
            "SELECT payload FROM events WHERE event_type = $1 ORDER BY created_at DESC, id DESC LIMIT 1",
        )
        .bind(event_type)
        .fetch_optional(&self.pool)
        .await?;

        Ok(payload)
    }

    /// Record a click on a booking link
    pub async fn log_click(&self, user_id: i64, listing_id: Option<i64>, source: &str) -> Result<(), StayBuddyError> {
        sqlx::query("INSERT INTO click_events (user_id, listing_id, source, created_at) VALUES ($1, $2, $3, NOW())")
            .bind(user_id)
            .bind(listing_id)
            .bind(source)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn count_clicks_since(&self, days: i32) -> Result<i64, StayBuddyError> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM click_events WHERE created_at >= NOW() - make_interval(days => $1)",
        )
        .bind(days)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0)
    }

    /// Listings with the most booking clicks
    pub async fn top_listings(&self, limit: i64) -> Result<Vec<TopListing>, StayBuddyError> {
        let top = sqlx::query_as::<_, TopListing>(
            r#"
            SELECT c.listing_id AS listing_id, l.title AS title, COUNT(*) AS clicks
            FROM click_events c
            JOIN listings l ON l.id = c.listing_id
            GROUP BY c.listing_id, l.title
            ORDER BY clicks DESC, c.listing_id ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(top)
    }

    /// Record that `inviter_id` brought `invitee_id`. Idempotent per invitee.
    pub async fn create_referral(&self, inviter_id: i64, invitee_id: i64) -> Result<bool, StayBuddyError> {
        let result = sqlx::query(
            r#"
            INSERT INTO referrals (inviter_id, invitee_id, created_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (invitee_id) DO NOTHING
            "#,
        )
        .bind(inviter_id)
        .bind(invitee_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Qualify the invitee's pending referral. Returns it when this call did the qualifying.
    pub async fn qualify_referral(&self, invitee_id: i64) -> Result<Option<Referral>, StayBuddyError> {
        let referral = sqlx::query_as::<_, Referral>(
            r#"
            UPDATE referrals
            SET qualified = TRUE, qualified_at = NOW()
            WHERE invitee_id = $1 AND qualified = FALSE
            RETURNING id, inviter_id, invitee_id, qualified, qualified_at, created_at
            "#,
        )
        .bind(invitee_id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(referral) = &referral {
            debug!(inviter_id = referral.inviter_id, invitee_id = invitee_id, "Referral qualified");
        }
        Ok(referral)
    }

    pub async fn has_pending_referral(&self, invitee_id: i64) -> Result<bool, StayBuddyError> {
        let exists: (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM referrals WHERE invitee_id = $1 AND qualified = FALSE)",
        )
        .bind(invitee_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists.0)
    }

    /// (invited, qualified) counts for an inviter
    pub async fn referral_stats(&self, inviter_id: i64) -> Result<(i64, i64), StayBuddyError> {
        let stats: (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COUNT(*) FILTER (WHERE qualified) FROM referrals WHERE inviter_id = $1",
        )
        .bind(inviter_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(stats)
    }

    /// Enter the giveaway. Returns false when already entered.
    pub async fn join_giveaway(&self, user_id: i64) -> Result<bool, StayBuddyError> {
        let result = sqlx::query(
            r#"
            INSERT INTO giveaway_entries (user_id, created_at, updated_at)
            VALUES ($1, NOW(), NOW())
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Participants who have not won yet
    pub async fn giveaway_candidates(&self) -> Result<Vec<GiveawayEntry>, StayBuddyError> {
        let entries = sqlx::query_as::<_, GiveawayEntry>(
            r#"
            SELECT id, user_id, is_winner, winner_code, created_at, updated_at
            FROM giveaway_entries
            WHERE is_winner = FALSE
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    pub async fn mark_giveaway_winner(&self, entry_id: i64, code: &str) -> Result<(), StayBuddyError> {
        sqlx::query(
            "UPDATE giveaway_entries SET is_winner = TRUE, winner_code = $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(code)
        .bind(entry_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
