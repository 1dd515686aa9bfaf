//! User repository implementation

use sqlx::PgPool;

use crate::models::engagement::{event_types, BroadcastSegment};
use crate::models::user::{UpsertUserRequest, User};
use crate::utils::errors::StayBuddyError;

const USER_COLUMNS: &str = "id, telegram_id, username, full_name, phone, ref_code, inviter_id, \
     is_blocked, reminders_opt_out, created_at, last_seen_at, last_reminder_at";

/// Days without activity that make a user "inactive" for broadcasts.
pub const INACTIVE_SEGMENT_DAYS: i32 = 7;

#[derive(Clone)]
#[derive(Debug)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new user or refresh name, username and last-seen of an existing one.
    /// `ref_code` is only used for new rows.
    pub async fn upsert(&self, request: &UpsertUserRequest, ref_code: &str) -> Result<User, StayBuddyError> {
        let sql = format!(
            r#"
            INSERT INTO users (telegram_id, full_name, username, ref_code, created_at, last_seen_at)
            VALUES ($1, $2, $3, $4, NOW(), NOW())
            ON CONFLICT (telegram_id) DO UPDATE SET
                full_name = EXCLUDED.full_name,
                username = EXCLUDED.username,
                last_seen_at = NOW()
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(request.telegram_id)
            .bind(&request.full_name)
            .bind(&request.username)
            .bind(ref_code)
            .fetch_one(&self.pool)
            .await?;

        Ok(user)
    }

    /// Find user by Telegram ID
    pub async fn find_by_telegram_id(&self, telegram_id: i64) -> Result<Option<User>, StayBuddyError> {
        let sql = format!("SELECT {} FROM users WHERE telegram_id = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(telegram_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn find_by_ref_code(&self, ref_code: &str) -> Result<Option<User>, StayBuddyError> {
        let sql = format!("SELECT {} FROM users WHERE ref_code = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(ref_code)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Record activity.
    pub async fn touch(&self, telegram_id: i64) -> Result<(), StayBuddyError> {
        sqlx::query("UPDATE users SET last_seen_at = NOW() WHERE telegram_id = $1")
            .bind(telegram_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Set the inviter unless one is already recorded. Returns whether it was set.
    pub async fn set_inviter_if_absent(&self, telegram_id: i64, inviter_id: i64) -> Result<bool, StayBuddyError> {
        let result = sqlx::query(
            "UPDATE users SET inviter_id = $1 WHERE telegram_id = $2 AND inviter_id IS NULL",
        )
        .bind(inviter_id)
        .bind(telegram_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn set_phone(&self, telegram_id: i64, phone: &str) -> Result<(), StayBuddyError> {
        sqlx::query("UPDATE users SET phone = $1 WHERE telegram_id = $2")
            .bind(phone)
            .bind(telegram_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn has_phone(&self, telegram_id: i64) -> Result<bool, StayBuddyError> {
        let phone: Option<(Option<String>,)> =
            sqlx::query_as("SELECT phone FROM users WHERE telegram_id = $1")
                .bind(telegram_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(matches!(phone, Some((Some(p),)) if !p.trim().is_empty()))
    }

    pub async fn set_reminders_opt_out(&self, telegram_id: i64, opt_out: bool) -> Result<(), StayBuddyError> {
        sqlx::query("UPDATE users SET reminders_opt_out = $1 WHERE telegram_id = $2")
            .bind(opt_out)
            .bind(telegram_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Mark users the bot can no longer reach.
    pub async fn mark_blocked(&self, telegram_ids: &[i64]) -> Result<u64, StayBuddyError> {
        if telegram_ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query("UPDATE users SET is_blocked = TRUE WHERE telegram_id = ANY($1)")
            .bind(telegram_ids)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn mark_reminded(&self, telegram_id: i64) -> Result<(), StayBuddyError> {
        sqlx::query("UPDATE users SET last_reminder_at = NOW() WHERE telegram_id = $1")
            .bind(telegram_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Users who went quiet and have not been reminded recently.
    pub async fn due_for_reminder(
        &self,
        inactive_days: i64,
        cooldown_days: i64,
        limit: i64,
    ) -> Result<Vec<i64>, StayBuddyError> {
        let rows: Vec<(i64,)> = sqlx::query_as(
            r#"
            SELECT telegram_id FROM users
            WHERE reminders_opt_out = FALSE
              AND is_blocked = FALSE
              AND last_seen_at < NOW() - make_interval(days => $1::INT)
              AND (last_reminder_at IS NULL OR last_reminder_at < NOW() - make_interval(days => $2::INT))
            ORDER BY last_seen_at ASC
            LIMIT $3
            "#,
        )
        .bind(inactive_days as i32)
        .bind(cooldown_days as i32)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Recipients of a broadcast segment. Blocked users are always excluded.
    pub async fn segment_recipients(&self, segment: BroadcastSegment) -> Result<Vec<i64>, StayBuddyError> {
        let query = match segment {
            BroadcastSegment::All => {
                sqlx::query_as::<_, (i64,)>(
                    "SELECT telegram_id FROM users WHERE is_blocked = FALSE ORDER BY id",
                )
            }
            BroadcastSegment::Inactive => sqlx::query_as::<_, (i64,)>(
                r#"
                SELECT telegram_id FROM users
                WHERE is_blocked = FALSE
                  AND last_seen_at < NOW() - make_interval(days => $1::INT)
                ORDER BY id
                "#,
            )
            .bind(INACTIVE_SEGMENT_DAYS),
            BroadcastSegment::ViewedNotBooked => sqlx::query_as::<_, (i64,)>(
                r#"
                SELECT DISTINCT u.telegram_id FROM users u
                JOIN events e ON e.user_id = u.telegram_id AND e.event_type = $1
                WHERE u.is_blocked = FALSE
                  AND NOT EXISTS (SELECT 1 FROM click_events c WHERE c.user_id = u.telegram_id)
                ORDER BY u.telegram_id
                "#,
            )
            .bind(event_types::VIEW_LISTING),
        };

        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Count users created within the last `days` days
    pub async fn count_new_since(&self, days: i32) -> Result<i64, StayBuddyError> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM users WHERE created_at >= NOW() - make_interval(days => $1)",
        )
        .bind(days)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0)
    }

    /// Count users seen within the last `days` days
    pub async fn count_active_since(&self, days: i32) -> Result<i64, StayBuddyError> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM users WHERE last_seen_at >= NOW() - make_interval(days => $1)",
        )
        .bind(days)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0)
    }
}
