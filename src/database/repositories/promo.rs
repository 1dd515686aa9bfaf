//! Promo code repository implementation

use sqlx::PgPool;
use tracing::{debug, info};

use crate::database::stores::PromoStore;
use crate::models::promo::{PromoCode, PromoKind, PromoPoolSummary};
use crate::utils::errors::StayBuddyError;

const PROMO_COLUMNS: &str = "id, code, kind, is_assigned, assigned_to, assigned_at, created_at";

#[derive(Clone)]
#[derive(Debug)]
pub struct PromoRepository {
    pool: PgPool,
}

impl PromoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Add a free code. Returns false when the code already exists.
    pub async fn add_code(&self, code: &str, kind: PromoKind) -> Result<bool, StayBuddyError> {
        let result = sqlx::query(
            "INSERT INTO promo_codes (code, kind, created_at) VALUES ($1, $2, NOW()) ON CONFLICT (code) DO NOTHING",
        )
        .bind(code)
        .bind(kind.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Add many free codes of one kind, skipping duplicates. Returns how many were new.
    pub async fn add_codes(&self, codes: &[String], kind: PromoKind) -> Result<u64, StayBuddyError> {
        let result = sqlx::query(
            r#"
            INSERT INTO promo_codes (code, kind, created_at)
            SELECT DISTINCT c, $2, NOW() FROM unnest($1::TEXT[]) AS c
            ON CONFLICT (code) DO NOTHING
            "#,
        )
        .bind(codes)
        .bind(kind.as_str())
        .execute(&self.pool)
        .await?;

        info!(kind = %kind, submitted = codes.len(), added = result.rows_affected(), "Bulk promo upload");
        Ok(result.rows_affected())
    }

    /// Take the lowest-id free code of `kind` for `user_id`.
    ///
    /// Concurrent callers never receive the same code: the candidate row is
    /// locked and skipped by everyone else.
    pub async fn claim_free(&self, kind: PromoKind, user_id: i64) -> Result<Option<String>, StayBuddyError> {
        let row: Option<(String,)> = sqlx::query_as(
            r#"
            UPDATE promo_codes
            SET is_assigned = TRUE, assigned_to = $2, assigned_at = NOW()
            WHERE id = (
                SELECT id FROM promo_codes
                WHERE kind = $1 AND is_assigned = FALSE
                ORDER BY id ASC
                LIMIT 1
                FOR UPDATE SKIP LOCKED
            )
            RETURNING code
            "#,
        )
        .bind(kind.as_str())
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some((code,)) = &row {
            debug!(kind = %kind, user_id = user_id, code = %code, "Promo code claimed");
        }
        Ok(row.map(|(code,)| code))
    }

    /// Assign a specific free code by id. Returns the code, or `None` if it was taken meanwhile.
    pub async fn assign_by_id(&self, code_id: i64, user_id: i64) -> Result<Option<String>, StayBuddyError> {
        let row: Option<(String,)> = sqlx::query_as(
            r#"
            UPDATE promo_codes
            SET is_assigned = TRUE, assigned_to = $2, assigned_at = NOW()
            WHERE id = $1 AND is_assigned = FALSE
            RETURNING code
            "#,
        )
        .bind(code_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(code,)| code))
    }

    /// Give an operator-typed code to a user. A known free code is assigned;
    /// an unknown one is created as an already assigned `manual` code.
    /// Returns false when the code exists but belongs to someone.
    pub async fn assign_code(&self, code: &str, user_id: i64) -> Result<bool, StayBuddyError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE promo_codes
            SET is_assigned = TRUE, assigned_to = $2, assigned_at = NOW()
            WHERE code = $1 AND is_assigned = FALSE
            "#,
        )
        .bind(code)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        let assigned = if updated.rows_affected() > 0 {
            true
        } else {
            let inserted = sqlx::query(
                r#"
                INSERT INTO promo_codes (code, kind, is_assigned, assigned_to, assigned_at, created_at)
                VALUES ($1, $2, TRUE, $3, NOW(), NOW())
                ON CONFLICT (code) DO NOTHING
                "#,
            )
            .bind(code)
            .bind(PromoKind::Manual.as_str())
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
            inserted.rows_affected() > 0
        };

        tx.commit().await?;
        Ok(assigned)
    }

    pub async fn list_free(&self, kind: PromoKind, limit: i64) -> Result<Vec<PromoCode>, StayBuddyError> {
        let sql = format!(
            "SELECT {} FROM promo_codes WHERE kind = $1 AND is_assigned = FALSE ORDER BY id ASC LIMIT $2",
            PROMO_COLUMNS
        );
        let codes = sqlx::query_as::<_, PromoCode>(&sql)
            .bind(kind.as_str())
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(codes)
    }

    /// Codes held by a user, newest first
    pub async fn list_for_user(&self, user_id: i64) -> Result<Vec<PromoCode>, StayBuddyError> {
        let sql = format!(
            "SELECT {} FROM promo_codes WHERE assigned_to = $1 ORDER BY assigned_at DESC NULLS LAST, id DESC",
            PROMO_COLUMNS
        );
        let codes = sqlx::query_as::<_, PromoCode>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(codes)
    }

    pub async fn count_for_user(&self, user_id: i64) -> Result<i64, StayBuddyError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM promo_codes WHERE assigned_to = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }

    pub async fn has_kind(&self, user_id: i64, kind: PromoKind) -> Result<bool, StayBuddyError> {
        let exists: (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM promo_codes WHERE assigned_to = $1 AND kind = $2)",
        )
        .bind(user_id)
        .bind(kind.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists.0)
    }

    pub async fn has_free(&self, kind: PromoKind) -> Result<bool, StayBuddyError> {
        let exists: (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM promo_codes WHERE kind = $1 AND is_assigned = FALSE)",
        )
        .bind(kind.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists.0)
    }

    /// Free/total counters for every kind present in the pool
    pub async fn pool_summary(&self) -> Result<Vec<PromoPoolSummary>, StayBuddyError> {
        let summary = sqlx::query_as::<_, PromoPoolSummary>(
            r#"
            SELECT kind,
                   COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE NOT is_assigned) AS free
            FROM promo_codes
            GROUP BY kind
            ORDER BY kind
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(summary)
    }
}

impl PromoStore for PromoRepository {
    async fn has_code_of_kind(&self, user_id: i64, kind: PromoKind) -> crate::utils::errors::Result<bool> {
        self.has_kind(user_id, kind).await
    }

    async fn claim_free_code(&self, kind: PromoKind, user_id: i64) -> crate::utils::errors::Result<Option<String>> {
        self.claim_free(kind, user_id).await
    }
}
