//! Date and entry-date request repository implementation

use sqlx::PgPool;

use crate::models::request::{GuestRequest, RequestKind, STATUS_HANDLED};
use crate::utils::errors::StayBuddyError;

const DATE_REQUEST_SELECT: &str = r#"
    SELECT r.id, r.user_id, r.listing_id, l.title AS listing_title, r.raw_text, r.status,
           r.admin_id, u.full_name, u.username, r.created_at, r.handled_at
    FROM date_requests r
    LEFT JOIN listings l ON l.id = r.listing_id
    LEFT JOIN users u ON u.telegram_id = r.user_id
"#;

const ENTRY_REQUEST_SELECT: &str = r#"
    SELECT r.id, r.user_id, NULL::BIGINT AS listing_id, NULL::TEXT AS listing_title, r.raw_text,
           r.status, r.admin_id, u.full_name, u.username, r.created_at, r.handled_at
    FROM entry_date_requests r
    LEFT JOIN users u ON u.telegram_id = r.user_id
"#;

#[derive(Clone)]
#[derive(Debug)]
pub struct RequestRepository {
    pool: PgPool,
}

impl RequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn table(kind: RequestKind) -> &'static str {
        match kind {
            RequestKind::Dates => "date_requests",
            RequestKind::EntryDate => "entry_date_requests",
        }
    }

    fn select(kind: RequestKind) -> &'static str {
        match kind {
            RequestKind::Dates => DATE_REQUEST_SELECT,
            RequestKind::EntryDate => ENTRY_REQUEST_SELECT,
        }
    }

    /// Save stay dates for a listing
    pub async fn create_date_request(&self, user_id: i64, listing_id: i64, raw_text: &str) -> Result<i64, StayBuddyError> {
        let id: (i64,) = sqlx::query_as(
            "INSERT INTO date_requests (user_id, listing_id, raw_text, created_at) VALUES ($1, $2, $3, NOW()) RETURNING id",
        )
        .bind(user_id)
        .bind(listing_id)
        .bind(raw_text)
        .fetch_one(&self.pool)
        .await?;

        Ok(id.0)
    }

    /// Save an arrival date question
    pub async fn create_entry_request(&self, user_id: i64, raw_text: &str) -> Result<i64, StayBuddyError> {
        let id: (i64,) = sqlx::query_as(
            "INSERT INTO entry_date_requests (user_id, raw_text, created_at) VALUES ($1, $2, NOW()) RETURNING id",
        )
        .bind(user_id)
        .bind(raw_text)
        .fetch_one(&self.pool)
        .await?;

        Ok(id.0)
    }

    pub async fn find(&self, kind: RequestKind, request_id: i64) -> Result<Option<GuestRequest>, StayBuddyError> {
        let sql = format!("{} WHERE r.id = $1", Self::select(kind));
        let request = sqlx::query_as::<_, GuestRequest>(&sql)
            .bind(request_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(request)
    }

    /// Most recent requests of a kind
    pub async fn list_recent(&self, kind: RequestKind, limit: i64) -> Result<Vec<GuestRequest>, StayBuddyError> {
        let sql = format!("{} ORDER BY r.created_at DESC, r.id DESC LIMIT $1", Self::select(kind));
        let requests = sqlx::query_as::<_, GuestRequest>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(requests)
    }

    /// Mark a request handled by `admin_id`
    pub async fn mark_handled(&self, kind: RequestKind, request_id: i64, admin_id: i64) -> Result<(), StayBuddyError> {
        let sql = format!(
            "UPDATE {} SET status = $1, admin_id = $2, handled_at = NOW() WHERE id = $3",
            Self::table(kind)
        );
        let result = sqlx::query(&sql)
            .bind(STATUS_HANDLED)
            .bind(admin_id)
            .bind(request_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StayBuddyError::RequestNotFound { request_id });
        }
        Ok(())
    }

    /// Count date requests created within the last `days` days
    pub async fn count_since(&self, days: i32) -> Result<i64, StayBuddyError> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM date_requests WHERE created_at >= NOW() - make_interval(days => $1)",
        )
        .bind(days)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0)
    }
}
