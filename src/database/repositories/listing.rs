//! Listing repository implementation

use sqlx::types::Json;
use sqlx::PgPool;
use tracing::debug;

use crate::database::stores::ListingStore;
use crate::models::listing::{Listing, ListingDraft, ListingFieldValue};
use crate::utils::errors::{Result, StayBuddyError};

const LISTING_COLUMNS: &str = "id, title, address_short, guests_max, amenities, tags, price_from, \
     channel_post_url, map_url, is_active, sort_order, details_json, media_urls, created_at, updated_at";

/// Catalog search predicate: optional minimum capacity and lowercase tag set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingSearch {
    pub min_guests: Option<i32>,
    pub tags: Vec<String>,
}

#[derive(Clone)]
#[derive(Debug)]
pub struct ListingRepository {
    pool: PgPool,
}

impl ListingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new active listing
    pub async fn create(&self, draft: &ListingDraft) -> Result<i64> {
        let id: (i64,) = sqlx::query_as(
            r#"
            INSERT INTO listings (title, address_short, guests_max, amenities, tags, map_url,
                                  details_json, media_urls, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, TRUE, NOW(), NOW())
            RETURNING id
            "#,
        )
        .bind(&draft.title)
        .bind(&draft.address_short)
        .bind(draft.guests_max)
        .bind(&draft.amenities)
        .bind(&draft.tags)
        .bind(&draft.map_url)
        .bind(Json(draft.details.clone()))
        .bind(&draft.media_urls)
        .fetch_one(&self.pool)
        .await?;

        debug!(listing_id = id.0, "Listing created");
        Ok(id.0)
    }

    /// Replace the wizard-managed content of a listing
    pub async fn update_content(&self, listing_id: i64, draft: &ListingDraft) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE listings
            SET title = $2,
                address_short = $3,
                guests_max = $4,
                amenities = $5,
                tags = $6,
                map_url = $7,
                details_json = $8,
                media_urls = $9,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(listing_id)
        .bind(&draft.title)
        .bind(&draft.address_short)
        .bind(draft.guests_max)
        .bind(&draft.amenities)
        .bind(&draft.tags)
        .bind(&draft.map_url)
        .bind(Json(draft.details.clone()))
        .bind(&draft.media_urls)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StayBuddyError::ListingNotFound { listing_id });
        }
        Ok(())
    }

    /// Find listing by ID
    pub async fn find_by_id(&self, listing_id: i64) -> Result<Option<Listing>> {
        let sql = format!("SELECT {} FROM listings WHERE id = $1", LISTING_COLUMNS);
        let listing = sqlx::query_as::<_, Listing>(&sql)
            .bind(listing_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(listing)
    }

    /// Every listing, active or not, in catalog order
    pub async fn list_all(&self, limit: i64) -> Result<Vec<Listing>> {
        let sql = format!(
            "SELECT {} FROM listings ORDER BY sort_order ASC, id ASC LIMIT $1",
            LISTING_COLUMNS
        );
        let listings = sqlx::query_as::<_, Listing>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(listings)
    }

    /// One page of active listings matching `search`
    pub async fn search(&self, search: &ListingSearch, limit: i64, offset: i64) -> Result<Vec<Listing>> {
        let sql = format!(
            r#"
            SELECT {} FROM listings
            WHERE is_active = TRUE
              AND ($1::INT IS NULL OR guests_max >= $1)
              AND (cardinality($2::TEXT[]) = 0
                   OR EXISTS (SELECT 1 FROM unnest(tags) AS t(tag) WHERE lower(t.tag) = ANY($2::TEXT[])))
            ORDER BY sort_order ASC, id ASC
            LIMIT $3 OFFSET $4
            "#,
            LISTING_COLUMNS
        );
        let listings = sqlx::query_as::<_, Listing>(&sql)
            .bind(search.min_guests)
            .bind(&search.tags)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(listings)
    }

    /// Count active listings matching `search`
    pub async fn count_matching(&self, search: &ListingSearch) -> Result<i64> {
        let count: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM listings
            WHERE is_active = TRUE
              AND ($1::INT IS NULL OR guests_max >= $1)
              AND (cardinality($2::TEXT[]) = 0
                   OR EXISTS (SELECT 1 FROM unnest(tags) AS t(tag) WHERE lower(t.tag) = ANY($2::TEXT[])))
            "#,
        )
        .bind(search.min_guests)
        .bind(&search.tags)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0)
    }

    /// Flip the active flag and return the new value
    pub async fn toggle_active(&self, listing_id: i64) -> Result<bool> {
        let row: Option<(bool,)> = sqlx::query_as(
            "UPDATE listings SET is_active = NOT is_active, updated_at = NOW() WHERE id = $1 RETURNING is_active",
        )
        .bind(listing_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|(active,)| active)
            .ok_or(StayBuddyError::ListingNotFound { listing_id })
    }

    /// Update a single operator-editable column
    pub async fn update_field(&self, listing_id: i64, value: &ListingFieldValue) -> Result<()> {
        let query = match value {
            ListingFieldValue::SortOrder(order) => {
                sqlx::query("UPDATE listings SET sort_order = $2, updated_at = NOW() WHERE id = $1")
                    .bind(listing_id)
                    .bind(*order)
            }
            ListingFieldValue::Tags(tags) => {
                sqlx::query("UPDATE listings SET tags = $2, updated_at = NOW() WHERE id = $1")
                    .bind(listing_id)
                    .bind(tags.clone())
            }
            ListingFieldValue::ChannelPostUrl(url) => sqlx::query(
                "UPDATE listings SET channel_post_url = $2, updated_at = NOW() WHERE id = $1",
            )
            .bind(listing_id)
            .bind(url.clone()),
            ListingFieldValue::MapUrl(url) => {
                sqlx::query("UPDATE listings SET map_url = $2, updated_at = NOW() WHERE id = $1")
                    .bind(listing_id)
                    .bind(url.clone())
            }
        };

        let result = query.execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(StayBuddyError::ListingNotFound { listing_id });
        }
        Ok(())
    }
}

impl ListingStore for ListingRepository {
    async fn insert_listing(&self, draft: &ListingDraft) -> Result<i64> {
        self.create(draft).await
    }

    async fn update_listing(&self, listing_id: i64, draft: &ListingDraft) -> Result<()> {
        self.update_content(listing_id, draft).await
    }

    async fn find_listing(&self, listing_id: i64) -> Result<Option<Listing>> {
        self.find_by_id(listing_id).await
    }
}
