//! Database service layer
//!
//! Groups the repositories behind one cloneable handle and hosts the few
//! operations that span several tables.

use tracing::info;

use crate::database::{
    DatabasePool, EngagementRepository, ListingRepository, PromoRepository, RequestRepository,
    UserRepository,
};
use crate::models::{StatsReport, StatsWindow};
use crate::utils::errors::StayBuddyError;

/// Windows shown on the admin stats screen, in days.
pub const STATS_WINDOWS: [i32; 2] = [7, 30];
pub const TOP_LISTINGS_LIMIT: i64 = 5;

#[derive(Debug, Clone)]
pub struct DatabaseService {
    pool: DatabasePool,
    pub users: UserRepository,
    pub listings: ListingRepository,
    pub promos: PromoRepository,
    pub requests: RequestRepository,
    pub engagement: EngagementRepository,
}

impl DatabaseService {
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            listings: ListingRepository::new(pool.clone()),
            promos: PromoRepository::new(pool.clone()),
            requests: RequestRepository::new(pool.clone()),
            engagement: EngagementRepository::new(pool.clone()),
            pool,
        }
    }

    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<(), StayBuddyError> {
        super::health_check(&self.pool).await
    }

    /// Erase everything stored about a user. Their promo codes go back to the pool.
    pub async fn delete_user_data(&self, telegram_id: i64) -> Result<(), StayBuddyError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM referrals WHERE inviter_id = $1 OR invitee_id = $1")
            .bind(telegram_id)
            .execute(&mut *tx)
            .await?;

        for table in [
            "giveaway_entries",
            "date_requests",
            "entry_date_requests",
            "click_events",
            "events",
        ] {
            sqlx::query(&format!("DELETE FROM {} WHERE user_id = $1", table))
                .bind(telegram_id)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query(
            r#"
            UPDATE promo_codes
            SET is_assigned = FALSE, assigned_to = NULL, assigned_at = NULL
            WHERE assigned_to = $1
            "#,
        )
        .bind(telegram_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE users SET inviter_id = NULL WHERE inviter_id = $1")
            .bind(telegram_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM users WHERE telegram_id = $1")
            .bind(telegram_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        info!(user_id = telegram_id, "User data deleted");
        Ok(())
    }

    /// Counters for the admin stats screen
    pub async fn stats_report(&self) -> Result<StatsReport, StayBuddyError> {
        let mut windows = Vec::with_capacity(STATS_WINDOWS.len());
        for days in STATS_WINDOWS {
            windows.push(StatsWindow {
                days,
                new_users: self.users.count_new_since(days).await?,
                active_users: self.users.count_active_since(days).await?,
                clicks: self.engagement.count_clicks_since(days).await?,
                requests: self.requests.count_since(days).await?,
            });
        }

        let top_listings = self.engagement.top_listings(TOP_LISTINGS_LIMIT).await?;
        Ok(StatsReport { windows, top_listings })
    }
}
