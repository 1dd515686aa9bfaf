//! Database schema
//!
//! Ordered idempotent DDL, applied on every startup. `user_id` columns hold
//! Telegram user ids (`users.telegram_id`).

use tracing::{debug, info};

use super::connection::DatabasePool;
use crate::utils::errors::Result;

pub const SCHEMA_STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id BIGSERIAL PRIMARY KEY,
        telegram_id BIGINT UNIQUE NOT NULL,
        username TEXT,
        full_name TEXT,
        phone TEXT,
        ref_code TEXT UNIQUE,
        inviter_id BIGINT,
        is_blocked BOOLEAN NOT NULL DEFAULT FALSE,
        reminders_opt_out BOOLEAN NOT NULL DEFAULT FALSE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        last_seen_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        last_reminder_at TIMESTAMPTZ
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS listings (
        id BIGSERIAL PRIMARY KEY,
        title TEXT NOT NULL,
        address_short TEXT NOT NULL,
        guests_max INTEGER NOT NULL DEFAULT 2,
        amenities TEXT NOT NULL DEFAULT '',
        tags TEXT[] NOT NULL DEFAULT '{}',
        price_from INTEGER NOT NULL DEFAULT 0,
        channel_post_url TEXT NOT NULL DEFAULT '',
        map_url TEXT NOT NULL DEFAULT '',
        is_active BOOLEAN NOT NULL DEFAULT TRUE,
        sort_order INTEGER NOT NULL DEFAULT 0,
        details_json JSONB NOT NULL DEFAULT '{}'::jsonb,
        media_urls TEXT[] NOT NULL DEFAULT '{}',
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS promo_codes (
        id BIGSERIAL PRIMARY KEY,
        code TEXT UNIQUE NOT NULL,
        kind TEXT NOT NULL,
        is_assigned BOOLEAN NOT NULL DEFAULT FALSE,
        assigned_to BIGINT,
        assigned_at TIMESTAMPTZ,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS click_events (
        id BIGSERIAL PRIMARY KEY,
        user_id BIGINT NOT NULL,
        listing_id BIGINT,
        source TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS date_requests (
        id BIGSERIAL PRIMARY KEY,
        user_id BIGINT NOT NULL,
        listing_id BIGINT NOT NULL,
        raw_text TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'new',
        admin_id BIGINT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        handled_at TIMESTAMPTZ
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS entry_date_requests (
        id BIGSERIAL PRIMARY KEY,
        user_id BIGINT NOT NULL,
        raw_text TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'new',
        admin_id BIGINT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        handled_at TIMESTAMPTZ
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS giveaway_entries (
        id BIGSERIAL PRIMARY KEY,
        user_id BIGINT UNIQUE NOT NULL,
        is_winner BOOLEAN NOT NULL DEFAULT FALSE,
        winner_code TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS referrals (
        id BIGSERIAL PRIMARY KEY,
        inviter_id BIGINT NOT NULL,
        invitee_id BIGINT UNIQUE NOT NULL,
        qualified BOOLEAN NOT NULL DEFAULT FALSE,
        qualified_at TIMESTAMPTZ,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS events (
        id BIGSERIAL PRIMARY KEY,
        user_id BIGINT,
        event_type TEXT NOT NULL,
        payload JSONB NOT NULL DEFAULT '{}'::jsonb,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_users_last_seen ON users(last_seen_at)",
    "CREATE INDEX IF NOT EXISTS idx_listings_active_order ON listings(is_active, sort_order, id)",
    "CREATE INDEX IF NOT EXISTS idx_promo_codes_free ON promo_codes(kind, is_assigned, id)",
    "CREATE INDEX IF NOT EXISTS idx_click_events_created ON click_events(created_at)",
    "CREATE INDEX IF NOT EXISTS idx_events_type_created ON events(event_type, created_at)",
];

/// Apply the schema. Safe to run repeatedly.
pub async fn ensure_schema(pool: &DatabasePool) -> Result<()> {
    info!("Ensuring database schema...");

    for statement in SCHEMA_STATEMENTS {
        sqlx::query(statement).execute(pool).await?;
    }

    debug!(statements = SCHEMA_STATEMENTS.len(), "Schema statements applied");
    info!("Database schema is up to date");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statements_are_idempotent() {
        for statement in SCHEMA_STATEMENTS {
            assert!(
                statement.contains("IF NOT EXISTS"),
                "statement is not idempotent: {}",
                statement
            );
        }
    }
}
