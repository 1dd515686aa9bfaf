//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use url::Url;

use super::Settings;
use crate::utils::errors::{Result, StayBuddyError};

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_bot_config(&settings.bot)?;
    validate_database_config(&settings.database)?;
    validate_storefront_config(&settings.storefront)?;
    validate_reminders_config(&settings.reminders)?;
    validate_notifications_config(&settings.notifications)?;
    validate_logging_config(&settings.logging)?;

    Ok(())
}

/// Validate bot configuration
fn validate_bot_config(config: &super::BotConfig) -> Result<()> {
    if config.token.is_empty() {
        return Err(StayBuddyError::Config("Bot token is required".to_string()));
    }

    if config.admin_ids.is_empty() {
        return Err(StayBuddyError::Config(
            "At least one admin ID must be configured".to_string(),
        ));
    }

    Ok(())
}

/// Validate database configuration
fn validate_database_config(config: &super::DatabaseConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(StayBuddyError::Config("Database URL is required".to_string()));
    }

    if config.max_connections == 0 {
        return Err(StayBuddyError::Config(
            "Max connections must be greater than 0".to_string(),
        ));
    }

    if config.min_connections > config.max_connections {
        return Err(StayBuddyError::Config(
            "Min connections cannot be greater than max connections".to_string(),
        ));
    }

    Ok(())
}

/// Validate storefront links and paging
fn validate_storefront_config(config: &super::StorefrontConfig) -> Result<()> {
    validate_http_url("Booking URL", &config.booking_url)?;

    if let Some(catalog_url) = config.catalog_url.as_deref().filter(|u| !u.is_empty()) {
        validate_http_url("Catalog URL", catalog_url)?;
    }

    if config.page_size == 0 {
        return Err(StayBuddyError::Config(
            "Catalog page size must be greater than 0".to_string(),
        ));
    }

    Ok(())
}

fn validate_http_url(name: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(StayBuddyError::Config(format!("{} is required", name)));
    }

    let parsed = Url::parse(value)?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(StayBuddyError::Config(format!(
            "{} must use http or https, got '{}'",
            name,
            parsed.scheme()
        )));
    }

    Ok(())
}

/// Validate reminder sweep settings
fn validate_reminders_config(config: &super::RemindersConfig) -> Result<()> {
    if !config.enabled {
        return Ok(());
    }

    if config.interval_seconds == 0 {
        return Err(StayBuddyError::Config(
            "Reminder interval must be greater than 0".to_string(),
        ));
    }

    if config.batch_size <= 0 {
        return Err(StayBuddyError::Config(
            "Reminder batch size must be greater than 0".to_string(),
        ));
    }

    Ok(())
}

fn validate_notifications_config(config: &super::NotificationsConfig) -> Result<()> {
    if config.messages_per_second == 0 {
        return Err(StayBuddyError::Config(
            "Notification rate must be greater than 0".to_string(),
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(StayBuddyError::Config("Log level is required".to_string()));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(StayBuddyError::Config(format!(
            "Invalid log level: {}. Valid levels: {:?}",
            config.level, valid_levels
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn valid_settings() -> Settings {
        let mut settings = Settings::default();
        settings.bot.token = "12345:test_token".to_string();
        settings.bot.admin_ids = vec![1];
        settings
    }

    #[test]
    fn test_valid_settings_pass() {
        assert!(validate_settings(&valid_settings()).is_ok());
    }

    #[test]
    fn test_missing_token_is_fatal() {
        let mut settings = valid_settings();
        settings.bot.token.clear();
        assert_matches!(validate_settings(&settings), Err(StayBuddyError::Config(_)));
    }

    #[test]
    fn test_booking_url_must_be_http() {
        let mut settings = valid_settings();
        settings.storefront.booking_url = "ftp://example.com".to_string();
        assert_matches!(validate_settings(&settings), Err(StayBuddyError::Config(_)));

        settings.storefront.booking_url = "not a url".to_string();
        assert_matches!(validate_settings(&settings), Err(StayBuddyError::UrlParse(_)));
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let mut settings = valid_settings();
        settings.storefront.page_size = 0;
        assert_matches!(validate_settings(&settings), Err(StayBuddyError::Config(_)));
    }

    #[test]
    fn test_disabled_reminders_skip_checks() {
        let mut settings = valid_settings();
        settings.reminders.enabled = false;
        settings.reminders.interval_seconds = 0;
        assert!(validate_settings(&settings).is_ok());
    }
}
