//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from a config file and environment variables.

use serde::{Deserialize, Serialize};

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub bot: BotConfig,
    pub database: DatabaseConfig,
    pub storefront: StorefrontConfig,
    #[serde(default)]
    pub contacts: ContactsConfig,
    #[serde(default)]
    pub reminders: RemindersConfig,
    #[serde(default)]
    pub throttle: ThrottleConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Telegram bot configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BotConfig {
    pub token: String,
    #[serde(default)]
    pub admin_ids: Vec<i64>,
    /// Chat that receives operator notifications instead of every admin.
    #[serde(default)]
    pub admin_chat_id: Option<i64>,
    /// Public channel for listing posts and giveaway announcements.
    #[serde(default)]
    pub channel_id: Option<i64>,
    /// Bot username used in referral links; resolved with `getMe` when absent.
    #[serde(default)]
    pub username: Option<String>,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_seconds: u64,
}

/// Storefront content and behaviour
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorefrontConfig {
    pub booking_url: String,
    #[serde(default)]
    pub catalog_url: Option<String>,
    #[serde(default = "default_welcome_text")]
    pub welcome_text: String,
    /// Local path or URL of the welcome picture.
    #[serde(default)]
    pub welcome_image: Option<String>,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Referrals qualify only after the invited user shares a phone number.
    #[serde(default)]
    pub strict_phone_mode: bool,
}

/// Manager contact links shown under listing posts
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ContactsConfig {
    pub phone: Option<String>,
    pub username: Option<String>,
    pub whatsapp: Option<String>,
}

/// Inactivity reminder sweep
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RemindersConfig {
    pub enabled: bool,
    pub interval_seconds: u64,
    pub inactive_days: i64,
    pub cooldown_days: i64,
    pub batch_size: i64,
}

/// Duplicate-action suppression window
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ThrottleConfig {
    pub cooldown_ms: u64,
}

/// Outbound fan-out pacing
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotificationsConfig {
    pub messages_per_second: u32,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    /// Directory for daily rolling log files; stdout only when unset.
    pub file_path: Option<String>,
    pub json: bool,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_acquire_timeout() -> u64 {
    30
}

fn default_page_size() -> u32 {
    5
}

fn default_welcome_text() -> String {
    "👋 Welcome to StayBuddy!\n\nBrowse our apartments, pick dates and book in a couple of taps.".to_string()
}

impl Default for RemindersConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_seconds: 3600,
            inactive_days: 7,
            cooldown_days: 14,
            batch_size: 100,
        }
    }
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self { cooldown_ms: 600 }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self { messages_per_second: 25 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_path: None,
            json: false,
        }
    }
}

impl Settings {
    /// Load settings from `config.*` in the working directory and environment variables
    pub fn new() -> Result<Self, config::ConfigError> {
        Self::load_from("config")
    }

    /// Load settings from the given config file (optional) layered under
    /// `STAYBUDDY_*` environment variables, e.g. `STAYBUDDY_BOT__TOKEN`.
    pub fn load_from(path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("STAYBUDDY")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("bot.admin_ids")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::StayBuddyError> {
        super::validation::validate_settings(self)
    }

    /// Where operator notifications go: the admin chat if set, every admin otherwise.
    pub fn admin_targets(&self) -> Vec<i64> {
        match self.bot.admin_chat_id {
            Some(chat_id) => vec![chat_id],
            None => self.bot.admin_ids.clone(),
        }
    }

    /// Direct link to the manager: the admin chat, or the lowest admin id.
    pub fn manager_link(&self) -> Option<String> {
        self.bot
            .admin_chat_id
            .or_else(|| self.bot.admin_ids.iter().copied().min())
            .map(|id| format!("tg://user?id={}", id))
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bot: BotConfig {
                token: String::new(),
                admin_ids: vec![],
                admin_chat_id: None,
                channel_id: None,
                username: None,
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/staybuddy".to_string(),
                max_connections: default_max_connections(),
                min_connections: default_min_connections(),
                acquire_timeout_seconds: default_acquire_timeout(),
            },
            storefront: StorefrontConfig {
                booking_url: "https://example.com/booking".to_string(),
                catalog_url: None,
                welcome_text: default_welcome_text(),
                welcome_image: None,
                page_size: default_page_size(),
                strict_phone_mode: false,
            },
            contacts: ContactsConfig::default(),
            reminders: RemindersConfig::default(),
            throttle: ThrottleConfig::default(),
            notifications: NotificationsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("temp file");
        writeln!(
            file,
            r#"
[bot]
token = "12345:abc"
admin_ids = [10, 20]

[database]
url = "postgresql://localhost/test"

[storefront]
booking_url = "https://book.example"
strict_phone_mode = true
"#
        )
        .expect("write config");

        let path = file.path().with_extension("");
        let settings = Settings::load_from(path.to_str().expect("utf8 path")).expect("settings");

        assert_eq!(settings.bot.admin_ids, vec![10, 20]);
        assert_eq!(settings.database.max_connections, 10);
        assert_eq!(settings.storefront.page_size, 5);
        assert!(settings.storefront.strict_phone_mode);
        assert_eq!(settings.throttle.cooldown_ms, 600);
        assert_eq!(settings.reminders.interval_seconds, 3600);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_admin_targets() {
        let mut settings = Settings::default();
        settings.bot.admin_ids = vec![7, 3];
        assert_eq!(settings.admin_targets(), vec![7, 3]);
        assert_eq!(settings.manager_link().as_deref(), Some("tg://user?id=3"));

        settings.bot.admin_chat_id = Some(-100);
        assert_eq!(settings.admin_targets(), vec![-100]);
        assert_eq!(settings.manager_link().as_deref(), Some("tg://user?id=-100"));
    }
}
