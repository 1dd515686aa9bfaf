//! Logging configuration and setup
//!
//! This module provides logging initialization and structured logging utilities
//! for the StayBuddy application.

use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;
use crate::utils::errors::{Result, StayBuddyError};

/// Initialize logging based on configuration.
///
/// The returned guard flushes the file writer on drop and must be kept alive
/// for as long as the process logs.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_new(&config.level).map_err(|e| {
        StayBuddyError::Config(format!("Invalid log filter '{}': {}", config.level, e))
    })?;

    let (json_layer, text_layer) = if config.json {
        (Some(fmt::layer().json().with_writer(std::io::stdout)), None)
    } else {
        (None, Some(fmt::layer().with_writer(std::io::stdout)))
    };

    let (file_layer, guard) = match config.file_path.as_deref() {
        Some(dir) if !dir.is_empty() => {
            let file_appender = tracing_appender::rolling::daily(dir, "staybuddy.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(non_blocking)),
                Some(guard),
            )
        }
        _ => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| StayBuddyError::Config(format!("Failed to install logger: {}", e)))?;

    info!("Logging initialized with level: {}", config.level);
    Ok(guard)
}

/// Log user actions with structured data
pub fn log_user_action(user_id: i64, action: &str, details: Option<&str>) {
    info!(
        user_id = user_id,
        action = action,
        details = details,
        "User action performed"
    );
}

/// Log admin actions
pub fn log_admin_action(admin_id: i64, action: &str, target: Option<&str>, details: Option<&str>) {
    warn!(
        admin_id = admin_id,
        action = action,
        target = target,
        details = details,
        "Admin action performed"
    );
}

/// Log a failed outbound delivery
pub fn log_delivery_failure(recipient: i64, context: &str, error: &str) {
    warn!(
        recipient = recipient,
        context = context,
        error = error,
        "Message delivery failed"
    );
}

/// Log wizard transitions
pub fn log_wizard_transition(user_id: i64, from: &str, to: &str) {
    debug!(
        user_id = user_id,
        from = from,
        to = to,
        "Wizard transition"
    );
}
