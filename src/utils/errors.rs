//! Error handling for StayBuddy
//!
//! This module defines the main error type used throughout the application
//! and provides a unified error handling strategy.

use thiserror::Error;

/// Main error type for StayBuddy application
#[derive(Error, Debug)]
pub enum StayBuddyError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Telegram API error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    #[error("Settings error: {0}")]
    Settings(#[from] config::ConfigError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("User not found: {user_id}")]
    UserNotFound { user_id: i64 },

    #[error("Listing not found: {listing_id}")]
    ListingNotFound { listing_id: i64 },

    #[error("Request not found: {request_id}")]
    RequestNotFound { request_id: i64 },

    #[error("No active wizard session for user {user_id}")]
    NoActiveSession { user_id: i64 },

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

/// Result type alias for StayBuddy operations
pub type Result<T> = std::result::Result<T, StayBuddyError>;

impl StayBuddyError {
    /// Check if the error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            StayBuddyError::Database(_) => false,
            StayBuddyError::Telegram(_) => true,
            StayBuddyError::Settings(_) => false,
            StayBuddyError::Config(_) => false,
            StayBuddyError::PermissionDenied(_) => false,
            StayBuddyError::UserNotFound { .. } => false,
            StayBuddyError::ListingNotFound { .. } => false,
            StayBuddyError::RequestNotFound { .. } => false,
            StayBuddyError::NoActiveSession { .. } => true,
            StayBuddyError::InvalidStateTransition { .. } => true,
            StayBuddyError::Serialization(_) => false,
            StayBuddyError::Io(_) => true,
            StayBuddyError::UrlParse(_) => false,
            StayBuddyError::InvalidInput(_) => true,
            StayBuddyError::ServiceUnavailable(_) => true,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            StayBuddyError::Database(_) => ErrorSeverity::Critical,
            StayBuddyError::Settings(_) | StayBuddyError::Config(_) => ErrorSeverity::Critical,
            StayBuddyError::PermissionDenied(_) => ErrorSeverity::Warning,
            StayBuddyError::NoActiveSession { .. }
            | StayBuddyError::InvalidStateTransition { .. } => ErrorSeverity::Warning,
            StayBuddyError::InvalidInput(_) => ErrorSeverity::Info,
            _ => ErrorSeverity::Error,
        }
    }

    /// Text shown to the person whose action failed.
    pub fn user_message(&self) -> &'static str {
        match self {
            StayBuddyError::PermissionDenied(_) => "⛔ This action is available to administrators only.",
            StayBuddyError::ListingNotFound { .. } => "This listing is no longer available.",
            StayBuddyError::RequestNotFound { .. } => "This request no longer exists.",
            StayBuddyError::NoActiveSession { .. }
            | StayBuddyError::InvalidStateTransition { .. } => "This action is not available right now.",
            StayBuddyError::Database(_) => "⚠️ Could not save or load data. Please try again.",
            _ => "⚠️ Something went wrong. Please try again.",
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wizard_errors_are_recoverable_warnings() {
        let err = StayBuddyError::InvalidStateTransition {
            from: "collecting".to_string(),
            to: "commit".to_string(),
        };
        assert!(err.is_recoverable());
        assert_eq!(err.severity(), ErrorSeverity::Warning);
        assert_eq!(err.user_message(), "This action is not available right now.");
    }

    #[test]
    fn test_config_errors_are_critical() {
        let err = StayBuddyError::Config("Bot token is required".to_string());
        assert!(!err.is_recoverable());
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert_eq!(err.severity().to_string(), "CRITICAL");
    }

    #[test]
    fn test_generic_user_message() {
        let err = StayBuddyError::ServiceUnavailable("telegram".to_string());
        assert_eq!(err.user_message(), "⚠️ Something went wrong. Please try again.");
    }
}
