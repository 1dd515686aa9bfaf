//! Middleware module
//!
//! This module contains middleware for request processing

pub mod auth;
pub mod logging;
pub mod throttle;

// Re-export commonly used middleware
pub use auth::AdminGuard;
pub use throttle::Throttle;
