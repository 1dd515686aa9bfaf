//! Admin authorization
//!
//! Every admin screen and admin-only callback goes through [`AdminGuard`].

use std::collections::HashSet;

use teloxide::types::User;
use tracing::{debug, warn};

use crate::config::settings::Settings;
use crate::utils::errors::{Result, StayBuddyError};

/// Admin allow-list check
#[derive(Debug, Clone)]
pub struct AdminGuard {
    admin_ids: HashSet<i64>,
}

impl AdminGuard {
    pub fn new(settings: &Settings) -> Self {
        Self::from_ids(settings.bot.admin_ids.iter().copied())
    }

    pub fn from_ids(ids: impl IntoIterator<Item = i64>) -> Self {
        Self {
            admin_ids: ids.into_iter().collect(),
        }
    }

    /// Check if user is an admin
    pub fn is_admin(&self, user_id: i64) -> bool {
        self.admin_ids.contains(&user_id)
    }

    /// Ensure the sender may use admin features
    pub fn check_admin_auth(&self, user: &User) -> Result<()> {
        let user_id = user.id.0 as i64;

        if self.is_admin(user_id) {
            debug!(user_id = user_id, "Admin authentication successful");
            Ok(())
        } else {
            warn!(
                user_id = user_id,
                username = user.username.as_deref().unwrap_or("none"),
                "Unauthorized admin access attempt"
            );
            Err(StayBuddyError::PermissionDenied(
                "Admin privileges required".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use teloxide::types::UserId;

    fn create_test_user(id: u64) -> User {
        User {
            id: UserId(id),
            is_bot: false,
            first_name: "Test".to_string(),
            last_name: None,
            username: Some("testuser".to_string()),
            language_code: Some("en".to_string()),
            is_premium: false,
            added_to_attachment_menu: false,
        }
    }

    #[test]
    fn test_admin_check() {
        let guard = AdminGuard::from_ids([100, 200]);

        assert!(guard.is_admin(100));
        assert!(!guard.is_admin(300));
        assert!(guard.check_admin_auth(&create_test_user(200)).is_ok());
        assert_matches!(
            guard.check_admin_auth(&create_test_user(300)),
            Err(StayBuddyError::PermissionDenied(_))
        );
    }

    #[test]
    fn test_from_settings() {
        let mut settings = Settings::default();
        settings.bot.admin_ids = vec![42];
        assert!(AdminGuard::new(&settings).is_admin(42));
    }
}
