//! Duplicate-action throttle
//!
//! Suppresses rapid repeats of the same action by the same user. The last
//! accepted time is tracked per `(user, action key)`; a repeat inside the
//! cooldown window is dropped without an error.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::config::ThrottleConfig;

/// Prune stale entries once the map grows past this many keys.
const PRUNE_THRESHOLD: usize = 10_000;

/// Per-(user, key) cooldown tracker
#[derive(Debug, Clone)]
pub struct Throttle {
    cooldown: Duration,
    last_accepted: Arc<Mutex<HashMap<(i64, String), Instant>>>,
}

impl Throttle {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_accepted: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn from_config(config: &ThrottleConfig) -> Self {
        Self::new(Duration::from_millis(config.cooldown_ms))
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<(i64, String), Instant>> {
        self.last_accepted.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// True when the action is accepted, false when it repeats too soon.
    pub fn check(&self, user_id: i64, key: &str) -> bool {
        self.check_at(user_id, key, Instant::now())
    }

    /// [`check`](Self::check) with an explicit clock reading.
    pub fn check_at(&self, user_id: i64, key: &str, now: Instant) -> bool {
        let mut entries = self.entries();
        let composite = (user_id, key.to_string());

        if let Some(&last) = entries.get(&composite) {
            if now.saturating_duration_since(last) < self.cooldown {
                debug!(user_id = user_id, key = key, "Throttled repeated action");
                return false;
            }
        }

        entries.insert(composite, now);
        if entries.len() > PRUNE_THRESHOLD {
            let cooldown = self.cooldown;
            entries.retain(|_, last| now.saturating_duration_since(*last) < cooldown);
            debug!(remaining_entries = entries.len(), "Pruned throttle entries");
        }
        true
    }

    /// Forget every entry of a user.
    pub fn clear_user(&self, user_id: i64) -> usize {
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|(uid, _), _| *uid != user_id);
        before - entries.len()
    }
}

impl Default for Throttle {
    fn default() -> Self {
        Self::from_config(&ThrottleConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeat_inside_window_is_suppressed() {
        let throttle = Throttle::new(Duration::from_millis(600));
        let start = Instant::now();

        assert!(throttle.check_at(1, "catalog", start));
        assert!(!throttle.check_at(1, "catalog", start + Duration::from_millis(200)));
        assert!(throttle.check_at(1, "catalog", start + Duration::from_millis(700)));
    }

    #[test]
    fn test_keys_and_users_are_independent() {
        let throttle = Throttle::default();
        let now = Instant::now();

        assert!(throttle.check_at(1, "catalog", now));
        assert!(throttle.check_at(1, "promo", now));
        assert!(throttle.check_at(2, "catalog", now));
    }

    #[test]
    fn test_suppressed_attempt_does_not_extend_window() {
        let throttle = Throttle::new(Duration::from_millis(600));
        let start = Instant::now();

        assert!(throttle.check_at(3, "book", start));
        assert!(!throttle.check_at(3, "book", start + Duration::from_millis(500)));
        assert!(throttle.check_at(3, "book", start + Duration::from_millis(650)));
    }

    #[test]
    fn test_clear_user() {
        let throttle = Throttle::default();
        let now = Instant::now();
        throttle.check_at(4, "a", now);
        throttle.check_at(4, "b", now);
        throttle.check_at(5, "a", now);

        assert_eq!(throttle.clear_user(4), 2);
        assert!(throttle.check_at(4, "a", now));
        assert!(!throttle.check_at(5, "a", now));
    }
}
