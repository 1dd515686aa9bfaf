//! Wizard sessions
//!
//! At most one live [`Session`] exists per user. Starting a new wizard
//! replaces whatever was there; sessions vanish on cancel, commit or restart
//! of the process.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use super::storage::{MemoryStore, StorageStats};
use crate::models::MediaItem;

/// Whether a commit inserts a new listing or overwrites an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardMode {
    Create,
    Edit { listing_id: i64 },
}

impl WizardMode {
    pub fn target_listing(&self) -> Option<i64> {
        match self {
            WizardMode::Create => None,
            WizardMode::Edit { listing_id } => Some(*listing_id),
        }
    }
}

/// A collected wizard value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Media(Vec<MediaItem>),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_media(&self) -> Option<&[MediaItem]> {
        match self {
            FieldValue::Media(items) => Some(items),
            _ => None,
        }
    }
}

/// Where a session is in the step table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardPhase {
    /// Waiting for input for the step at `index`.
    Collecting { index: usize },
    /// A choice step's custom option was picked; the next text goes to `field_key`.
    AwaitingCustomValue {
        index: usize,
        field_key: &'static str,
    },
    /// Every step answered; waiting for commit, restart or cancel.
    Preview,
}

impl WizardPhase {
    pub fn name(&self) -> &'static str {
        match self {
            WizardPhase::Collecting { .. } => "collecting",
            WizardPhase::AwaitingCustomValue { .. } => "awaiting_custom_value",
            WizardPhase::Preview => "preview",
        }
    }

    /// Step index, with the preview counted as one past the last step.
    pub fn step_index(&self, total_steps: usize) -> usize {
        match self {
            WizardPhase::Collecting { index } | WizardPhase::AwaitingCustomValue { index, .. } => {
                *index
            }
            WizardPhase::Preview => total_steps,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: i64,
    pub mode: WizardMode,
    pub phase: WizardPhase,
    pub fields: HashMap<String, FieldValue>,
    pub started_at: DateTime<Utc>,
}

impl Session {
    pub fn new(user_id: i64, mode: WizardMode, seed: HashMap<String, FieldValue>) -> Self {
        Self {
            user_id,
            mode,
            phase: WizardPhase::Collecting { index: 0 },
            fields: seed,
            started_at: Utc::now(),
        }
    }

    pub fn field(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.field(key).and_then(FieldValue::as_text)
    }

    pub fn media(&self, key: &str) -> &[MediaItem] {
        self.field(key).and_then(FieldValue::as_media).unwrap_or_default()
    }
}

/// Per-user wizard session store
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: MemoryStore<Session>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: MemoryStore::new("wizard_sessions"),
        }
    }

    /// Begin a fresh session, unconditionally discarding any existing one.
    pub fn start(
        &self,
        user_id: i64,
        mode: WizardMode,
        seed: HashMap<String, FieldValue>,
    ) -> Session {
        let session = Session::new(user_id, mode, seed);
        if let Some(previous) = self.sessions.insert(user_id, session.clone()) {
            debug!(
                user_id = user_id,
                previous_phase = previous.phase.name(),
                "Discarded in-flight wizard session"
            );
        }
        session
    }

    pub fn get(&self, user_id: i64) -> Option<Session> {
        self.sessions.get(user_id)
    }

    /// Merge `partial` into the session's fields. False when there is no session.
    pub fn update(&self, user_id: i64, partial: HashMap<String, FieldValue>) -> bool {
        self.sessions
            .modify(user_id, |session| session.fields.extend(partial))
            .is_some()
    }

    /// Run `f` against the live session under the store lock.
    pub fn modify<R>(&self, user_id: i64, f: impl FnOnce(&mut Session) -> R) -> Option<R> {
        self.sessions.modify(user_id, f)
    }

    pub fn clear(&self, user_id: i64) -> Option<Session> {
        self.sessions.remove(user_id)
    }

    pub fn is_active(&self, user_id: i64) -> bool {
        self.sessions.contains(user_id)
    }

    pub fn stats(&self) -> StorageStats {
        self.sessions.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed(pairs: &[(&str, &str)]) -> HashMap<String, FieldValue> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), FieldValue::Text(v.to_string())))
            .collect()
    }

    #[test]
    fn test_start_overwrites_without_merge() {
        let store = SessionStore::new();
        store.start(1, WizardMode::Edit { listing_id: 4 }, seed(&[("a", "1"), ("b", "2")]));
        let fresh = store.start(1, WizardMode::Create, seed(&[("c", "3")]));

        let current = store.get(1).expect("session");
        assert_eq!(current.mode, WizardMode::Create);
        assert_eq!(current.fields.len(), 1);
        assert_eq!(current.text("c"), Some("3"));
        assert_eq!(fresh.phase, WizardPhase::Collecting { index: 0 });
    }

    #[test]
    fn test_update_and_clear() {
        let store = SessionStore::new();
        assert!(!store.update(2, seed(&[("a", "1")])));

        store.start(2, WizardMode::Create, HashMap::new());
        assert!(store.update(2, seed(&[("a", "1")])));
        assert!(store.update(2, seed(&[("a", "2"), ("b", "x")])));
        let session = store.get(2).expect("session");
        assert_eq!(session.text("a"), Some("2"));
        assert_eq!(session.text("b"), Some("x"));

        assert!(store.clear(2).is_some());
        assert!(!store.is_active(2));
    }

    #[test]
    fn test_phase_step_index() {
        assert_eq!(WizardPhase::Collecting { index: 3 }.step_index(8), 3);
        assert_eq!(
            WizardPhase::AwaitingCustomValue { index: 2, field_key: "x" }.step_index(8),
            2
        );
        assert_eq!(WizardPhase::Preview.step_index(8), 8);
        assert_eq!(WizardMode::Edit { listing_id: 9 }.target_listing(), Some(9));
    }
}
