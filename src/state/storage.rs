//! In-process keyed state storage
//!
//! Every piece of per-user conversational state (wizard sessions, dialogs,
//! catalog filters, tracked message ids) lives in a [`MemoryStore`]: a
//! mutex-guarded map keyed by Telegram user id. Nothing here survives a
//! restart. No lock is ever held across an `.await`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tracing::debug;

/// Mutex-guarded per-user map
#[derive(Debug)]
pub struct MemoryStore<V> {
    name: &'static str,
    entries: Arc<Mutex<HashMap<i64, V>>>,
}

impl<V> Clone for MemoryStore<V> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<V: Clone> MemoryStore<V> {
    /// Create an empty store; `name` only shows up in logs.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    // A poisoned map is still structurally valid, so keep serving it.
    fn lock(&self) -> MutexGuard<'_, HashMap<i64, V>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, user_id: i64) -> Option<V> {
        self.lock().get(&user_id).cloned()
    }

    /// Store `value`, returning whatever it replaced.
    pub fn insert(&self, user_id: i64, value: V) -> Option<V> {
        let previous = self.lock().insert(user_id, value);
        if previous.is_some() {
            debug!(store = self.name, user_id = user_id, "Replaced existing entry");
        }
        previous
    }

    pub fn remove(&self, user_id: i64) -> Option<V> {
        self.lock().remove(&user_id)
    }

    pub fn contains(&self, user_id: i64) -> bool {
        self.lock().contains_key(&user_id)
    }

    /// Mutate an existing entry in place under the lock.
    pub fn modify<R>(&self, user_id: i64, f: impl FnOnce(&mut V) -> R) -> Option<R> {
        self.lock().get_mut(&user_id).map(f)
    }

    /// Mutate the entry, creating it from `V::default()` first when missing.
    pub fn upsert_with<R>(&self, user_id: i64, f: impl FnOnce(&mut V) -> R) -> R
    where
        V: Default,
    {
        let mut entries = self.lock();
        f(entries.entry(user_id).or_default())
    }

    pub fn stats(&self) -> StorageStats {
        StorageStats {
            store: self.name,
            entries: self.lock().len(),
        }
    }
}

/// Snapshot of a store's size
#[derive(Debug, Clone, Serialize)]
pub struct StorageStats {
    pub store: &'static str,
    pub entries: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_get_remove() {
        let store: MemoryStore<String> = MemoryStore::new("test");
        assert!(store.insert(1, "a".to_string()).is_none());
        assert_eq!(store.insert(1, "b".to_string()).as_deref(), Some("a"));
        assert_eq!(store.get(1).as_deref(), Some("b"));
        assert!(store.contains(1));
        assert_eq!(store.remove(1).as_deref(), Some("b"));
        assert!(store.get(1).is_none());
    }

    #[test]
    fn test_modify_and_upsert() {
        let store: MemoryStore<Vec<i32>> = MemoryStore::new("test");
        assert!(store.modify(5, |v| v.push(1)).is_none());
        store.upsert_with(5, |v| v.push(1));
        store.upsert_with(5, |v| v.push(2));
        assert_eq!(store.modify(5, |v| v.len()), Some(2));
        assert_eq!(store.stats().entries, 1);
    }

    #[test]
    fn test_clones_share_entries() {
        let store: MemoryStore<i32> = MemoryStore::new("shared");
        let other = store.clone();
        other.insert(9, 42);
        assert_eq!(store.get(9), Some(42));
    }
}
