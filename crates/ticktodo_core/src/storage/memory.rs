//! In-memory key-value slots.
//!
//! # Responsibility
//! - Stand in for browser `localStorage` in tests and embedded hosts.
//! - Enforce an optional byte quota the way the browser does.
//!
//! # Invariants
//! - Clones share one map.
//! - A write rejected by the quota leaves the prior value in place.

use super::{KeyValueStore, StorageError, StorageResult};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// In-process map standing in for browser `localStorage`.
///
/// Clones share the same underlying map, so a second handle observes
/// what the first one wrote, like two page loads against one origin.
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyValueStore {
    slots: Arc<Mutex<HashMap<String, String>>>,
    quota_bytes: Option<usize>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Caps the total stored bytes (keys plus values) across all slots.
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            slots: Arc::default(),
            quota_bytes: Some(quota_bytes),
        }
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.slots().get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> StorageResult<()> {
        let mut slots = self.slots();
        if let Some(quota_bytes) = self.quota_bytes {
            let others: usize = slots
                .iter()
                .filter(|(existing, _)| existing.as_str() != key)
                .map(|(existing, stored)| existing.len() + stored.len())
                .sum();
            let required_bytes = others + key.len() + value.len();
            if required_bytes > quota_bytes {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    required_bytes,
                    quota_bytes,
                });
            }
        }
        slots.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StorageResult<()> {
        self.slots().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryKeyValueStore;
    use crate::storage::{KeyValueStore, StorageError};

    #[test]
    fn clones_share_slots() {
        let mut first = MemoryKeyValueStore::new();
        let second = first.clone();
        first.set("todos", "[]").unwrap();
        assert_eq!(second.get("todos").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn quota_rejects_oversized_write_and_keeps_prior_value() {
        let mut store = MemoryKeyValueStore::with_quota(12);
        store.set("todos", "[1]").unwrap();

        let err = store.set("todos", "[1,2,3,4,5]").unwrap_err();
        assert!(matches!(
            err,
            StorageError::QuotaExceeded {
                required_bytes: 16,
                quota_bytes: 12,
                ..
            }
        ));
        assert_eq!(store.get("todos").unwrap().as_deref(), Some("[1]"));
    }

    #[test]
    fn remove_clears_slot() {
        let mut store = MemoryKeyValueStore::new();
        store.set("todos", "[]").unwrap();
        store.remove("todos").unwrap();
        assert!(store.get("todos").unwrap().is_none());
    }
}
