//! Store configuration.
//!
//! # Invariants
//! - `tick_interval` is never zero.

use crate::repo::task_repo::DEFAULT_STORAGE_KEY;
use std::time::Duration;

/// Default interval between expiry sweeps.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

const MIN_TICK_INTERVAL: Duration = Duration::from_millis(10);

/// Tunables shared by front ends that host a task store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Key of the storage slot holding the task list.
    pub storage_key: String,
    /// Interval of the recurring expiry check.
    pub tick_interval: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }
}

impl StoreConfig {
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        if !key.trim().is_empty() {
            self.storage_key = key;
        }
        self
    }

    /// Sets the sweep interval, clamped to a small positive minimum.
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval.max(MIN_TICK_INTERVAL);
        self
    }
}
