//! Task repository: persists the whole task list into one storage slot.
//!
//! # Responsibility
//! - Translate between in-memory `Task` values and the JSON slot payload.
//! - Recover from missing or corrupt slots by starting empty.
//!
//! # Invariants
//! - `load` never fails the caller.
//! - `save` always writes the full collection, replacing the prior payload.
//! - `decode_tasks(encode_tasks(tasks)) == tasks` for valid collections.

use crate::model::task::{Task, TaskId};
use crate::storage::{KeyValueStore, StorageError};
use log::{debug, warn};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Slot key used by the original browser widget.
pub const DEFAULT_STORAGE_KEY: &str = "todos";

pub type RepoResult<T> = Result<T, RepoError>;

/// Persistence failure for task collections.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying key-value store failed.
    Storage(StorageError),
    /// Task list could not be serialized.
    Encode(serde_json::Error),
    /// Persisted payload is malformed or violates task invariants.
    Corrupt(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Storage(err) => write!(f, "{err}"),
            Self::Encode(err) => write!(f, "failed to encode tasks: {err}"),
            Self::Corrupt(message) => write!(f, "corrupt persisted tasks: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            Self::Encode(err) => Some(err),
            Self::Corrupt(_) => None,
        }
    }
}

impl From<StorageError> for RepoError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

/// Persistence contract consumed by the task store.
pub trait TaskRepository {
    /// Returns persisted tasks in stored order, or empty when none are usable.
    fn load(&self) -> Vec<Task>;
    /// Replaces persisted state with `tasks`.
    fn save(&mut self, tasks: &[Task]) -> RepoResult<()>;
}

/// Repository storing the task list as a JSON array under a single key.
#[derive(Debug, Clone)]
pub struct KvTaskRepository<S: KeyValueStore> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> KvTaskRepository<S> {
    /// Uses the default `todos` slot.
    pub fn new(store: S) -> Self {
        Self::with_key(store, DEFAULT_STORAGE_KEY)
    }

    pub fn with_key(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Like `load`, but reports why prior state was unusable.
    ///
    /// Returns `Ok(None)` when the slot has never been written.
    pub fn try_load(&self) -> RepoResult<Option<Vec<Task>>> {
        match self.store.get(&self.key)? {
            Some(payload) => decode_tasks(&payload).map(Some),
            None => Ok(None),
        }
    }
}

impl<S: KeyValueStore> TaskRepository for KvTaskRepository<S> {
    fn load(&self) -> Vec<Task> {
        match self.try_load() {
            Ok(Some(tasks)) => {
                debug!(
                    "event=tasks_load module=repo status=ok key={} count={}",
                    self.key,
                    tasks.len()
                );
                tasks
            }
            Ok(None) => {
                debug!(
                    "event=tasks_load module=repo status=empty key={}",
                    self.key
                );
                Vec::new()
            }
            Err(RepoError::Corrupt(reason)) => {
                warn!(
                    "event=tasks_load module=repo status=recovered key={} error_code=storage_corrupt error={}",
                    self.key, reason
                );
                Vec::new()
            }
            Err(err) => {
                warn!(
                    "event=tasks_load module=repo status=recovered key={} error_code=storage_read_failed error={}",
                    self.key, err
                );
                Vec::new()
            }
        }
    }

    fn save(&mut self, tasks: &[Task]) -> RepoResult<()> {
        let payload = encode_tasks(tasks)?;
        self.store.set(&self.key, &payload)?;
        debug!(
            "event=tasks_save module=repo status=ok key={} count={} bytes={}",
            self.key,
            tasks.len(),
            payload.len()
        );
        Ok(())
    }
}

/// Serializes tasks into the slot payload.
pub fn encode_tasks(tasks: &[Task]) -> RepoResult<String> {
    serde_json::to_string(tasks).map_err(RepoError::Encode)
}

/// Parses a slot payload, enforcing record invariants and id uniqueness.
///
/// # Errors
/// - `Corrupt` when the payload is not a JSON array of valid tasks.
/// - `Corrupt` when two records share an id.
pub fn decode_tasks(payload: &str) -> RepoResult<Vec<Task>> {
    let tasks: Vec<Task> =
        serde_json::from_str(payload).map_err(|err| RepoError::Corrupt(err.to_string()))?;

    let mut seen: HashSet<&TaskId> = HashSet::with_capacity(tasks.len());
    for task in &tasks {
        if !seen.insert(&task.id) {
            return Err(RepoError::Corrupt(format!("duplicate task id `{}`", task.id)));
        }
    }

    Ok(tasks)
}
