//! Core logic for the ticktodo task list.
//! This crate is the single source of truth for task invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod storage;
pub mod timer;
pub mod view;

pub use config::{StoreConfig, DEFAULT_TICK_INTERVAL};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::task::{Task, TaskId, TaskTimer, TaskValidationError, TimerConfig};
pub use model::time::{Clock, ManualClock, SystemClock, Timestamp};
pub use repo::task_repo::{
    decode_tasks, encode_tasks, KvTaskRepository, RepoError, RepoResult, TaskRepository,
    DEFAULT_STORAGE_KEY,
};
pub use service::task_store::{SharedTaskStore, StoreError, StoreResult, TaskStore};
pub use storage::{
    KeyValueStore, MemoryKeyValueStore, SqliteKeyValueStore, StorageError, StorageResult,
};
pub use timer::{evaluate, remaining, ExpiryTicker, Remaining, TimerStatus};
pub use view::{filter_tasks, project_rows, FilterMode, TaskCounts, TaskRow};
