//! Persistence adapters for the task store.
//!
//! # Responsibility
//! - Define the task persistence contract used by the store.
//! - Keep serialization and slot details out of store orchestration.
//!
//! # Invariants
//! - Corrupt persisted state is treated as "no prior state", never as a
//!   fatal error.

pub mod task_repo;
