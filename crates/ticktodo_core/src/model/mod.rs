//! Domain model for todo tasks and their countdown timers.
//!
//! # Responsibility
//! - Define canonical data structures used by the store, persistence and
//!   timer evaluation.
//! - Own the timestamp type and its wire encoding.
//!
//! # Invariants
//! - Every task is identified by a stable, non-empty `TaskId`.
//! - A task without a timer never reports remaining time.

pub mod task;
pub mod time;
