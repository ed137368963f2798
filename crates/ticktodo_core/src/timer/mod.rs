//! Countdown evaluation and the recurring expiry check.
//!
//! # Responsibility
//! - Compute remaining time or expiry for a task at a given instant.
//! - Drive periodic expiry sweeps over a shared task store.
//!
//! # Invariants
//! - Evaluation is pure; only the store mutates timers.
//! - Completed tasks and disarmed timers never report remaining time.

mod evaluator;
mod ticker;

pub use evaluator::{evaluate, remaining, Remaining, TimerStatus};
pub use ticker::ExpiryTicker;
