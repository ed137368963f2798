//! Pure countdown evaluation.
//!
//! # Responsibility
//! - Derive remaining time or expiry for one task at an injected instant.
//!
//! # Invariants
//! - Never mutates the task; disarming is the store's job.
//! - Elapsed time is whole seconds since `start_time`, clamped at zero.
//! - `Remaining::seconds` is always `< 60`.

use crate::model::task::Task;
use crate::model::time::Timestamp;
use std::fmt::{Display, Formatter};

/// Time left on a running countdown, split for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Remaining {
    pub minutes: u64,
    /// Always `< 60`.
    pub seconds: u64,
}

impl Remaining {
    pub fn from_total_seconds(total: u64) -> Self {
        Self {
            minutes: total / 60,
            seconds: total % 60,
        }
    }

    pub fn total_seconds(&self) -> u64 {
        self.minutes * 60 + self.seconds
    }
}

impl Display for Remaining {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{:02}", self.minutes, self.seconds)
    }
}

/// Timer state of one task at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerStatus {
    /// No countdown was configured.
    NoTimer,
    /// Countdown exists but is disarmed, or the task is completed.
    Inactive,
    /// Countdown is armed and has time left.
    Running(Remaining),
    /// Countdown is armed but its time is up; the caller should disarm it.
    Expired,
}

impl TimerStatus {
    pub fn remaining(&self) -> Option<Remaining> {
        match self {
            Self::Running(remaining) => Some(*remaining),
            _ => None,
        }
    }

    pub fn is_expired(&self) -> bool {
        matches!(self, Self::Expired)
    }
}

/// Evaluates the task's countdown at `now`.
///
/// Elapsed time is counted in whole seconds since `start_time` and clamped
/// at zero when `now` precedes the start. The countdown expires once the
/// remaining whole seconds reach zero.
pub fn evaluate(task: &Task, now: Timestamp) -> TimerStatus {
    let Some(timer) = task.timer.as_ref() else {
        return TimerStatus::NoTimer;
    };
    if task.completed || !timer.is_active {
        return TimerStatus::Inactive;
    }

    let elapsed = u64::try_from((now - timer.start_time).num_seconds()).unwrap_or(0);
    match timer.duration_seconds.checked_sub(elapsed) {
        Some(left) if left > 0 => TimerStatus::Running(Remaining::from_total_seconds(left)),
        _ => TimerStatus::Expired,
    }
}

/// Remaining time, if the countdown is still running at `now`.
pub fn remaining(task: &Task, now: Timestamp) -> Option<Remaining> {
    evaluate(task, now).remaining()
}
