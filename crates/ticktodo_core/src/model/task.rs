//! Task domain model.
//!
//! # Responsibility
//! - Define the canonical todo record and its optional countdown timer.
//! - Validate user input before a task can exist.
//!
//! # Invariants
//! - `id` is non-empty and stable for the task lifetime.
//! - `text` is never empty after trimming.
//! - `timer.duration_seconds` is always `> 0`.
//! - `timer.is_active` only ever moves from `true` to `false`.
//! - A completed task never holds an armed timer, including loaded ones.

use crate::model::time::{iso_millis, Timestamp};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

static CLOCK_SPEC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(\d+):)?(\d+):(\d{1,2})$").expect("valid clock timer regex")
});
static UNIT_SPEC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(\d+)h)?(?:(\d+)m)?(?:(\d+)s)?$").expect("valid unit timer regex")
});

/// Validation failures for task and timer input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    /// Task text is empty or whitespace only.
    EmptyText,
    /// Task identifier is empty.
    EmptyId,
    /// Timer duration must be at least one second.
    ZeroDuration,
    /// Timer text could not be parsed into a duration.
    InvalidTimerSpec(String),
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyText => write!(f, "task text cannot be empty"),
            Self::EmptyId => write!(f, "task id cannot be empty"),
            Self::ZeroDuration => write!(f, "timer duration must be greater than zero seconds"),
            Self::InvalidTimerSpec(value) => write!(
                f,
                "invalid timer `{value}`; expected seconds, mm:ss, h:mm:ss or 1h30m15s"
            ),
        }
    }
}

impl Error for TaskValidationError {}

/// Opaque task identifier.
///
/// Fresh ids are UUID v4 strings. Any non-empty string loads, so ids
/// written by older clients keep working.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaskId(String);

impl TaskId {
    /// Generates a new random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wraps an existing identifier, rejecting empty values.
    pub fn parse(value: impl Into<String>) -> Result<Self, TaskValidationError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(TaskValidationError::EmptyId);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First `len` characters, for compact display.
    pub fn short(&self, len: usize) -> &str {
        match self.0.char_indices().nth(len) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl Display for TaskId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for TaskId {
    type Error = TaskValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<TaskId> for String {
    fn from(value: TaskId) -> Self {
        value.0
    }
}

/// Validated request to attach a countdown to a new task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerConfig {
    duration_seconds: u64,
}

impl TimerConfig {
    pub fn from_seconds(duration_seconds: u64) -> Result<Self, TaskValidationError> {
        if duration_seconds == 0 {
            return Err(TaskValidationError::ZeroDuration);
        }
        Ok(Self { duration_seconds })
    }

    /// Builds a duration from the minutes and seconds fields of a form.
    pub fn from_minutes_seconds(minutes: u64, seconds: u64) -> Result<Self, TaskValidationError> {
        let total = minutes
            .checked_mul(60)
            .and_then(|value| value.checked_add(seconds))
            .ok_or_else(|| TaskValidationError::InvalidTimerSpec(format!("{minutes}m{seconds}s")))?;
        Self::from_seconds(total)
    }

    pub fn duration_seconds(&self) -> u64 {
        self.duration_seconds
    }
}

impl FromStr for TimerConfig {
    type Err = TaskValidationError;

    /// Accepts `90`, `25:00`, `1:02:03`, `45s`, `2m15s` or `1h30m`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim().to_ascii_lowercase();
        let invalid = || TaskValidationError::InvalidTimerSpec(value.trim().to_string());

        if !trimmed.is_empty() && trimmed.bytes().all(|byte| byte.is_ascii_digit()) {
            return Self::from_seconds(trimmed.parse::<u64>().map_err(|_| invalid())?);
        }

        let captures = CLOCK_SPEC_RE
            .captures(&trimmed)
            .or_else(|| UNIT_SPEC_RE.captures(&trimmed))
            .filter(|captures| captures.iter().skip(1).any(|group| group.is_some()))
            .ok_or_else(invalid)?;

        let mut total: u64 = 0;
        for (index, factor) in [(1, 3600_u64), (2, 60), (3, 1)] {
            let Some(group) = captures.get(index) else {
                continue;
            };
            let part = group.as_str().parse::<u64>().map_err(|_| invalid())?;
            total = part
                .checked_mul(factor)
                .and_then(|value| total.checked_add(value))
                .ok_or_else(invalid)?;
        }

        Self::from_seconds(total)
    }
}

/// Countdown attached to a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "TimerRecord")]
pub struct TaskTimer {
    /// Whole seconds, always `> 0`.
    pub duration_seconds: u64,
    #[serde(with = "iso_millis")]
    pub start_time: Timestamp,
    /// Cleared once on expiry, completion or deletion; never re-armed.
    pub is_active: bool,
}

impl TaskTimer {
    pub fn start(config: TimerConfig, start_time: Timestamp) -> Self {
        Self {
            duration_seconds: config.duration_seconds(),
            start_time,
            is_active: true,
        }
    }

    /// Turns the timer off; returns whether it was still running.
    pub fn deactivate(&mut self) -> bool {
        std::mem::replace(&mut self.is_active, false)
    }
}

/// Persisted timer shape, including the fractional-minute `duration`
/// field written by older clients.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimerRecord {
    #[serde(default)]
    duration_seconds: Option<u64>,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(with = "iso_millis")]
    start_time: Timestamp,
    is_active: bool,
}

impl TryFrom<TimerRecord> for TaskTimer {
    type Error = String;

    fn try_from(record: TimerRecord) -> Result<Self, Self::Error> {
        let duration_seconds = match (record.duration_seconds, record.duration) {
            (Some(seconds), _) => seconds,
            (None, Some(minutes)) if minutes.is_finite() && minutes > 0.0 => {
                (minutes * 60.0).round() as u64
            }
            (None, Some(minutes)) => return Err(format!("invalid legacy timer duration {minutes}")),
            (None, None) => return Err("timer is missing `durationSeconds`".to_string()),
        };
        if duration_seconds == 0 {
            return Err(TaskValidationError::ZeroDuration.to_string());
        }
        Ok(Self {
            duration_seconds,
            start_time: record.start_time,
            is_active: record.is_active,
        })
    }
}

/// Canonical todo record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "TaskRecord")]
pub struct Task {
    pub id: TaskId,
    /// Trimmed user label.
    pub text: String,
    pub completed: bool,
    #[serde(with = "iso_millis")]
    pub created_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timer: Option<TaskTimer>,
}

impl Task {
    /// Creates an open task with a generated id.
    ///
    /// # Errors
    /// - `EmptyText` when `text` is empty after trimming.
    pub fn new(text: &str, created_at: Timestamp) -> Result<Self, TaskValidationError> {
        Self::with_id(TaskId::generate(), text, created_at)
    }

    /// Creates an open task with a caller-provided id.
    pub fn with_id(
        id: TaskId,
        text: &str,
        created_at: Timestamp,
    ) -> Result<Self, TaskValidationError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(TaskValidationError::EmptyText);
        }
        Ok(Self {
            id,
            text: text.to_string(),
            completed: false,
            created_at,
            timer: None,
        })
    }

    /// Checks record-level invariants.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        if self.id.as_str().trim().is_empty() {
            return Err(TaskValidationError::EmptyId);
        }
        if self.text.trim().is_empty() {
            return Err(TaskValidationError::EmptyText);
        }
        if self
            .timer
            .as_ref()
            .is_some_and(|timer| timer.duration_seconds == 0)
        {
            return Err(TaskValidationError::ZeroDuration);
        }
        Ok(())
    }

    /// Returns whether the task still counts as open work.
    pub fn is_active(&self) -> bool {
        !self.completed
    }

    /// Returns whether a countdown is attached and still armed.
    pub fn has_running_timer(&self) -> bool {
        self.timer.as_ref().is_some_and(|timer| timer.is_active)
    }

    /// Flips completion; completing also disarms the timer.
    pub fn toggle_completed(&mut self) {
        self.completed = !self.completed;
        if self.completed {
            if let Some(timer) = self.timer.as_mut() {
                timer.deactivate();
            }
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskRecord {
    id: TaskId,
    text: String,
    #[serde(default)]
    completed: bool,
    #[serde(with = "iso_millis")]
    created_at: Timestamp,
    #[serde(default)]
    timer: Option<TaskTimer>,
}

impl TryFrom<TaskRecord> for Task {
    type Error = TaskValidationError;

    fn try_from(record: TaskRecord) -> Result<Self, Self::Error> {
        let mut task = Self {
            id: record.id,
            text: record.text,
            completed: record.completed,
            created_at: record.created_at,
            timer: record.timer,
        };
        task.validate()?;
        if task.completed {
            if let Some(timer) = task.timer.as_mut() {
                timer.deactivate();
            }
        }
        Ok(task)
    }
}
