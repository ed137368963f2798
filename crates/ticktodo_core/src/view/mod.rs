//! Read-only projections of the task list.
//!
//! # Responsibility
//! - Filter tasks by completion status without copying them.
//! - Derive tab counts and display rows for the presentation layer.
//!
//! # Invariants
//! - Projections preserve insertion order.
//! - `TaskCounts::total == active + completed`.

use crate::model::task::{Task, TaskId};
use crate::model::time::Timestamp;
use crate::timer::{evaluate, TimerStatus};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Which tasks a view displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterMode {
    #[default]
    All,
    Active,
    Completed,
}

impl FilterMode {
    pub const ALL_MODES: [FilterMode; 3] = [Self::All, Self::Active, Self::Completed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }

    /// Tab label as shown above the list.
    pub fn label(&self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Active => "Active",
            Self::Completed => "Completed",
        }
    }

    pub fn matches(&self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Active => !task.completed,
            Self::Completed => task.completed,
        }
    }

    /// Message shown when the filtered list is empty.
    pub fn empty_message(&self) -> String {
        match self {
            Self::All => "No todos yet. Add one above!".to_string(),
            other => format!("No {} todos.", other.as_str()),
        }
    }
}

impl Display for FilterMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown filter mode name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFilterModeError(String);

impl Display for ParseFilterModeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unsupported filter `{}`; expected all|active|completed",
            self.0
        )
    }
}

impl Error for ParseFilterModeError {}

impl FromStr for FilterMode {
    type Err = ParseFilterModeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "active" => Ok(Self::Active),
            "completed" | "done" => Ok(Self::Completed),
            other => Err(ParseFilterModeError(other.to_string())),
        }
    }
}

/// Tasks matching `mode`, in original order.
pub fn filter_tasks(tasks: &[Task], mode: FilterMode) -> Vec<&Task> {
    tasks.iter().filter(|task| mode.matches(task)).collect()
}

/// Per-status totals for the filter tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaskCounts {
    pub total: usize,
    pub active: usize,
    pub completed: usize,
}

impl TaskCounts {
    /// Counts all statuses in a single pass.
    pub fn from_tasks(tasks: &[Task]) -> Self {
        tasks.iter().fold(Self::default(), |mut counts, task| {
            counts.total += 1;
            if task.completed {
                counts.completed += 1;
            } else {
                counts.active += 1;
            }
            counts
        })
    }

    pub fn for_mode(&self, mode: FilterMode) -> usize {
        match mode {
            FilterMode::All => self.total,
            FilterMode::Active => self.active,
            FilterMode::Completed => self.completed,
        }
    }
}

/// One rendered line of the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRow {
    pub id: TaskId,
    pub text: String,
    pub completed: bool,
    pub timer: TimerStatus,
}

impl TaskRow {
    pub fn project(task: &Task, now: Timestamp) -> Self {
        Self {
            id: task.id.clone(),
            text: task.text.clone(),
            completed: task.completed,
            timer: evaluate(task, now),
        }
    }

    /// Remaining-time or expiry text, `None` when nothing should be shown.
    pub fn timer_label(&self) -> Option<String> {
        match self.timer {
            TimerStatus::Running(remaining) => Some(remaining.to_string()),
            TimerStatus::Expired => Some("expired".to_string()),
            TimerStatus::NoTimer | TimerStatus::Inactive => None,
        }
    }
}

/// Filtered rows with timer state evaluated at `now`.
pub fn project_rows(tasks: &[Task], mode: FilterMode, now: Timestamp) -> Vec<TaskRow> {
    tasks
        .iter()
        .filter(|task| mode.matches(task))
        .map(|task| TaskRow::project(task, now))
        .collect()
}
