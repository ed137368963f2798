//! Task store: the single owner of the live task list.
//!
//! # Responsibility
//! - Apply add/toggle/delete/clear-completed/expiry mutations.
//! - Persist after every effective mutation before returning.
//!
//! # Invariants
//! - Ids are unique across held tasks.
//! - A mutation is committed in memory only after its save succeeded, so
//!   the held list always matches the last successful save.
//! - No-op mutations do not write.

use crate::model::task::{Task, TaskId, TaskTimer, TaskValidationError, TimerConfig};
use crate::model::time::{Clock, Timestamp};
use crate::repo::task_repo::{RepoError, TaskRepository};
use crate::timer::evaluate;
use crate::view::{filter_tasks, project_rows, FilterMode, TaskCounts, TaskRow};
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex};

pub type StoreResult<T> = Result<T, StoreError>;

/// Store handle shared between user actions and the expiry ticker.
pub type SharedTaskStore<R> = Arc<Mutex<TaskStore<R>>>;

/// Error for task store operations.
#[derive(Debug)]
pub enum StoreError {
    /// Input rejected; store unchanged.
    Validation(TaskValidationError),
    /// No task with this id.
    NotFound(TaskId),
    /// Save failed; store unchanged.
    Repo(RepoError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "task not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::NotFound(_) => None,
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<TaskValidationError> for StoreError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Ordered task collection bound to a repository and a clock.
pub struct TaskStore<R: TaskRepository> {
    repo: R,
    clock: Arc<dyn Clock>,
    tasks: Vec<Task>,
}

impl<R: TaskRepository> TaskStore<R> {
    /// Creates the store from whatever the repository holds.
    ///
    /// Missing or corrupt persisted state yields an empty store.
    pub fn open(repo: R, clock: Arc<dyn Clock>) -> Self {
        let tasks = repo.load();
        info!(
            "event=store_open module=store status=ok count={}",
            tasks.len()
        );
        Self { repo, clock, tasks }
    }

    /// Wraps the store for use by the expiry ticker and user actions.
    pub fn into_shared(self) -> SharedTaskStore<R> {
        Arc::new(Mutex::new(self))
    }

    /// Releases the store and hands back its repository.
    pub fn teardown(self) -> R {
        info!(
            "event=store_teardown module=store status=ok count={}",
            self.tasks.len()
        );
        self.repo
    }

    /// Adds a task, optionally with a countdown starting now.
    ///
    /// # Errors
    /// - `Validation` when `text` is empty after trimming.
    /// - `Repo` when the save fails.
    pub fn add(&mut self, text: &str, timer: Option<TimerConfig>) -> StoreResult<Task> {
        let now = self.clock.now();
        let mut task = Task::with_id(self.fresh_id(), text, now)?;
        task.timer = timer.map(|config| TaskTimer::start(config, now));

        let mut next = self.tasks.clone();
        next.push(task.clone());
        self.commit("task_add", next)?;
        info!(
            "event=task_add module=store status=ok id={} timer_seconds={}",
            task.id,
            task.timer
                .as_ref()
                .map_or(0, |timer| timer.duration_seconds)
        );
        Ok(task)
    }

    /// Flips completion of the matching task and returns its new state.
    ///
    /// Completing a task disarms its timer.
    pub fn toggle(&mut self, id: &TaskId) -> StoreResult<Task> {
        let index = self
            .position(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;

        let mut next = self.tasks.clone();
        next[index].toggle_completed();
        let toggled = next[index].clone();
        self.commit("task_toggle", next)?;
        info!(
            "event=task_toggle module=store status=ok id={} completed={}",
            toggled.id, toggled.completed
        );
        Ok(toggled)
    }

    /// Removes the matching task; returns `false` when it was absent.
    pub fn delete(&mut self, id: &TaskId) -> StoreResult<bool> {
        let Some(index) = self.position(id) else {
            return Ok(false);
        };

        let mut next = self.tasks.clone();
        next.remove(index);
        self.commit("task_delete", next)?;
        info!("event=task_delete module=store status=ok id={id}");
        Ok(true)
    }

    /// Removes every completed task, keeping the others in order.
    pub fn clear_completed(&mut self) -> StoreResult<usize> {
        let next: Vec<Task> = self
            .tasks
            .iter()
            .filter(|task| !task.completed)
            .cloned()
            .collect();
        let removed = self.tasks.len() - next.len();
        if removed == 0 {
            return Ok(0);
        }

        self.commit("tasks_clear_completed", next)?;
        info!("event=tasks_clear_completed module=store status=ok removed={removed}");
        Ok(removed)
    }

    /// Disarms every timer that has expired by the clock's current time.
    pub fn expire_due(&mut self) -> StoreResult<Vec<TaskId>> {
        let now = self.clock.now();
        self.expire_due_at(now)
    }

    /// Disarms every timer that has expired at `now`; returns their ids.
    pub fn expire_due_at(&mut self, now: Timestamp) -> StoreResult<Vec<TaskId>> {
        let due: Vec<usize> = self
            .tasks
            .iter()
            .enumerate()
            .filter(|(_, task)| evaluate(task, now).is_expired())
            .map(|(index, _)| index)
            .collect();
        if due.is_empty() {
            return Ok(Vec::new());
        }

        let mut next = self.tasks.clone();
        let mut expired = Vec::with_capacity(due.len());
        for index in due {
            if let Some(timer) = next[index].timer.as_mut() {
                timer.deactivate();
            }
            expired.push(next[index].id.clone());
        }
        self.commit("timers_expire", next)?;
        info!(
            "event=timers_expire module=store status=ok expired={}",
            expired.len()
        );
        Ok(expired)
    }

    /// All tasks in insertion order.
    pub fn list(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| &task.id == id)
    }

    /// Finds the single task whose id starts with `prefix`.
    ///
    /// Returns `None` when nothing or more than one task matches. An exact
    /// id match always wins.
    pub fn resolve(&self, prefix: &str) -> Option<&Task> {
        let prefix = prefix.trim();
        if prefix.is_empty() {
            return None;
        }
        if let Some(exact) = self.tasks.iter().find(|task| task.id.as_str() == prefix) {
            return Some(exact);
        }
        let mut matches = self
            .tasks
            .iter()
            .filter(|task| task.id.as_str().starts_with(prefix));
        match (matches.next(), matches.next()) {
            (Some(task), None) => Some(task),
            _ => None,
        }
    }

    pub fn filtered(&self, mode: FilterMode) -> Vec<&Task> {
        filter_tasks(&self.tasks, mode)
    }

    pub fn counts(&self) -> TaskCounts {
        TaskCounts::from_tasks(&self.tasks)
    }

    /// Display rows with timers evaluated at the clock's current time.
    pub fn rows(&self, mode: FilterMode) -> Vec<TaskRow> {
        project_rows(&self.tasks, mode, self.clock.now())
    }

    fn position(&self, id: &TaskId) -> Option<usize> {
        self.tasks.iter().position(|task| &task.id == id)
    }

    fn fresh_id(&self) -> TaskId {
        loop {
            let id = TaskId::generate();
            if self.position(&id).is_none() {
                return id;
            }
        }
    }

    fn commit(&mut self, event: &'static str, next: Vec<Task>) -> StoreResult<()> {
        if let Err(err) = self.repo.save(&next) {
            error!(
                "event={event} module=store status=error error_code=save_failed error={err}"
            );
            return Err(err.into());
        }
        self.tasks = next;
        Ok(())
    }
}
