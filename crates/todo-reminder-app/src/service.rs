//! Task lifecycle rules on top of a [`TaskStore`](crate::store::TaskStore).

use anyhow::Error;
use time::OffsetDateTime;
use todo_reminder_core::id::TaskId;
use todo_reminder_core::{NewTask, Task};
use tracing::{debug, info};

use crate::store::TaskStore;

/// Which open, dated tasks count as overdue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OverdueScope {
    /// Every open task with a deadline, including future ones.
    #[default]
    AnyDeadline,
    /// Only tasks whose deadline is at or before the reference time.
    PastDue,
}

impl OverdueScope {
    const fn cutoff(self, now: OffsetDateTime) -> Option<OffsetDateTime> {
        match self {
            Self::AnyDeadline => None,
            Self::PastDue => Some(now),
        }
    }
}

/// Errors surfaced by [`TaskService`].
#[derive(thiserror::Error, Debug)]
pub enum TaskServiceError {
    /// Content was empty on create.
    #[error("todo content must not be empty")]
    EmptyContent,
    /// No live task has this id.
    #[error("task {0} not found")]
    NotFound(TaskId),
    /// Backing store returned an error.
    #[error("store error: {0}")]
    Store(#[from] Error),
}

/// Task lifecycle operations over a [`TaskStore`].
#[derive(Debug, Clone)]
pub struct TaskService<S> {
    store: S,
}

impl<S> TaskService<S> {
    /// Wrap a store.
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Expose a reference to the underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }
}

impl<S: TaskStore> TaskService<S> {
    fn store_error(err: S::Error) -> TaskServiceError {
        TaskServiceError::Store(err.into())
    }

    /// Live tasks, oldest first.
    ///
    /// # Errors
    /// Returns [`TaskServiceError::Store`] when the store cannot be read.
    pub fn list_all(&self) -> Result<Vec<Task>, TaskServiceError> {
        self.store.list_active().map_err(Self::store_error)
    }

    /// Open tasks with a deadline, oldest first.
    ///
    /// # Errors
    /// Returns [`TaskServiceError::Store`] when the store cannot be read.
    pub fn list_overdue_incomplete(
        &self,
        now: OffsetDateTime,
        scope: OverdueScope,
    ) -> Result<Vec<Task>, TaskServiceError> {
        self.store
            .list_reminder_candidates(scope.cutoff(now))
            .map_err(Self::store_error)
    }

    /// Create a task.
    ///
    /// # Errors
    /// Returns [`TaskServiceError::EmptyContent`] for empty content (nothing is
    /// persisted) or [`TaskServiceError::Store`] when the insert fails.
    pub fn create(
        &self,
        content: impl Into<String>,
        until: Option<OffsetDateTime>,
    ) -> Result<Task, TaskServiceError> {
        let content = content.into();
        if content.is_empty() {
            return Err(TaskServiceError::EmptyContent);
        }
        let task = self
            .store
            .insert(NewTask::new(content, until), OffsetDateTime::now_utc())
            .map_err(Self::store_error)?;
        info!(id = %task.id, "created task");
        Ok(task)
    }

    /// Set the completion flag. Content and deadline are never touched.
    ///
    /// # Errors
    /// Returns [`TaskServiceError::NotFound`] for unknown or deleted tasks.
    pub fn update_done(&self, id: TaskId, done: bool) -> Result<Task, TaskServiceError> {
        let task = self
            .store
            .set_done(id, done, OffsetDateTime::now_utc())
            .map_err(Self::store_error)?
            .ok_or(TaskServiceError::NotFound(id))?;
        info!(%id, done, "updated task");
        Ok(task)
    }

    /// Soft-delete a task. Unknown and already deleted ids are a no-op.
    ///
    /// # Errors
    /// Returns [`TaskServiceError::Store`] when the store fails.
    pub fn soft_delete(&self, id: TaskId) -> Result<(), TaskServiceError> {
        let changed = self
            .store
            .mark_deleted(id, OffsetDateTime::now_utc())
            .map_err(Self::store_error)?;
        if changed {
            info!(%id, "deleted task");
        } else {
            debug!(%id, "delete ignored: no live task");
        }
        Ok(())
    }

    /// Load a task by id, including soft-deleted ones.
    ///
    /// # Errors
    /// Returns [`TaskServiceError::NotFound`] when the id was never assigned.
    pub fn get(&self, id: TaskId) -> Result<Task, TaskServiceError> {
        self.store
            .find(id, true)
            .map_err(Self::store_error)?
            .ok_or(TaskServiceError::NotFound(id))
    }
}
