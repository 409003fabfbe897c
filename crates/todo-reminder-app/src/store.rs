//! Storage seam between the services and the database.

use anyhow::Error;
use time::OffsetDateTime;
use todo_reminder_core::id::TaskId;
use todo_reminder_core::{NewTask, Task};
use todo_reminder_store_sqlite::{SqliteStore, SqliteStoreError};

/// Minimal storage abstraction required by [`crate::TaskService`].
pub trait TaskStore {
    /// Error type bubbled up from the backing store.
    type Error: Into<Error>;

    /// Persist a new task stamped with `created_at`.
    ///
    /// # Errors
    /// Returns a store-specific error when the insert fails.
    fn insert(&self, task: NewTask, created_at: OffsetDateTime) -> Result<Task, Self::Error>;

    /// Load a task by id, optionally including soft-deleted rows.
    ///
    /// # Errors
    /// Returns a store-specific error when the lookup fails.
    fn find(&self, id: TaskId, include_deleted: bool) -> Result<Option<Task>, Self::Error>;

    /// Every live task ordered by `created_at` ascending.
    ///
    /// # Errors
    /// Returns a store-specific error when listing fails.
    fn list_active(&self) -> Result<Vec<Task>, Self::Error>;

    /// Live, open tasks with a deadline (at or before `cutoff` when given),
    /// ordered by `created_at` ascending.
    ///
    /// # Errors
    /// Returns a store-specific error when the query fails.
    fn list_reminder_candidates(
        &self,
        cutoff: Option<OffsetDateTime>,
    ) -> Result<Vec<Task>, Self::Error>;

    /// Set `done` and `updated_at` on a live task; `None` when there is no such task.
    ///
    /// # Errors
    /// Returns a store-specific error when the update fails.
    fn set_done(
        &self,
        id: TaskId,
        done: bool,
        updated_at: OffsetDateTime,
    ) -> Result<Option<Task>, Self::Error>;

    /// Mark a live task deleted; returns whether anything changed.
    ///
    /// # Errors
    /// Returns a store-specific error when the update fails.
    fn mark_deleted(&self, id: TaskId, deleted_at: OffsetDateTime) -> Result<bool, Self::Error>;
}

impl TaskStore for SqliteStore {
    type Error = SqliteStoreError;

    fn insert(&self, task: NewTask, created_at: OffsetDateTime) -> Result<Task, Self::Error> {
        Self::insert(self, task, created_at)
    }

    fn find(&self, id: TaskId, include_deleted: bool) -> Result<Option<Task>, Self::Error> {
        Self::find(self, id, include_deleted)
    }

    fn list_active(&self) -> Result<Vec<Task>, Self::Error> {
        Self::list_active(self)
    }

    fn list_reminder_candidates(
        &self,
        cutoff: Option<OffsetDateTime>,
    ) -> Result<Vec<Task>, Self::Error> {
        Self::list_reminder_candidates(self, cutoff)
    }

    fn set_done(
        &self,
        id: TaskId,
        done: bool,
        updated_at: OffsetDateTime,
    ) -> Result<Option<Task>, Self::Error> {
        Self::set_done(self, id, done, updated_at)
    }

    fn mark_deleted(&self, id: TaskId, deleted_at: OffsetDateTime) -> Result<bool, Self::Error> {
        Self::mark_deleted(self, id, deleted_at)
    }
}

impl<S> TaskStore for &S
where
    S: TaskStore + ?Sized,
{
    type Error = S::Error;

    fn insert(&self, task: NewTask, created_at: OffsetDateTime) -> Result<Task, Self::Error> {
        (*self).insert(task, created_at)
    }

    fn find(&self, id: TaskId, include_deleted: bool) -> Result<Option<Task>, Self::Error> {
        (*self).find(id, include_deleted)
    }

    fn list_active(&self) -> Result<Vec<Task>, Self::Error> {
        (*self).list_active()
    }

    fn list_reminder_candidates(
        &self,
        cutoff: Option<OffsetDateTime>,
    ) -> Result<Vec<Task>, Self::Error> {
        (*self).list_reminder_candidates(cutoff)
    }

    fn set_done(
        &self,
        id: TaskId,
        done: bool,
        updated_at: OffsetDateTime,
    ) -> Result<Option<Task>, Self::Error> {
        (*self).set_done(id, done, updated_at)
    }

    fn mark_deleted(&self, id: TaskId, deleted_at: OffsetDateTime) -> Result<bool, Self::Error> {
        (*self).mark_deleted(id, deleted_at)
    }
}

impl<S> TaskStore for std::sync::Arc<S>
where
    S: TaskStore + ?Sized,
{
    type Error = S::Error;

    fn insert(&self, task: NewTask, created_at: OffsetDateTime) -> Result<Task, Self::Error> {
        (**self).insert(task, created_at)
    }

    fn find(&self, id: TaskId, include_deleted: bool) -> Result<Option<Task>, Self::Error> {
        (**self).find(id, include_deleted)
    }

    fn list_active(&self) -> Result<Vec<Task>, Self::Error> {
        (**self).list_active()
    }

    fn list_reminder_candidates(
        &self,
        cutoff: Option<OffsetDateTime>,
    ) -> Result<Vec<Task>, Self::Error> {
        (**self).list_reminder_candidates(cutoff)
    }

    fn set_done(
        &self,
        id: TaskId,
        done: bool,
        updated_at: OffsetDateTime,
    ) -> Result<Option<Task>, Self::Error> {
        (**self).set_done(id, done, updated_at)
    }

    fn mark_deleted(&self, id: TaskId, deleted_at: OffsetDateTime) -> Result<bool, Self::Error> {
        (**self).mark_deleted(id, deleted_at)
    }
}
