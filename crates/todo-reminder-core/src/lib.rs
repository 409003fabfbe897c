//! Domain types for todo-reminder.

/// Deadline parsing and rendering.
pub mod deadline;
/// Reminder digest composition.
pub mod digest;
/// Identifier types.
pub mod id;

use crate::id::TaskId;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

pub use deadline::{DeadlineParseError, format_deadline, parse_deadline, parse_offset};
pub use digest::Digest;

/// A persisted to-do item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Store-assigned identifier.
    pub id: TaskId,
    /// Free-form description. Never empty for a persisted task.
    pub content: String,
    /// Completion flag.
    pub done: bool,
    /// Optional deadline.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub until: Option<OffsetDateTime>,
    /// Creation time, never modified.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Time of the most recent mutation.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
    /// Soft-delete marker.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub deleted_at: Option<OffsetDateTime>,
}

impl Task {
    /// Whether the task has been soft-deleted.
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Whether the task belongs in a reminder digest.
    ///
    /// With `cutoff` set, only deadlines at or before it qualify.
    #[must_use]
    pub fn is_reminder_candidate(&self, cutoff: Option<OffsetDateTime>) -> bool {
        if self.done || self.is_deleted() {
            return false;
        }
        match (self.until, cutoff) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(until), Some(cutoff)) => until <= cutoff,
        }
    }
}

/// Input for creating a task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTask {
    /// Description of the task.
    pub content: String,
    /// Optional deadline.
    pub until: Option<OffsetDateTime>,
}

impl NewTask {
    /// Build a new task input.
    pub fn new(content: impl Into<String>, until: Option<OffsetDateTime>) -> Self {
        Self {
            content: content.into(),
            until,
        }
    }

    /// Materialize the record a store persists, stamped with `created_at`.
    #[must_use]
    pub fn into_task(self, id: TaskId, created_at: OffsetDateTime) -> Task {
        Task {
            id,
            content: self.content,
            done: false,
            until: self.until,
            created_at,
            updated_at: None,
            deleted_at: None,
        }
    }
}
