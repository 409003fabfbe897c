//! Result structure handed to the presentation layer.

use serde::Serialize;
use todo_reminder_core::Task;

/// Shown when the task list cannot be read.
pub const MSG_CANNOT_GET: &str = "Cannot get todos";
/// Shown when a create/update/delete fails in the store.
pub const MSG_CANNOT_UPDATE: &str = "Cannot update";
/// Shown when a task is created without content.
pub const MSG_EMPTY_CONTENT: &str = "Todo content must not be empty";
/// Shown when the targeted task does not exist.
pub const MSG_NOT_FOUND: &str = "Todo not found";

/// Tasks plus the errors and status messages to display with them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageData {
    /// Live tasks, oldest first.
    pub tasks: Vec<Task>,
    /// User-facing error lines.
    pub errors: Vec<String>,
    /// User-facing status lines.
    pub messages: Vec<String>,
}

impl PageData {
    /// Task list with an optional status message; empty messages are dropped.
    #[must_use]
    pub fn listing(tasks: Vec<Task>, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            tasks,
            errors: Vec::new(),
            messages: if message.is_empty() {
                Vec::new()
            } else {
                vec![message]
            },
        }
    }

    /// Page carrying only errors.
    #[must_use]
    pub fn errors<I, E>(errors: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<String>,
    {
        Self {
            errors: errors.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}
