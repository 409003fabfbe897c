//! Application layer logic for todo-reminder.
//!
//! This crate provides the task lifecycle service, the one-shot flash message,
//! the mail reminder workflow and configuration shared by the CLI and HTTP
//! front ends.

pub mod config;
pub mod flash;
pub mod page;
pub mod reminder;
pub mod service;
pub mod store;

#[cfg(test)]
mod test_support;

// Re-exports for convenience
pub use config::{AppConfig, ReminderSettings};
pub use flash::{EphemeralEntry, EphemeralState, FLASH_KEY, FlashMessenger, MemoryState};
pub use page::PageData;
pub use reminder::{ReminderConfig, ReminderError, ReminderOutcome, ReminderReport, ReminderService};
pub use service::{OverdueScope, TaskService, TaskServiceError};
pub use store::TaskStore;
