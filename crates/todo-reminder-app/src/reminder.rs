//! Mail digest of open tasks with deadlines.

use time::{OffsetDateTime, UtcOffset};
use todo_reminder_core::{Digest, Task};
use todo_reminder_mail::{MailConfig, MailTransport, OutgoingMail};
use tracing::{error, info};

use crate::service::{OverdueScope, TaskService, TaskServiceError};
use crate::store::TaskStore;

/// Status shown when there was nothing to send.
pub const MSG_NOTHING_TO_NOTIFY: &str = "Not found incomplete todos to notify";
/// Status shown after a successful delivery.
pub const MSG_NOTIFIED: &str = "Notified todos by mail!";
/// Status shown when delivery failed.
pub const MSG_NOTIFY_FAILED: &str = "Failed to notify todos by mail";

/// Tunables for the reminder workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderConfig {
    /// Offset used to print deadlines in the digest.
    pub deadline_offset: UtcOffset,
    /// Which tasks count as overdue.
    pub scope: OverdueScope,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            deadline_offset: UtcOffset::UTC,
            scope: OverdueScope::default(),
        }
    }
}

/// What happened to a reminder request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReminderOutcome {
    /// No matching tasks; no mail was attempted.
    NothingToNotify,
    /// The digest was accepted by the transport.
    Sent {
        /// Number of tasks in the digest.
        count: usize,
    },
    /// Delivery failed; the request itself still succeeds.
    Failed {
        /// Diagnostic for logs and CLI output.
        reason: String,
    },
}

impl ReminderOutcome {
    /// Status line for the user.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::NothingToNotify => MSG_NOTHING_TO_NOTIFY,
            Self::Sent { .. } => MSG_NOTIFIED,
            Self::Failed { .. } => MSG_NOTIFY_FAILED,
        }
    }

    /// Whether delivery was attempted and failed.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Outcome plus the tasks the digest covered.
#[derive(Debug, Clone)]
pub struct ReminderReport {
    /// Delivery result.
    pub outcome: ReminderOutcome,
    /// Tasks selected for the digest, in digest order.
    pub tasks: Vec<Task>,
}

/// Failures that abort the reminder request.
#[derive(thiserror::Error, Debug)]
pub enum ReminderError {
    /// The overdue query failed; nothing was sent.
    #[error("failed to load tasks for reminder: {0}")]
    Storage(#[source] TaskServiceError),
}

/// Selects overdue tasks and mails a digest of them.
pub struct ReminderService<S, M> {
    tasks: TaskService<S>,
    transport: M,
    mail: MailConfig,
    config: ReminderConfig,
}

impl<S, M> ReminderService<S, M> {
    /// Assemble the service from its collaborators.
    pub const fn new(
        tasks: TaskService<S>,
        transport: M,
        mail: MailConfig,
        config: ReminderConfig,
    ) -> Self {
        Self {
            tasks,
            transport,
            mail,
            config,
        }
    }

    /// Workflow tunables.
    pub const fn config(&self) -> &ReminderConfig {
        &self.config
    }
}

impl<S, M> ReminderService<S, M>
where
    S: TaskStore,
    M: MailTransport,
{
    /// Run the reminder once, blocking until delivery finishes.
    ///
    /// Delivery problems are reported through [`ReminderOutcome::Failed`], never as errors.
    ///
    /// # Errors
    /// Returns [`ReminderError::Storage`] when the overdue query fails.
    pub fn notify(&self, now: OffsetDateTime) -> Result<ReminderReport, ReminderError> {
        let tasks = self
            .tasks
            .list_overdue_incomplete(now, self.config.scope)
            .map_err(|err| {
                error!(error = %err, "failed to load tasks for reminder");
                ReminderError::Storage(err)
            })?;

        if tasks.is_empty() {
            info!("no todos to notify");
            return Ok(ReminderReport {
                outcome: ReminderOutcome::NothingToNotify,
                tasks,
            });
        }

        let digest = Digest::compose(&tasks, self.config.deadline_offset);
        let count = digest.task_count;
        let delivered = self
            .envelope(digest)
            .and_then(|mail| self.transport.send(&mail));

        let outcome = match delivered {
            Ok(()) => {
                info!(count, "notified todos by mail");
                ReminderOutcome::Sent { count }
            }
            Err(err) => {
                error!(error = %err, "failed to notify todos by mail");
                ReminderOutcome::Failed {
                    reason: err.to_string(),
                }
            }
        };
        Ok(ReminderReport { outcome, tasks })
    }

    fn envelope(&self, digest: Digest) -> todo_reminder_mail::Result<OutgoingMail> {
        Ok(OutgoingMail {
            from: self.mail.sender()?,
            to: self.mail.recipient()?,
            subject: digest.subject,
            body: digest.body,
        })
    }
}
