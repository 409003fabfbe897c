use std::fmt::Write as _;

use time::UtcOffset;

use crate::Task;
use crate::deadline::format_deadline;

/// Subject line of every reminder mail.
pub const DIGEST_SUBJECT: &str = "TODO Reminder";
/// First line of the digest body.
pub const DIGEST_HEADER: &str = "This is your todo list";

/// Plain-text summary of open tasks with deadlines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest {
    /// Mail subject.
    pub subject: String,
    /// Mail body.
    pub body: String,
    /// Number of task lines in the body.
    pub task_count: usize,
}

impl Digest {
    /// Compose the digest, one `<deadline> <content>` line per task in the given order.
    ///
    /// Tasks without a deadline render with an empty deadline column.
    #[must_use]
    pub fn compose(tasks: &[Task], offset: UtcOffset) -> Self {
        let mut body = String::new();
        body.push_str(DIGEST_HEADER);
        body.push_str("\n\n");
        for task in tasks {
            let deadline = task
                .until
                .map(|until| format_deadline(until, offset))
                .unwrap_or_default();
            // Writing into a String cannot fail.
            let _ = writeln!(body, "{deadline} {}", task.content);
        }
        Self {
            subject: DIGEST_SUBJECT.to_owned(),
            body,
            task_count: tasks.len(),
        }
    }
}
