//! In-memory doubles shared by the unit tests.

use anyhow::anyhow;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use time::OffsetDateTime;
use todo_reminder_core::id::TaskId;
use todo_reminder_core::{NewTask, Task};
use todo_reminder_mail::{MailError, MailTransport, OutgoingMail};

use crate::store::TaskStore;

pub fn guard<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Clone, Default)]
pub struct MockStore {
    inner: Arc<MockStoreInner>,
}

#[derive(Default)]
struct MockStoreInner {
    tasks: Mutex<Vec<Task>>,
    insert_calls: AtomicUsize,
    fail_reads: AtomicBool,
}

impl MockStore {
    pub fn insert_calls(&self) -> usize {
        self.inner.insert_calls.load(Ordering::SeqCst)
    }

    pub fn fail_reads(&self, fail: bool) {
        self.inner.fail_reads.store(fail, Ordering::SeqCst);
    }

    fn check_reads(&self) -> anyhow::Result<()> {
        if self.inner.fail_reads.load(Ordering::SeqCst) {
            return Err(anyhow!("database unreachable"));
        }
        Ok(())
    }

    fn sorted(mut tasks: Vec<Task>) -> Vec<Task> {
        tasks.sort_by_key(|task| (task.created_at, task.id));
        tasks
    }
}

impl TaskStore for MockStore {
    type Error = anyhow::Error;

    fn insert(&self, task: NewTask, created_at: OffsetDateTime) -> Result<Task, Self::Error> {
        self.inner.insert_calls.fetch_add(1, Ordering::SeqCst);
        let mut tasks = guard(&self.inner.tasks);
        let id = TaskId(i64::try_from(tasks.len())? + 1);
        let task = task.into_task(id, created_at);
        tasks.push(task.clone());
        Ok(task)
    }

    fn find(&self, id: TaskId, include_deleted: bool) -> Result<Option<Task>, Self::Error> {
        self.check_reads()?;
        Ok(guard(&self.inner.tasks)
            .iter()
            .find(|task| task.id == id && (include_deleted || !task.is_deleted()))
            .cloned())
    }

    fn list_active(&self) -> Result<Vec<Task>, Self::Error> {
        self.check_reads()?;
        let live = guard(&self.inner.tasks)
            .iter()
            .filter(|task| !task.is_deleted())
            .cloned()
            .collect();
        Ok(Self::sorted(live))
    }

    fn list_reminder_candidates(
        &self,
        cutoff: Option<OffsetDateTime>,
    ) -> Result<Vec<Task>, Self::Error> {
        self.check_reads()?;
        let matching = guard(&self.inner.tasks)
            .iter()
            .filter(|task| task.is_reminder_candidate(cutoff))
            .cloned()
            .collect();
        Ok(Self::sorted(matching))
    }

    fn set_done(
        &self,
        id: TaskId,
        done: bool,
        updated_at: OffsetDateTime,
    ) -> Result<Option<Task>, Self::Error> {
        let mut tasks = guard(&self.inner.tasks);
        let Some(task) = tasks.iter_mut().find(|t| t.id == id && !t.is_deleted()) else {
            return Ok(None);
        };
        task.done = done;
        task.updated_at = Some(updated_at);
        Ok(Some(task.clone()))
    }

    fn mark_deleted(&self, id: TaskId, deleted_at: OffsetDateTime) -> Result<bool, Self::Error> {
        let mut tasks = guard(&self.inner.tasks);
        let Some(task) = tasks.iter_mut().find(|t| t.id == id && !t.is_deleted()) else {
            return Ok(false);
        };
        task.deleted_at = Some(deleted_at);
        Ok(true)
    }
}

#[derive(Clone, Default)]
pub struct MockTransport {
    sent: Arc<Mutex<Vec<OutgoingMail>>>,
    attempts: Arc<AtomicUsize>,
    fail: Arc<AtomicBool>,
}

impl MockTransport {
    pub fn failing() -> Self {
        let transport = Self::default();
        transport.fail.store(true, Ordering::SeqCst);
        transport
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn sent(&self) -> Vec<OutgoingMail> {
        guard(&self.sent).clone()
    }
}

impl MailTransport for MockTransport {
    fn send(&self, mail: &OutgoingMail) -> todo_reminder_mail::Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(MailError::Config("relay refused connection".into()));
        }
        guard(&self.sent).push(mail.clone());
        Ok(())
    }
}
