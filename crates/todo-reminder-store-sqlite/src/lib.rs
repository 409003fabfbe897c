//! SQLite-backed storage implementation for todo-reminder.

mod error;

pub use error::SqliteStoreError;

use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use time::OffsetDateTime;
use todo_reminder_core::id::TaskId;
use todo_reminder_core::{NewTask, Task};
use tracing::{debug, info};

/// Path understood as "keep everything in memory".
pub const IN_MEMORY: &str = ":memory:";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS todos (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    content    TEXT    NOT NULL CHECK (content <> ''),
    done       INTEGER NOT NULL DEFAULT 0,
    until      INTEGER,
    created_at INTEGER NOT NULL,
    updated_at INTEGER,
    deleted_at INTEGER
);
CREATE INDEX IF NOT EXISTS todos_created_at ON todos (created_at);
";

const COLUMNS: &str = "id, content, done, until, created_at, updated_at, deleted_at";

type Result<T> = std::result::Result<T, SqliteStoreError>;

/// Task storage in a single `todos` table.
///
/// Timestamps are stored as Unix microseconds, which covers every year
/// `time` can represent. Rows are never physically removed; deletion sets
/// `deleted_at`.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and ensure the schema exists.
    ///
    /// Missing parent directories are created. [`IN_MEMORY`] opens a private
    /// in-memory database.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or the schema cannot be applied.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.as_os_str() == IN_MEMORY {
            return Self::open_in_memory();
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path).map_err(|source| SqliteStoreError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self::from_connection(conn)?;
        info!(path = %path.display(), "opened task database");
        Ok(store)
    }

    /// Open a private in-memory database.
    ///
    /// # Errors
    /// Returns an error if the schema cannot be applied.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| SqliteStoreError::Open {
            path: IN_MEMORY.into(),
            source,
        })?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        debug!("task schema ensured");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| SqliteStoreError::LockError)
    }

    /// Persist a new task stamped with `created_at`.
    ///
    /// The returned task is read back, so its timestamps carry the stored
    /// microsecond precision.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn insert(&self, new: NewTask, created_at: OffsetDateTime) -> Result<Task> {
        let until = new.until.map(to_micros).transpose()?;
        let created = to_micros(created_at)?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO todos (content, done, until, created_at) VALUES (?1, 0, ?2, ?3)",
            params![new.content, until, created],
        )?;
        let id = TaskId(conn.last_insert_rowid());
        let sql = format!("SELECT {COLUMNS} FROM todos WHERE id = ?1");
        let task = conn.query_row(&sql, params![id.0], row_to_task)?;
        drop(conn);
        debug!(%id, "inserted task");
        Ok(task)
    }

    /// Load a task by id. Soft-deleted rows are returned only with `include_deleted`.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn find(&self, id: TaskId, include_deleted: bool) -> Result<Option<Task>> {
        let sql = if include_deleted {
            format!("SELECT {COLUMNS} FROM todos WHERE id = ?1")
        } else {
            format!("SELECT {COLUMNS} FROM todos WHERE id = ?1 AND deleted_at IS NULL")
        };
        let conn = self.lock()?;
        let task = conn.query_row(&sql, params![id.0], row_to_task).optional()?;
        Ok(task)
    }

    /// Every live task, oldest first.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn list_active(&self) -> Result<Vec<Task>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM todos WHERE deleted_at IS NULL ORDER BY created_at, id"
        );
        self.query_tasks(&sql, params![])
    }

    /// Live, open tasks that carry a deadline, oldest first.
    ///
    /// With `cutoff`, only deadlines at or before it are returned.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn list_reminder_candidates(&self, cutoff: Option<OffsetDateTime>) -> Result<Vec<Task>> {
        match cutoff {
            None => {
                let sql = format!(
                    "SELECT {COLUMNS} FROM todos \
                     WHERE deleted_at IS NULL AND until IS NOT NULL AND done = 0 \
                     ORDER BY created_at, id"
                );
                self.query_tasks(&sql, params![])
            }
            Some(cutoff) => {
                let sql = format!(
                    "SELECT {COLUMNS} FROM todos \
                     WHERE deleted_at IS NULL AND until IS NOT NULL AND done = 0 AND until <= ?1 \
                     ORDER BY created_at, id"
                );
                self.query_tasks(&sql, params![to_micros(cutoff)?])
            }
        }
    }

    /// Set the completion flag of a live task and stamp `updated_at`.
    ///
    /// Returns `None` when no live task has this id.
    ///
    /// # Errors
    /// Returns an error if the update fails.
    pub fn set_done(&self, id: TaskId, done: bool, updated_at: OffsetDateTime) -> Result<Option<Task>> {
        let stamp = to_micros(updated_at)?;
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE todos SET done = ?1, updated_at = ?2 WHERE id = ?3 AND deleted_at IS NULL",
            params![done, stamp, id.0],
        )?;
        if changed == 0 {
            return Ok(None);
        }
        let sql = format!("SELECT {COLUMNS} FROM todos WHERE id = ?1");
        let task = conn.query_row(&sql, params![id.0], row_to_task).optional()?;
        drop(conn);
        debug!(%id, done, "updated task");
        Ok(task)
    }

    /// Mark a live task deleted. Returns whether a row changed.
    ///
    /// # Errors
    /// Returns an error if the update fails.
    pub fn mark_deleted(&self, id: TaskId, deleted_at: OffsetDateTime) -> Result<bool> {
        let stamp = to_micros(deleted_at)?;
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE todos SET deleted_at = ?1 WHERE id = ?2 AND deleted_at IS NULL",
            params![stamp, id.0],
        )?;
        debug!(%id, changed, "soft-deleted task");
        Ok(changed > 0)
    }

    fn query_tasks(&self, sql: &str, params: &[&dyn rusqlite::ToSql]) -> Result<Vec<Task>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params, row_to_task)?;
        let mut tasks = Vec::new();
        for row in rows {
            tasks.push(row?);
        }
        Ok(tasks)
    }
}

const NANOS_PER_MICRO: i128 = 1_000;

fn to_micros(ts: OffsetDateTime) -> Result<i64> {
    i64::try_from(ts.unix_timestamp_nanos().div_euclid(NANOS_PER_MICRO))
        .map_err(|_| SqliteStoreError::TimestampOutOfRange(ts.to_string()))
}

fn column_time(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<OffsetDateTime>> {
    let Some(micros) = row.get::<_, Option<i64>>(idx)? else {
        return Ok(None);
    };
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(micros) * NANOS_PER_MICRO)
        .map(Some)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Integer, Box::new(err)))
}

fn row_to_task(row: &Row<'_>) -> rusqlite::Result<Task> {
    let created_at = column_time(row, 4)?
        .ok_or_else(|| rusqlite::Error::InvalidColumnType(4, "created_at".into(), Type::Null))?;
    Ok(Task {
        id: TaskId(row.get(0)?),
        content: row.get(1)?,
        done: row.get(2)?,
        until: column_time(row, 3)?,
        created_at,
        updated_at: column_time(row, 5)?,
        deleted_at: column_time(row, 6)?,
    })
}
