//! Task row access contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide stable CRUD APIs over the `tasks` table.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Listing is always ordered by ascending id.
//! - Updates and deletes of a missing id are silent no-ops reported through
//!   the return value, not errors.
//! - Read paths reject malformed persisted state instead of masking it.

use crate::db::row::{RowError, TaskRow};
use crate::db::{migrations, DbError};
use crate::model::task::TaskId;
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const TASK_SELECT_SQL: &str = "SELECT
    id,
    title,
    is_done,
    created_at,
    priority,
    due_date
FROM tasks";

const REQUIRED_TASK_COLUMNS: &[&str] =
    &["id", "title", "is_done", "created_at", "priority", "due_date"];

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for task persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    Row(RowError),
    InvalidData(String),
    /// Connection has not been migrated to the schema this binary expects.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// The background store worker has shut down; the session is over.
    StoreClosed,
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Row(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted task data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection is at schema version {actual_version}, expected {expected_version}; \
                 open it through db::open_db so migrations run"
            ),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "missing required column `{column}` in table `{table}`")
            }
            Self::StoreClosed => write!(f, "task store is closed"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Row(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<RowError> for RepoError {
    fn from(value: RowError) -> Self {
        Self::Row(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Data-access interface for task rows.
pub trait TaskDao {
    /// Returns every stored row ordered by ascending id.
    fn list_all(&self) -> RepoResult<Vec<TaskRow>>;
    /// Inserts a new row. `row.id` is ignored; storage assigns the key and
    /// returns it.
    fn insert(&self, row: &TaskRow) -> RepoResult<TaskId>;
    /// Replaces the full row matched by `row.id`. Returns `false` when no
    /// row matched.
    fn update(&self, row: &TaskRow) -> RepoResult<bool>;
    /// Removes the row with the given id. Returns `false` when absent.
    fn delete_by_id(&self, id: TaskId) -> RepoResult<bool>;
    /// Point lookup by id.
    fn get_by_id(&self, id: TaskId) -> RepoResult<Option<TaskRow>>;
}

/// SQLite-backed task row access.
#[derive(Debug)]
pub struct SqliteTaskDao<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskDao<'conn> {
    /// Constructs a DAO from a migrated, ready connection.
    ///
    /// # Errors
    /// - [`RepoError::UninitializedConnection`] when `PRAGMA user_version`
    ///   does not match the latest migration.
    /// - [`RepoError::MissingRequiredTable`] / [`RepoError::MissingRequiredColumn`]
    ///   when the `tasks` layout is incomplete.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl TaskDao for SqliteTaskDao<'_> {
    fn list_all(&self) -> RepoResult<Vec<TaskRow>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} ORDER BY id ASC;"))?;

        let mut rows = stmt.query([])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_task_row(row)?);
        }

        Ok(items)
    }

    fn insert(&self, row: &TaskRow) -> RepoResult<TaskId> {
        self.conn.execute(
            "INSERT INTO tasks (title, is_done, created_at, priority, due_date)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                row.title.as_str(),
                bool_to_int(row.is_done),
                row.created_at,
                row.priority.as_str(),
                row.due_date,
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn update(&self, row: &TaskRow) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "UPDATE tasks
             SET
                title = ?1,
                is_done = ?2,
                created_at = ?3,
                priority = ?4,
                due_date = ?5
             WHERE id = ?6;",
            params![
                row.title.as_str(),
                bool_to_int(row.is_done),
                row.created_at,
                row.priority.as_str(),
                row.due_date,
                row.id,
            ],
        )?;

        Ok(changed > 0)
    }

    fn delete_by_id(&self, id: TaskId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM tasks WHERE id = ?1;", [id])?;
        Ok(changed > 0)
    }

    fn get_by_id(&self, id: TaskId) -> RepoResult<Option<TaskRow>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} WHERE id = ?1;"))?;

        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_task_row(row)?));
        }

        Ok(None)
    }
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<TaskRow> {
    let is_done = match row.get::<_, i64>("is_done")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid is_done value `{other}` in tasks.is_done"
            )));
        }
    };

    Ok(TaskRow {
        id: row.get("id")?,
        title: row.get("title")?,
        is_done,
        created_at: row.get("created_at")?,
        priority: row.get("priority")?,
        due_date: row.get("due_date")?,
    })
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = migrations::latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, "tasks")? {
        return Err(RepoError::MissingRequiredTable("tasks"));
    }

    for column in REQUIRED_TASK_COLUMNS {
        if !table_has_column(conn, "tasks", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "tasks",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
