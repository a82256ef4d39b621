//! Persisted row shape and its domain conversions.
//!
//! # Responsibility
//! - Mirror the `tasks` table layout as a plain value type.
//! - Convert losslessly between [`TaskRow`] and [`Task`].
//!
//! # Invariants
//! - `priority` is stored as an exact symbolic name; an unrecognized name
//!   is a conversion error, never silently defaulted.
//! - An absent `due_date` maps to SQL NULL and back to `None`, not to a
//!   sentinel value.

use crate::model::task::{Priority, Task, TaskId};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// One stored row of the `tasks` table.
///
/// Field order matches the column order of the fully migrated schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRow {
    /// Primary key; `0` on rows built from a not-yet-persisted task.
    pub id: TaskId,
    pub title: String,
    pub is_done: bool,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Stored symbolic priority name; validated on conversion to domain.
    pub priority: String,
    /// Unix epoch milliseconds, NULL when no due date is set.
    pub due_date: Option<i64>,
}

/// Conversion failure from stored row to domain task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowError {
    /// Stored priority text matches none of the known symbolic names.
    InvalidPriority(String),
}

impl Display for RowError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPriority(value) => {
                write!(f, "invalid priority value `{value}` in tasks.priority")
            }
        }
    }
}

impl Error for RowError {}

impl TaskRow {
    /// Builds the stored representation of a task. Never fails; every task
    /// has exactly one row form.
    pub fn from_task(task: &Task) -> Self {
        Self {
            id: task.id,
            title: task.title.clone(),
            is_done: task.is_done,
            created_at: task.created_at,
            priority: priority_to_db(task.priority).to_string(),
            due_date: task.due_date,
        }
    }

    /// Rebuilds the domain task from this row.
    ///
    /// # Errors
    /// - [`RowError::InvalidPriority`] when the stored priority name is not
    ///   one of `HIGH`/`NORMAL`/`LOW`; the value is never defaulted.
    pub fn into_task(self) -> Result<Task, RowError> {
        let priority = match parse_priority(&self.priority) {
            Some(priority) => priority,
            None => return Err(RowError::InvalidPriority(self.priority)),
        };

        Ok(Task {
            id: self.id,
            title: self.title,
            is_done: self.is_done,
            created_at: self.created_at,
            priority,
            due_date: self.due_date,
        })
    }
}

/// Maps a priority to its stored symbolic name.
pub fn priority_to_db(priority: Priority) -> &'static str {
    match priority {
        Priority::High => "HIGH",
        Priority::Normal => "NORMAL",
        Priority::Low => "LOW",
    }
}

/// Parses a stored symbolic name back to a priority. Exact match only.
pub fn parse_priority(value: &str) -> Option<Priority> {
    match value {
        "HIGH" => Some(Priority::High),
        "NORMAL" => Some(Priority::Normal),
        "LOW" => Some(Priority::Low),
        _ => None,
    }
}
