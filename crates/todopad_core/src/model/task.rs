//! Task domain model.
//!
//! # Responsibility
//! - Define the canonical task record and its priority classification.
//! - Provide copy-with-modification helpers for whole-value replacement.
//!
//! # Invariants
//! - `id == 0` means "not yet persisted"; storage assigns the real id.
//! - `created_at` is stamped once at construction and never rewritten by
//!   any helper.
//! - A task with an empty or whitespace-only title never passes
//!   `validate()`.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};

/// Storage-assigned task identifier.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
/// `0` is reserved for tasks that have not been inserted yet.
pub type TaskId = i64;

/// Urgency classification for a task.
///
/// Closed set of exactly three values; storage and wire forms use the
/// uppercase symbolic names (`HIGH`/`NORMAL`/`LOW`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    /// Needs attention before everything else.
    High,
    /// Everyday work. The default for new tasks.
    #[default]
    Normal,
    /// Can wait.
    Low,
}

impl Priority {
    /// Human-readable label shown by the UI layers.
    ///
    /// The product shipped with Japanese labels; they are part of the
    /// product surface, not a translation concern of this crate.
    pub fn label(self) -> &'static str {
        match self {
            Self::High => "高",
            Self::Normal => "普通",
            Self::Low => "低",
        }
    }

    /// Opaque presentation color token resolved by the UI layers.
    ///
    /// The core hands out identifiers only; it never computes colors.
    pub fn color_token(self) -> &'static str {
        match self {
            Self::High => "holo_red_light",
            Self::Normal => "holo_blue_light",
            Self::Low => "holo_green_light",
        }
    }
}

/// Validation failure for task write paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    /// Title is empty or whitespace-only.
    EmptyTitle,
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "task title must not be empty or whitespace-only"),
        }
    }
}

impl Error for TaskValidationError {}

/// Canonical domain record for one to-do item.
///
/// Tasks are immutable values: every mutation produces a modified copy that
/// replaces the stored row wholesale. Two tasks are equal iff all fields
/// are equal, including an absent `due_date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Storage-assigned id; `0` until first insert.
    pub id: TaskId,
    /// Display title. Trimmed by the service boundary before persistence.
    pub title: String,
    /// Completion flag.
    pub is_done: bool,
    /// Creation instant in Unix epoch milliseconds. Set once, never mutated.
    pub created_at: i64,
    /// Urgency classification.
    pub priority: Priority,
    /// Optional due instant in Unix epoch milliseconds. Absent by default.
    pub due_date: Option<i64>,
}

impl Task {
    /// Creates a fresh, not-yet-persisted task.
    ///
    /// # Invariants
    /// - `id` starts at `0` so storage can assign the real id on insert.
    /// - `is_done` starts as `false`, `due_date` as `None`.
    /// - `created_at` is stamped from the wall clock now.
    pub fn new(title: impl Into<String>, priority: Priority) -> Self {
        Self {
            id: 0,
            title: title.into(),
            is_done: false,
            created_at: now_epoch_ms(),
            priority,
            due_date: None,
        }
    }

    /// Returns a copy with `title` replaced.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Returns a copy with `is_done` replaced.
    pub fn with_done(mut self, is_done: bool) -> Self {
        self.is_done = is_done;
        self
    }

    /// Returns a copy with `priority` replaced.
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Returns a copy with `due_date` replaced; `None` clears it.
    pub fn with_due_date(mut self, due_date: Option<i64>) -> Self {
        self.due_date = due_date;
        self
    }

    /// Checks the invariants a task must satisfy before any SQL write.
    ///
    /// # Errors
    /// - [`TaskValidationError::EmptyTitle`] when the title trims to empty.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        if self.title.trim().is_empty() {
            return Err(TaskValidationError::EmptyTitle);
        }
        Ok(())
    }
}

/// Current wall-clock time in Unix epoch milliseconds.
///
/// Shared by task construction and the migration that backfills
/// `created_at`. A clock before the epoch collapses to `0` rather than
/// panicking.
pub(crate) fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_millis() as i64)
}
