//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level task functions to Dart via FRB.
//! - Keep error semantics simple for early-stage UI integration.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - All responses are envelopes; storage faults surface as `ok=false`
//!   with a readable message, never as thrown errors.
//! - The task store binds to one database path per process.

use once_cell::sync::OnceCell;
use std::path::PathBuf;
use todopad_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, parse_priority,
    ping as ping_inner, priority_to_db, Priority, RepoResult, Task, TaskId, TaskService,
};
use tokio::runtime::Runtime;

const TASKS_DB_FILE_NAME: &str = "todopad_tasks.sqlite3";
static STORE: OnceCell<Store> = OnceCell::new();

struct Store {
    db_path: PathBuf,
    runtime: Runtime,
    service: TaskService,
}

impl Store {
    fn open(db_path: PathBuf) -> Result<Self, String> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .map_err(|err| format!("task runtime start failed: {err}"))?;
        let service = TaskService::open(&db_path)
            .map_err(|err| format!("task store open failed: {err}"))?;
        log::info!(
            "event=store_init module=ffi status=ok db_path={}",
            db_path.display()
        );
        Ok(Self {
            db_path,
            runtime,
            service,
        })
    }
}

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Sync call; may perform small file-system setup work.
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Reconfiguration attempts with different level or directory return error.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Task projection returned to the UI layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskItem {
    /// Stable task id.
    pub id: i64,
    /// Task title as stored (trimmed).
    pub title: String,
    /// Completion flag.
    pub is_done: bool,
    /// Creation instant in epoch milliseconds.
    pub created_at: i64,
    /// Symbolic priority name (`HIGH|NORMAL|LOW`).
    pub priority: String,
    /// Display label for the priority.
    pub priority_label: String,
    /// Symbolic color token for the priority.
    pub priority_color: String,
    /// Optional due instant in epoch milliseconds.
    pub due_date: Option<i64>,
}

/// Generic action response envelope for task command flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskActionResponse {
    /// Whether the operation succeeded.
    pub ok: bool,
    /// Id of the task the operation created or changed; `None` when no row
    /// changed.
    pub task_id: Option<i64>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl TaskActionResponse {
    fn success(message: impl Into<String>, task_id: Option<TaskId>) -> Self {
        Self {
            ok: true,
            task_id,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            task_id: None,
            message: message.into(),
        }
    }
}

/// List response envelope for task query flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskListResponse {
    /// Tasks ordered by ascending id (empty on failure).
    pub items: Vec<TaskItem>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

/// Binds the process-wide task store to a database path and starts it.
///
/// Path resolution: explicit `db_path`, then the `TODOPAD_DB_PATH`
/// environment variable, then a file in the system temp directory.
///
/// # FFI contract
/// - Sync call; opens the database and runs pending migrations.
/// - Idempotent for the same resolved path; switching paths is rejected.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn store_init(db_path: Option<String>) -> TaskActionResponse {
    let resolved = resolve_db_path(db_path);
    let store = match STORE.get_or_try_init(|| Store::open(resolved.clone())) {
        Ok(store) => store,
        Err(err) => return TaskActionResponse::failure(format!("store_init failed: {err}")),
    };

    if store.db_path != resolved {
        return TaskActionResponse::failure(format!(
            "store already open at `{}`; refusing to switch to `{}`",
            store.db_path.display(),
            resolved.display()
        ));
    }

    TaskActionResponse::success("Store ready.", None)
}

/// Adds a task. `priority` is a symbolic name (`HIGH|NORMAL|LOW`); `None`
/// means `NORMAL`.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Blank titles and unknown priority names come back as `ok=false`
///   without storing anything.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn task_add(title: String, priority: Option<String>) -> TaskActionResponse {
    let priority = match priority {
        Some(name) => match parse_priority(&name) {
            Some(priority) => priority,
            None => {
                return TaskActionResponse::failure(format!(
                    "unknown priority `{name}`; expected HIGH|NORMAL|LOW"
                ));
            }
        },
        None => Priority::default(),
    };

    let outcome = run_store_op(|store| {
        store
            .runtime
            .block_on(store.service.add_task_with_priority(title.as_str(), priority))
    });
    match outcome {
        Ok(Some(id)) => TaskActionResponse::success("Task created.", Some(id)),
        Ok(None) => TaskActionResponse::failure("task_add ignored blank title"),
        Err(err) => TaskActionResponse::failure(format!("task_add failed: {err}")),
    }
}

/// Lists all tasks ordered by ascending id.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics; failures return an empty list with a message.
#[flutter_rust_bridge::frb(sync)]
pub fn task_list() -> TaskListResponse {
    match run_store_op(|store| store.runtime.block_on(store.service.list_tasks())) {
        Ok(tasks) => {
            let items = tasks.iter().map(to_task_item).collect::<Vec<_>>();
            let message = if items.is_empty() {
                "No tasks.".to_string()
            } else {
                format!("{} task(s).", items.len())
            };
            TaskListResponse { items, message }
        }
        Err(err) => TaskListResponse {
            items: Vec::new(),
            message: format!("task_list failed: {err}"),
        },
    }
}

/// Fetches one task by id. The response carries zero or one item.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - A missing id is not an error; the list is empty and the message says so.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn task_get(id: i64) -> TaskListResponse {
    match run_store_op(|store| store.runtime.block_on(store.service.get_task_by_id(id))) {
        Ok(Some(task)) => TaskListResponse {
            items: vec![to_task_item(&task)],
            message: "Found.".to_string(),
        },
        Ok(None) => TaskListResponse {
            items: Vec::new(),
            message: format!("No task with id {id}."),
        },
        Err(err) => TaskListResponse {
            items: Vec::new(),
            message: format!("task_get failed: {err}"),
        },
    }
}

/// Flips the done flag of a task.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - A missing id is a silent no-op: `ok=true` with `task_id=None`.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn task_toggle_done(id: i64) -> TaskActionResponse {
    match run_store_op(|store| store.runtime.block_on(store.service.toggle_task_done(id))) {
        Ok(true) => TaskActionResponse::success(format!("Task {id} toggled."), Some(id)),
        Ok(false) => changed_nothing(id),
        Err(err) => TaskActionResponse::failure(format!("task_toggle_done failed: {err}")),
    }
}

/// Deletes a task by id.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - A missing id is a silent no-op: `ok=true` with `task_id=None`.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn task_delete(id: i64) -> TaskActionResponse {
    match run_store_op(|store| store.runtime.block_on(store.service.delete_task(id))) {
        Ok(true) => TaskActionResponse::success(format!("Task {id} deleted."), Some(id)),
        Ok(false) => changed_nothing(id),
        Err(err) => TaskActionResponse::failure(format!("task_delete failed: {err}")),
    }
}

/// Renames a task. The stored title is the trimmed input.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - A blank new title comes back as `ok=false` without touching the row.
/// - A missing id is a silent no-op: `ok=true` with `task_id=None`.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn task_rename(id: i64, new_title: String) -> TaskActionResponse {
    if new_title.trim().is_empty() {
        return TaskActionResponse::failure("task_rename ignored blank title");
    }

    let outcome = run_store_op(|store| {
        store
            .runtime
            .block_on(store.service.update_task_title(id, new_title.as_str()))
    });
    match outcome {
        Ok(true) => TaskActionResponse::success(format!("Task {id} renamed."), Some(id)),
        Ok(false) => changed_nothing(id),
        Err(err) => TaskActionResponse::failure(format!("task_rename failed: {err}")),
    }
}

/// Reassigns a task's priority by symbolic name (`HIGH|NORMAL|LOW`).
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Unknown priority names come back as `ok=false`, never as a default.
/// - A missing id is a silent no-op: `ok=true` with `task_id=None`.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn task_set_priority(id: i64, priority: String) -> TaskActionResponse {
    let Some(parsed) = parse_priority(&priority) else {
        return TaskActionResponse::failure(format!(
            "unknown priority `{priority}`; expected HIGH|NORMAL|LOW"
        ));
    };

    let outcome =
        run_store_op(|store| store.runtime.block_on(store.service.update_task_priority(id, parsed)));
    match outcome {
        Ok(true) => TaskActionResponse::success(
            format!("Task {id} priority set to {}.", priority_to_db(parsed)),
            Some(id),
        ),
        Ok(false) => changed_nothing(id),
        Err(err) => TaskActionResponse::failure(format!("task_set_priority failed: {err}")),
    }
}

/// Sets (`Some`) or clears (`None`) a task's due date, epoch milliseconds.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - A missing id is a silent no-op: `ok=true` with `task_id=None`.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn task_set_due_date(id: i64, due_date: Option<i64>) -> TaskActionResponse {
    let outcome = run_store_op(|store| {
        store
            .runtime
            .block_on(store.service.update_task_due_date(id, due_date))
    });
    match outcome {
        Ok(true) if due_date.is_some() => {
            TaskActionResponse::success(format!("Task {id} due date set."), Some(id))
        }
        Ok(true) => TaskActionResponse::success(format!("Task {id} due date cleared."), Some(id)),
        Ok(false) => changed_nothing(id),
        Err(err) => TaskActionResponse::failure(format!("task_set_due_date failed: {err}")),
    }
}

fn changed_nothing(id: i64) -> TaskActionResponse {
    TaskActionResponse::success(format!("No task with id {id}; nothing changed."), None)
}

fn resolve_db_path(explicit: Option<String>) -> PathBuf {
    if let Some(raw) = explicit {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }
    if let Ok(raw) = std::env::var("TODOPAD_DB_PATH") {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }
    std::env::temp_dir().join(TASKS_DB_FILE_NAME)
}

fn store() -> Result<&'static Store, String> {
    STORE.get_or_try_init(|| Store::open(resolve_db_path(None)))
}

fn run_store_op<T>(f: impl FnOnce(&Store) -> RepoResult<T>) -> Result<T, String> {
    let store = store()?;
    f(store).map_err(|err| err.to_string())
}

fn to_task_item(task: &Task) -> TaskItem {
    TaskItem {
        id: task.id,
        title: task.title.clone(),
        is_done: task.is_done,
        created_at: task.created_at,
        priority: priority_to_db(task.priority).to_string(),
        priority_label: task.priority.label().to_string(),
        priority_color: task.priority.color_token().to_string(),
        due_date: task.due_date,
    }
}
