//! Async task repository with an observable task list.
//!
//! # Responsibility
//! - Own the SQLite connection on a dedicated worker thread.
//! - Expose async CRUD calls that forward to [`crate::repo::task_dao`].
//! - Republish the full task list to watchers after every effective write.
//!
//! # Invariants
//! - Commands are applied strictly in arrival order; read-modify-write
//!   sequences issued concurrently may interleave, and the last write wins.
//! - Watchers always hold a complete snapshot, never a diff.
//! - Snapshots are refreshed only by writes that changed stored state.

use crate::db;
use crate::db::row::TaskRow;
use crate::model::task::{Task, TaskId};
use crate::repo::task_dao::{RepoError, RepoResult, SqliteTaskDao, TaskDao};
use rusqlite::Connection;
use std::path::Path;
use std::thread::{self, JoinHandle};
use tokio::sync::{mpsc, oneshot, watch};

enum Command {
    ListAll {
        reply: oneshot::Sender<RepoResult<Vec<Task>>>,
    },
    Insert {
        task: Task,
        reply: oneshot::Sender<RepoResult<TaskId>>,
    },
    Update {
        task: Task,
        reply: oneshot::Sender<RepoResult<bool>>,
    },
    DeleteById {
        id: TaskId,
        reply: oneshot::Sender<RepoResult<bool>>,
    },
    GetById {
        id: TaskId,
        reply: oneshot::Sender<RepoResult<Option<Task>>>,
    },
    Shutdown,
}

/// Handle on the task store. Cheap to call from async contexts; all storage
/// work happens on the worker thread.
#[derive(Debug)]
pub struct TaskRepository {
    commands: mpsc::UnboundedSender<Command>,
    snapshot_rx: watch::Receiver<Vec<Task>>,
    worker: Option<JoinHandle<()>>,
}

impl TaskRepository {
    /// Opens (and migrates) the database at `path` and starts the store
    /// worker.
    ///
    /// # Errors
    /// Fails when the database cannot be opened or migrated, or when stored
    /// rows do not parse into tasks.
    pub fn open(path: &Path) -> RepoResult<Self> {
        Self::with_connection(db::open_db(path)?)
    }

    /// In-memory variant of [`TaskRepository::open`], used by tests and
    /// smoke probes.
    pub fn open_in_memory() -> RepoResult<Self> {
        Self::with_connection(db::open_db_in_memory()?)
    }

    /// Wraps an already opened connection. The connection must have been
    /// migrated; readiness is verified before the worker starts.
    pub fn with_connection(conn: Connection) -> RepoResult<Self> {
        let initial = load_tasks(&conn)?;
        let (snapshot_tx, snapshot_rx) = watch::channel(initial);
        let (commands, command_rx) = mpsc::unbounded_channel();

        let worker = thread::spawn(move || {
            StoreWorker { conn, snapshot_tx }.run(command_rx);
        });
        log::info!("event=store_start module=repo status=ok");

        Ok(Self {
            commands,
            snapshot_rx,
            worker: Some(worker),
        })
    }

    /// Returns a watcher over the task list. The watcher starts out holding
    /// the current list, with no change pending.
    pub fn observe_all(&self) -> TaskListStream {
        let mut rx = self.snapshot_rx.clone();
        rx.mark_unchanged();
        TaskListStream { rx }
    }

    /// All stored tasks ordered by ascending id.
    pub async fn list_all(&self) -> RepoResult<Vec<Task>> {
        let (reply, response) = oneshot::channel();
        self.send(Command::ListAll { reply })?;
        await_reply(response).await
    }

    /// Stores a new task and returns its assigned id. `task.id` is ignored.
    pub async fn insert_task(&self, task: Task) -> RepoResult<TaskId> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Insert { task, reply })?;
        await_reply(response).await
    }

    /// Replaces the stored row matching `task.id` with the given state.
    /// Returns `false` when no such row exists.
    pub async fn update_task(&self, task: Task) -> RepoResult<bool> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Update { task, reply })?;
        await_reply(response).await
    }

    /// Deletes by id. Returns `false` when no such row exists.
    pub async fn delete_task(&self, id: TaskId) -> RepoResult<bool> {
        let (reply, response) = oneshot::channel();
        self.send(Command::DeleteById { id, reply })?;
        await_reply(response).await
    }

    /// Point lookup by id.
    pub async fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        let (reply, response) = oneshot::channel();
        self.send(Command::GetById { id, reply })?;
        await_reply(response).await
    }

    fn send(&self, command: Command) -> RepoResult<()> {
        self.commands
            .send(command)
            .map_err(|_| RepoError::StoreClosed)
    }
}

impl Drop for TaskRepository {
    fn drop(&mut self) {
        let _ = self.commands.send(Command::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

async fn await_reply<T>(response: oneshot::Receiver<RepoResult<T>>) -> RepoResult<T> {
    response.await.map_err(|_| RepoError::StoreClosed)?
}

/// Watcher over the stored task list. Cloning yields an independent
/// subscriber at the same position.
#[derive(Clone)]
pub struct TaskListStream {
    rx: watch::Receiver<Vec<Task>>,
}

impl TaskListStream {
    /// The most recently published list.
    pub fn snapshot(&self) -> Vec<Task> {
        self.rx.borrow().clone()
    }

    /// Waits until a new list has been published, then returns `true`.
    /// Returns `false` once the repository has shut down. Intermediate
    /// snapshots may be conflated; [`TaskListStream::snapshot`] always
    /// reads the latest one.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }

    /// Whether a snapshot newer than the last one seen is available.
    pub fn has_pending_update(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }
}

struct StoreWorker {
    conn: Connection,
    snapshot_tx: watch::Sender<Vec<Task>>,
}

impl StoreWorker {
    fn run(self, mut commands: mpsc::UnboundedReceiver<Command>) {
        while let Some(command) = commands.blocking_recv() {
            match command {
                Command::ListAll { reply } => {
                    let _ = reply.send(load_tasks(&self.conn));
                }
                Command::Insert { task, reply } => {
                    let outcome = self.insert(&task);
                    if outcome.is_ok() {
                        self.publish_snapshot();
                    }
                    let _ = reply.send(outcome);
                }
                Command::Update { task, reply } => {
                    let outcome = self.update(&task);
                    if matches!(outcome, Ok(true)) {
                        self.publish_snapshot();
                    }
                    let _ = reply.send(outcome);
                }
                Command::DeleteById { id, reply } => {
                    let outcome = self.delete(id);
                    if matches!(outcome, Ok(true)) {
                        self.publish_snapshot();
                    }
                    let _ = reply.send(outcome);
                }
                Command::GetById { id, reply } => {
                    let _ = reply.send(self.get(id));
                }
                Command::Shutdown => break,
            }
        }
        log::info!("event=store_stop module=repo status=ok");
    }

    fn insert(&self, task: &Task) -> RepoResult<TaskId> {
        let dao = SqliteTaskDao::try_new(&self.conn)?;
        dao.insert(&TaskRow::from_task(task))
    }

    fn update(&self, task: &Task) -> RepoResult<bool> {
        let dao = SqliteTaskDao::try_new(&self.conn)?;
        dao.update(&TaskRow::from_task(task))
    }

    fn delete(&self, id: TaskId) -> RepoResult<bool> {
        let dao = SqliteTaskDao::try_new(&self.conn)?;
        dao.delete_by_id(id)
    }

    fn get(&self, id: TaskId) -> RepoResult<Option<Task>> {
        let dao = SqliteTaskDao::try_new(&self.conn)?;
        match dao.get_by_id(id)? {
            Some(row) => Ok(Some(row.into_task()?)),
            None => Ok(None),
        }
    }

    fn publish_snapshot(&self) {
        match load_tasks(&self.conn) {
            Ok(tasks) => {
                let _ = self.snapshot_tx.send(tasks);
            }
            Err(err) => {
                log::warn!("event=snapshot_refresh module=repo status=error error={err}");
            }
        }
    }
}

fn load_tasks(conn: &Connection) -> RepoResult<Vec<Task>> {
    let dao = SqliteTaskDao::try_new(conn)?;
    let rows = dao.list_all()?;

    let mut tasks = Vec::with_capacity(rows.len());
    for row in rows {
        tasks.push(row.into_task()?);
    }

    Ok(tasks)
}
