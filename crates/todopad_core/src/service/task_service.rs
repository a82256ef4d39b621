//! Task use-case service (the app-facing view-model seam).
//!
//! # Responsibility
//! - Provide stable task operations for UI-facing callers.
//! - Normalize user input (trimming, blank rejection) before persistence.
//! - Delegate storage to the async task repository.
//!
//! # Invariants
//! - Titles reach storage trimmed and never blank.
//! - Read-modify-write operations resolve against the stored row at the
//!   moment the write command is applied; concurrent edits of the same
//!   task are last-writer-wins.

use crate::model::task::{Priority, Task, TaskId};
use crate::repo::task_dao::RepoResult;
use crate::repo::task_repo::{TaskListStream, TaskRepository};
use std::path::Path;

/// Use-case service wrapper for task CRUD operations.
pub struct TaskService {
    repo: TaskRepository,
}

impl TaskService {
    /// Creates a service over an already running repository.
    pub fn new(repo: TaskRepository) -> Self {
        Self { repo }
    }

    /// Opens (and migrates) the database at `path` and starts a service
    /// over it.
    pub fn open(path: &Path) -> RepoResult<Self> {
        Ok(Self::new(TaskRepository::open(path)?))
    }

    /// In-memory variant of [`TaskService::open`], used by tests and smoke
    /// probes.
    pub fn open_in_memory() -> RepoResult<Self> {
        Ok(Self::new(TaskRepository::open_in_memory()?))
    }

    /// Returns a watcher over the task list, primed with the current list.
    pub fn tasks(&self) -> TaskListStream {
        self.repo.observe_all()
    }

    /// Reads all stored tasks ordered by ascending id.
    pub async fn list_tasks(&self) -> RepoResult<Vec<Task>> {
        self.repo.list_all().await
    }

    /// Adds a task at [`Priority::Normal`].
    ///
    /// See [`TaskService::add_task_with_priority`] for the input contract.
    pub async fn add_task(&self, title: impl Into<String>) -> RepoResult<Option<TaskId>> {
        self.add_task_with_priority(title, Priority::default()).await
    }

    /// Adds a task with an explicit priority.
    ///
    /// # Contract
    /// - Blank input (empty or whitespace-only) stores nothing and returns
    ///   `Ok(None)`; watchers observe no change.
    /// - Otherwise the trimmed title is stored and the assigned id returned.
    pub async fn add_task_with_priority(
        &self,
        title: impl Into<String>,
        priority: Priority,
    ) -> RepoResult<Option<TaskId>> {
        let title = title.into();
        let task = Task::new(title.trim(), priority);
        if task.validate().is_err() {
            return Ok(None);
        }

        let id = self.repo.insert_task(task).await?;
        Ok(Some(id))
    }

    /// Flips the done flag of the stored task.
    ///
    /// # Contract
    /// - Missing id is a silent no-op (`Ok(false)`), never an error.
    pub async fn toggle_task_done(&self, id: TaskId) -> RepoResult<bool> {
        match self.repo.get_task(id).await? {
            Some(task) => {
                let done = !task.is_done;
                self.repo.update_task(task.with_done(done)).await
            }
            None => Ok(false),
        }
    }

    /// Deletes the task with the given id.
    ///
    /// # Contract
    /// - Missing id is a silent no-op (`Ok(false)`), never an error.
    pub async fn delete_task(&self, id: TaskId) -> RepoResult<bool> {
        self.repo.delete_task(id).await
    }

    /// Renames the stored task.
    ///
    /// # Contract
    /// - Blank new title leaves the stored row untouched (`Ok(false)`).
    /// - Missing id is a silent no-op (`Ok(false)`).
    /// - The stored title is the trimmed input.
    pub async fn update_task_title(
        &self,
        id: TaskId,
        new_title: impl Into<String>,
    ) -> RepoResult<bool> {
        let new_title = new_title.into();
        let trimmed = new_title.trim();
        if trimmed.is_empty() {
            return Ok(false);
        }

        match self.repo.get_task(id).await? {
            Some(task) => self.repo.update_task(task.with_title(trimmed)).await,
            None => Ok(false),
        }
    }

    /// Reassigns the stored task's priority.
    pub async fn update_task_priority(&self, id: TaskId, priority: Priority) -> RepoResult<bool> {
        match self.repo.get_task(id).await? {
            Some(task) => self.repo.update_task(task.with_priority(priority)).await,
            None => Ok(false),
        }
    }

    /// Sets or clears (`None`) the stored task's due date.
    pub async fn update_task_due_date(
        &self,
        id: TaskId,
        due_date: Option<i64>,
    ) -> RepoResult<bool> {
        match self.repo.get_task(id).await? {
            Some(task) => self.repo.update_task(task.with_due_date(due_date)).await,
            None => Ok(false),
        }
    }

    /// Point lookup by id.
    pub async fn get_task_by_id(&self, id: TaskId) -> RepoResult<Option<Task>> {
        self.repo.get_task(id).await
    }
}
