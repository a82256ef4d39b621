//! Storage access layer for tasks.
//!
//! # Responsibility
//! - Define the data-access contract over the `tasks` table
//!   ([`task_dao::TaskDao`]) and its SQLite implementation.
//! - Run the async repository worker that owns the connection and feeds
//!   the observable task list ([`task_repo::TaskRepository`]).

pub mod task_dao;
pub mod task_repo;

pub use task_dao::{RepoError, RepoResult, SqliteTaskDao, TaskDao};
pub use task_repo::{TaskListStream, TaskRepository};
