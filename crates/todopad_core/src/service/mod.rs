//! Use-case services layered over the storage access layer.
//!
//! # Responsibility
//! - Host the app-facing task operations (input normalization plus
//!   repository delegation).

pub mod task_service;

pub use task_service::TaskService;
