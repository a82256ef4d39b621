//! Domain model for the to-do core.
//!
//! # Responsibility
//! - Define the canonical data structures used by core business logic.
//! - Keep domain values free of storage and UI concerns.
//!
//! # Invariants
//! - Tasks are value types replaced wholesale on mutation; no partial
//!   in-place field updates cross this boundary.
//! - Deletion is permanent; there is no tombstone state.

pub mod task;
