//! Flutter-facing bindings for the TodoPad core.

pub mod api;
