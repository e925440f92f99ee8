//! Application layer for the Achievements & Progress context.

pub mod command_handlers;
pub mod query_handlers;
