//! Route modules.

pub mod achievements;
pub mod health;
