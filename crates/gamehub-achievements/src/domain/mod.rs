//! Domain layer for the Achievements & Progress context.

pub mod commands;
pub mod definition;
pub mod leaderboard;
pub mod progress;
pub mod requirement;
