//! Gamehub: Achievements & Progress bounded context.
//!
//! Responsible for the achievement catalog, evaluating user events against
//! requirement policies, persisting per-user progress, and the read models
//! built on top of it (user summaries, statistics, leaderboard).

pub mod application;
pub mod domain;
