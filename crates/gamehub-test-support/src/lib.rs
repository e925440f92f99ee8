//! Shared test mocks and utilities for the gamehub achievements backend.

mod clock;
mod fixtures;
mod repository;

pub use clock::FixedClock;
pub use fixtures::{fixed_time, stored_achievement};
pub use repository::{
    FailingAchievementRepository, InMemoryAchievementRepository, RacingAchievementRepository,
};
