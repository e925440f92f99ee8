//! Shared application state.

use std::sync::Arc;

use gamehub_core::clock::Clock;
use gamehub_core::repository::AchievementRepository;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Time source for progress writes.
    pub clock: Arc<dyn Clock + Send + Sync>,
    /// Achievement and progress storage.
    pub repository: Arc<dyn AchievementRepository>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock + Send + Sync>,
        repository: Arc<dyn AchievementRepository>,
    ) -> Self {
        Self { clock, repository }
    }
}
