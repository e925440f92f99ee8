//! Achievement repository abstraction.
//!
//! The row types here are the storage representation: enumerations such as
//! category, rarity, and requirement type travel as plain strings and are
//! interpreted by the achievements context.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::DomainError;

/// Stored representation of an achievement definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAchievement {
    /// Primary key.
    pub id: i64,
    /// Row creation time.
    pub created_at: DateTime<Utc>,
    /// Last administrative edit, if any.
    pub updated_at: Option<DateTime<Utc>>,
    /// Display name.
    pub name: String,
    /// Display description.
    pub description: String,
    /// Optional icon location.
    pub icon_url: Option<String>,
    /// Category tag (`social`, `gaming`, ...).
    pub category: String,
    /// Rarity tag (`common`, `rare`, ...).
    pub rarity: String,
    /// Requirement kind selecting the progress policy.
    pub requirement_type: String,
    /// Threshold at which the achievement completes.
    pub requirement_value: i32,
    /// Points awarded on completion.
    pub points: i32,
    /// Inactive definitions are hidden from catalog and evaluator.
    pub is_active: bool,
    /// Restricts the definition to events for this game.
    pub game_id: Option<i64>,
    /// Listing tie-break.
    pub display_order: i32,
}

/// Stored representation of a user's progress toward one achievement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredProgress {
    /// Primary key.
    pub id: i64,
    /// Row creation time.
    pub created_at: DateTime<Utc>,
    /// The user the row belongs to.
    pub user_id: i64,
    /// The achievement definition the row tracks.
    pub achievement_id: i64,
    /// Completion time; creation time while incomplete.
    pub earned_at: DateTime<Utc>,
    /// Current progress value.
    pub current_progress: i32,
    /// Whether the achievement is completed.
    pub is_completed: bool,
    /// Whether the user has been told about the completion.
    pub is_notified: bool,
    /// Optimistic-concurrency counter, bumped on every write.
    pub version: i64,
}

/// Values for a progress row that does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProgress {
    /// The user the row belongs to.
    pub user_id: i64,
    /// The achievement definition the row tracks.
    pub achievement_id: i64,
    /// Initial progress value.
    pub current_progress: i32,
    /// Initial completion flag.
    pub is_completed: bool,
    /// Used as both `created_at` and `earned_at`.
    pub now: DateTime<Utc>,
}

/// Values written over an existing progress row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressUpdate {
    /// New progress value.
    pub current_progress: i32,
    /// New completion flag.
    pub is_completed: bool,
    /// New `earned_at`.
    pub earned_at: DateTime<Utc>,
    /// New notification flag; `None` leaves it untouched.
    pub is_notified: Option<bool>,
}

/// A progress row joined with its achievement definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProgressEntry {
    /// The progress row.
    pub progress: StoredProgress,
    /// The definition it tracks.
    pub achievement: StoredAchievement,
}

/// One completed progress row with the points of its definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletedEntry {
    /// The progress row id.
    pub progress_id: i64,
    /// The user who completed the achievement.
    pub user_id: i64,
    /// Points of the completed achievement.
    pub points: i32,
}

/// Repository trait for achievement definitions and per-user progress.
#[async_trait]
pub trait AchievementRepository: Send + Sync {
    /// Active definitions ordered by `display_order`, then `name`.
    async fn list_active_achievements(&self) -> Result<Vec<StoredAchievement>, DomainError>;

    /// Active definitions of one category, same ordering as the catalog.
    async fn list_active_achievements_by_category(
        &self,
        category: &str,
    ) -> Result<Vec<StoredAchievement>, DomainError>;

    /// Load a definition by id regardless of its active flag.
    async fn find_achievement(&self, id: i64) -> Result<Option<StoredAchievement>, DomainError>;

    /// Active definitions whose requirement type equals `requirement_type`.
    async fn active_achievements_for_requirement(
        &self,
        requirement_type: &str,
    ) -> Result<Vec<StoredAchievement>, DomainError>;

    /// Load the progress row for a (user, achievement) pair.
    async fn find_progress(
        &self,
        user_id: i64,
        achievement_id: i64,
    ) -> Result<Option<StoredProgress>, DomainError>;

    /// Insert a progress row unless one already exists for the pair.
    ///
    /// Returns `None` when another writer created the row first.
    async fn insert_progress_if_absent(
        &self,
        progress: &NewProgress,
    ) -> Result<Option<StoredProgress>, DomainError>;

    /// Overwrite a progress row.
    ///
    /// With `expected_version` set the write only succeeds if the stored
    /// version still matches, otherwise `DomainError::ConcurrencyConflict` is
    /// returned. `None` writes unconditionally.
    async fn update_progress(
        &self,
        id: i64,
        expected_version: Option<i64>,
        update: &ProgressUpdate,
    ) -> Result<StoredProgress, DomainError>;

    /// All progress rows of a user joined with their definitions, newest
    /// `earned_at` first.
    async fn list_user_progress(&self, user_id: i64)
    -> Result<Vec<UserProgressEntry>, DomainError>;

    /// The first `limit` completed rows across all users, ordered by row id.
    async fn list_completed(&self, limit: i64) -> Result<Vec<CompletedEntry>, DomainError>;

    /// Completed rows of a user that have not been notified yet.
    async fn list_unnotified_completions(
        &self,
        user_id: i64,
    ) -> Result<Vec<UserProgressEntry>, DomainError>;

    /// Set `is_notified` on the given rows; returns the number of rows touched.
    async fn mark_notified(&self, progress_ids: &[i64]) -> Result<u64, DomainError>;
}
