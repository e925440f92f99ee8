//! Query handlers for the Achievements & Progress context.
//!
//! This module contains query handlers that read the catalog and progress
//! rows and return read-only view DTOs.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use gamehub_core::error::DomainError;
use gamehub_core::repository::{AchievementRepository, StoredProgress, UserProgressEntry};
use serde::Serialize;

use crate::domain::definition::{AchievementDefinition, Category, Rarity};
use crate::domain::leaderboard::{self, LeaderboardEntry};
use crate::domain::progress::progress_percentage;

/// Default number of leaderboard lines.
pub const DEFAULT_LEADERBOARD_LIMIT: i64 = 10;
/// Largest accepted leaderboard limit.
pub const MAX_LEADERBOARD_LIMIT: i64 = 100;

/// Read-only view of a catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AchievementView {
    /// The achievement identifier.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Display description.
    pub description: String,
    /// Optional icon location.
    pub icon_url: Option<String>,
    /// Catalog grouping.
    pub category: Category,
    /// Rarity tier.
    pub rarity: Rarity,
    /// Points awarded on completion.
    pub points: i32,
    /// Requirement kind tag.
    pub requirement_type: String,
    /// Completion threshold.
    pub requirement_value: i32,
    /// Game the achievement is restricted to.
    pub game_id: Option<i64>,
    /// Listing tie-break.
    pub display_order: i32,
    /// Row creation time.
    pub created_at: DateTime<Utc>,
    /// Last administrative edit.
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<AchievementDefinition> for AchievementView {
    fn from(d: AchievementDefinition) -> Self {
        Self {
            id: d.id,
            name: d.name,
            description: d.description,
            icon_url: d.icon_url,
            category: d.category,
            rarity: d.rarity,
            points: d.points,
            requirement_type: d.requirement.as_str().to_owned(),
            requirement_value: d.requirement_value,
            game_id: d.game_id,
            display_order: d.display_order,
            created_at: d.created_at,
            updated_at: d.updated_at,
        }
    }
}

/// One of a user's achievements with its definition details.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserAchievementView {
    /// The progress row identifier.
    pub id: i64,
    /// The achievement identifier.
    pub achievement_id: i64,
    /// Completion time, or creation time while incomplete.
    pub earned_at: DateTime<Utc>,
    /// Current progress value.
    pub current_progress: i32,
    /// Whether the achievement is completed.
    pub is_completed: bool,
    /// Achievement name.
    pub achievement_name: String,
    /// Achievement description.
    pub achievement_description: String,
    /// Achievement icon.
    pub achievement_icon_url: Option<String>,
    /// Achievement category.
    pub achievement_category: Category,
    /// Achievement rarity.
    pub achievement_rarity: Rarity,
    /// Achievement points.
    pub achievement_points: i32,
    /// Completion threshold.
    pub requirement_value: i32,
}

/// A user's achievements plus aggregate totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserAchievementsView {
    /// Rows, newest `earned_at` first.
    pub achievements: Vec<UserAchievementView>,
    /// Sum of points over completed rows.
    pub total_points: i64,
    /// Number of completed rows.
    pub completed_count: usize,
    /// Number of rows still in progress.
    pub in_progress_count: usize,
}

/// A user's progress toward one achievement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressView {
    /// The progress row identifier; absent when the user has no row yet.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// The user.
    pub user_id: i64,
    /// The achievement.
    pub achievement_id: i64,
    /// Current progress value.
    pub current_progress: i32,
    /// Whether the achievement is completed.
    pub is_completed: bool,
    /// Whether the completion was notified.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_notified: Option<bool>,
    /// Completion or creation time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub earned_at: Option<DateTime<Utc>>,
    /// `current / requirement × 100`, capped at 100, two decimals.
    pub progress_percentage: f64,
}

/// Achievement statistics for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserStatsView {
    /// Rows the user has, completed or not.
    pub total_achievements: usize,
    /// Completed rows.
    pub completed_achievements: usize,
    /// Sum of points over completed rows.
    pub total_points: i64,
    /// Completed rows per rarity.
    pub rarity_breakdown: BTreeMap<Rarity, usize>,
}

/// A completed achievement the user has not been told about.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnnotifiedAchievementView {
    /// The progress row identifier (used to mark it notified).
    pub id: i64,
    /// The achievement identifier.
    pub achievement_id: i64,
    /// Completion time.
    pub earned_at: DateTime<Utc>,
    /// Achievement name.
    pub achievement_name: String,
    /// Achievement description.
    pub achievement_description: String,
    /// Achievement points.
    pub achievement_points: i32,
    /// Achievement rarity.
    pub achievement_rarity: Rarity,
    /// Achievement icon.
    pub achievement_icon_url: Option<String>,
}

fn definitions(
    rows: Vec<gamehub_core::repository::StoredAchievement>,
) -> Result<Vec<AchievementView>, DomainError> {
    rows.into_iter()
        .map(|row| AchievementDefinition::try_from(row).map(AchievementView::from))
        .collect()
}

fn joined(
    entries: Vec<UserProgressEntry>,
) -> Result<Vec<(StoredProgress, AchievementDefinition)>, DomainError> {
    entries
        .into_iter()
        .map(|entry| Ok((entry.progress, AchievementDefinition::try_from(entry.achievement)?)))
        .collect()
}

/// Lists the active catalog ordered by display order, then name.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if the repository fails or a stored
/// row is corrupt.
pub async fn list_achievements(
    repo: &dyn AchievementRepository,
) -> Result<Vec<AchievementView>, DomainError> {
    definitions(repo.list_active_achievements().await?)
}

/// Retrieves one active achievement.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the achievement is missing or inactive.
/// Returns `DomainError::Infrastructure` if the repository fails.
pub async fn get_achievement_by_id(
    id: i64,
    repo: &dyn AchievementRepository,
) -> Result<AchievementView, DomainError> {
    let stored = repo
        .find_achievement(id)
        .await?
        .filter(|a| a.is_active)
        .ok_or_else(|| DomainError::achievement_not_found(id))?;
    Ok(AchievementDefinition::try_from(stored)?.into())
}

/// Lists the active catalog entries of one category.
///
/// # Errors
///
/// Returns `DomainError::Validation` for an unknown category.
/// Returns `DomainError::Infrastructure` if the repository fails.
pub async fn list_achievements_by_category(
    category: &str,
    repo: &dyn AchievementRepository,
) -> Result<Vec<AchievementView>, DomainError> {
    let category: Category = category.parse()?;
    definitions(
        repo.list_active_achievements_by_category(category.as_str())
            .await?,
    )
}

/// Retrieves a user's achievements with completed/in-progress totals.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if the repository fails.
pub async fn get_user_achievements(
    user_id: i64,
    repo: &dyn AchievementRepository,
) -> Result<UserAchievementsView, DomainError> {
    let rows = joined(repo.list_user_progress(user_id).await?)?;

    let total_points = rows
        .iter()
        .filter(|(p, _)| p.is_completed)
        .map(|(_, d)| i64::from(d.points))
        .sum();
    let completed_count = rows.iter().filter(|(p, _)| p.is_completed).count();

    let achievements = rows
        .into_iter()
        .map(|(p, d)| UserAchievementView {
            id: p.id,
            achievement_id: p.achievement_id,
            earned_at: p.earned_at,
            current_progress: p.current_progress,
            is_completed: p.is_completed,
            achievement_name: d.name,
            achievement_description: d.description,
            achievement_icon_url: d.icon_url,
            achievement_category: d.category,
            achievement_rarity: d.rarity,
            achievement_points: d.points,
            requirement_value: d.requirement_value,
        })
        .collect::<Vec<_>>();

    Ok(UserAchievementsView {
        in_progress_count: achievements.len() - completed_count,
        achievements,
        total_points,
        completed_count,
    })
}

/// Retrieves a user's progress toward one achievement with a percentage.
///
/// A user without a row gets zero progress rather than an error.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if the repository fails.
pub async fn get_user_progress(
    user_id: i64,
    achievement_id: i64,
    repo: &dyn AchievementRepository,
) -> Result<ProgressView, DomainError> {
    let Some(row) = repo.find_progress(user_id, achievement_id).await? else {
        return Ok(ProgressView {
            id: None,
            user_id,
            achievement_id,
            current_progress: 0,
            is_completed: false,
            is_notified: None,
            earned_at: None,
            progress_percentage: 0.0,
        });
    };

    let requirement_value = repo
        .find_achievement(achievement_id)
        .await?
        .map(|a| a.requirement_value);

    Ok(ProgressView {
        id: Some(row.id),
        user_id,
        achievement_id,
        current_progress: row.current_progress,
        is_completed: row.is_completed,
        is_notified: Some(row.is_notified),
        earned_at: Some(row.earned_at),
        progress_percentage: progress_percentage(row.current_progress, requirement_value),
    })
}

/// Ranks users by points over completed achievements.
///
/// Only the first `limit` completions are read before grouping, so totals
/// reflect that sample rather than each user's full history.
///
/// # Errors
///
/// Returns `DomainError::Validation` if `limit` is outside `1..=100`.
/// Returns `DomainError::Infrastructure` if the repository fails.
pub async fn get_leaderboard(
    limit: i64,
    repo: &dyn AchievementRepository,
) -> Result<Vec<LeaderboardEntry>, DomainError> {
    if !(1..=MAX_LEADERBOARD_LIMIT).contains(&limit) {
        return Err(DomainError::Validation(format!(
            "invalid limit parameter: {limit} (expected 1..={MAX_LEADERBOARD_LIMIT})"
        )));
    }
    let completions = repo.list_completed(limit).await?;
    let lines = usize::try_from(limit)
        .map_err(|_| DomainError::Validation(format!("invalid limit parameter: {limit}")))?;
    Ok(leaderboard::rank(&completions, lines))
}

/// Aggregates a user's achievement statistics.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if the repository fails.
pub async fn get_user_stats(
    user_id: i64,
    repo: &dyn AchievementRepository,
) -> Result<UserStatsView, DomainError> {
    let rows = joined(repo.list_user_progress(user_id).await?)?;

    let mut stats = UserStatsView {
        total_achievements: rows.len(),
        completed_achievements: 0,
        total_points: 0,
        rarity_breakdown: BTreeMap::new(),
    };
    for (_, definition) in rows.iter().filter(|(p, _)| p.is_completed) {
        stats.completed_achievements += 1;
        stats.total_points += i64::from(definition.points);
        *stats.rarity_breakdown.entry(definition.rarity).or_insert(0) += 1;
    }
    Ok(stats)
}

/// Lists a user's completed achievements that have not been notified yet.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if the repository fails.
pub async fn get_unnotified_achievements(
    user_id: i64,
    repo: &dyn AchievementRepository,
) -> Result<Vec<UnnotifiedAchievementView>, DomainError> {
    Ok(joined(repo.list_unnotified_completions(user_id).await?)?
        .into_iter()
        .map(|(p, d)| UnnotifiedAchievementView {
            id: p.id,
            achievement_id: p.achievement_id,
            earned_at: p.earned_at,
            achievement_name: d.name,
            achievement_description: d.description,
            achievement_points: d.points,
            achievement_rarity: d.rarity,
            achievement_icon_url: d.icon_url,
        })
        .collect())
}
