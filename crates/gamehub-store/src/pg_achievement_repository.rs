//! `PostgreSQL` implementation of the `AchievementRepository` trait.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::{debug, instrument};

use gamehub_core::error::DomainError;
use gamehub_core::repository::{
    AchievementRepository, CompletedEntry, NewProgress, ProgressUpdate, StoredAchievement,
    StoredProgress, UserProgressEntry,
};

const ACHIEVEMENT_COLUMNS: &str = "id, created_at, updated_at, name, description, icon_url, \
     category, rarity, requirement_type, requirement_value, points, is_active, game_id, \
     display_order";

const PROGRESS_COLUMNS: &str = "id, created_at, user_id, achievement_id, earned_at, \
     current_progress, is_completed, is_notified, version";

/// Progress columns followed by the joined definition columns, the latter
/// prefixed with `a_`.
const JOINED_COLUMNS: &str = "ua.id, ua.created_at, ua.user_id, ua.achievement_id, \
     ua.earned_at, ua.current_progress, ua.is_completed, ua.is_notified, ua.version, \
     a.id AS a_id, a.created_at AS a_created_at, a.updated_at AS a_updated_at, \
     a.name AS a_name, a.description AS a_description, a.icon_url AS a_icon_url, \
     a.category AS a_category, a.rarity AS a_rarity, \
     a.requirement_type AS a_requirement_type, a.requirement_value AS a_requirement_value, \
     a.points AS a_points, a.is_active AS a_is_active, a.game_id AS a_game_id, \
     a.display_order AS a_display_order";

fn infrastructure(err: sqlx::Error) -> DomainError {
    DomainError::Infrastructure(err.to_string())
}

fn achievement_from_row(row: &PgRow, prefix: &str) -> Result<StoredAchievement, sqlx::Error> {
    let col = |name: &str| format!("{prefix}{name}");
    Ok(StoredAchievement {
        id: row.try_get(col("id").as_str())?,
        created_at: row.try_get(col("created_at").as_str())?,
        updated_at: row.try_get(col("updated_at").as_str())?,
        name: row.try_get(col("name").as_str())?,
        description: row.try_get(col("description").as_str())?,
        icon_url: row.try_get(col("icon_url").as_str())?,
        category: row.try_get(col("category").as_str())?,
        rarity: row.try_get(col("rarity").as_str())?,
        requirement_type: row.try_get(col("requirement_type").as_str())?,
        requirement_value: row.try_get(col("requirement_value").as_str())?,
        points: row.try_get(col("points").as_str())?,
        is_active: row.try_get(col("is_active").as_str())?,
        game_id: row.try_get(col("game_id").as_str())?,
        display_order: row.try_get(col("display_order").as_str())?,
    })
}

fn progress_from_row(row: &PgRow) -> Result<StoredProgress, sqlx::Error> {
    Ok(StoredProgress {
        id: row.try_get("id")?,
        created_at: row.try_get("created_at")?,
        user_id: row.try_get("user_id")?,
        achievement_id: row.try_get("achievement_id")?,
        earned_at: row.try_get("earned_at")?,
        current_progress: row.try_get("current_progress")?,
        is_completed: row.try_get("is_completed")?,
        is_notified: row.try_get("is_notified")?,
        version: row.try_get("version")?,
    })
}

fn entry_from_row(row: &PgRow) -> Result<UserProgressEntry, sqlx::Error> {
    Ok(UserProgressEntry {
        progress: progress_from_row(row)?,
        achievement: achievement_from_row(row, "a_")?,
    })
}

fn achievements(rows: &[PgRow]) -> Result<Vec<StoredAchievement>, DomainError> {
    rows.iter()
        .map(|row| achievement_from_row(row, ""))
        .collect::<Result<_, _>>()
        .map_err(infrastructure)
}

fn entries(rows: &[PgRow]) -> Result<Vec<UserProgressEntry>, DomainError> {
    rows.iter()
        .map(entry_from_row)
        .collect::<Result<_, _>>()
        .map_err(infrastructure)
}

/// PostgreSQL-backed achievement repository.
#[derive(Debug, Clone)]
pub struct PgAchievementRepository {
    pool: PgPool,
}

impl PgAchievementRepository {
    /// Creates a new `PgAchievementRepository`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AchievementRepository for PgAchievementRepository {
    async fn list_active_achievements(&self) -> Result<Vec<StoredAchievement>, DomainError> {
        let rows = sqlx::query(&format!(
            "SELECT {ACHIEVEMENT_COLUMNS} FROM achievements \
             WHERE is_active ORDER BY display_order, name"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(infrastructure)?;
        achievements(&rows)
    }

    async fn list_active_achievements_by_category(
        &self,
        category: &str,
    ) -> Result<Vec<StoredAchievement>, DomainError> {
        let rows = sqlx::query(&format!(
            "SELECT {ACHIEVEMENT_COLUMNS} FROM achievements \
             WHERE is_active AND category = $1 ORDER BY display_order, name"
        ))
        .bind(category)
        .fetch_all(&self.pool)
        .await
        .map_err(infrastructure)?;
        achievements(&rows)
    }

    async fn find_achievement(&self, id: i64) -> Result<Option<StoredAchievement>, DomainError> {
        let row = sqlx::query(&format!(
            "SELECT {ACHIEVEMENT_COLUMNS} FROM achievements WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(infrastructure)?;
        row.map(|r| achievement_from_row(&r, ""))
            .transpose()
            .map_err(infrastructure)
    }

    async fn active_achievements_for_requirement(
        &self,
        requirement_type: &str,
    ) -> Result<Vec<StoredAchievement>, DomainError> {
        let rows = sqlx::query(&format!(
            "SELECT {ACHIEVEMENT_COLUMNS} FROM achievements \
             WHERE is_active AND requirement_type = $1 ORDER BY id"
        ))
        .bind(requirement_type)
        .fetch_all(&self.pool)
        .await
        .map_err(infrastructure)?;
        achievements(&rows)
    }

    async fn find_progress(
        &self,
        user_id: i64,
        achievement_id: i64,
    ) -> Result<Option<StoredProgress>, DomainError> {
        let row = sqlx::query(&format!(
            "SELECT {PROGRESS_COLUMNS} FROM user_achievements \
             WHERE user_id = $1 AND achievement_id = $2"
        ))
        .bind(user_id)
        .bind(achievement_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(infrastructure)?;
        row.as_ref()
            .map(progress_from_row)
            .transpose()
            .map_err(infrastructure)
    }

    #[instrument(
        skip(self, progress),
        fields(user_id = progress.user_id, achievement_id = progress.achievement_id)
    )]
    async fn insert_progress_if_absent(
        &self,
        progress: &NewProgress,
    ) -> Result<Option<StoredProgress>, DomainError> {
        let row = sqlx::query(&format!(
            "INSERT INTO user_achievements \
                 (user_id, achievement_id, current_progress, is_completed, created_at, earned_at) \
             VALUES ($1, $2, $3, $4, $5, $5) \
             ON CONFLICT (user_id, achievement_id) DO NOTHING \
             RETURNING {PROGRESS_COLUMNS}"
        ))
        .bind(progress.user_id)
        .bind(progress.achievement_id)
        .bind(progress.current_progress)
        .bind(progress.is_completed)
        .bind(progress.now)
        .fetch_optional(&self.pool)
        .await
        .map_err(infrastructure)?;

        if row.is_none() {
            debug!("progress row already exists");
        }
        row.as_ref()
            .map(progress_from_row)
            .transpose()
            .map_err(infrastructure)
    }

    #[instrument(skip(self, update))]
    async fn update_progress(
        &self,
        id: i64,
        expected_version: Option<i64>,
        update: &ProgressUpdate,
    ) -> Result<StoredProgress, DomainError> {
        let row = sqlx::query(&format!(
            "UPDATE user_achievements \
             SET current_progress = $2, is_completed = $3, earned_at = $4, \
                 is_notified = COALESCE($5::BOOLEAN, is_notified), version = version + 1 \
             WHERE id = $1 AND ($6::BIGINT IS NULL OR version = $6) \
             RETURNING {PROGRESS_COLUMNS}"
        ))
        .bind(id)
        .bind(update.current_progress)
        .bind(update.is_completed)
        .bind(update.earned_at)
        .bind(update.is_notified)
        .bind(expected_version)
        .fetch_optional(&self.pool)
        .await
        .map_err(infrastructure)?;

        if let Some(row) = row {
            return progress_from_row(&row).map_err(infrastructure);
        }

        // Nothing matched: either the row is gone or its version moved on.
        let actual: Option<i64> =
            sqlx::query_scalar("SELECT version FROM user_achievements WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(infrastructure)?;
        match (actual, expected_version) {
            (Some(actual), Some(expected)) => {
                debug!(expected, actual, "stale progress write rejected");
                Err(DomainError::ConcurrencyConflict {
                    id,
                    expected,
                    actual,
                })
            }
            _ => Err(DomainError::NotFound {
                entity: "achievement progress",
                id,
            }),
        }
    }

    async fn list_user_progress(
        &self,
        user_id: i64,
    ) -> Result<Vec<UserProgressEntry>, DomainError> {
        let rows = sqlx::query(&format!(
            "SELECT {JOINED_COLUMNS} FROM user_achievements ua \
             INNER JOIN achievements a ON a.id = ua.achievement_id \
             WHERE ua.user_id = $1 ORDER BY ua.earned_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(infrastructure)?;
        entries(&rows)
    }

    async fn list_completed(&self, limit: i64) -> Result<Vec<CompletedEntry>, DomainError> {
        let rows = sqlx::query(
            "SELECT ua.id, ua.user_id, a.points FROM user_achievements ua \
             INNER JOIN achievements a ON a.id = ua.achievement_id \
             WHERE ua.is_completed ORDER BY ua.id LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(infrastructure)?;

        rows.iter()
            .map(|row| {
                Ok(CompletedEntry {
                    progress_id: row.try_get("id")?,
                    user_id: row.try_get("user_id")?,
                    points: row.try_get("points")?,
                })
            })
            .collect::<Result<_, sqlx::Error>>()
            .map_err(infrastructure)
    }

    async fn list_unnotified_completions(
        &self,
        user_id: i64,
    ) -> Result<Vec<UserProgressEntry>, DomainError> {
        let rows = sqlx::query(&format!(
            "SELECT {JOINED_COLUMNS} FROM user_achievements ua \
             INNER JOIN achievements a ON a.id = ua.achievement_id \
             WHERE ua.user_id = $1 AND ua.is_completed AND NOT ua.is_notified \
             ORDER BY ua.id"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(infrastructure)?;
        entries(&rows)
    }

    #[instrument(skip(self), fields(count = progress_ids.len()))]
    async fn mark_notified(&self, progress_ids: &[i64]) -> Result<u64, DomainError> {
        let result = sqlx::query(
            "UPDATE user_achievements SET is_notified = TRUE, version = version + 1 \
             WHERE id = ANY($1)",
        )
        .bind(progress_ids)
        .execute(&self.pool)
        .await
        .map_err(infrastructure)?;
        Ok(result.rows_affected())
    }
}
