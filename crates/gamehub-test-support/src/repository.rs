//! Test repositories: mock `AchievementRepository` implementations for tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use gamehub_core::error::DomainError;
use gamehub_core::repository::{
    AchievementRepository, CompletedEntry, NewProgress, ProgressUpdate, StoredAchievement,
    StoredProgress, UserProgressEntry,
};

#[derive(Debug, Default)]
struct State {
    achievements: Vec<StoredAchievement>,
    progress: Vec<StoredProgress>,
    next_progress_id: i64,
}

impl State {
    fn achievement(&self, id: i64) -> Option<&StoredAchievement> {
        self.achievements.iter().find(|a| a.id == id)
    }

    fn joined(&self, rows: impl Iterator<Item = StoredProgress>) -> Vec<UserProgressEntry> {
        rows.filter_map(|progress| {
            self.achievement(progress.achievement_id)
                .cloned()
                .map(|achievement| UserProgressEntry {
                    progress,
                    achievement,
                })
        })
        .collect()
    }

    fn catalog(&self, filter: impl Fn(&StoredAchievement) -> bool) -> Vec<StoredAchievement> {
        let mut rows: Vec<StoredAchievement> = self
            .achievements
            .iter()
            .filter(|a| a.is_active && filter(a))
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            a.display_order
                .cmp(&b.display_order)
                .then_with(|| a.name.cmp(&b.name))
        });
        rows
    }
}

/// An in-memory repository with the same semantics as the `PostgreSQL` one:
/// unique (user, achievement) rows, version-checked updates, and the same
/// orderings.
#[derive(Debug, Default)]
pub struct InMemoryAchievementRepository {
    state: Mutex<State>,
}

impl InMemoryAchievementRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository holding the given catalog.
    #[must_use]
    pub fn with_achievements(achievements: Vec<StoredAchievement>) -> Self {
        let repo = Self::new();
        repo.state.lock().unwrap().achievements = achievements;
        repo
    }

    /// Add a definition to the catalog.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn add_achievement(&self, achievement: StoredAchievement) {
        self.state.lock().unwrap().achievements.push(achievement);
    }

    /// Store a progress row as-is, replacing any row with the same id.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn put_progress(&self, row: StoredProgress) {
        let mut state = self.state.lock().unwrap();
        state.next_progress_id = state.next_progress_id.max(row.id);
        state.progress.retain(|p| p.id != row.id);
        state.progress.push(row);
    }

    /// Returns a snapshot of all progress rows, ordered by id.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn progress_rows(&self) -> Vec<StoredProgress> {
        let mut rows = self.state.lock().unwrap().progress.clone();
        rows.sort_by_key(|p| p.id);
        rows
    }

    /// Returns the row for a (user, achievement) pair, if any.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn progress_for(&self, user_id: i64, achievement_id: i64) -> Option<StoredProgress> {
        self.state
            .lock()
            .unwrap()
            .progress
            .iter()
            .find(|p| p.user_id == user_id && p.achievement_id == achievement_id)
            .cloned()
    }
}

#[async_trait]
impl AchievementRepository for InMemoryAchievementRepository {
    async fn list_active_achievements(&self) -> Result<Vec<StoredAchievement>, DomainError> {
        Ok(self.state.lock().unwrap().catalog(|_| true))
    }

    async fn list_active_achievements_by_category(
        &self,
        category: &str,
    ) -> Result<Vec<StoredAchievement>, DomainError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .catalog(|a| a.category == category))
    }

    async fn find_achievement(&self, id: i64) -> Result<Option<StoredAchievement>, DomainError> {
        Ok(self.state.lock().unwrap().achievement(id).cloned())
    }

    async fn active_achievements_for_requirement(
        &self,
        requirement_type: &str,
    ) -> Result<Vec<StoredAchievement>, DomainError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .achievements
            .iter()
            .filter(|a| a.is_active && a.requirement_type == requirement_type)
            .cloned()
            .collect())
    }

    async fn find_progress(
        &self,
        user_id: i64,
        achievement_id: i64,
    ) -> Result<Option<StoredProgress>, DomainError> {
        Ok(self.progress_for(user_id, achievement_id))
    }

    async fn insert_progress_if_absent(
        &self,
        progress: &NewProgress,
    ) -> Result<Option<StoredProgress>, DomainError> {
        let mut state = self.state.lock().unwrap();
        let exists = state
            .progress
            .iter()
            .any(|p| p.user_id == progress.user_id && p.achievement_id == progress.achievement_id);
        if exists {
            return Ok(None);
        }
        state.next_progress_id += 1;
        let row = StoredProgress {
            id: state.next_progress_id,
            created_at: progress.now,
            user_id: progress.user_id,
            achievement_id: progress.achievement_id,
            earned_at: progress.now,
            current_progress: progress.current_progress,
            is_completed: progress.is_completed,
            is_notified: false,
            version: 1,
        };
        state.progress.push(row.clone());
        Ok(Some(row))
    }

    async fn update_progress(
        &self,
        id: i64,
        expected_version: Option<i64>,
        update: &ProgressUpdate,
    ) -> Result<StoredProgress, DomainError> {
        let mut state = self.state.lock().unwrap();
        let row = state
            .progress
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(DomainError::NotFound {
                entity: "achievement progress",
                id,
            })?;
        if let Some(expected) = expected_version {
            if row.version != expected {
                return Err(DomainError::ConcurrencyConflict {
                    id,
                    expected,
                    actual: row.version,
                });
            }
        }
        row.current_progress = update.current_progress;
        row.is_completed = update.is_completed;
        row.earned_at = update.earned_at;
        if let Some(notified) = update.is_notified {
            row.is_notified = notified;
        }
        row.version += 1;
        Ok(row.clone())
    }

    async fn list_user_progress(
        &self,
        user_id: i64,
    ) -> Result<Vec<UserProgressEntry>, DomainError> {
        let state = self.state.lock().unwrap();
        let mut rows: Vec<StoredProgress> = state
            .progress
            .iter()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.earned_at.cmp(&a.earned_at));
        Ok(state.joined(rows.into_iter()))
    }

    async fn list_completed(&self, limit: i64) -> Result<Vec<CompletedEntry>, DomainError> {
        let state = self.state.lock().unwrap();
        let mut rows: Vec<&StoredProgress> =
            state.progress.iter().filter(|p| p.is_completed).collect();
        rows.sort_by_key(|p| p.id);
        Ok(rows
            .into_iter()
            .filter_map(|p| {
                state.achievement(p.achievement_id).map(|a| CompletedEntry {
                    progress_id: p.id,
                    user_id: p.user_id,
                    points: a.points,
                })
            })
            .take(usize::try_from(limit).unwrap_or(0))
            .collect())
    }

    async fn list_unnotified_completions(
        &self,
        user_id: i64,
    ) -> Result<Vec<UserProgressEntry>, DomainError> {
        let state = self.state.lock().unwrap();
        let mut rows: Vec<StoredProgress> = state
            .progress
            .iter()
            .filter(|p| p.user_id == user_id && p.is_completed && !p.is_notified)
            .cloned()
            .collect();
        rows.sort_by_key(|p| p.id);
        Ok(state.joined(rows.into_iter()))
    }

    async fn mark_notified(&self, progress_ids: &[i64]) -> Result<u64, DomainError> {
        let mut state = self.state.lock().unwrap();
        let mut touched = 0;
        for row in state
            .progress
            .iter_mut()
            .filter(|p| progress_ids.contains(&p.id))
        {
            row.is_notified = true;
            row.version += 1;
            touched += 1;
        }
        Ok(touched)
    }
}

/// Wraps an in-memory repository and simulates a second writer that commits
/// between the caller's read and write, once.
///
/// Built with [`RacingAchievementRepository::on_update`] the competitor bumps
/// the row's progress by one right before the first versioned update; built
/// with [`RacingAchievementRepository::on_insert`] it creates the row right
/// before the first insert.
#[derive(Debug)]
pub struct RacingAchievementRepository {
    inner: InMemoryAchievementRepository,
    race_update: AtomicBool,
    race_insert: AtomicBool,
}

impl RacingAchievementRepository {
    /// Race the first versioned `update_progress` call.
    #[must_use]
    pub fn on_update(inner: InMemoryAchievementRepository) -> Self {
        Self {
            inner,
            race_update: AtomicBool::new(true),
            race_insert: AtomicBool::new(false),
        }
    }

    /// Race the first `insert_progress_if_absent` call.
    #[must_use]
    pub fn on_insert(inner: InMemoryAchievementRepository) -> Self {
        Self {
            inner,
            race_update: AtomicBool::new(false),
            race_insert: AtomicBool::new(true),
        }
    }

    /// The wrapped repository, for assertions.
    #[must_use]
    pub fn inner(&self) -> &InMemoryAchievementRepository {
        &self.inner
    }
}

#[async_trait]
impl AchievementRepository for RacingAchievementRepository {
    async fn list_active_achievements(&self) -> Result<Vec<StoredAchievement>, DomainError> {
        self.inner.list_active_achievements().await
    }

    async fn list_active_achievements_by_category(
        &self,
        category: &str,
    ) -> Result<Vec<StoredAchievement>, DomainError> {
        self.inner
            .list_active_achievements_by_category(category)
            .await
    }

    async fn find_achievement(&self, id: i64) -> Result<Option<StoredAchievement>, DomainError> {
        self.inner.find_achievement(id).await
    }

    async fn active_achievements_for_requirement(
        &self,
        requirement_type: &str,
    ) -> Result<Vec<StoredAchievement>, DomainError> {
        self.inner
            .active_achievements_for_requirement(requirement_type)
            .await
    }

    async fn find_progress(
        &self,
        user_id: i64,
        achievement_id: i64,
    ) -> Result<Option<StoredProgress>, DomainError> {
        self.inner.find_progress(user_id, achievement_id).await
    }

    async fn insert_progress_if_absent(
        &self,
        progress: &NewProgress,
    ) -> Result<Option<StoredProgress>, DomainError> {
        if self.race_insert.swap(false, Ordering::SeqCst) {
            self.inner.insert_progress_if_absent(progress).await?;
        }
        self.inner.insert_progress_if_absent(progress).await
    }

    async fn update_progress(
        &self,
        id: i64,
        expected_version: Option<i64>,
        update: &ProgressUpdate,
    ) -> Result<StoredProgress, DomainError> {
        if expected_version.is_some() && self.race_update.swap(false, Ordering::SeqCst) {
            let competitor = self
                .inner
                .progress_rows()
                .into_iter()
                .find(|p| p.id == id)
                .ok_or(DomainError::NotFound {
                    entity: "achievement progress",
                    id,
                })?;
            self.inner
                .update_progress(
                    id,
                    None,
                    &ProgressUpdate {
                        current_progress: competitor.current_progress + 1,
                        is_completed: competitor.is_completed,
                        earned_at: competitor.earned_at,
                        is_notified: None,
                    },
                )
                .await?;
        }
        self.inner.update_progress(id, expected_version, update).await
    }

    async fn list_user_progress(
        &self,
        user_id: i64,
    ) -> Result<Vec<UserProgressEntry>, DomainError> {
        self.inner.list_user_progress(user_id).await
    }

    async fn list_completed(&self, limit: i64) -> Result<Vec<CompletedEntry>, DomainError> {
        self.inner.list_completed(limit).await
    }

    async fn list_unnotified_completions(
        &self,
        user_id: i64,
    ) -> Result<Vec<UserProgressEntry>, DomainError> {
        self.inner.list_unnotified_completions(user_id).await
    }

    async fn mark_notified(&self, progress_ids: &[i64]) -> Result<u64, DomainError> {
        self.inner.mark_notified(progress_ids).await
    }
}

/// A repository that always returns an infrastructure error. Useful for
/// testing the best-effort paths.
#[derive(Debug)]
pub struct FailingAchievementRepository;

fn refused<T>() -> Result<T, DomainError> {
    Err(DomainError::Infrastructure("connection refused".into()))
}

#[async_trait]
impl AchievementRepository for FailingAchievementRepository {
    async fn list_active_achievements(&self) -> Result<Vec<StoredAchievement>, DomainError> {
        refused()
    }

    async fn list_active_achievements_by_category(
        &self,
        _category: &str,
    ) -> Result<Vec<StoredAchievement>, DomainError> {
        refused()
    }

    async fn find_achievement(&self, _id: i64) -> Result<Option<StoredAchievement>, DomainError> {
        refused()
    }

    async fn active_achievements_for_requirement(
        &self,
        _requirement_type: &str,
    ) -> Result<Vec<StoredAchievement>, DomainError> {
        refused()
    }

    async fn find_progress(
        &self,
        _user_id: i64,
        _achievement_id: i64,
    ) -> Result<Option<StoredProgress>, DomainError> {
        refused()
    }

    async fn insert_progress_if_absent(
        &self,
        _progress: &NewProgress,
    ) -> Result<Option<StoredProgress>, DomainError> {
        refused()
    }

    async fn update_progress(
        &self,
        _id: i64,
        _expected_version: Option<i64>,
        _update: &ProgressUpdate,
    ) -> Result<StoredProgress, DomainError> {
        refused()
    }

    async fn list_user_progress(
        &self,
        _user_id: i64,
    ) -> Result<Vec<UserProgressEntry>, DomainError> {
        refused()
    }

    async fn list_completed(&self, _limit: i64) -> Result<Vec<CompletedEntry>, DomainError> {
        refused()
    }

    async fn list_unnotified_completions(
        &self,
        _user_id: i64,
    ) -> Result<Vec<UserProgressEntry>, DomainError> {
        refused()
    }

    async fn mark_notified(&self, _progress_ids: &[i64]) -> Result<u64, DomainError> {
        refused()
    }
}
