//! Integration tests for `PgAchievementRepository` and the catalog seeder.

use chrono::{DateTime, Duration, TimeZone, Utc};
use gamehub_core::error::DomainError;
use gamehub_core::repository::{AchievementRepository, NewProgress, ProgressUpdate};
use gamehub_store::pg_achievement_repository::PgAchievementRepository;
use gamehub_store::seed::seed_default_catalog;
use sqlx::PgPool;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
}

/// Inserts a definition and returns its id.
async fn insert_achievement(
    pool: &PgPool,
    name: &str,
    requirement_type: &str,
    requirement_value: i32,
    points: i32,
    is_active: bool,
) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO achievements \
             (name, description, category, rarity, requirement_type, requirement_value, points, is_active) \
         VALUES ($1, 'test', 'gaming', 'rare', $2, $3, $4, $5) RETURNING id",
    )
    .bind(name)
    .bind(requirement_type)
    .bind(requirement_value)
    .bind(points)
    .bind(is_active)
    .fetch_one(pool)
    .await
    .unwrap()
}

fn new_progress(user_id: i64, achievement_id: i64, current: i32, done: bool) -> NewProgress {
    NewProgress {
        user_id,
        achievement_id,
        current_progress: current,
        is_completed: done,
        now: now(),
    }
}

// --- catalog reads ---

#[sqlx::test(migrations = "../../migrations")]
async fn test_catalog_hides_inactive_and_filters_by_requirement(pool: PgPool) {
    let repo = PgAchievementRepository::new(pool.clone());
    let wins = insert_achievement(&pool, "Winner", "game_wins", 1, 25, true).await;
    insert_achievement(&pool, "Retired", "game_wins", 5, 50, false).await;
    insert_achievement(&pool, "Joiner", "lobby_joined", 1, 10, true).await;

    let catalog = repo.list_active_achievements().await.unwrap();
    let for_wins = repo.active_achievements_for_requirement("game_wins").await.unwrap();
    let gaming = repo
        .list_active_achievements_by_category("gaming")
        .await
        .unwrap();

    assert_eq!(catalog.len(), 2);
    assert_eq!(for_wins.len(), 1);
    assert_eq!(for_wins[0].id, wins);
    assert_eq!(for_wins[0].rarity, "rare");
    assert_eq!(gaming.len(), 2);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_find_achievement_returns_inactive_rows(pool: PgPool) {
    let repo = PgAchievementRepository::new(pool.clone());
    let id = insert_achievement(&pool, "Retired", "game_wins", 5, 50, false).await;

    let found = repo.find_achievement(id).await.unwrap().unwrap();
    let missing = repo.find_achievement(id + 100).await.unwrap();

    assert!(!found.is_active);
    assert!(found.icon_url.is_none());
    assert!(missing.is_none());
}

// --- progress writes ---

#[sqlx::test(migrations = "../../migrations")]
async fn test_insert_progress_if_absent_keeps_first_writer(pool: PgPool) {
    let repo = PgAchievementRepository::new(pool.clone());
    let id = insert_achievement(&pool, "Joiner", "lobby_joined", 3, 10, true).await;

    let first = repo
        .insert_progress_if_absent(&new_progress(7, id, 1, false))
        .await
        .unwrap()
        .unwrap();
    let second = repo
        .insert_progress_if_absent(&new_progress(7, id, 2, false))
        .await
        .unwrap();

    assert_eq!(first.version, 1);
    assert_eq!(first.earned_at, now());
    assert!(!first.is_notified);
    assert!(second.is_none());
    let stored = repo.find_progress(7, id).await.unwrap().unwrap();
    assert_eq!(stored.current_progress, 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_update_progress_checks_version(pool: PgPool) {
    let repo = PgAchievementRepository::new(pool.clone());
    let id = insert_achievement(&pool, "Winner", "game_wins", 3, 25, true).await;
    let row = repo
        .insert_progress_if_absent(&new_progress(7, id, 1, false))
        .await
        .unwrap()
        .unwrap();
    let update = ProgressUpdate {
        current_progress: 2,
        is_completed: false,
        earned_at: row.earned_at,
        is_notified: None,
    };

    let updated = repo
        .update_progress(row.id, Some(1), &update)
        .await
        .unwrap();
    let stale = repo.update_progress(row.id, Some(1), &update).await;

    assert_eq!(updated.current_progress, 2);
    assert_eq!(updated.version, 2);
    match stale {
        Err(DomainError::ConcurrencyConflict {
            id,
            expected,
            actual,
        }) => {
            assert_eq!(id, row.id);
            assert_eq!(expected, 1);
            assert_eq!(actual, 2);
        }
        other => panic!("expected ConcurrencyConflict, got {other:?}"),
    }
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_unconditional_update_sets_notification_only_when_given(pool: PgPool) {
    let repo = PgAchievementRepository::new(pool.clone());
    let id = insert_achievement(&pool, "Winner", "game_wins", 2, 25, true).await;
    let row = repo
        .insert_progress_if_absent(&new_progress(7, id, 2, true))
        .await
        .unwrap()
        .unwrap();
    repo.mark_notified(&[row.id]).await.unwrap();

    let kept = repo
        .update_progress(
            row.id,
            None,
            &ProgressUpdate {
                current_progress: 2,
                is_completed: true,
                earned_at: now() + Duration::hours(1),
                is_notified: None,
            },
        )
        .await
        .unwrap();
    let reset = repo
        .update_progress(
            row.id,
            None,
            &ProgressUpdate {
                current_progress: 2,
                is_completed: true,
                earned_at: now() + Duration::hours(2),
                is_notified: Some(false),
            },
        )
        .await
        .unwrap();

    assert!(kept.is_notified);
    assert!(!reset.is_notified);
    assert_eq!(reset.version, 4);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_update_missing_row_is_not_found(pool: PgPool) {
    let repo = PgAchievementRepository::new(pool);
    let update = ProgressUpdate {
        current_progress: 1,
        is_completed: false,
        earned_at: now(),
        is_notified: None,
    };

    let result = repo.update_progress(999, Some(1), &update).await;

    assert!(matches!(result, Err(DomainError::NotFound { id: 999, .. })));
}

// --- reporting reads ---

#[sqlx::test(migrations = "../../migrations")]
async fn test_list_user_progress_joins_definitions_newest_first(pool: PgPool) {
    let repo = PgAchievementRepository::new(pool.clone());
    let a = insert_achievement(&pool, "Joiner", "lobby_joined", 1, 10, true).await;
    let b = insert_achievement(&pool, "Winner", "game_wins", 1, 25, true).await;
    repo.insert_progress_if_absent(&new_progress(7, a, 1, true))
        .await
        .unwrap();
    let mut later = new_progress(7, b, 1, true);
    later.now = now() + Duration::days(1);
    repo.insert_progress_if_absent(&later).await.unwrap();

    let entries = repo.list_user_progress(7).await.unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].achievement.name, "Winner");
    assert_eq!(entries[0].achievement.points, 25);
    assert_eq!(entries[1].progress.achievement_id, a);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_list_completed_orders_by_row_and_limits(pool: PgPool) {
    let repo = PgAchievementRepository::new(pool.clone());
    let a = insert_achievement(&pool, "Joiner", "lobby_joined", 1, 10, true).await;
    let b = insert_achievement(&pool, "Winner", "game_wins", 5, 25, true).await;
    repo.insert_progress_if_absent(&new_progress(1, a, 1, true))
        .await
        .unwrap();
    repo.insert_progress_if_absent(&new_progress(2, b, 1, false))
        .await
        .unwrap();
    repo.insert_progress_if_absent(&new_progress(2, a, 1, true))
        .await
        .unwrap();
    repo.insert_progress_if_absent(&new_progress(3, a, 1, true))
        .await
        .unwrap();

    let completed = repo.list_completed(2).await.unwrap();

    let users: Vec<i64> = completed.iter().map(|c| c.user_id).collect();
    assert_eq!(users, vec![1, 2]);
    assert!(completed.iter().all(|c| c.points == 10));
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_unnotified_feed_and_mark_notified(pool: PgPool) {
    let repo = PgAchievementRepository::new(pool.clone());
    let a = insert_achievement(&pool, "Joiner", "lobby_joined", 1, 10, true).await;
    let b = insert_achievement(&pool, "Winner", "game_wins", 5, 25, true).await;
    let done = repo
        .insert_progress_if_absent(&new_progress(7, a, 1, true))
        .await
        .unwrap()
        .unwrap();
    repo.insert_progress_if_absent(&new_progress(7, b, 1, false))
        .await
        .unwrap();

    let pending = repo.list_unnotified_completions(7).await.unwrap();
    let touched = repo.mark_notified(&[done.id, 12_345]).await.unwrap();
    let after = repo.list_unnotified_completions(7).await.unwrap();

    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].progress.id, done.id);
    assert_eq!(touched, 1);
    assert!(after.is_empty());
}

// --- seeding ---

#[sqlx::test(migrations = "../../migrations")]
async fn test_seed_default_catalog_runs_once(pool: PgPool) {
    let repo = PgAchievementRepository::new(pool.clone());

    let first = seed_default_catalog(&pool).await.unwrap();
    let second = seed_default_catalog(&pool).await.unwrap();

    assert_eq!(first, 16);
    assert_eq!(second, 0);
    let catalog = repo.list_active_achievements().await.unwrap();
    assert_eq!(catalog.len(), 16);
    assert_eq!(catalog[0].name, "First Friend");
    assert_eq!(
        catalog[0].icon_url.as_deref(),
        Some("/icons/achievements/first-friend.svg")
    );
    let friends = repo
        .active_achievements_for_requirement("friend_count")
        .await
        .unwrap();
    assert_eq!(friends.len(), 3);
}
