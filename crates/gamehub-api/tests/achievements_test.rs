//! Integration tests for the Achievements & Progress routes.

mod common;

use axum::http::StatusCode;
use gamehub_store::seed::seed_default_catalog;
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "../../migrations")]
async fn test_lobby_joined_event_unlocks_first_steps(pool: PgPool) {
    let first_steps = common::insert_achievement(&pool, "First Steps", "lobby_joined", 1, 10).await;

    // POST /api/v1/achievements/events
    let app = common::build_test_app(pool.clone());
    let (status, outcome) = common::post_json(
        app,
        "/api/v1/achievements/events",
        &json!({ "user_id": 42, "event_type": "lobby_joined" }),
    )
    .await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(outcome["completed"], json!([first_steps]));

    // GET /api/v1/achievements/user/42: verify persisted state
    let app = common::build_test_app(pool);
    let (status, json) = common::get_json(app, "/api/v1/achievements/user/42").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["completed_count"], 1);
    assert_eq!(json["in_progress_count"], 0);
    assert_eq!(json["total_points"], 10);
    let row = &json["achievements"][0];
    assert_eq!(row["achievement_id"], first_steps);
    assert_eq!(row["current_progress"], 1);
    assert_eq!(row["is_completed"], true);
    assert_eq!(row["earned_at"], "2026-01-15T10:00:00Z");
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_repeated_events_accumulate_and_freeze_on_completion(pool: PgPool) {
    let id = common::insert_achievement(&pool, "Winner", "game_wins", 2, 25).await;

    for _ in 0..3 {
        let app = common::build_test_app(pool.clone());
        let (status, _) = common::post_json(
            app,
            "/api/v1/achievements/events",
            &json!({ "user_id": 7, "event_type": "game_wins" }),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);
    }

    let app = common::build_test_app(pool);
    let (status, json) = common::get_json(
        app,
        &format!("/api/v1/achievements/user/7/achievement/{id}"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["current_progress"], 2);
    assert_eq!(json["is_completed"], true);
    assert_eq!(json["progress_percentage"], 100.0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_award_creates_then_overwrites(pool: PgPool) {
    let id = common::insert_achievement(&pool, "Social Butterfly", "friend_count", 10, 50).await;

    // POST /award: first write creates the row
    let app = common::build_test_app(pool.clone());
    let (status, json) = common::post_json(
        app,
        "/api/v1/achievements/award",
        &json!({ "user_id": 7, "achievement_id": id, "current_progress": 7 }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["current_progress"], 7);
    assert_eq!(json["is_completed"], false);

    // GET progress: 7/10
    let app = common::build_test_app(pool.clone());
    let (_, json) = common::get_json(
        app,
        &format!("/api/v1/achievements/user/7/achievement/{id}"),
    )
    .await;
    assert_eq!(json["progress_percentage"], 70.0);

    // POST /award again without progress: completes at the requirement value
    let app = common::build_test_app(pool);
    let (status, json) = common::post_json(
        app,
        "/api/v1/achievements/award",
        &json!({ "user_id": 7, "achievement_id": id }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["current_progress"], 10);
    assert_eq!(json["is_completed"], true);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_award_rejects_inactive_achievement(pool: PgPool) {
    let id = common::insert_achievement(&pool, "Retired", "friend_count", 1, 5).await;
    sqlx::query("UPDATE achievements SET is_active = FALSE WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .unwrap();

    let app = common::build_test_app(pool);
    let (status, json) = common::post_json(
        app,
        "/api/v1/achievements/award",
        &json!({ "user_id": 7, "achievement_id": id }),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "not_found");
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_notification_feed_round_trip(pool: PgPool) {
    common::insert_achievement(&pool, "First Steps", "lobby_joined", 1, 10).await;
    let app = common::build_test_app(pool.clone());
    common::post_json(
        app,
        "/api/v1/achievements/events",
        &json!({ "user_id": 9, "event_type": "lobby_joined" }),
    )
    .await;

    // GET unnotified
    let app = common::build_test_app(pool.clone());
    let (status, pending) = common::get_json(app, "/api/v1/achievements/user/9/unnotified").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pending.as_array().unwrap().len(), 1);
    assert_eq!(pending[0]["achievement_name"], "First Steps");

    // POST notified
    let progress_id = pending[0]["id"].as_i64().unwrap();
    let app = common::build_test_app(pool.clone());
    let (status, json) = common::post_json(
        app,
        "/api/v1/achievements/notified",
        &json!({ "progress_ids": [progress_id] }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["updated"], 1);

    // GET unnotified: now empty
    let app = common::build_test_app(pool);
    let (_, after) = common::get_json(app, "/api/v1/achievements/user/9/unnotified").await;
    assert!(after.as_array().unwrap().is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_leaderboard_and_stats(pool: PgPool) {
    seed_default_catalog(&pool).await.unwrap();

    // User 1: First Friend (10) + Victory Royale (25); user 2: Victory Royale.
    for (user_id, event_type) in [(1, "friend_count"), (1, "game_wins"), (2, "game_wins")] {
        let app = common::build_test_app(pool.clone());
        common::post_json(
            app,
            "/api/v1/achievements/events",
            &json!({ "user_id": user_id, "event_type": event_type }),
        )
        .await;
    }

    let app = common::build_test_app(pool.clone());
    let (status, board) = common::get_json(app, "/api/v1/achievements/leaderboard").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(board[0]["user_id"], 1);
    assert_eq!(board[0]["total_points"], 35);
    assert_eq!(board[0]["completed_count"], 2);
    assert_eq!(board[1]["user_id"], 2);
    assert_eq!(board[1]["total_points"], 25);

    let app = common::build_test_app(pool);
    let (status, stats) = common::get_json(app, "/api/v1/achievements/user/1/stats").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["completed_achievements"], 2);
    assert_eq!(stats["total_points"], 35);
    assert_eq!(stats["rarity_breakdown"]["common"], 2);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_seeded_catalog_is_listed_by_category(pool: PgPool) {
    seed_default_catalog(&pool).await.unwrap();

    let app = common::build_test_app(pool.clone());
    let (status, all) = common::get_json(app, "/api/v1/achievements").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 16);

    let app = common::build_test_app(pool.clone());
    let (status, social) = common::get_json(app, "/api/v1/achievements/category/social").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(social.as_array().unwrap().len(), 3);
    assert_eq!(social[0]["name"], "First Friend");

    let id = all[0]["id"].as_i64().unwrap();
    let app = common::build_test_app(pool);
    let (status, one) = common::get_json(app, &format!("/api/v1/achievements/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(one["requirement_type"], "friend_count");
}
