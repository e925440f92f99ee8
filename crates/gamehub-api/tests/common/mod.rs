//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use gamehub_core::clock::Clock;
use gamehub_store::pg_achievement_repository::PgAchievementRepository;
use gamehub_test_support::{FixedClock, fixed_time};
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use gamehub_api::state::AppState;

/// Build the full app router with a real `PgAchievementRepository` and a
/// fixed clock. Uses the same route structure as `main.rs`.
pub fn build_test_app(pool: PgPool) -> Router {
    let clock: Arc<dyn Clock + Send + Sync> = Arc::new(FixedClock(fixed_time()));
    let repository = Arc::new(PgAchievementRepository::new(pool));
    gamehub_api::app(AppState::new(clock, repository))
}

/// Inserts an active achievement definition and returns its id.
pub async fn insert_achievement(
    pool: &PgPool,
    name: &str,
    requirement_type: &str,
    requirement_value: i32,
    points: i32,
) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO achievements \
             (name, description, category, rarity, requirement_type, requirement_value, points) \
         VALUES ($1, 'integration test', 'participation', 'common', $2, $3, $4) RETURNING id",
    )
    .bind(name)
    .bind(requirement_type)
    .bind(requirement_value)
    .bind(points)
    .fetch_one(pool)
    .await
    .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    send(app, request).await
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    send(app, request).await
}
