//! Routes for the Achievements & Progress context.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{
    Json, Router,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};
use uuid::Uuid;

use gamehub_achievements::application::command_handlers::{self, TrackOutcome};
use gamehub_achievements::application::query_handlers::{
    self, AchievementView, DEFAULT_LEADERBOARD_LIMIT, ProgressView, UnnotifiedAchievementView,
    UserAchievementsView, UserStatsView,
};
use gamehub_achievements::domain::commands::{AwardAchievement, MarkNotified, Trigger};
use gamehub_achievements::domain::leaderboard::LeaderboardEntry;
use gamehub_achievements::domain::requirement::EventPayload;

use crate::error::ApiError;
use crate::state::AppState;

/// Parses a path identifier; only plain decimal digits are accepted.
fn parse_id(raw: &str, name: &str) -> Result<i64, ApiError> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ApiError::validation(format!("invalid {name}: {raw:?}")));
    }
    raw.parse()
        .map_err(|_| ApiError::validation(format!("invalid {name}: {raw:?}")))
}

/// Query string for GET /leaderboard.
#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    /// Number of completions to rank, `1..=100`.
    pub limit: Option<String>,
}

/// Request body for POST /award.
#[derive(Debug, Deserialize)]
pub struct AwardRequest {
    /// The receiving user.
    pub user_id: Option<i64>,
    /// The achievement to award.
    pub achievement_id: Option<i64>,
    /// Progress to write; defaults to the requirement value.
    pub current_progress: Option<i32>,
}

/// Response body for POST /award.
#[derive(Debug, Serialize)]
pub struct AwardResponse {
    /// The progress row identifier.
    pub id: i64,
    /// The user.
    pub user_id: i64,
    /// The achievement.
    pub achievement_id: i64,
    /// Progress as written.
    pub current_progress: i32,
    /// Completion flag as written.
    pub is_completed: bool,
    /// Notification flag.
    pub is_notified: bool,
    /// Completion or creation time.
    pub earned_at: DateTime<Utc>,
}

/// Request body for POST /notified.
#[derive(Debug, Deserialize)]
pub struct NotifiedRequest {
    /// Progress rows to mark as notified.
    pub progress_ids: Option<Vec<i64>>,
}

/// Response body for POST /notified.
#[derive(Debug, Serialize)]
pub struct NotifiedResponse {
    /// Rows actually updated.
    pub updated: u64,
}

/// Request body for POST /events.
#[derive(Debug, Deserialize)]
pub struct EventRequest {
    /// The user the event happened to.
    pub user_id: i64,
    /// Requirement tag, e.g. `lobby_joined`.
    pub event_type: String,
    /// Game the event happened in.
    pub game_id: Option<i64>,
    /// Event-specific data.
    #[serde(default)]
    pub event_data: EventPayload,
}

/// GET /
async fn list_achievements(
    State(state): State<AppState>,
) -> Result<Json<Vec<AchievementView>>, ApiError> {
    Ok(Json(
        query_handlers::list_achievements(&*state.repository).await?,
    ))
}

/// GET /{id}
async fn get_achievement(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AchievementView>, ApiError> {
    let id = parse_id(&id, "achievement id")?;
    Ok(Json(
        query_handlers::get_achievement_by_id(id, &*state.repository).await?,
    ))
}

/// GET /category/{category}
async fn list_by_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<Json<Vec<AchievementView>>, ApiError> {
    Ok(Json(
        query_handlers::list_achievements_by_category(&category, &*state.repository).await?,
    ))
}

/// GET /leaderboard
async fn leaderboard(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<Vec<LeaderboardEntry>>, ApiError> {
    let limit = match query.limit.as_deref() {
        None => DEFAULT_LEADERBOARD_LIMIT,
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ApiError::validation(format!("invalid limit parameter: {raw:?}")))?,
    };
    Ok(Json(
        query_handlers::get_leaderboard(limit, &*state.repository).await?,
    ))
}

/// GET /user/{user_id}
async fn user_achievements(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserAchievementsView>, ApiError> {
    let user_id = parse_id(&user_id, "user id")?;
    Ok(Json(
        query_handlers::get_user_achievements(user_id, &*state.repository).await?,
    ))
}

/// GET /user/{user_id}/achievement/{achievement_id}
async fn user_progress(
    State(state): State<AppState>,
    Path((user_id, achievement_id)): Path<(String, String)>,
) -> Result<Json<ProgressView>, ApiError> {
    let user_id = parse_id(&user_id, "user id")?;
    let achievement_id = parse_id(&achievement_id, "achievement id")?;
    Ok(Json(
        query_handlers::get_user_progress(user_id, achievement_id, &*state.repository).await?,
    ))
}

/// GET /user/{user_id}/stats
async fn user_stats(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserStatsView>, ApiError> {
    let user_id = parse_id(&user_id, "user id")?;
    Ok(Json(
        query_handlers::get_user_stats(user_id, &*state.repository).await?,
    ))
}

/// GET /user/{user_id}/unnotified
async fn user_unnotified(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<UnnotifiedAchievementView>>, ApiError> {
    let user_id = parse_id(&user_id, "user id")?;
    Ok(Json(
        query_handlers::get_unnotified_achievements(user_id, &*state.repository).await?,
    ))
}

/// POST /award
#[instrument(skip(state, request))]
async fn award(
    State(state): State<AppState>,
    Json(request): Json<AwardRequest>,
) -> Result<(StatusCode, Json<AwardResponse>), ApiError> {
    let (Some(user_id), Some(achievement_id)) = (request.user_id, request.achievement_id) else {
        return Err(ApiError::validation(
            "user_id and achievement_id are required",
        ));
    };

    let command = AwardAchievement {
        correlation_id: Uuid::new_v4(),
        user_id,
        achievement_id,
        current_progress: request.current_progress,
    };

    info!(correlation_id = %command.correlation_id, "handling award command");

    let result =
        command_handlers::handle_award(&command, state.clock.as_ref(), &*state.repository).await?;

    let status = if result.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    let p = result.progress;
    Ok((
        status,
        Json(AwardResponse {
            id: p.id,
            user_id: p.user_id,
            achievement_id: p.achievement_id,
            current_progress: p.current_progress,
            is_completed: p.is_completed,
            is_notified: p.is_notified,
            earned_at: p.earned_at,
        }),
    ))
}

/// POST /notified
#[instrument(skip(state, request))]
async fn mark_notified(
    State(state): State<AppState>,
    Json(request): Json<NotifiedRequest>,
) -> Result<Json<NotifiedResponse>, ApiError> {
    let progress_ids = request
        .progress_ids
        .ok_or_else(|| ApiError::validation("progress_ids is required"))?;

    let command = MarkNotified {
        correlation_id: Uuid::new_v4(),
        progress_ids,
    };

    info!(
        correlation_id = %command.correlation_id,
        count = command.progress_ids.len(),
        "handling mark_notified command"
    );

    let updated = command_handlers::handle_mark_notified(&command, &*state.repository).await?;
    Ok(Json(NotifiedResponse { updated }))
}

/// POST /events
///
/// Tracking never fails the caller: the response is always 202, carrying
/// the outcome or `null` when evaluation failed.
#[instrument(
    skip(state, request),
    fields(user_id = request.user_id, event_type = %request.event_type)
)]
async fn track_event(
    State(state): State<AppState>,
    Json(request): Json<EventRequest>,
) -> (StatusCode, Json<Option<TrackOutcome>>) {
    let trigger = Trigger::for_event_type(request.user_id, request.event_type)
        .with_game(request.game_id)
        .with_payload(request.event_data);

    let outcome =
        match command_handlers::track_event(&trigger, state.clock.as_ref(), &*state.repository)
            .await
        {
            Ok(outcome) => Some(outcome),
            Err(err) => {
                error!(
                    correlation_id = %trigger.correlation_id,
                    error = %err,
                    "error tracking achievement event"
                );
                None
            }
        };

    (StatusCode::ACCEPTED, Json(outcome))
}

/// Returns the router for the achievements context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_achievements))
        .route("/leaderboard", get(leaderboard))
        .route("/award", post(award))
        .route("/notified", post(mark_notified))
        .route("/events", post(track_event))
        .route("/category/{category}", get(list_by_category))
        .route("/user/{user_id}", get(user_achievements))
        .route(
            "/user/{user_id}/achievement/{achievement_id}",
            get(user_progress),
        )
        .route("/user/{user_id}/stats", get(user_stats))
        .route("/user/{user_id}/unnotified", get(user_unnotified))
        .route("/{id}", get(get_achievement))
}
