//! Gamehub API server entry point.

use std::sync::Arc;

use gamehub_core::clock::SystemClock;
use gamehub_store::pg_achievement_repository::PgAchievementRepository;
use gamehub_store::seed::seed_default_catalog;
use sqlx::postgres::PgPoolOptions;

use gamehub_api::config::Config;
use gamehub_api::error::AppError;
use gamehub_api::state::AppState;
use gamehub_api::telemetry;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = Config::from_env()?;
    let telemetry = telemetry::init(&config)?;

    tracing::info!(
        otel_export = telemetry.is_exporting(),
        "Starting Gamehub API server"
    );

    // Create database connection pool and bring the schema up to date.
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;
    sqlx::migrate!("../../migrations").run(&pool).await?;

    if config.seed_achievements {
        seed_default_catalog(&pool).await?;
    }

    let app_state = AppState::new(
        Arc::new(SystemClock),
        Arc::new(PgAchievementRepository::new(pool)),
    );
    let app = gamehub_api::app(app_state);

    let addr = config.listen_addr()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    telemetry.shutdown();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
