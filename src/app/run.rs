use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;

use crate::{app, app::config::AppConfig, error::AppError, telemetry};

pub async fn run() -> Result<(), AppError> {
    let _ = dotenvy::dotenv();
    let config = AppConfig::from_env()?;
    let telemetry_guard = telemetry::init_tracing(&config.telemetry)
        .map_err(|err| AppError::Internal(format!("telemetry init failed: {}", err)))?;

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(config.database.acquire_timeout)
        .connect(&config.database.url)
        .await
        .map_err(AppError::Database)?;

    let state = app::state::AppState::new(pool, &config);
    let app = app::router::build_router(state, &config.cors_allowed_origin)?;

    tracing::info!(addr = %config.bind_addr, default_sort = %config.default_sort, "Server listening");
    let listener = TcpListener::bind(config.bind_addr)
        .await
        .map_err(|err| AppError::Internal(format!("bind failed: {}", err)))?;
    let result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::Internal(format!("server error: {}", err)));
    telemetry_guard.shutdown();
    result
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
