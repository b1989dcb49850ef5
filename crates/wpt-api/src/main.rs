//! Warehouse productivity API server

use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use wpt_api::{create_router, state::AppState};
use wpt_core::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration first so the log filter can come from it
    let config = AppConfig::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.clone().into()),
        )
        .init();

    let pool = PgPoolOptions::new()
        .max_connections(config.database.pool_size)
        .connect(&config.database.url)
        .await?;

    sqlx::migrate!("../../migrations").run(&pool).await?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = Arc::new(AppState::new(config, pool));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("API server starting on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
