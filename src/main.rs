use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use clubsched::config::AppConfig;
use clubsched::db;
use clubsched::handlers;
use clubsched::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url, config.busy_timeout_ms)?;
    tracing::info!(
        database = %config.database_url,
        busy_timeout_ms = config.busy_timeout_ms,
        "database ready"
    );

    let state = Arc::new(AppState::new(conn, config.clone()));
    let app = handlers::router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
