use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use duval_api::config::config;
use duval_api::database::{DatabaseManager, PgStore};
use duval_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("duval_api=debug,tower_http=info")),
        )
        .init();

    let config = config().clone();
    tracing::info!("Starting duval-api in {:?} mode", config.environment);

    if config.security.jwt_secret.is_empty() {
        if duval_api::is_production!() {
            anyhow::bail!("JWT_SECRET must be set in production");
        }
        tracing::warn!("JWT_SECRET is empty; tokens are signed with an empty key");
    }

    let pool = DatabaseManager::connect(&config.database)
        .await
        .context("failed to connect to the database")?;
    let store = Arc::new(PgStore::new(pool));

    let bind_addr = config.bind_addr();
    let app = duval_api::app(AppState::new(store, config));

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!("duval-api listening on http://{}", bind_addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
