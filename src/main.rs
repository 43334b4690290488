use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use card_admin_api::auth::Authenticator;
use card_admin_api::config::AppConfig;
use card_admin_api::database::PgDataStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL and the ACCESS_* settings
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Validate everything up front; nothing is looked up per request
    let config = AppConfig::from_env().context("invalid configuration")?;
    tracing::info!("Starting Card Admin API in {:?} mode", config.environment);

    let authenticator = Arc::new(Authenticator::from_mode(&config.access).context("invalid access configuration")?);
    let store = PgDataStore::connect(&config.database)
        .await
        .context("failed to connect to database")?;

    let app = card_admin_api::app(authenticator, Arc::new(store));

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Card Admin API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
