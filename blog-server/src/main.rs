use anyhow::Context;
use blog_server::infrastructure::config::AppConfig;
use blog_server::infrastructure::database::{create_pool, run_migrations};
use blog_server::infrastructure::logging::init_logging;
use blog_server::server::{AppState, start_http_server};
use tracing::info;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let config = AppConfig::from_env().context("invalid configuration")?;
    info!(config = ?config, "configuration loaded");

    let pool = create_pool(&config.database_url, config.database_max_connections)
        .await
        .context("failed to connect to database")?;
    run_migrations(&pool)
        .await
        .context("failed to run migrations")?;

    tokio::fs::create_dir_all(&config.media_root)
        .await
        .with_context(|| format!("failed to create media root {:?}", config.media_root))?;

    let state = AppState::new(pool, &config);
    start_http_server(config, state).await
}
