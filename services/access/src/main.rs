use anyhow::Result;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use access::{AccessConfig, AppState, PgAccessRepository, routes};
use common::database::{DatabaseConfig, init_pool};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AccessConfig::from_env()?;

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting access service");

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    // Check database connectivity
    if common::database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    let store = Arc::new(PgAccessRepository::new(pool));
    let app = routes::create_router(AppState::new(store, config.clone()));

    let listener = TcpListener::bind(&config.bind_addr).await?;
    info!("Access service listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
