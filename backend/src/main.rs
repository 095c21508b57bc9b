use anyhow::{Context, Result};
use backend::axum_http::http_serve;
use backend::config::config_loader;
use crates::infra::db::postgres::postgres_connection;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        error!("Backend exited with error: {}", error);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    crates::observability::init_observability("backend")?;

    let (config, postgres_pool) = tokio::time::timeout(backend::DEFAULT_START_TIMEOUT, async {
        let config = config_loader::load()?;
        info!("ENV has been loaded");

        let postgres_pool = postgres_connection::establish_connection(&config.database.dsn)?;
        info!("Postgres connection has been established");

        Ok::<_, anyhow::Error>((config, postgres_pool))
    })
    .await
    .context("startup timed out")??;

    http_serve::start(Arc::new(config), Arc::new(postgres_pool)).await?;

    Ok(())
}
