use anyhow::Result;
use crates::infra::db::{
    postgres::postgres_connection, repositories::snapshots::SnapshotPostgres,
};
use std::{sync::Arc, time::Duration};
use tracing::{error, info};
use worker::{config, services::snapshot_loop};

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(error) = run().await {
        error!("Worker exited with error: {}", error);
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    crates::observability::init_observability("worker")?;

    let config = config::config_loader::load()?;
    info!("ENV has been loaded");

    let postgres_pool = postgres_connection::establish_connection(&config.database.dsn)?;
    info!("Postgres connection has been established");

    let snapshot_repository = Arc::new(SnapshotPostgres::new(Arc::new(postgres_pool)));

    snapshot_loop::run_snapshot_loop(
        snapshot_repository,
        Duration::from_secs(config.snapshot.interval_seconds),
    )
    .await
}
