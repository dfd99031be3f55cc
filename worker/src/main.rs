use anyhow::Result;
use crates::infra::db::{
    postgres::postgres_connection, repositories::subscriptions::SubscriptionPostgres,
};
use std::sync::Arc;
use tracing::{error, info};
use worker::{
    config, services::worker_loop, usecases::subscription_sweep::SubscriptionSweepUseCase,
};

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

    let dotenvy_env = config::config_loader::load()?;
    info!(stage = %dotenvy_env.stage, "ENV has been loaded");

    let postgres_pool = postgres_connection::establish_connection(
        &dotenvy_env.database.url,
        &dotenvy_env.database.pool_settings(),
    )?;
    info!("Postgres connection has been established");

    let db_pool_arc = Arc::new(postgres_pool);
    let subscription_repository = Arc::new(SubscriptionPostgres::new(Arc::clone(&db_pool_arc)));
    let sweep_usecase = Arc::new(SubscriptionSweepUseCase::new(subscription_repository));

    let sweep_loop = tokio::spawn(worker_loop::run_worker_loop(
        sweep_usecase,
        dotenvy_env.sweep,
    ));

    tokio::select! {
        result = sweep_loop => result??,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received, stopping worker");
        }
    };
    Ok(())
}
