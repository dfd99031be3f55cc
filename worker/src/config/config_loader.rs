use super::{
    config_model::{Database, DotEnvyConfig, Sweep},
    stage::Stage,
};
use anyhow::{Context, Result};

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let database = Database {
        url: std::env::var("DATABASE_URL").expect("DATABASE_URL is invalid"),
        max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "5".to_string())
            .parse()
            .context("DATABASE_MAX_CONNECTIONS is invalid")?,
        connect_timeout_seconds: std::env::var("DATABASE_CONNECT_TIMEOUT_SECONDS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("DATABASE_CONNECT_TIMEOUT_SECONDS is invalid")?,
    };
    anyhow::ensure!(
        database.max_connections > 0,
        "DATABASE_MAX_CONNECTIONS must be positive"
    );
    anyhow::ensure!(
        database.connect_timeout_seconds > 0,
        "DATABASE_CONNECT_TIMEOUT_SECONDS must be positive"
    );

    let interval_seconds = std::env::var("SWEEP_INTERVAL_SECONDS")
        .unwrap_or_else(|_| "300".to_string())
        .parse::<u64>()
        .context("SWEEP_INTERVAL_SECONDS is invalid")?;
    anyhow::ensure!(interval_seconds > 0, "SWEEP_INTERVAL_SECONDS must be positive");

    let batch_limit = std::env::var("SWEEP_BATCH_LIMIT")
        .unwrap_or_else(|_| "100".to_string())
        .parse::<i64>()
        .context("SWEEP_BATCH_LIMIT is invalid")?;
    anyhow::ensure!(batch_limit > 0, "SWEEP_BATCH_LIMIT must be positive");

    Ok(DotEnvyConfig {
        stage: get_stage(),
        database,
        sweep: Sweep {
            interval_seconds,
            batch_limit,
        },
    })
}

pub fn get_stage() -> Stage {
    dotenvy::dotenv().ok();

    let stage_str = std::env::var("STAGE").unwrap_or("".to_string());
    Stage::try_from(&stage_str).unwrap_or_default()
}
