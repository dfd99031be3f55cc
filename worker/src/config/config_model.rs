use std::time::Duration;

use crates::infra::db::postgres::postgres_connection::PoolSettings;

use super::stage::Stage;

#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub stage: Stage,
    pub database: Database,
    pub sweep: Sweep,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
    pub max_connections: u32,
    pub connect_timeout_seconds: u64,
}

impl Database {
    pub fn pool_settings(&self) -> PoolSettings {
        PoolSettings {
            max_size: self.max_connections,
            connection_timeout: Duration::from_secs(self.connect_timeout_seconds),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Sweep {
    pub interval_seconds: u64,
    pub batch_limit: i64,
}

impl Sweep {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }
}
