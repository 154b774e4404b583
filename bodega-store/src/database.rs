use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use tracing::{error, info};

use bodega_core::{CoreError, CoreResult};

use crate::app_config::DatabaseConfig;

/// Translate a storage-layer fault: log the cause, surface only the
/// operation that failed.
pub(crate) fn storage_error(context: &str, err: impl std::fmt::Display) -> CoreError {
    error!("{}: {}", context, err);
    CoreError::Internal(format!("{} failed", context))
}

#[derive(Clone)]
pub struct DbClient {
    pub pool: Pool<Postgres>,
}

impl DbClient {
    /// Pooled connection with a bounded acquire timeout, so no store call
    /// can block a request indefinitely.
    pub async fn connect(config: &DatabaseConfig) -> CoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect(&config.url)
            .await
            .map_err(|err| storage_error("connecting to the database", err))?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> CoreResult<()> {
        info!("running database migrations");
        sqlx::migrate!("../migrations")
            .run(&self.pool)
            .await
            .map_err(|err| storage_error("running migrations", err))?;
        info!("migrations completed");
        Ok(())
    }
}
