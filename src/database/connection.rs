use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;

use super::config::DatabaseConfig;
use crate::error::{OrgAuthError, Result};

/// Delay before retry number `attempt` (1-based): `attempt²` seconds.
pub fn retry_delay(attempt: u32) -> Duration {
    Duration::from_secs(u64::from(attempt).pow(2))
}

/// Connect to the database, retrying with quadratic backoff.
///
/// Makes up to `config.connect_attempts` attempts and sleeps `attempt²`
/// seconds between them. The last error is returned once attempts run out.
pub async fn connect_with_retry(config: &DatabaseConfig) -> Result<DatabaseConnection> {
    let attempts = config.connect_attempts.max(1);
    let redacted = config.redacted_url();

    let mut attempt = 1;
    loop {
        match connect(config).await {
            Ok(conn) => {
                tracing::info!(
                    url = %redacted,
                    attempt,
                    max_connections = config.max_connections,
                    "Database connected"
                );
                return Ok(conn);
            }
            Err(e) if attempt < attempts => {
                let delay = retry_delay(attempt);
                tracing::warn!(
                    url = %redacted,
                    attempt,
                    max_attempts = attempts,
                    retry_in_secs = delay.as_secs(),
                    error = %e,
                    "Database connection failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                tracing::error!(
                    url = %redacted,
                    attempts,
                    error = %e,
                    "Giving up connecting to database"
                );
                return Err(OrgAuthError::internal(format!(
                    "Failed to connect to database after {} attempts: {}",
                    attempts, e
                )));
            }
        }
    }
}

async fn connect(config: &DatabaseConfig) -> std::result::Result<DatabaseConnection, sea_orm::DbErr> {
    let mut opt = ConnectOptions::new(&config.url);
    opt.max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(config.connect_timeout))
        .sqlx_logging(false);

    Database::connect(opt).await
}
