//! Connection manager: the one persistent connection to PostgreSQL.

use crate::error::{AppError, ConfigError};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::str::FromStr;
use std::time::Duration;

/// Open the shared connection. The handle is capped at a single connection, opened eagerly
/// and never recycled, so every CRUD call runs on the same session for the process lifetime.
pub async fn connect(database_url: &str, acquire_timeout: Duration) -> Result<PgPool, AppError> {
    let opts = sqlx::postgres::PgConnectOptions::from_str(database_url)
        .map_err(|e| ConfigError::Load(format!("invalid DATABASE_URL: {}", e)))?;
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .acquire_timeout(acquire_timeout)
        .connect_with(opts)
        .await?;
    tracing::info!(database = %redact(database_url), "connected to store");
    Ok(pool)
}

/// Close the shared connection, waiting for in-flight calls to finish.
pub async fn close(pool: &PgPool) {
    pool.close().await;
    tracing::info!("store connection closed");
}

/// Strip the password from a connection URL before logging it.
pub fn redact(database_url: &str) -> String {
    let Some(scheme_end) = database_url.find("://") else {
        return database_url.to_string();
    };
    let rest = &database_url[scheme_end + 3..];
    let Some(at) = rest.rfind('@') else {
        return database_url.to_string();
    };
    let creds = &rest[..at];
    match creds.find(':') {
        Some(colon) => format!(
            "{}{}:***{}",
            &database_url[..scheme_end + 3],
            &creds[..colon],
            &rest[at..]
        ),
        None => database_url.to_string(),
    }
}
