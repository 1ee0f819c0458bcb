use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;

/// Errors surfaced by the store layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error("Unique constraint violated: {0}")]
    Conflict(String),

    #[error("Row decode error: {0}")]
    Decode(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Builds the process-wide connection pool from configuration
pub struct DatabaseManager;

impl DatabaseManager {
    /// Opens a bounded pool. Connections are recycled after `max_lifetime_secs`.
    pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        if config.url.is_empty() {
            return Err(DatabaseError::ConfigMissing("DATABASE_URL"));
        }

        let pool = Self::pool_options(config).connect(&config.url).await?;
        info!(
            "Created database pool (max_connections={}, max_lifetime={}s)",
            config.max_connections, config.max_lifetime_secs
        );
        Ok(pool)
    }

    fn pool_options(config: &DatabaseConfig) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(0)
            .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
    }

    /// Unique violations become [`DatabaseError::Conflict`] and other errors
    /// raised by Postgres become [`DatabaseError::QueryError`]. Driver and
    /// connection faults pass through.
    pub fn classify(err: sqlx::Error) -> DatabaseError {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                DatabaseError::Conflict(db_err.constraint().unwrap_or("unique").to_string())
            }
            sqlx::Error::Database(db_err) => DatabaseError::QueryError(db_err.message().to_string()),
            _ => DatabaseError::Sqlx(err),
        }
    }

    /// Quote an identifier for Postgres (double quotes, escape inner quotes)
    pub fn quote_identifier(ident: &str) -> String {
        format!("\"{}\"", ident.replace('"', "\"\""))
    }
}
