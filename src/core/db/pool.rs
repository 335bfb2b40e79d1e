//! PostgreSQL pool setup.
//!
//! One pool is opened at startup from [`Config`] and cloned into every
//! repository. Pending migrations from `migrations/` run before it is handed out.

use std::time::Duration;

use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::core::config::Config;

/// How long a request waits for a free connection
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

/// Database errors
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("DATABASE_URL environment variable not set")]
    MissingDatabaseUrl,

    #[error("Failed to connect to database: {0}")]
    ConnectionError(#[from] sqlx::Error),

    #[error("Failed to run migrations: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),
}

/// Open the pool described by `config` and apply pending migrations
pub async fn connect(config: &Config) -> Result<PgPool, DbError> {
    let database_url = config
        .database_url
        .as_deref()
        .ok_or(DbError::MissingDatabaseUrl)?;

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!(
        "Database ready (max {} connections), migrations applied",
        config.db_max_connections
    );

    Ok(pool)
}
