//! # SchoolHub DB
//!
//! PostgreSQL pool initialization, migrations and error helpers.
//!
//! ```ignore
//! use schoolhub_db::{DatabaseConfig, init_db_pool};
//!
//! let pool = init_db_pool(&DatabaseConfig::from_env()?).await?;
//! ```

use std::env;
use std::time::Duration;

use sqlx::migrate::MigrateError;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

pub use sqlx::PgPool;

const DEFAULT_MAX_CONNECTIONS: u32 = 10;

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl DatabaseConfig {
    /// Reads `DATABASE_URL` (required) and `DATABASE_MAX_CONNECTIONS`.
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Self {
            url: env::var("DATABASE_URL")?,
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_CONNECTIONS),
        })
    }
}

/// Opens the connection pool. The returned pool is cheap to clone.
pub async fn init_db_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.url)
        .await?;

    info!(
        db.max_connections = config.max_connections,
        "Database pool initialized"
    );
    Ok(pool)
}

/// Applies the SQL migrations shipped in the workspace `migrations/` directory.
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrateError> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    info!("Database migrations applied");
    Ok(())
}

/// Returns the violated constraint name when `err` is a unique violation.
///
/// Services match on the name to produce a specific conflict message:
///
/// ```ignore
/// match unique_violation(&err) {
///     Some("schools_username_key") => AppError::conflict("School username is already taken"),
///     _ => AppError::internal(err),
/// }
/// ```
pub fn unique_violation(err: &sqlx::Error) -> Option<&str> {
    match err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            Some(db_err.constraint().unwrap_or_default())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_violation_ignores_other_errors() {
        assert_eq!(unique_violation(&sqlx::Error::RowNotFound), None);
        assert_eq!(unique_violation(&sqlx::Error::PoolTimedOut), None);
    }
}
