//! SQLite persistence for collected interactions.

pub mod connection;
pub mod interaction_repository;
pub mod migrations;

pub use connection::{create_pool, create_test_pool, verify_connection, ConnectionError, PoolConfig};
pub use interaction_repository::SqliteInteractionStore;
pub use migrations::{all_embedded_migrations, Migration, MigrationError, Migrator};

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::errors::StoreError;

/// Parse a UUID string from a SQLite row field.
pub fn parse_uuid(s: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(s).map_err(|e| StoreError::Serialization(e.to_string()))
}

/// Parse an RFC3339 datetime string from a SQLite row field.
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(s)
        .map_err(|e| StoreError::Serialization(e.to_string()))
        .map(|dt| dt.with_timezone(&Utc))
}

/// Failure opening the database at startup
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    /// Pool could not be created or the first query failed
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),
    /// Schema could not be brought up to date
    #[error("Migration error: {0}")]
    Migration(#[from] MigrationError),
}

/// Open (creating if needed) the database and bring its schema up to date.
pub async fn initialize_database(
    database_url: &str,
    config: Option<PoolConfig>,
) -> Result<SqlitePool, DatabaseError> {
    let pool = create_pool(database_url, config).await?;
    verify_connection(&pool).await?;
    let migrator = Migrator::new(pool.clone());
    let applied = migrator
        .run_embedded_migrations(all_embedded_migrations())
        .await?;
    if applied > 0 {
        tracing::info!(applied, "Database schema migrated");
    }
    Ok(pool)
}

/// Create an in-memory test pool with all migrations applied.
pub async fn create_migrated_test_pool() -> Result<SqlitePool, DatabaseError> {
    let pool = create_test_pool().await?;
    let migrator = Migrator::new(pool.clone());
    migrator
        .run_embedded_migrations(all_embedded_migrations())
        .await?;
    Ok(pool)
}
