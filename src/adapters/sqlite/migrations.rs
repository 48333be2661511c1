//! SQLite database migration management.

use sqlx::SqlitePool;
use thiserror::Error;

/// Errors applying the schema
#[derive(Debug, Error)]
pub enum MigrationError {
    /// A migration's SQL or its bookkeeping insert failed; nothing of it was kept
    #[error("Failed to execute migration {version}: {source}")]
    ExecutionError {
        /// Version of the failed migration
        version: i64,
        /// Underlying database error
        #[source]
        source: sqlx::Error,
    },
    /// `schema_migrations` could not be read
    #[error("Failed to get schema version: {0}")]
    VersionCheckError(#[source] sqlx::Error),
}

/// One versioned schema change
#[derive(Debug, Clone)]
pub struct Migration {
    /// Applied in ascending order; recorded in `schema_migrations`
    pub version: i64,
    /// Human-readable summary
    pub description: String,
    /// SQL script, possibly several statements
    pub sql: String,
}

/// Applies [`Migration`]s to a pool
pub struct Migrator {
    pool: SqlitePool,
}

impl Migrator {
    /// Migrator over `pool`
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Apply every migration newer than the recorded schema version, in order.
    /// Returns how many were applied.
    pub async fn run_embedded_migrations(
        &self,
        migrations: Vec<Migration>,
    ) -> Result<usize, MigrationError> {
        self.ensure_migrations_table().await?;
        let current_version = self.get_current_version().await?;
        let mut pending: Vec<_> = migrations
            .into_iter()
            .filter(|m| m.version > current_version)
            .collect();
        pending.sort_by_key(|m| m.version);

        for migration in &pending {
            self.apply_migration(migration).await?;
            tracing::debug!(
                version = migration.version,
                description = %migration.description,
                "Applied migration"
            );
        }

        Ok(pending.len())
    }

    async fn ensure_migrations_table(&self) -> Result<(), MigrationError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL DEFAULT (datetime('now')),
                description TEXT
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| MigrationError::ExecutionError {
            version: 0,
            source: e,
        })?;
        Ok(())
    }

    /// Highest applied version, or 0 for a fresh database
    pub async fn get_current_version(&self) -> Result<i64, MigrationError> {
        let result: Option<(i64,)> =
            sqlx::query_as("SELECT COALESCE(MAX(version), 0) FROM schema_migrations")
                .fetch_optional(&self.pool)
                .await
                .map_err(MigrationError::VersionCheckError)?;
        Ok(result.map_or(0, |(v,)| v))
    }

    async fn apply_migration(&self, migration: &Migration) -> Result<(), MigrationError> {
        let to_error = |source| MigrationError::ExecutionError {
            version: migration.version,
            source,
        };

        let mut tx = self.pool.begin().await.map_err(to_error)?;
        sqlx::raw_sql(&migration.sql)
            .execute(&mut *tx)
            .await
            .map_err(to_error)?;
        sqlx::query("INSERT INTO schema_migrations (version, description) VALUES (?, ?)")
            .bind(migration.version)
            .bind(&migration.description)
            .execute(&mut *tx)
            .await
            .map_err(to_error)?;
        tx.commit().await.map_err(to_error)
    }
}

/// Version 1: the `interaction_records` table, unique on date
pub fn interaction_records_migration() -> Migration {
    Migration {
        version: 1,
        description: "Interaction records keyed by date".to_string(),
        sql: include_str!("../../../migrations/001_interaction_records.sql").to_string(),
    }
}

/// Every migration compiled into the binary, in order
pub fn all_embedded_migrations() -> Vec<Migration> {
    vec![interaction_records_migration()]
}
