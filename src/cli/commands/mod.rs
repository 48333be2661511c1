//! CLI command implementations.

pub mod list;
pub mod run;
pub mod show;

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::adapters::sqlite::{initialize_database, PoolConfig, SqliteInteractionStore};
use crate::domain::models::DatabaseConfig;
use crate::domain::ports::InteractionStore;

/// Open the configured store, migrating the schema if needed.
pub(crate) async fn open_store(config: &DatabaseConfig) -> Result<Arc<dyn InteractionStore>> {
    let pool = initialize_database(&config.url(), Some(PoolConfig::from(config)))
        .await
        .with_context(|| format!("Failed to open database at {}", config.path))?;
    Ok(Arc::new(SqliteInteractionStore::new(pool)))
}
