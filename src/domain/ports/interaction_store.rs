//! Interaction record persistence port.

use async_trait::async_trait;

use crate::domain::errors::StoreError;
use crate::domain::models::{DateKey, DateRange, InteractionRecord, StoredId, StoredRecord};

/// Document store keyed by date.
#[async_trait]
pub trait InteractionStore: Send + Sync {
    /// Insert the record, or replace the one already stored for its date.
    ///
    /// Returns the document id. Upserting the same date twice leaves a single
    /// document and returns the same id both times.
    async fn upsert(&self, record: &InteractionRecord) -> Result<StoredId, StoreError>;

    /// Get the record stored for a date.
    async fn get(&self, date: DateKey) -> Result<Option<StoredRecord>, StoreError>;

    /// List stored records within a range, ascending by date.
    async fn list(&self, range: &DateRange) -> Result<Vec<StoredRecord>, StoreError>;

    /// Release the underlying connection.
    async fn close(&self);
}
