//! SQLite implementation of the InteractionStore.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::domain::errors::StoreError;
use crate::domain::models::{
    Completion, DateKey, DateRange, InteractionRecord, StoredId, StoredRecord,
};
use crate::domain::ports::InteractionStore;

use super::{parse_datetime, parse_uuid};

/// [`InteractionStore`] over a SQLite pool. One row per date.
#[derive(Clone)]
pub struct SqliteInteractionStore {
    pool: SqlitePool,
}

impl SqliteInteractionStore {
    /// Store over a pool whose schema is already migrated
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InteractionStore for SqliteInteractionStore {
    async fn upsert(&self, record: &InteractionRecord) -> Result<StoredId, StoreError> {
        let now = Utc::now().to_rfc3339();

        let (id,): (String,) = sqlx::query_as(
            r#"INSERT INTO interaction_records
               (report_date, id, prompt, answer, completion, recorded_at, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)
               ON CONFLICT(report_date) DO UPDATE SET
                   prompt = excluded.prompt,
                   answer = excluded.answer,
                   completion = excluded.completion,
                   recorded_at = excluded.recorded_at,
                   updated_at = excluded.updated_at
               RETURNING id"#,
        )
        .bind(record.date.to_string())
        .bind(StoredId::new().to_string())
        .bind(&record.prompt)
        .bind(&record.answer)
        .bind(record.completion.as_str())
        .bind(record.recorded_at.to_rfc3339())
        .bind(&now)
        .bind(&now)
        .fetch_one(&self.pool)
        .await?;

        Ok(StoredId::from_uuid(parse_uuid(&id)?))
    }

    async fn get(&self, date: DateKey) -> Result<Option<StoredRecord>, StoreError> {
        let row: Option<InteractionRow> =
            sqlx::query_as("SELECT * FROM interaction_records WHERE report_date = ?")
                .bind(date.to_string())
                .fetch_optional(&self.pool)
                .await?;

        row.map(StoredRecord::try_from).transpose()
    }

    async fn list(&self, range: &DateRange) -> Result<Vec<StoredRecord>, StoreError> {
        if range.is_empty() {
            return Ok(Vec::new());
        }

        let rows: Vec<InteractionRow> = sqlx::query_as(
            "SELECT * FROM interaction_records WHERE report_date BETWEEN ? AND ? ORDER BY report_date ASC",
        )
        .bind(range.start().to_string())
        .bind(range.end().to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(StoredRecord::try_from).collect()
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

#[derive(sqlx::FromRow)]
struct InteractionRow {
    report_date: String,
    id: String,
    prompt: String,
    answer: String,
    completion: String,
    recorded_at: String,
    created_at: String,
    #[allow(dead_code)]
    updated_at: String,
}

impl TryFrom<InteractionRow> for StoredRecord {
    type Error = StoreError;

    fn try_from(row: InteractionRow) -> Result<Self, Self::Error> {
        let date: DateKey = row
            .report_date
            .parse()
            .map_err(|e: crate::domain::models::DateKeyParseError| {
                StoreError::Serialization(e.to_string())
            })?;
        let completion = Completion::from_str(&row.completion).ok_or_else(|| {
            StoreError::Serialization(format!("Unknown completion '{}'", row.completion))
        })?;
        let recorded_at: DateTime<Utc> = parse_datetime(&row.recorded_at)?;

        Ok(StoredRecord {
            id: StoredId::from_uuid(parse_uuid(&row.id)?),
            created_at: parse_datetime(&row.created_at)?,
            record: InteractionRecord {
                date,
                prompt: row.prompt,
                answer: row.answer,
                completion,
                recorded_at,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::create_migrated_test_pool;
    use crate::domain::models::InteractionOutcome;

    async fn setup() -> SqliteInteractionStore {
        let pool = create_migrated_test_pool().await.unwrap();
        SqliteInteractionStore::new(pool)
    }

    fn record(date: DateKey, answer: &str, completion: Completion) -> InteractionRecord {
        InteractionRecord::new(
            date,
            InteractionOutcome {
                prompt: format!("prompt for {date}"),
                answer: answer.to_string(),
                completion,
            },
        )
    }

    fn day(d: u32) -> DateKey {
        DateKey::from_ymd(2024, 11, d).unwrap()
    }

    #[tokio::test]
    async fn test_upsert_then_get() {
        let store = setup().await;
        let id = store
            .upsert(&record(day(1), "first answer", Completion::Stable))
            .await
            .unwrap();

        let stored = store.get(day(1)).await.unwrap().unwrap();
        assert_eq!(stored.id, id);
        assert_eq!(stored.record.answer, "first answer");
        assert_eq!(stored.record.completion, Completion::Stable);
        assert!(store.get(day(2)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_same_date_replaces_and_keeps_id() {
        let store = setup().await;
        let first = store
            .upsert(&record(day(1), "old", Completion::Partial))
            .await
            .unwrap();
        let created_at = store.get(day(1)).await.unwrap().unwrap().created_at;

        let second = store
            .upsert(&record(day(1), "new", Completion::Stable))
            .await
            .unwrap();
        assert_eq!(first, second);

        let stored = store.get(day(1)).await.unwrap().unwrap();
        assert_eq!(stored.record.answer, "new");
        assert_eq!(stored.record.completion, Completion::Stable);
        assert_eq!(stored.created_at, created_at);

        let all = store.list(&DateRange::single(day(1))).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_list_is_ascending_and_bounded() {
        let store = setup().await;
        for d in [5, 2, 9, 3] {
            store
                .upsert(&record(day(d), "a", Completion::Stable))
                .await
                .unwrap();
        }

        let listed = store.list(&DateRange::new(day(2), day(5))).await.unwrap();
        let dates: Vec<_> = listed.iter().map(|r| r.record.date).collect();
        assert_eq!(dates, vec![day(2), day(3), day(5)]);

        let empty = store.list(&DateRange::new(day(9), day(1))).await.unwrap();
        assert!(empty.is_empty());
    }

    #[tokio::test]
    async fn test_closed_store_reports_closed() {
        let store = setup().await;
        store.close().await;

        let err = store
            .upsert(&record(day(1), "late", Completion::Stable))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Closed));
    }
}
