//! In-memory store implementations.
//!
//! Back the checkpointer for tests and local runs. Identifier assignment,
//! ascending-order selection, and watermark upsert semantics match the
//! Postgres implementations.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use super::stores::{SourceRecordStore, StagingStore, WatermarkStore};
use crate::error::Result;
use crate::models::{GeocodeResult, NewSourceRecord, SourceRecord};

/// Append-only record store with ascending identifier assignment.
#[derive(Default)]
pub struct InMemorySourceRecordStore {
    rows: Mutex<Vec<SourceRecord>>,
}

impl InMemorySourceRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed records directly, for fixtures.
    pub fn seed(&self, names: &[&str]) {
        let mut rows = self.rows.lock();
        for name in names {
            let id = rows.last().map(|r| r.id).unwrap_or(0) + 1;
            rows.push(SourceRecord {
                id,
                name: (*name).to_string(),
                district: None,
                city: None,
                created_at: Utc::now(),
            });
        }
    }
}

#[async_trait]
impl SourceRecordStore for InMemorySourceRecordStore {
    async fn append(&self, records: Vec<NewSourceRecord>) -> Result<Vec<SourceRecord>> {
        let mut rows = self.rows.lock();
        let mut created = Vec::with_capacity(records.len());
        for new_record in records {
            let id = rows.last().map(|r| r.id).unwrap_or(0) + 1;
            let record = SourceRecord {
                id,
                name: new_record.name,
                district: new_record.district,
                city: new_record.city,
                created_at: Utc::now(),
            };
            rows.push(record.clone());
            created.push(record);
        }
        Ok(created)
    }

    async fn fetch_after(&self, after_id: i64, limit: u32) -> Result<Vec<SourceRecord>> {
        let rows = self.rows.lock();
        Ok(rows
            .iter()
            .filter(|r| r.id > after_id)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<SourceRecord>> {
        let rows = self.rows.lock();
        Ok(rows.iter().find(|r| r.id == id).cloned())
    }

    async fn list(&self) -> Result<Vec<SourceRecord>> {
        Ok(self.rows.lock().clone())
    }
}

/// Keyed watermark map with upsert semantics.
#[derive(Default)]
pub struct InMemoryWatermarkStore {
    values: Mutex<HashMap<String, i64>>,
}

impl InMemoryWatermarkStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-set a watermark value, for fixtures.
    pub fn set(&self, key: &str, value: i64) {
        self.values.lock().insert(key.to_string(), value);
    }
}

#[async_trait]
impl WatermarkStore for InMemoryWatermarkStore {
    async fn load(&self, key: &str) -> Result<i64> {
        Ok(self.values.lock().get(key).copied().unwrap_or(0))
    }

    async fn commit(&self, key: &str, value: i64) -> Result<()> {
        self.values.lock().insert(key.to_string(), value);
        Ok(())
    }
}

/// Append-only staging buffer.
#[derive(Default)]
pub struct InMemoryStagingStore {
    rows: Mutex<Vec<GeocodeResult>>,
}

impl InMemoryStagingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.lock().is_empty()
    }
}

#[async_trait]
impl StagingStore for InMemoryStagingStore {
    async fn append(&self, result: &GeocodeResult) -> Result<()> {
        self.rows.lock().push(result.clone());
        Ok(())
    }

    async fn fetch_all(&self) -> Result<Vec<GeocodeResult>> {
        Ok(self.rows.lock().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn append_assigns_ascending_identifiers() {
        let store = InMemorySourceRecordStore::new();
        let created = store
            .append(vec![
                NewSourceRecord {
                    name: "a".to_string(),
                    district: None,
                    city: None,
                },
                NewSourceRecord {
                    name: "b".to_string(),
                    district: None,
                    city: None,
                },
            ])
            .await
            .unwrap();

        assert_eq!(created[0].id, 1);
        assert_eq!(created[1].id, 2);
    }

    #[tokio::test]
    async fn fetch_after_is_exclusive_and_bounded() {
        let store = InMemorySourceRecordStore::new();
        store.seed(&["a", "b", "c", "d"]);

        let selected = store.fetch_after(1, 2).await.unwrap();
        let ids: Vec<i64> = selected.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[tokio::test]
    async fn watermark_defaults_to_zero() {
        let store = InMemoryWatermarkStore::new();
        assert_eq!(store.load("missing").await.unwrap(), 0);

        store.commit("k", 9).await.unwrap();
        assert_eq!(store.load("k").await.unwrap(), 9);
    }
}
