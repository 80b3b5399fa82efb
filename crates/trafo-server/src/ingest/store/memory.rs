use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{PageRequest, ReadingStore};
use crate::ingest::error::StoreError;
use crate::ingest::models::{BatchRecord, CalculationBatch, ReadingRecord};

#[derive(Debug)]
struct StoredBatch {
    summary: BatchRecord,
    readings: Vec<ReadingRecord>,
}

/// Process-local store for development and tests.
///
/// Batches are kept in commit order; a batch is pushed under one write lock so
/// readers never observe a partial upload.
#[derive(Debug, Default)]
pub struct MemoryReadingStore {
    batches: RwLock<Vec<StoredBatch>>,
}

impl MemoryReadingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn batch_count(&self) -> usize {
        self.batches.read().await.len()
    }

    pub async fn reading_count(&self) -> usize {
        self.batches
            .read()
            .await
            .iter()
            .map(|b| b.readings.len())
            .sum()
    }
}

fn window<T>(items: impl Iterator<Item = T>, page: PageRequest) -> Vec<T> {
    items
        .skip(page.offset.max(0) as usize)
        .take(page.limit.max(0) as usize)
        .collect()
}

#[async_trait]
impl ReadingStore for MemoryReadingStore {
    async fn insert_batch(&self, batch: &CalculationBatch) -> Result<u64, StoreError> {
        let stored = StoredBatch {
            summary: BatchRecord::from_batch(batch),
            readings: batch
                .readings
                .iter()
                .map(|r| ReadingRecord::from_calculated(batch, r))
                .collect(),
        };
        let written = stored.readings.len() as u64;

        self.batches.write().await.push(stored);

        tracing::debug!(batch_id = %batch.batch_id, rows = written, "Batch stored in memory");
        Ok(written)
    }

    async fn list_readings(
        &self,
        trafo_id: i64,
        page: PageRequest,
    ) -> Result<(Vec<ReadingRecord>, i64), StoreError> {
        let guard = self.batches.read().await;
        let matching: Vec<&StoredBatch> = guard
            .iter()
            .rev()
            .filter(|b| b.summary.trafo_id == trafo_id)
            .collect();

        let total = matching.iter().map(|b| b.readings.len()).sum::<usize>() as i64;
        let items = window(
            matching.iter().flat_map(|b| b.readings.iter().cloned()),
            page,
        );
        Ok((items, total))
    }

    async fn list_batches(
        &self,
        trafo_id: i64,
        page: PageRequest,
    ) -> Result<(Vec<BatchRecord>, i64), StoreError> {
        let guard = self.batches.read().await;
        let matching: Vec<&StoredBatch> = guard
            .iter()
            .rev()
            .filter(|b| b.summary.trafo_id == trafo_id)
            .collect();

        let total = matching.len() as i64;
        let items = window(matching.iter().map(|b| b.summary.clone()), page);
        Ok((items, total))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::models::{CalculatedReading, DerivedMetrics, NormalizedReading};
    use chrono::Utc;
    use uuid::Uuid;

    fn batch(trafo_id: i64, rows: i32) -> CalculationBatch {
        CalculationBatch {
            batch_id: Uuid::new_v4(),
            trafo_id,
            rated_capacity: 100.0,
            uploaded_by: "tester".to_string(),
            source_filename: None,
            uploaded_at: Utc::now(),
            readings: (1..=rows)
                .map(|row_number| CalculatedReading {
                    row_number,
                    reading: NormalizedReading::default(),
                    metrics: DerivedMetrics::default(),
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_list() {
        let store = MemoryReadingStore::new();
        let first = batch(7, 3);
        let second = batch(7, 2);

        assert_eq!(store.insert_batch(&first).await.unwrap(), 3);
        assert_eq!(store.insert_batch(&second).await.unwrap(), 2);
        store.insert_batch(&batch(8, 4)).await.unwrap();

        let (readings, total) = store
            .list_readings(7, PageRequest::new(1, 100))
            .await
            .unwrap();
        assert_eq!(total, 5);
        assert_eq!(readings[0].batch_id, second.batch_id);
        assert_eq!(readings[0].row_number, 1);
        assert_eq!(readings[2].batch_id, first.batch_id);

        let (batches, total) = store.list_batches(7, PageRequest::new(1, 1)).await.unwrap();
        assert_eq!(total, 2);
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].batch_id, second.batch_id);
        assert_eq!(batches[0].row_count, 2);

        assert_eq!(store.batch_count().await, 3);
        assert_eq!(store.reading_count().await, 9);
    }

    #[tokio::test]
    async fn test_pagination_past_end() {
        let store = MemoryReadingStore::new();
        store.insert_batch(&batch(1, 3)).await.unwrap();

        let (readings, total) = store.list_readings(1, PageRequest::new(2, 3)).await.unwrap();
        assert!(readings.is_empty());
        assert_eq!(total, 3);
    }
}
