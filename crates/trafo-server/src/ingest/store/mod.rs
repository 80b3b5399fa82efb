//! Persistence collaborator for calculated readings
//!
//! [`ReadingStore::insert_batch`] is all-or-nothing: either every reading of
//! the batch becomes visible or none does.

mod memory;
mod postgres;

pub use memory::MemoryReadingStore;
pub use postgres::PgReadingStore;

use async_trait::async_trait;

use super::error::StoreError;
use super::models::{BatchRecord, CalculationBatch, ReadingRecord};

/// Offset/limit window for list operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: i64,
    pub offset: i64,
}

impl PageRequest {
    pub fn new(page: i64, per_page: i64) -> Self {
        Self {
            limit: per_page,
            offset: page.saturating_sub(1).max(0).saturating_mul(per_page),
        }
    }
}

#[async_trait]
pub trait ReadingStore: Send + Sync {
    /// Persist a whole batch atomically and return the number of readings written.
    async fn insert_batch(&self, batch: &CalculationBatch) -> Result<u64, StoreError>;

    /// Readings of one transformer, newest upload first then row order,
    /// together with the total count.
    async fn list_readings(
        &self,
        trafo_id: i64,
        page: PageRequest,
    ) -> Result<(Vec<ReadingRecord>, i64), StoreError>;

    /// Upload batches of one transformer, newest first, with the total count.
    async fn list_batches(
        &self,
        trafo_id: i64,
        page: PageRequest,
    ) -> Result<(Vec<BatchRecord>, i64), StoreError>;

    /// Cheap reachability probe used by the health endpoint.
    async fn ping(&self) -> Result<(), StoreError>;
}
