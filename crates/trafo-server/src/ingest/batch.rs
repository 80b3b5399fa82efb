//! Turning a decoded upload into a persisted batch
//!
//! One upload moves through `decode -> normalize(i) -> derive(i) -> persist`
//! row by row, in file order. The first failing row aborts the whole upload
//! before anything reaches the store.

use chrono::Utc;
use uuid::Uuid;

use super::calculator::derive;
use super::decoder::decode;
use super::error::IngestError;
use super::models::{
    BatchParams, CalculatedReading, CalculationBatch, DecodedTable, IngestOutcome, IngestRequest,
    COL_DATETIME, REQUIRED_COLUMNS,
};
use super::normalizer::normalize_row;
use super::store::ReadingStore;

/// Build a [`CalculationBatch`] from a decoded table.
///
/// A required column missing from the header fails on the first data row that
/// needed it, i.e. row 1. An unreadable `Datetime` fails on its own row.
pub fn assemble(table: &DecodedTable, params: &BatchParams) -> Result<CalculationBatch, IngestError> {
    if let Some(missing) = REQUIRED_COLUMNS.iter().find(|c| !table.has_column(c)) {
        tracing::warn!(field = %missing, "Required column missing, aborting upload");
        return Err(IngestError::row(1, *missing, "required column is missing"));
    }

    let mut readings = Vec::with_capacity(table.rows.len());

    for row in &table.rows {
        let row_number = row.row();

        tracing::debug!(row = row_number, "Normalizing row");
        let reading = normalize_row(row).map_err(|e| {
            tracing::warn!(row = row_number, error = %e, "Row rejected, aborting upload");
            IngestError::row(row_number, COL_DATETIME, e.to_string())
        })?;

        tracing::debug!(row = row_number, "Deriving metrics");
        let metrics = derive(&reading, params.rated_capacity);

        readings.push(CalculatedReading {
            row_number: row_number as i32,
            reading,
            metrics,
        });
    }

    Ok(CalculationBatch {
        batch_id: Uuid::new_v4(),
        trafo_id: params.trafo_id,
        rated_capacity: params.rated_capacity,
        uploaded_by: params.uploaded_by.clone(),
        source_filename: params.source_filename.clone(),
        uploaded_at: Utc::now(),
        readings,
    })
}

/// Decode, calculate and persist one upload.
///
/// The store is called exactly once, and only when every row succeeded.
#[tracing::instrument(
    skip(store, request),
    fields(
        trafo_id = request.params.trafo_id,
        bytes = request.content.len(),
        filename = ?request.params.source_filename
    )
)]
pub async fn ingest_upload(
    store: &dyn ReadingStore,
    request: IngestRequest,
) -> Result<IngestOutcome, IngestError> {
    tracing::debug!("Decoding upload");
    let table = decode(&request.content).map_err(|e| {
        tracing::warn!(error = %e, "Upload could not be decoded");
        e
    })?;
    tracing::info!(rows = table.rows.len(), "Upload decoded");

    let batch = assemble(&table, &request.params)?;

    tracing::debug!(batch_id = %batch.batch_id, rows = batch.len(), "Persisting batch");
    let rows_ingested = store.insert_batch(&batch).await.map_err(|e| {
        tracing::warn!(batch_id = %batch.batch_id, error = %e, "Batch rolled back");
        IngestError::Persistence(e)
    })?;

    tracing::info!(batch_id = %batch.batch_id, rows_ingested, "Batch committed");

    Ok(IngestOutcome {
        batch_id: batch.batch_id,
        trafo_id: batch.trafo_id,
        rows_ingested,
        uploaded_at: batch.uploaded_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::error::StoreError;
    use crate::ingest::models::{BatchRecord, ReadingRecord};
    use crate::ingest::store::{MemoryReadingStore, PageRequest};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const HEADER: &str = "Datetime,Voltage R,Voltage S,Voltage T,Ampere R,Ampere S,Ampere T,Cosphi";

    fn params() -> BatchParams {
        BatchParams {
            trafo_id: 42,
            rated_capacity: 1000.0,
            uploaded_by: "operator-1".to_string(),
            source_filename: Some("readings.csv".to_string()),
        }
    }

    fn request(body: &str) -> IngestRequest {
        IngestRequest {
            params: params(),
            content: body.as_bytes().to_vec(),
        }
    }

    /// Counts calls and fails every insert
    #[derive(Default)]
    struct FailingStore {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ReadingStore for FailingStore {
        async fn insert_batch(&self, _batch: &CalculationBatch) -> Result<u64, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::Unavailable("connection reset".to_string()))
        }

        async fn list_readings(
            &self,
            _trafo_id: i64,
            _page: PageRequest,
        ) -> Result<(Vec<ReadingRecord>, i64), StoreError> {
            Ok((Vec::new(), 0))
        }

        async fn list_batches(
            &self,
            _trafo_id: i64,
            _page: PageRequest,
        ) -> Result<(Vec<BatchRecord>, i64), StoreError> {
            Ok((Vec::new(), 0))
        }

        async fn ping(&self) -> Result<(), StoreError> {
            Ok(())
        }
    }

    #[test]
    fn test_assemble_numbers_rows_and_derives() {
        let csv = format!(
            "{}\n2024-01-01 00:00:00,100,100,100,2,2,2,0.8\n2024-01-01 00:15:00,,100,100,2,2,2,0.8\n",
            HEADER
        );
        let table = decode(csv.as_bytes()).unwrap();
        let batch = assemble(&table, &params()).unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.readings[0].row_number, 1);
        assert_eq!(batch.readings[1].row_number, 2);
        assert_eq!(batch.readings[0].metrics.total_kva, Some(600.0));
        assert_eq!(batch.readings[1].metrics.kva.r, None);
        assert_eq!(batch.readings[1].metrics.total_kva, None);
        assert_eq!(batch.uploaded_by, "operator-1");
    }

    #[test]
    fn test_missing_column_fails_row_one() {
        let csv = "Datetime,Voltage R,Voltage S,Voltage T,Ampere R,Ampere S,Ampere T\n2024-01-01 00:00:00,1,1,1,1,1,1\n";
        let table = decode(csv.as_bytes()).unwrap();

        match assemble(&table, &params()) {
            Err(IngestError::RowValidation { row, field, .. }) => {
                assert_eq!(row, 1);
                assert_eq!(field, "Cosphi");
            },
            other => panic!("expected RowValidation, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_timestamp_reports_its_row() {
        let csv = format!(
            "{}\n2024-01-01 00:00:00,1,1,1,1,1,1,1\n2024-01-01 00:15:00,1,1,1,1,1,1,1\n01/01/2024,1,1,1,1,1,1,1\n",
            HEADER
        );
        let table = decode(csv.as_bytes()).unwrap();

        match assemble(&table, &params()) {
            Err(IngestError::RowValidation { row, field, .. }) => {
                assert_eq!(row, 3);
                assert_eq!(field, "Datetime");
            },
            other => panic!("expected RowValidation, got {:?}", other),
        }
    }

    #[test]
    fn test_blank_record_still_counts_toward_row_number() {
        let csv = format!(
            "{}\n2024-01-01 00:00:00,1,1,1,1,1,1,1\n,,,,,,,\nbad-date,1,1,1,1,1,1,1\n",
            HEADER
        );
        let table = decode(csv.as_bytes()).unwrap();

        match assemble(&table, &params()) {
            Err(IngestError::RowValidation { row, field, .. }) => {
                assert_eq!(row, 3);
                assert_eq!(field, "Datetime");
            },
            other => panic!("expected RowValidation, got {:?}", other),
        }
    }

    #[test]
    fn test_blank_record_leaves_gap_in_row_numbers() {
        let csv = format!(
            "{}\n2024-01-01 00:00:00,1,1,1,1,1,1,1\n,,,,,,,\n2024-01-01 00:30:00,1,1,1,1,1,1,1\n",
            HEADER
        );
        let table = decode(csv.as_bytes()).unwrap();
        let batch = assemble(&table, &params()).unwrap();

        let numbers: Vec<i32> = batch.readings.iter().map(|r| r.row_number).collect();
        assert_eq!(numbers, vec![1, 3]);
    }

    #[test]
    fn test_blank_timestamp_is_accepted() {
        let csv = format!("{}\n,230,230,230,1,1,1,0.9\n", HEADER);
        let table = decode(csv.as_bytes()).unwrap();
        let batch = assemble(&table, &params()).unwrap();

        assert_eq!(batch.readings[0].reading.measured_at, None);
    }

    #[tokio::test]
    async fn test_ingest_upload_persists_once() {
        let store = MemoryReadingStore::new();
        let csv = format!("{}\n2024-01-01 00:00:00,100,100,100,2,2,2,0.8\n", HEADER);

        let outcome = ingest_upload(&store, request(&csv)).await.unwrap();

        assert_eq!(outcome.trafo_id, 42);
        assert_eq!(outcome.rows_ingested, 1);
        assert_eq!(store.batch_count().await, 1);
    }

    #[tokio::test]
    async fn test_failed_row_never_reaches_store() {
        let store = FailingStore::default();
        let csv = format!("{}\nyesterday,100,100,100,2,2,2,0.8\n", HEADER);

        let err = ingest_upload(&store, request(&csv)).await.unwrap_err();

        assert!(matches!(err, IngestError::RowValidation { row: 1, .. }));
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_store_failure_is_persistence_error() {
        let store = FailingStore::default();
        let csv = format!("{}\n2024-01-01 00:00:00,100,100,100,2,2,2,0.8\n", HEADER);

        let err = ingest_upload(&store, request(&csv)).await.unwrap_err();

        assert!(matches!(err, IngestError::Persistence(_)));
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_upload_never_reaches_store() {
        let store = MemoryReadingStore::new();

        let err = ingest_upload(&store, request(HEADER)).await.unwrap_err();

        assert!(matches!(err, IngestError::EmptyUpload));
        assert_eq!(store.batch_count().await, 0);
    }
}
