use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};

use super::{PageRequest, ReadingStore};
use crate::ingest::error::StoreError;
use crate::ingest::models::{
    BatchRecord, CalculatedReading, CalculationBatch, ReadingRecord,
};

/// 26 binds per row keeps each statement well under the 65535 parameter limit.
pub const DEFAULT_READING_CHUNK_SIZE: usize = 1000;

const READING_COLUMNS: &str = r#"
    batch_id, trafo_id, row_number, measured_at,
    voltage_r, voltage_s, voltage_t,
    current_r, current_s, current_t,
    cosphi,
    kva_r, kva_s, kva_t,
    kw_r, kw_s, kw_t,
    kvar_r, kvar_s, kvar_t,
    total_kva, total_kw, total_kvar, remaining_capacity,
    uploaded_at
"#;

/// PostgreSQL-backed store; one transaction per batch
#[derive(Debug, Clone)]
pub struct PgReadingStore {
    pool: PgPool,
    chunk_size: usize,
}

impl PgReadingStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            chunk_size: DEFAULT_READING_CHUNK_SIZE,
        }
    }

    pub fn with_chunk_size(pool: PgPool, chunk_size: usize) -> Self {
        Self {
            pool,
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn insert_summary(
        tx: &mut Transaction<'_, Postgres>,
        batch: &CalculationBatch,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO upload_batches (
                batch_id, trafo_id, rated_capacity, uploaded_by,
                source_filename, row_count, uploaded_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(batch.batch_id)
        .bind(batch.trafo_id)
        .bind(batch.rated_capacity)
        .bind(&batch.uploaded_by)
        .bind(&batch.source_filename)
        .bind(batch.readings.len() as i64)
        .bind(batch.uploaded_at)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    async fn insert_readings(
        tx: &mut Transaction<'_, Postgres>,
        batch: &CalculationBatch,
        chunk: &[CalculatedReading],
    ) -> Result<u64, sqlx::Error> {
        let mut query_builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("INSERT INTO reading_results ({}) ", READING_COLUMNS));

        query_builder.push_values(chunk, |mut b, calculated| {
            let reading = &calculated.reading;
            let metrics = &calculated.metrics;

            b.push_bind(batch.batch_id)
                .push_bind(batch.trafo_id)
                .push_bind(calculated.row_number)
                .push_bind(reading.measured_at)
                .push_bind(reading.voltage.r)
                .push_bind(reading.voltage.s)
                .push_bind(reading.voltage.t)
                .push_bind(reading.current.r)
                .push_bind(reading.current.s)
                .push_bind(reading.current.t)
                .push_bind(reading.cosphi)
                .push_bind(metrics.kva.r)
                .push_bind(metrics.kva.s)
                .push_bind(metrics.kva.t)
                .push_bind(metrics.kw.r)
                .push_bind(metrics.kw.s)
                .push_bind(metrics.kw.t)
                .push_bind(metrics.kvar.r)
                .push_bind(metrics.kvar.s)
                .push_bind(metrics.kvar.t)
                .push_bind(metrics.total_kva)
                .push_bind(metrics.total_kw)
                .push_bind(metrics.total_kvar)
                .push_bind(metrics.remaining_capacity)
                .push_bind(batch.uploaded_at);
        });

        let result = query_builder.build().execute(&mut **tx).await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl ReadingStore for PgReadingStore {
    #[tracing::instrument(skip(self, batch), fields(batch_id = %batch.batch_id, rows = batch.len()))]
    async fn insert_batch(&self, batch: &CalculationBatch) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await?;

        Self::insert_summary(&mut tx, batch).await?;

        let mut written = 0;
        for chunk in batch.readings.chunks(self.chunk_size) {
            written += Self::insert_readings(&mut tx, batch, chunk).await?;
        }

        // Dropping an uncommitted transaction rolls it back, so any `?` above
        // leaves nothing behind.
        tx.commit().await?;

        tracing::debug!(written, "Batch committed to database");
        Ok(written)
    }

    async fn list_readings(
        &self,
        trafo_id: i64,
        page: PageRequest,
    ) -> Result<(Vec<ReadingRecord>, i64), StoreError> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM reading_results WHERE trafo_id = $1")
                .bind(trafo_id)
                .fetch_one(&self.pool)
                .await?;

        let records = sqlx::query_as::<_, ReadingRecord>(&format!(
            r#"
            SELECT {}
            FROM reading_results
            WHERE trafo_id = $1
            ORDER BY uploaded_at DESC, batch_id, row_number
            LIMIT $2
            OFFSET $3
            "#,
            READING_COLUMNS
        ))
        .bind(trafo_id)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((records, total))
    }

    async fn list_batches(
        &self,
        trafo_id: i64,
        page: PageRequest,
    ) -> Result<(Vec<BatchRecord>, i64), StoreError> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM upload_batches WHERE trafo_id = $1")
                .bind(trafo_id)
                .fetch_one(&self.pool)
                .await?;

        let records = sqlx::query_as::<_, BatchRecord>(
            r#"
            SELECT batch_id, trafo_id, rated_capacity, uploaded_by,
                   source_filename, row_count, uploaded_at
            FROM upload_batches
            WHERE trafo_id = $1
            ORDER BY uploaded_at DESC, batch_id
            LIMIT $2
            OFFSET $3
            "#,
        )
        .bind(trafo_id)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((records, total))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        crate::db::health_check(&self.pool)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }
}
