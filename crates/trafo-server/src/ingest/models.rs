//! Data carried through the ingestion pipeline and read back from the store

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use trafo_common::types::PhaseValues;
use uuid::Uuid;

pub const COL_DATETIME: &str = "Datetime";
pub const COL_VOLTAGE_R: &str = "Voltage R";
pub const COL_VOLTAGE_S: &str = "Voltage S";
pub const COL_VOLTAGE_T: &str = "Voltage T";
pub const COL_AMPERE_R: &str = "Ampere R";
pub const COL_AMPERE_S: &str = "Ampere S";
pub const COL_AMPERE_T: &str = "Ampere T";
pub const COL_COSPHI: &str = "Cosphi";

/// Columns every upload must carry, in the order they are checked.
pub const REQUIRED_COLUMNS: [&str; 8] = [
    COL_DATETIME,
    COL_VOLTAGE_R,
    COL_VOLTAGE_S,
    COL_VOLTAGE_T,
    COL_AMPERE_R,
    COL_AMPERE_S,
    COL_AMPERE_T,
    COL_COSPHI,
];

/// One decoded row: column name to raw cell text.
///
/// Cells past the end of a short row are simply absent. `row` is the 1-based
/// data-row index in the file; skipped blank rows still occupy their index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadingInput {
    row: usize,
    values: HashMap<String, String>,
}

impl ReadingInput {
    pub fn new(row: usize, values: HashMap<String, String>) -> Self {
        Self { row, values }
    }

    pub fn with_row(mut self, row: usize) -> Self {
        self.row = row;
        self
    }

    pub fn row(&self) -> usize {
        self.row
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ReadingInput {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            row: 0,
            values: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Header plus data rows, in file order
#[derive(Debug, Clone)]
pub struct DecodedTable {
    pub headers: Vec<String>,
    pub rows: Vec<ReadingInput>,
}

impl DecodedTable {
    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|h| h == column)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedReading {
    pub measured_at: Option<NaiveDateTime>,
    pub voltage: PhaseValues<f64>,
    pub current: PhaseValues<f64>,
    pub cosphi: Option<f64>,
}

/// Power quantities computed from one [`NormalizedReading`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    pub kva: PhaseValues<f64>,
    pub kw: PhaseValues<f64>,
    pub kvar: PhaseValues<f64>,
    pub total_kva: Option<f64>,
    pub total_kw: Option<f64>,
    pub total_kvar: Option<f64>,
    pub remaining_capacity: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculatedReading {
    /// 1-based position among the data rows of the upload
    pub row_number: i32,
    pub reading: NormalizedReading,
    pub metrics: DerivedMetrics,
}

/// Caller-supplied context for one upload
#[derive(Debug, Clone, PartialEq)]
pub struct BatchParams {
    pub trafo_id: i64,
    pub rated_capacity: f64,
    pub uploaded_by: String,
    pub source_filename: Option<String>,
}

/// Every reading of one upload plus the metadata shared by all of them.
///
/// Built once, persisted as a unit and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationBatch {
    pub batch_id: Uuid,
    pub trafo_id: i64,
    pub rated_capacity: f64,
    pub uploaded_by: String,
    pub source_filename: Option<String>,
    pub uploaded_at: DateTime<Utc>,
    pub readings: Vec<CalculatedReading>,
}

impl CalculationBatch {
    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}

/// Raw upload handed to [`crate::ingest::ingest_upload`]
#[derive(Debug, Clone)]
pub struct IngestRequest {
    pub params: BatchParams,
    pub content: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestOutcome {
    pub batch_id: Uuid,
    pub trafo_id: i64,
    pub rows_ingested: u64,
    pub uploaded_at: DateTime<Utc>,
}

/// One persisted reading, flattened the way it is stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ReadingRecord {
    pub batch_id: Uuid,
    pub trafo_id: i64,
    pub row_number: i32,
    pub measured_at: Option<NaiveDateTime>,
    pub voltage_r: Option<f64>,
    pub voltage_s: Option<f64>,
    pub voltage_t: Option<f64>,
    pub current_r: Option<f64>,
    pub current_s: Option<f64>,
    pub current_t: Option<f64>,
    pub cosphi: Option<f64>,
    pub kva_r: Option<f64>,
    pub kva_s: Option<f64>,
    pub kva_t: Option<f64>,
    pub kw_r: Option<f64>,
    pub kw_s: Option<f64>,
    pub kw_t: Option<f64>,
    pub kvar_r: Option<f64>,
    pub kvar_s: Option<f64>,
    pub kvar_t: Option<f64>,
    pub total_kva: Option<f64>,
    pub total_kw: Option<f64>,
    pub total_kvar: Option<f64>,
    pub remaining_capacity: Option<f64>,
    pub uploaded_at: DateTime<Utc>,
}

impl ReadingRecord {
    pub fn from_calculated(batch: &CalculationBatch, calculated: &CalculatedReading) -> Self {
        let CalculatedReading {
            row_number,
            reading,
            metrics,
        } = calculated;

        Self {
            batch_id: batch.batch_id,
            trafo_id: batch.trafo_id,
            row_number: *row_number,
            measured_at: reading.measured_at,
            voltage_r: reading.voltage.r,
            voltage_s: reading.voltage.s,
            voltage_t: reading.voltage.t,
            current_r: reading.current.r,
            current_s: reading.current.s,
            current_t: reading.current.t,
            cosphi: reading.cosphi,
            kva_r: metrics.kva.r,
            kva_s: metrics.kva.s,
            kva_t: metrics.kva.t,
            kw_r: metrics.kw.r,
            kw_s: metrics.kw.s,
            kw_t: metrics.kw.t,
            kvar_r: metrics.kvar.r,
            kvar_s: metrics.kvar.s,
            kvar_t: metrics.kvar.t,
            total_kva: metrics.total_kva,
            total_kw: metrics.total_kw,
            total_kvar: metrics.total_kvar,
            remaining_capacity: metrics.remaining_capacity,
            uploaded_at: batch.uploaded_at,
        }
    }
}

/// Summary of one persisted upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct BatchRecord {
    pub batch_id: Uuid,
    pub trafo_id: i64,
    pub rated_capacity: f64,
    pub uploaded_by: String,
    pub source_filename: Option<String>,
    pub row_count: i64,
    pub uploaded_at: DateTime<Utc>,
}

impl BatchRecord {
    pub fn from_batch(batch: &CalculationBatch) -> Self {
        Self {
            batch_id: batch.batch_id,
            trafo_id: batch.trafo_id,
            rated_capacity: batch.rated_capacity,
            uploaded_by: batch.uploaded_by.clone(),
            source_filename: batch.source_filename.clone(),
            row_count: batch.readings.len() as i64,
            uploaded_at: batch.uploaded_at,
        }
    }
}
