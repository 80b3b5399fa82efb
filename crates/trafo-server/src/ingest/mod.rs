//! Reading ingestion and derivation engine
//!
//! Raw CSV bytes from an upload become a persisted batch of calculated
//! readings:
//!
//! - **decoder**: UTF-8 check and CSV parsing into column-keyed rows
//! - **normalizer**: lenient numeric parsing and the strict timestamp format
//! - **calculator**: per-phase kVA/kW/kvar, totals and remaining capacity
//! - **batch**: row-by-row assembly and the single persistence call
//! - **store**: the [`ReadingStore`] collaborator (PostgreSQL and in-memory)
//!
//! Everything up to persistence is synchronous and pure; only the store
//! touches I/O.

pub mod batch;
pub mod calculator;
pub mod decoder;
pub mod error;
pub mod models;
pub mod normalizer;
pub mod store;

pub use batch::{assemble, ingest_upload};
pub use error::{IngestError, StoreError};
pub use models::{
    BatchParams, BatchRecord, CalculatedReading, CalculationBatch, DecodedTable, DerivedMetrics,
    IngestOutcome, IngestRequest, NormalizedReading, ReadingInput, ReadingRecord,
};
pub use store::{MemoryReadingStore, PageRequest, PgReadingStore, ReadingStore};
