pub mod list_batches;
pub mod list_readings;

pub use list_batches::{ListBatchesError, ListBatchesQuery, ListBatchesResponse};
pub use list_readings::{ListReadingsError, ListReadingsQuery, ListReadingsResponse};
