pub mod commands;
pub mod queries;
pub mod routes;

pub use commands::{UploadReadingsCommand, UploadReadingsError, UploadReadingsResponse};

pub use queries::{
    ListBatchesError, ListBatchesQuery, ListBatchesResponse, ListReadingsError,
    ListReadingsQuery, ListReadingsResponse,
};

pub use routes::readings_routes;
