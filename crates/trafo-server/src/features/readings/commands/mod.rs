pub mod upload;

pub use upload::{UploadReadingsCommand, UploadReadingsError, UploadReadingsResponse};
