//! Upload readings command
//!
//! Ingests one CSV file of transformer readings: decode, normalize, derive
//! power metrics and persist the whole file as a single batch.
//!
//! # Architecture
//!
//! - Command: the upload bytes plus caller-supplied context, with validation
//! - Handler: standalone async function delegating to [`crate::ingest::ingest_upload`]

use mediator::Request;
use std::sync::Arc;

use crate::features::shared::validation::{validate_capacity, validate_trafo_id, ParameterError};
use crate::ingest::{self, BatchParams, IngestError, IngestOutcome, IngestRequest, ReadingStore};

/// Maximum stored length of the original file name
const MAX_FILENAME_LEN: usize = 255;

/// Command to ingest one readings file
///
/// # Examples
///
/// ```rust,ignore
/// use trafo_server::features::readings::commands::UploadReadingsCommand;
///
/// let command = UploadReadingsCommand {
///     trafo_id: 12,
///     capacity: 250.0,
///     uploaded_by: "operator-7".to_string(),
///     filename: Some("gardu-12-march.csv".to_string()),
///     content: std::fs::read("gardu-12-march.csv")?,
/// };
/// ```
#[derive(Clone)]
pub struct UploadReadingsCommand {
    pub trafo_id: i64,

    /// Rated capacity of the transformer
    pub capacity: f64,

    pub uploaded_by: String,

    /// Original file name from the multipart part, if any
    pub filename: Option<String>,

    /// Raw file bytes
    pub content: Vec<u8>,
}

impl std::fmt::Debug for UploadReadingsCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadReadingsCommand")
            .field("trafo_id", &self.trafo_id)
            .field("capacity", &self.capacity)
            .field("uploaded_by", &self.uploaded_by)
            .field("filename", &self.filename)
            .field("content_len", &self.content.len())
            .finish()
    }
}

pub type UploadReadingsResponse = IngestOutcome;

#[derive(Debug, thiserror::Error)]
pub enum UploadReadingsError {
    #[error("{0}")]
    InvalidParameter(#[from] ParameterError),

    #[error("Uploaded file is empty")]
    EmptyContent,

    #[error("File name must be at most {MAX_FILENAME_LEN} characters")]
    FilenameLength,

    #[error(transparent)]
    Ingest(#[from] IngestError),
}

impl Request<Result<UploadReadingsResponse, UploadReadingsError>> for UploadReadingsCommand {}

impl crate::cqrs::middleware::Command for UploadReadingsCommand {}

impl UploadReadingsCommand {
    /// Checks the caller-supplied context before any decoding happens
    #[tracing::instrument(skip(self), fields(trafo_id = self.trafo_id))]
    pub fn validate(&self) -> Result<(), UploadReadingsError> {
        validate_trafo_id(self.trafo_id)?;
        validate_capacity(self.capacity)?;

        if self.content.is_empty() {
            return Err(UploadReadingsError::EmptyContent);
        }

        if self
            .filename
            .as_deref()
            .is_some_and(|name| name.chars().count() > MAX_FILENAME_LEN)
        {
            return Err(UploadReadingsError::FilenameLength);
        }

        tracing::debug!("Command validation passed");
        Ok(())
    }
}

#[tracing::instrument(
    skip(store, command),
    fields(
        trafo_id = command.trafo_id,
        capacity = command.capacity,
        uploaded_by = %command.uploaded_by,
        bytes = command.content.len()
    )
)]
pub async fn handle(
    store: Arc<dyn ReadingStore>,
    command: UploadReadingsCommand,
) -> Result<UploadReadingsResponse, UploadReadingsError> {
    command.validate()?;

    let request = IngestRequest {
        params: BatchParams {
            trafo_id: command.trafo_id,
            rated_capacity: command.capacity,
            uploaded_by: command.uploaded_by,
            source_filename: command.filename,
        },
        content: command.content,
    };

    let outcome = ingest::ingest_upload(store.as_ref(), request).await?;

    tracing::info!(
        batch_id = %outcome.batch_id,
        rows = outcome.rows_ingested,
        "Readings uploaded"
    );

    Ok(outcome)
}
