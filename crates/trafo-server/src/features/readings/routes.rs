//! Readings API routes
//!
//! # Route Structure
//!
//! - `POST /api/v1/readings/upload?trafo_id=&capacity=` - Ingest one CSV file (multipart field `file`)
//! - `GET /api/v1/readings?trafo_id=&page=&per_page=` - Calculated readings of a transformer
//! - `GET /api/v1/readings/batches?trafo_id=&page=&per_page=` - Upload batches of a transformer

use crate::api::response::{ApiResponse, ErrorResponse};
use crate::features::shared::AuthenticatedUser;
use crate::ingest::{IngestError, ReadingStore};
use axum::{
    extract::{
        multipart::MultipartError, rejection::QueryRejection, Multipart, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use super::{
    commands::{UploadReadingsCommand, UploadReadingsError},
    queries::{ListBatchesError, ListBatchesQuery, ListReadingsError, ListReadingsQuery},
};

/// Name of the multipart part carrying the CSV file
pub const FILE_FIELD: &str = "file";

pub fn readings_routes() -> Router<Arc<dyn ReadingStore>> {
    Router::new()
        .route("/", get(list_readings))
        .route("/upload", post(upload_readings))
        .route("/batches", get(list_batches))
}

/// Query string of the upload endpoint
#[derive(Debug, Deserialize)]
struct UploadParams {
    trafo_id: Option<i64>,
    capacity: Option<f64>,
}

// ============================================================================
// Command Handlers (Write Operations)
// ============================================================================

/// Upload a readings file
///
/// # Response
///
/// - `201 Created` - Every row was calculated and persisted as one batch
/// - `400 Bad Request` - Invalid parameters or a rejected file; nothing persisted
/// - `401 Unauthorized` - Missing caller identity
/// - `500 Internal Server Error` - The batch could not be persisted
#[tracing::instrument(
    skip(store, user, params, multipart),
    fields(user_id = %user.user_id)
)]
async fn upload_readings(
    State(store): State<Arc<dyn ReadingStore>>,
    user: AuthenticatedUser,
    params: Result<Query<UploadParams>, QueryRejection>,
    mut multipart: Multipart,
) -> Result<Response, ReadingsApiError> {
    let Query(params) = params.map_err(|e| ReadingsApiError::InvalidRequest(e.body_text()))?;
    let trafo_id = params
        .trafo_id
        .ok_or_else(|| ReadingsApiError::InvalidRequest("trafo_id is required".to_string()))?;
    let capacity = params
        .capacity
        .ok_or_else(|| ReadingsApiError::InvalidRequest("capacity is required".to_string()))?;

    let mut upload: Option<(Option<String>, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field.file_name().map(str::to_string);
        let data = field.bytes().await?;
        upload = Some((filename, data.to_vec()));
    }

    let (filename, content) = upload.ok_or(ReadingsApiError::MissingFile)?;

    let command = UploadReadingsCommand {
        trafo_id,
        capacity,
        uploaded_by: user.user_id,
        filename,
        content,
    };

    let response = super::commands::upload::handle(store, command).await?;

    tracing::info!(
        batch_id = %response.batch_id,
        rows = response.rows_ingested,
        "Readings uploaded via API"
    );

    Ok((StatusCode::CREATED, Json(ApiResponse::success(response))).into_response())
}

// ============================================================================
// Query Handlers (Read Operations)
// ============================================================================

/// List calculated readings, newest upload first then file row order
#[tracing::instrument(skip(store, query))]
async fn list_readings(
    State(store): State<Arc<dyn ReadingStore>>,
    query: Result<Query<ListReadingsQuery>, QueryRejection>,
) -> Result<Response, ReadingsApiError> {
    let Query(query) = query.map_err(|e| ReadingsApiError::InvalidRequest(e.body_text()))?;

    let response = super::queries::list_readings::handle(store, query).await?;

    tracing::debug!(
        count = response.items.len(),
        total = response.pagination.total,
        "Readings listed via API"
    );

    let meta = json!({ "pagination": response.pagination });

    Ok(
        (StatusCode::OK, Json(ApiResponse::success_with_meta(response.items, meta)))
            .into_response(),
    )
}

#[tracing::instrument(skip(store, query))]
async fn list_batches(
    State(store): State<Arc<dyn ReadingStore>>,
    query: Result<Query<ListBatchesQuery>, QueryRejection>,
) -> Result<Response, ReadingsApiError> {
    let Query(query) = query.map_err(|e| ReadingsApiError::InvalidRequest(e.body_text()))?;

    let response = super::queries::list_batches::handle(store, query).await?;

    let meta = json!({ "pagination": response.pagination });

    Ok(
        (StatusCode::OK, Json(ApiResponse::success_with_meta(response.items, meta)))
            .into_response(),
    )
}

// ============================================================================
// Error Handling
// ============================================================================

/// Unified error type for readings API endpoints
#[derive(Debug)]
enum ReadingsApiError {
    InvalidRequest(String),
    Multipart(MultipartError),
    MissingFile,
    UploadError(UploadReadingsError),
    ListReadingsError(ListReadingsError),
    ListBatchesError(ListBatchesError),
}

impl From<MultipartError> for ReadingsApiError {
    fn from(err: MultipartError) -> Self {
        Self::Multipart(err)
    }
}

impl From<UploadReadingsError> for ReadingsApiError {
    fn from(err: UploadReadingsError) -> Self {
        Self::UploadError(err)
    }
}

impl From<ListReadingsError> for ReadingsApiError {
    fn from(err: ListReadingsError) -> Self {
        Self::ListReadingsError(err)
    }
}

impl From<ListBatchesError> for ReadingsApiError {
    fn from(err: ListBatchesError) -> Self {
        Self::ListBatchesError(err)
    }
}

fn validation_error(message: String) -> Response {
    let error = ErrorResponse::new("VALIDATION_ERROR", message);
    (StatusCode::BAD_REQUEST, Json(error)).into_response()
}

fn internal_error(message: &str) -> Response {
    let error = ErrorResponse::new("INTERNAL_ERROR", message);
    (StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response()
}

fn ingest_error(err: &IngestError) -> Response {
    match err {
        IngestError::RowValidation { row, field, .. } => {
            let error = ErrorResponse::with_details(
                err.code(),
                err.to_string(),
                json!({ "row": row, "field": field }),
            );
            (StatusCode::BAD_REQUEST, Json(error)).into_response()
        },
        IngestError::Persistence(_) => {
            tracing::error!("Failed to persist readings batch: {}", err);
            let error = ErrorResponse::new(err.code(), "The readings batch could not be saved");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response()
        },
        IngestError::Encoding { .. } | IngestError::MalformedTable { .. } | IngestError::EmptyUpload => {
            let error = ErrorResponse::new(err.code(), err.to_string());
            (StatusCode::BAD_REQUEST, Json(error)).into_response()
        },
    }
}

impl IntoResponse for ReadingsApiError {
    fn into_response(self) -> Response {
        match self {
            ReadingsApiError::InvalidRequest(_) | ReadingsApiError::MissingFile => {
                validation_error(self.to_string())
            },
            ReadingsApiError::Multipart(ref err) => {
                let status = err.status();
                if status == StatusCode::PAYLOAD_TOO_LARGE {
                    let error = ErrorResponse::new("PAYLOAD_TOO_LARGE", err.body_text());
                    (status, Json(error)).into_response()
                } else {
                    validation_error(self.to_string())
                }
            },

            // Upload errors
            ReadingsApiError::UploadError(UploadReadingsError::Ingest(ref err)) => {
                ingest_error(err)
            },
            ReadingsApiError::UploadError(UploadReadingsError::InvalidParameter(_))
            | ReadingsApiError::UploadError(UploadReadingsError::EmptyContent)
            | ReadingsApiError::UploadError(UploadReadingsError::FilenameLength) => {
                validation_error(self.to_string())
            },

            // List errors
            ReadingsApiError::ListReadingsError(ListReadingsError::InvalidParameter(_))
            | ReadingsApiError::ListReadingsError(ListReadingsError::Pagination(_))
            | ReadingsApiError::ListBatchesError(ListBatchesError::InvalidParameter(_))
            | ReadingsApiError::ListBatchesError(ListBatchesError::Pagination(_)) => {
                validation_error(self.to_string())
            },
            ReadingsApiError::ListReadingsError(ListReadingsError::Store(_))
            | ReadingsApiError::ListBatchesError(ListBatchesError::Store(_)) => {
                tracing::error!("Store error during readings listing: {}", self);
                internal_error("A database error occurred")
            },
        }
    }
}

impl std::fmt::Display for ReadingsApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRequest(msg) => write!(f, "{}", msg),
            Self::Multipart(e) => write!(f, "Invalid multipart body: {}", e.body_text()),
            Self::MissingFile => write!(f, "Multipart field '{}' is required", FILE_FIELD),
            Self::UploadError(e) => write!(f, "{}", e),
            Self::ListReadingsError(e) => write!(f, "{}", e),
            Self::ListBatchesError(e) => write!(f, "{}", e),
        }
    }
}
