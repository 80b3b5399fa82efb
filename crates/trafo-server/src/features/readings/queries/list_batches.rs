//! Upload batches of one transformer
//!
//! Re-uploading an overlapping file creates a second batch rather than
//! replacing the first; this listing is how callers spot such overlaps.

use mediator::Request;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::features::shared::pagination::{resolve_page, PaginationError, PaginationMetadata};
use crate::features::shared::validation::{validate_trafo_id, ParameterError};
use crate::ingest::{BatchRecord, PageRequest, ReadingStore, StoreError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListBatchesQuery {
    pub trafo_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListBatchesResponse {
    pub items: Vec<BatchRecord>,
    pub pagination: PaginationMetadata,
}

#[derive(Debug, thiserror::Error)]
pub enum ListBatchesError {
    #[error("{0}")]
    InvalidParameter(#[from] ParameterError),
    #[error("{0}")]
    Pagination(#[from] PaginationError),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl Request<Result<ListBatchesResponse, ListBatchesError>> for ListBatchesQuery {}

impl crate::cqrs::middleware::Query for ListBatchesQuery {}

impl ListBatchesQuery {
    pub fn validate(&self) -> Result<(i64, i64), ListBatchesError> {
        validate_trafo_id(self.trafo_id)?;
        Ok(resolve_page(self.page, self.per_page)?)
    }
}

#[tracing::instrument(skip(store))]
pub async fn handle(
    store: Arc<dyn ReadingStore>,
    query: ListBatchesQuery,
) -> Result<ListBatchesResponse, ListBatchesError> {
    let (page, per_page) = query.validate()?;

    let (items, total) = store
        .list_batches(query.trafo_id, PageRequest::new(page, per_page))
        .await?;

    Ok(ListBatchesResponse {
        items,
        pagination: PaginationMetadata::new(page, per_page, total),
    })
}
