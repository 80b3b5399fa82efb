use mediator::Request;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::features::shared::pagination::{resolve_page, PaginationError, PaginationMetadata};
use crate::features::shared::validation::{validate_trafo_id, ParameterError};
use crate::ingest::{PageRequest, ReadingRecord, ReadingStore, StoreError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListReadingsQuery {
    pub trafo_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListReadingsResponse {
    pub items: Vec<ReadingRecord>,
    pub pagination: PaginationMetadata,
}

#[derive(Debug, thiserror::Error)]
pub enum ListReadingsError {
    #[error("{0}")]
    InvalidParameter(#[from] ParameterError),
    #[error("{0}")]
    Pagination(#[from] PaginationError),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl Request<Result<ListReadingsResponse, ListReadingsError>> for ListReadingsQuery {}

impl crate::cqrs::middleware::Query for ListReadingsQuery {}

impl ListReadingsQuery {
    /// Returns the resolved `(page, per_page)` pair
    pub fn validate(&self) -> Result<(i64, i64), ListReadingsError> {
        validate_trafo_id(self.trafo_id)?;
        Ok(resolve_page(self.page, self.per_page)?)
    }
}

#[tracing::instrument(skip(store))]
pub async fn handle(
    store: Arc<dyn ReadingStore>,
    query: ListReadingsQuery,
) -> Result<ListReadingsResponse, ListReadingsError> {
    let (page, per_page) = query.validate()?;

    let (items, total) = store
        .list_readings(query.trafo_id, PageRequest::new(page, per_page))
        .await?;

    tracing::debug!(returned = items.len(), total, "Listed readings");

    Ok(ListReadingsResponse {
        items,
        pagination: PaginationMetadata::new(page, per_page, total),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::{BatchParams, IngestRequest, MemoryReadingStore};

    const CSV: &str = "Datetime,Voltage R,Voltage S,Voltage T,Ampere R,Ampere S,Ampere T,Cosphi\n\
                       2024-05-01 10:00:00,220,221,219,10,11,12,0.9\n\
                       2024-05-01 10:15:00,220,221,219,10,11,12,0.9\n\
                       2024-05-01 10:30:00,220,221,219,10,11,12,0.9\n";

    async fn seeded_store() -> Arc<MemoryReadingStore> {
        let store = Arc::new(MemoryReadingStore::new());
        for trafo_id in [1, 2] {
            let request = IngestRequest {
                params: BatchParams {
                    trafo_id,
                    rated_capacity: 100.0,
                    uploaded_by: "tester".to_string(),
                    source_filename: None,
                },
                content: CSV.as_bytes().to_vec(),
            };
            crate::ingest::ingest_upload(store.as_ref(), request)
                .await
                .unwrap();
        }
        store
    }

    fn query(trafo_id: i64, page: Option<i64>, per_page: Option<i64>) -> ListReadingsQuery {
        ListReadingsQuery {
            trafo_id,
            page,
            per_page,
        }
    }

    #[test]
    fn test_validate() {
        assert_eq!(query(1, None, None).validate().unwrap(), (1, 20));
        assert!(matches!(
            query(0, None, None).validate(),
            Err(ListReadingsError::InvalidParameter(_))
        ));
        assert!(matches!(
            query(1, Some(0), None).validate(),
            Err(ListReadingsError::Pagination(PaginationError::InvalidPage))
        ));
        assert!(matches!(
            query(1, None, Some(101)).validate(),
            Err(ListReadingsError::Pagination(PaginationError::InvalidPerPage))
        ));
    }

    #[tokio::test]
    async fn test_handle_filters_by_trafo_and_paginates() {
        let store = seeded_store().await;

        let response = handle(store.clone(), query(2, Some(1), Some(2))).await.unwrap();
        assert_eq!(response.items.len(), 2);
        assert!(response.items.iter().all(|r| r.trafo_id == 2));
        assert_eq!(response.items[0].row_number, 1);
        assert_eq!(response.pagination.total, 3);
        assert_eq!(response.pagination.pages, 2);
        assert!(response.pagination.has_next);

        let second = handle(store, query(2, Some(2), Some(2))).await.unwrap();
        assert_eq!(second.items.len(), 1);
        assert_eq!(second.items[0].row_number, 3);
    }

    #[tokio::test]
    async fn test_handle_unknown_trafo_is_empty() {
        let store = seeded_store().await;

        let response = handle(store, query(99, None, None)).await.unwrap();
        assert!(response.items.is_empty());
        assert_eq!(response.pagination.total, 0);
    }
}
