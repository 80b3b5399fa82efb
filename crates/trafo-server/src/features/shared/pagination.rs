//! Shared pagination utilities
//!
//! ```rust,ignore
//! use trafo_server::features::shared::pagination::{resolve_page, PaginationMetadata};
//!
//! let (page, per_page) = resolve_page(query.page, query.per_page)?;
//! // fetch...
//! let metadata = PaginationMetadata::new(page, per_page, total);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_PER_PAGE: i64 = 20;
pub const MAX_PER_PAGE: i64 = 100;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PaginationError {
    #[error("Page must be greater than 0 and within the result range")]
    InvalidPage,

    #[error("Per page must be between 1 and 100")]
    InvalidPerPage,
}

/// Validate optional `page`/`per_page` and apply defaults (1 and 20).
pub fn resolve_page(
    page: Option<i64>,
    per_page: Option<i64>,
) -> Result<(i64, i64), PaginationError> {
    let page = page.unwrap_or(1);
    if page < 1 {
        return Err(PaginationError::InvalidPage);
    }

    let per_page = per_page.unwrap_or(DEFAULT_PER_PAGE);
    if !(1..=MAX_PER_PAGE).contains(&per_page) {
        return Err(PaginationError::InvalidPerPage);
    }

    // The row offset of the page must fit in an i64.
    if (page - 1).checked_mul(per_page).is_none() {
        return Err(PaginationError::InvalidPage);
    }

    Ok((page, per_page))
}

/// Pagination metadata for response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationMetadata {
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub pages: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PaginationMetadata {
    pub fn new(page: i64, per_page: i64, total: i64) -> Self {
        let pages = if total <= 0 || per_page <= 0 {
            0
        } else {
            (total + per_page - 1) / per_page
        };

        Self {
            page,
            per_page,
            total,
            pages,
            has_next: page < pages,
            has_prev: page > 1,
        }
    }
}
