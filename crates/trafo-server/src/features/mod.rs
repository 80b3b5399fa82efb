//! Feature modules implementing the trafo API
//!
//! Each feature is a vertical slice following the CQRS pattern:
//! - `commands/` - Write operations
//! - `queries/` - Read operations
//! - `routes.rs` - HTTP route definitions
//!
//! Commands and queries implement the mediator pattern using the `mediator` crate.
//!
//! # Features
//!
//! - **readings**: CSV upload of transformer readings and listing of calculated results

pub mod readings;
pub mod shared;

use axum::Router;
use std::sync::Arc;

use crate::ingest::ReadingStore;

/// Creates the main API router with all feature routes mounted
///
/// - `/readings` - Reading uploads, calculated readings and upload batches
pub fn router(store: Arc<dyn ReadingStore>) -> Router<()> {
    Router::new().nest("/readings", readings::readings_routes().with_state(store))
}
