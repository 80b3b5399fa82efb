//! Shared utilities and types for feature modules
//!
//! - **identity**: the `x-user-id` caller extractor
//! - **pagination**: page/per-page handling and response metadata
//! - **validation**: input checks shared by commands and queries

pub mod identity;
pub mod pagination;
pub mod validation;

pub use identity::AuthenticatedUser;
pub use pagination::{PaginationError, PaginationMetadata};
