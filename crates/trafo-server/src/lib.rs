//! Trafo Server Library
//!
//! HTTP service that ingests CSV files of three-phase transformer readings,
//! derives per-phase and total power metrics and persists each upload as one
//! atomic batch.
//!
//! # Architecture
//!
//! - **ingest**: decoding, normalization, derivation and the [`ingest::ReadingStore`] collaborator
//! - **features**: CQRS vertical slices exposed over HTTP (`/api/v1/readings`)
//! - **cqrs**: command/query marker traits and the mediator registry
//! - **db**: PostgreSQL pool and embedded migrations
//! - **middleware**: CORS and request tracing layers
//!
//! # Example
//!
//! ```no_run
//! use trafo_server::{api, config::Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let store = api::build_store(&config).await?;
//!     api::serve(config, store, std::future::pending()).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod cqrs;
pub mod db;
pub mod error;
pub mod features;
pub mod ingest;
pub mod middleware;

pub use error::AppError;
