//! Trafo Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]
//!
//! Shared types, logging and error handling for the trafo workspace.
//!
//! - **Error Handling**: [`TrafoError`] and the [`Result`] alias
//! - **Logging**: centralized `tracing` setup in [`logging`]
//! - **Types**: three-phase measurement primitives in [`types`]
//!
//! # Example
//!
//! ```
//! use trafo_common::types::{Phase, PhaseValues};
//!
//! let volts = PhaseValues::new(Some(220.0), Some(221.5), None);
//! assert_eq!(volts.get(Phase::S), Some(221.5));
//! assert_eq!(volts.total(), None);
//! ```

pub mod error;
pub mod logging;
pub mod types;

pub use error::{Result, TrafoError};
