//! Error types shared across the trafo workspace

use thiserror::Error;

/// Result type alias for trafo operations
pub type Result<T> = std::result::Result<T, TrafoError>;

#[derive(Error, Debug)]
pub enum TrafoError {
    #[error("Invalid phase: {0}")]
    InvalidPhase(String),

    #[error("Configuration error: {0}")]
    Config(String),
}
