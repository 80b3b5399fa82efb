//! Shared validation utilities for transformer-scoped requests

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParameterError {
    #[error("trafo_id must be a positive integer, got {0}")]
    InvalidTrafoId(i64),

    #[error("capacity must be a finite, non-negative number, got {0}")]
    InvalidCapacity(f64),
}

pub fn validate_trafo_id(trafo_id: i64) -> Result<(), ParameterError> {
    if trafo_id <= 0 {
        return Err(ParameterError::InvalidTrafoId(trafo_id));
    }
    Ok(())
}

/// Rated capacity of a transformer, in the same unit as the derived kVA values
pub fn validate_capacity(capacity: f64) -> Result<(), ParameterError> {
    if !capacity.is_finite() || capacity < 0.0 {
        return Err(ParameterError::InvalidCapacity(capacity));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_trafo_id() {
        assert!(validate_trafo_id(1).is_ok());
        assert_eq!(validate_trafo_id(0), Err(ParameterError::InvalidTrafoId(0)));
        assert!(validate_trafo_id(-5).is_err());
    }

    #[test]
    fn test_validate_capacity() {
        assert!(validate_capacity(0.0).is_ok());
        assert!(validate_capacity(250.0).is_ok());
        assert!(validate_capacity(-1.0).is_err());
        assert!(validate_capacity(f64::NAN).is_err());
        assert!(validate_capacity(f64::INFINITY).is_err());
    }
}
