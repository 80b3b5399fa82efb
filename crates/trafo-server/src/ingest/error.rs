use thiserror::Error;

/// Failures of the persistence collaborator
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Reasons an upload is rejected as a whole.
///
/// Any of these means nothing from the upload was persisted.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Upload is not valid UTF-8 text (invalid byte at offset {offset})")]
    Encoding { offset: usize },

    #[error("Malformed table{}: {message}", .line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    MalformedTable { line: Option<u64>, message: String },

    #[error("Upload contains no data rows")]
    EmptyUpload,

    #[error("Row {row}: invalid value for '{field}': {reason}")]
    RowValidation {
        row: usize,
        field: String,
        reason: String,
    },

    #[error("Failed to persist batch: {0}")]
    Persistence(#[from] StoreError),
}

impl IngestError {
    pub fn row(row: usize, field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::RowValidation {
            row,
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Stable machine-readable code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            Self::Encoding { .. } => "ENCODING_ERROR",
            Self::MalformedTable { .. } => "MALFORMED_TABLE",
            Self::EmptyUpload => "EMPTY_UPLOAD",
            Self::RowValidation { .. } => "ROW_VALIDATION_ERROR",
            Self::Persistence(_) => "PERSISTENCE_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_table_message_includes_line() {
        let err = IngestError::MalformedTable {
            line: Some(4),
            message: "unterminated quote".to_string(),
        };
        assert_eq!(err.to_string(), "Malformed table at line 4: unterminated quote");

        let err = IngestError::MalformedTable {
            line: None,
            message: "no header".to_string(),
        };
        assert_eq!(err.to_string(), "Malformed table: no header");
    }

    #[test]
    fn test_codes() {
        assert_eq!(IngestError::EmptyUpload.code(), "EMPTY_UPLOAD");
        assert_eq!(IngestError::row(3, "Datetime", "bad").code(), "ROW_VALIDATION_ERROR");
        assert_eq!(
            IngestError::from(StoreError::Unavailable("down".into())).code(),
            "PERSISTENCE_ERROR"
        );
    }
}
