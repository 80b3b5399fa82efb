//! API response envelopes
//!
//! Success: `{"success": true, "data": ..., "meta": ...}`.
//! Failure: `{"success": false, "error": {"code", "message", "details"}}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Standard success response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data,
            meta: None,
        }
    }

    pub fn success_with_meta(data: T, meta: serde_json::Value) -> Self {
        Self {
            success: true,
            data,
            meta: Some(meta),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Standard error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Error response carrying structured context, e.g. the failing row
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            success: false,
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_envelope_omits_empty_meta() {
        let value = serde_json::to_value(ApiResponse::success(json!({"rows": 3}))).unwrap();
        assert_eq!(value, json!({"success": true, "data": {"rows": 3}}));
    }

    #[test]
    fn test_error_envelope_with_details() {
        let value = serde_json::to_value(ErrorResponse::with_details(
            "ROW_VALIDATION_ERROR",
            "bad row",
            json!({"row": 3, "field": "Datetime"}),
        ))
        .unwrap();

        assert_eq!(value["success"], json!(false));
        assert_eq!(value["error"]["code"], json!("ROW_VALIDATION_ERROR"));
        assert_eq!(value["error"]["details"]["row"], json!(3));
    }
}
