//! Service-level error types
//!
//! Mail dispatch never fails with an error (see
//! [`DispatchResult`](crate::email::DispatchResult)). [`RelayError`] covers
//! the request handling around it. Startup failures (configuration, bind)
//! surface as `anyhow::Error` at the binary edge.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Service error type
#[derive(Debug, Error)]
pub enum RelayError {
    /// Template rendering failed
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    /// Malformed request body
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Request parsed but failed validation
    #[error("Validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

impl RelayError {
    /// HTTP status for this error
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Template(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON error body shared by every API error response
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    /// Always `false`
    pub success: bool,

    /// User-facing message
    pub error: String,

    /// Raw diagnostic detail, omitted in production
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,

    /// Provider error code, omitted in production
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ErrorBody {
    /// Create an error body with only a user-facing message
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            details: None,
            code: None,
        }
    }

    /// Attach diagnostic detail
    #[must_use]
    pub fn with_details(mut self, details: impl Into<serde_json::Value>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Attach a provider code
    #[must_use]
    pub fn with_code(mut self, code: Option<String>) -> Self {
        self.code = code;
        self
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            Self::BadRequest(msg) => ErrorBody::new(format!("Invalid request: {msg}")),
            Self::Validation(errors) => ErrorBody::new("Validation failed")
                .with_details(crate::extractors::validation_errors_json(errors)),
            Self::Template(_) => {
                tracing::error!(error = %self, "Request failed");
                ErrorBody::new("Internal server error")
            }
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            RelayError::BadRequest("x".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            RelayError::Validation(validator::ValidationErrors::new()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            RelayError::Template(askama::Error::Fmt(std::fmt::Error)).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_body_skips_empty_fields() {
        let json = serde_json::to_value(ErrorBody::new("nope")).unwrap();
        assert_eq!(json, serde_json::json!({"success": false, "error": "nope"}));

        let json = serde_json::to_value(
            ErrorBody::new("nope")
                .with_details("raw")
                .with_code(Some("535".to_string())),
        )
        .unwrap();
        assert_eq!(json["details"], "raw");
        assert_eq!(json["code"], "535");
    }

    #[tokio::test]
    async fn test_template_errors_hide_detail() {
        let response = RelayError::Template(askama::Error::Fmt(std::fmt::Error)).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["error"], "Internal server error");
        assert!(json.get("details").is_none());
    }
}
