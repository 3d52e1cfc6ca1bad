//! Error types for chatrelay
//!
//! All errors implement `IntoResponse` for Axum handlers.

use crate::client::TransportError;
use crate::extract::ExtractError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Main error type for the application
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read config file {path}: {source}")]
    ConfigFileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration in {path}: {reason}")]
    ConfigValidationFailed { path: String, reason: String },

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Upload of {name} rejected: {}", .errors.join("; "))]
    UploadRejected {
        name: String,
        errors: Vec<String>,
        too_large: bool,
    },

    #[error("Failed to process {name}: {source}")]
    Extraction {
        name: String,
        #[source]
        source: ExtractError,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("API key not configured")]
    MissingCredential,

    #[error("Method not allowed")]
    MethodNotAllowed,

    /// Relayed call failed upstream; `status` is the upstream's, or 500
    #[error("OpenAI request failed: {details}")]
    Upstream { status: u16, details: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Self::UploadRejected {
            errors, too_large, ..
        } = &self
        {
            let status = if *too_large {
                StatusCode::PAYLOAD_TOO_LARGE
            } else {
                StatusCode::BAD_REQUEST
            };
            let body = Json(serde_json::json!({
                "error": errors.first().cloned().unwrap_or_else(|| self.to_string()),
                "errors": errors,
            }));
            return (status, body).into_response();
        }

        if let Self::Upstream { status, details } = &self {
            let status =
                StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            let body = Json(serde_json::json!({
                "error": "OpenAI request failed",
                "details": details,
                "code": status.as_u16(),
            }));
            return (status, body).into_response();
        }

        let (status, message) = match &self {
            Self::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Config(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            Self::ConfigFileRead { .. }
            | Self::ConfigParseFailed { .. }
            | Self::ConfigValidationFailed { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            Self::UploadRejected { .. } => (StatusCode::BAD_REQUEST, self.to_string()),
            Self::Extraction { .. } => (StatusCode::UNPROCESSABLE_ENTITY, self.to_string()),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::MissingCredential => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
            Self::MethodNotAllowed => (StatusCode::METHOD_NOT_ALLOWED, self.to_string()),
            Self::Upstream { .. } => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

impl From<TransportError> for AppError {
    fn from(error: TransportError) -> Self {
        match error {
            TransportError::MissingCredential => Self::MissingCredential,
            TransportError::Status {
                status, message, ..
            } => Self::Upstream {
                status,
                details: message,
            },
            other => Self::Upstream {
                status: 500,
                details: other.to_string(),
            },
        }
    }
}

/// Convenience type alias for Results
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");
        serde_json::from_slice(&bytes).expect("body should be JSON")
    }

    #[test]
    fn test_config_error_creates() {
        let err = AppError::Config("test error".to_string());
        assert_eq!(err.to_string(), "Configuration error: test error");
    }

    #[test]
    fn test_validation_error_creates() {
        let err = AppError::Validation("invalid input".to_string());
        assert_eq!(err.to_string(), "Invalid request: invalid input");
    }

    #[test]
    fn test_extraction_error_names_the_file() {
        let err = AppError::Extraction {
            name: "report.doc".to_string(),
            source: ExtractError::UnsupportedDocument,
        };
        assert_eq!(
            err.to_string(),
            "Failed to process report.doc: Unsupported document format"
        );
    }

    #[tokio::test]
    async fn test_validation_body_carries_bare_message() {
        let response = AppError::Validation("Prompt is required".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Prompt is required");
    }

    #[tokio::test]
    async fn test_missing_credential_response() {
        let response = AppError::MissingCredential.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], "API key not configured");
    }

    #[tokio::test]
    async fn test_method_not_allowed_response() {
        let response = AppError::MethodNotAllowed.into_response();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Method not allowed");
    }

    #[tokio::test]
    async fn test_oversized_upload_is_payload_too_large() {
        let response = AppError::UploadRejected {
            name: "big.txt".to_string(),
            errors: vec!["File size exceeds 10 MB limit".to_string()],
            too_large: true,
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        let body = body_json(response).await;
        assert_eq!(body["error"], "File size exceeds 10 MB limit");
        assert_eq!(body["errors"].as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn test_upstream_status_is_passed_through() {
        let err = AppError::from(TransportError::Status {
            status: 401,
            message: "Incorrect API key provided".to_string(),
            body: serde_json::json!({}),
        });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["error"], "OpenAI request failed");
        assert_eq!(body["details"], "Incorrect API key provided");
        assert_eq!(body["code"], 401);
    }

    #[tokio::test]
    async fn test_transport_failure_without_status_is_500() {
        let err = AppError::from(TransportError::Connect {
            endpoint: "http://127.0.0.1:9/chat/completions".to_string(),
            reason: "connection refused".to_string(),
        });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["code"], 500);
    }

    #[test]
    fn test_missing_credential_converts() {
        assert!(matches!(
            AppError::from(TransportError::MissingCredential),
            AppError::MissingCredential
        ));
    }

    #[test]
    fn test_not_found_response_status() {
        let response = AppError::NotFound("document 42".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_internal_error_response_status() {
        let err = AppError::Internal("test".to_string());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
