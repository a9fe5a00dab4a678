use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::analysis::verdict::{ErrorKind, ErrorVerdict};

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unreadable document: {0}")]
    UnreadableDocument(String),

    #[error("Reasoning service error: {0}")]
    Service(String),

    #[error("Malformed reasoning service response: {0}")]
    MalformedResponse(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ErrorVerdict> for AppError {
    fn from(verdict: ErrorVerdict) -> Self {
        match verdict.kind {
            ErrorKind::UnreadableDocument => AppError::UnreadableDocument(verdict.detail),
            ErrorKind::ServiceError | ErrorKind::Cancelled => AppError::Service(verdict.detail),
            ErrorKind::MalformedResponse => AppError::MalformedResponse(verdict.detail),
            ErrorKind::InternalError => AppError::Internal(anyhow::anyhow!(verdict.detail)),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::UnreadableDocument(msg) => {
                (StatusCode::BAD_REQUEST, "UNREADABLE_DOCUMENT", msg.clone())
            }
            AppError::Service(msg) => {
                tracing::error!("Reasoning service error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "SERVICE_ERROR",
                    "The AI analysis service is unavailable".to_string(),
                )
            }
            AppError::MalformedResponse(msg) => {
                tracing::error!("Malformed reasoning service response: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "MALFORMED_RESPONSE",
                    "The AI analysis service returned an unusable response".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_verdict_maps_to_status() {
        let cases = [
            (ErrorVerdict::unreadable("empty"), StatusCode::BAD_REQUEST),
            (ErrorVerdict::service("503"), StatusCode::BAD_GATEWAY),
            (ErrorVerdict::malformed("not json"), StatusCode::BAD_GATEWAY),
            (ErrorVerdict::internal("disk full"), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (verdict, expected) in cases {
            let response = AppError::from(verdict).into_response();
            assert_eq!(response.status(), expected);
        }
    }

    #[test]
    fn test_validation_is_bad_request() {
        let response = AppError::Validation("job_text cannot be empty".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
