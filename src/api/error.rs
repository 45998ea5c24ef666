use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::error::{FailureKind, PipelineError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing or malformed Authorization header")]
    MissingSession,

    #[error("Invalid request body: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::MissingSession => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": self.to_string(), "kind": "unauthorized" }),
            ),
            ApiError::BadRequest(_) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": self.to_string(), "kind": "invalid_request" }),
            ),
            ApiError::Pipeline(ref e) => {
                let kind = e.kind();
                let status = match kind {
                    FailureKind::InvalidPrompt => StatusCode::BAD_REQUEST,
                    FailureKind::QuotaExceeded => StatusCode::PAYMENT_REQUIRED,
                    FailureKind::AccountNotFound => StatusCode::NOT_FOUND,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };

                if status.is_server_error() {
                    tracing::error!(kind = kind.as_str(), "Playlist request failed: {}", e);
                    (
                        status,
                        json!({
                            "error": "Playlist could not be created",
                            "kind": kind.as_str(),
                            "detail": e.to_string(),
                        }),
                    )
                } else {
                    (status, json!({ "error": e.to_string(), "kind": kind.as_str() }))
                }
            }
            ApiError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "error": "Internal server error",
                        "kind": "internal",
                        "detail": msg,
                    }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
