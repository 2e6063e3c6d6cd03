//! API error types and responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use zenbali_core::MarketError;
use zenbali_store::StoreError;

use crate::upload::UploadError;

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Unauthorized - missing or invalid credentials.
    #[error("unauthorized")]
    Unauthorized,

    /// Forbidden - valid credentials but the wrong kind of account.
    #[error("forbidden")]
    Forbidden,

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Bad request - invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Event or payment operation failed.
    #[error(transparent)]
    Market(#[from] MarketError),

    /// Image upload rejected.
    #[error(transparent)]
    Upload(#[from] UploadError),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

/// Status code for a domain error.
fn market_status(err: &MarketError) -> StatusCode {
    match err {
        MarketError::EventNotFound { .. }
        | MarketError::PaymentNotFound { .. }
        | MarketError::CreatorNotFound { .. }
        | MarketError::ReferenceNotFound { .. } => StatusCode::NOT_FOUND,
        MarketError::NotOwner | MarketError::AccountInactive => StatusCode::FORBIDDEN,
        MarketError::EventInPast
        | MarketError::InvalidDate(_)
        | MarketError::MissingField(_)
        | MarketError::InvalidAmount(_)
        | MarketError::InvalidReference(_)
        | MarketError::AlreadyPaid
        | MarketError::InvalidId(_) => StatusCode::BAD_REQUEST,
        MarketError::Duplicate(_) => StatusCode::CONFLICT,
        MarketError::PaymentsUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        MarketError::ExternalService { .. } => StatusCode::BAD_GATEWAY,
        MarketError::Storage(_) | MarketError::Serialization(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                self.to_string(),
                None,
            ),
            Self::Forbidden => (StatusCode::FORBIDDEN, "forbidden", self.to_string(), None),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone(), None),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone(), None),
            Self::Market(err) => {
                let status = market_status(err);
                if status == StatusCode::INTERNAL_SERVER_ERROR {
                    tracing::error!(error = %err, "Internal server error");
                    (
                        status,
                        err.code(),
                        "An internal error occurred".to_string(),
                        None,
                    )
                } else {
                    if err.is_transient() {
                        tracing::warn!(error = %err, "Downstream failure");
                    }
                    let details = match err {
                        MarketError::MissingField(field) => {
                            Some(serde_json::json!({ "field": field }))
                        }
                        _ => None,
                    };
                    (status, err.code(), err.to_string(), details)
                }
            }
            Self::Upload(err) => match err {
                UploadError::FileTooLarge { max_bytes } => (
                    StatusCode::BAD_REQUEST,
                    "file_too_large",
                    err.to_string(),
                    Some(serde_json::json!({ "max_bytes": max_bytes })),
                ),
                UploadError::InvalidFileType(_) => (
                    StatusCode::BAD_REQUEST,
                    "invalid_file_type",
                    err.to_string(),
                    None,
                ),
                UploadError::Io(io) => {
                    tracing::error!(error = %io, "Failed to store upload");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "internal_error",
                        "An internal error occurred".to_string(),
                        None,
                    )
                }
            },
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self::Market(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_http_statuses() {
        assert_eq!(
            market_status(&MarketError::event_not_found("e")),
            StatusCode::NOT_FOUND
        );
        assert_eq!(market_status(&MarketError::NotOwner), StatusCode::FORBIDDEN);
        assert_eq!(
            market_status(&MarketError::AlreadyPaid),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            market_status(&MarketError::InvalidDate("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            market_status(&MarketError::external("stripe", "timed out")),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            market_status(&MarketError::Storage("down".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn internal_errors_hide_detail() {
        let response = ApiError::Market(MarketError::Storage("password=hunter2".into()))
            .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"]["code"], "internal_error");
        assert!(!body.to_string().contains("hunter2"));
    }
}
