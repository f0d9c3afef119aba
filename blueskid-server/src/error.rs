//! Server error types

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use blueskid_core::{AdapterError, Error, FormatError, LedgerConflict};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Core(#[from] Error),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl From<FormatError> for ServerError {
    fn from(err: FormatError) -> Self {
        ServerError::Core(err.into())
    }
}

impl From<AdapterError> for ServerError {
    fn from(err: AdapterError) -> Self {
        ServerError::Core(err.into())
    }
}

impl From<LedgerConflict> for ServerError {
    fn from(err: LedgerConflict) -> Self {
        ServerError::Core(err.into())
    }
}

impl From<JsonRejection> for ServerError {
    fn from(rejection: JsonRejection) -> Self {
        ServerError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ServerError {
    fn from(rejection: QueryRejection) -> Self {
        ServerError::BadRequest(rejection.body_text())
    }
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Core(err) => match err {
                Error::Format(_) | Error::Crypto(_) | Error::Protocol(_) => StatusCode::BAD_REQUEST,
                Error::Ledger(_) => StatusCode::CONFLICT,
                Error::Adapter(AdapterError::Unreachable { .. }) => StatusCode::BAD_GATEWAY,
                Error::Adapter(AdapterError::Unavailable { .. }) => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
                Error::Adapter(AdapterError::NoAssertionFound(_)) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                Error::Adapter(_) => StatusCode::BAD_REQUEST,
                Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ServerError::Core(err) if err.is_internal() => {
                tracing::error!("Internal error: {}", err);
                "Internal server error".to_string()
            }
            ServerError::Core(Error::Adapter(err)) if err.is_retryable() => {
                tracing::warn!("Post fetch failed: {}", err);
                self.to_string()
            }
            _ => {
                tracing::debug!(%status, "Request rejected: {}", self);
                self.to_string()
            }
        };

        let body = json!({ "success": false, "reason": message });
        (status, axum::Json(body)).into_response()
    }
}
