//! Wire protocol shared by all callable functions.
//!
//! Clients POST `{"data": <payload>}` to the function path and receive
//! either `{"result": <payload>}` or `{"error": {"message", "status"}}`,
//! where `status` is a canonical error code string.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::services::ProviderError;

/// Request envelope of a callable invocation.
///
/// `data` is optional so that an empty or data-less body still reaches the
/// handler, which decides whether the payload is acceptable.
#[derive(Debug, Deserialize)]
pub struct CallableRequest<T> {
    pub data: Option<T>,
}

/// Response envelope of a successful callable invocation.
#[derive(Debug, Serialize)]
pub struct CallableResult<T> {
    pub result: T,
}

/// Canonical error codes a callable can fail with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorStatus {
    InvalidArgument,
    Unauthenticated,
    PermissionDenied,
    NotFound,
    Internal,
    Unavailable,
}

impl ErrorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorStatus::InvalidArgument => "INVALID_ARGUMENT",
            ErrorStatus::Unauthenticated => "UNAUTHENTICATED",
            ErrorStatus::PermissionDenied => "PERMISSION_DENIED",
            ErrorStatus::NotFound => "NOT_FOUND",
            ErrorStatus::Internal => "INTERNAL",
            ErrorStatus::Unavailable => "UNAVAILABLE",
        }
    }

    fn http_status(&self) -> StatusCode {
        match self {
            ErrorStatus::InvalidArgument => StatusCode::BAD_REQUEST,
            ErrorStatus::Unauthenticated => StatusCode::UNAUTHORIZED,
            ErrorStatus::PermissionDenied => StatusCode::FORBIDDEN,
            ErrorStatus::NotFound => StatusCode::NOT_FOUND,
            ErrorStatus::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorStatus::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// Structured error returned to the caller of a callable function.
#[derive(Debug, Error)]
#[error("{}: {}", .status.as_str(), .message)]
pub struct CallableError {
    pub status: ErrorStatus,
    pub message: String,
}

impl CallableError {
    pub fn new(status: ErrorStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorStatus::InvalidArgument, message)
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new(ErrorStatus::Unauthenticated, message)
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::new(ErrorStatus::PermissionDenied, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorStatus::Internal, message)
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    message: &'a str,
    status: &'static str,
}

#[derive(Serialize)]
struct ErrorEnvelope<'a> {
    error: ErrorBody<'a>,
}

impl IntoResponse for CallableError {
    fn into_response(self) -> Response {
        let envelope = ErrorEnvelope {
            error: ErrorBody {
                message: &self.message,
                status: self.status.as_str(),
            },
        };

        (self.status.http_status(), Json(envelope)).into_response()
    }
}

impl From<ProviderError> for CallableError {
    fn from(err: ProviderError) -> Self {
        let status = match &err {
            ProviderError::InvalidToken(_) => ErrorStatus::Unauthenticated,
            ProviderError::Connection(_) => ErrorStatus::Unavailable,
            _ => ErrorStatus::Internal,
        };

        CallableError::new(status, err.to_string())
    }
}
