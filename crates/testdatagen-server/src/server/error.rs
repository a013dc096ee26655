//! HTTP-facing errors.
//!
//! [`ApiError`] wraps the library's [`testdatagen::Error`] plus the failures
//! that only exist at the HTTP edge, and maps each to a status code with a
//! plain-text body.
//!
//! ## Status mapping
//! - `InvalidParameter`, `Engine(InvalidRequest | Format | RangeExhausted)`:
//!   400
//! - `Engine(BatchIncomplete)`, `Internal`: 500
//! - `Engine(Cancelled)`, `ServiceShutdown`: 503

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use testdatagen::Error;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A query parameter failed validation. The reason is sent verbatim.
    #[error("{reason}")]
    InvalidParameter { reason: String },

    /// The generation engine rejected or could not complete the request.
    #[error(transparent)]
    Engine(#[from] Error),

    /// A request arrived while the service was shutting down.
    #[error("Service is shutting down")]
    ServiceShutdown,

    /// A blocking task panicked or was aborted.
    #[error("Internal error: {context}")]
    Internal { context: String },
}

impl ApiError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            reason: reason.into(),
        }
    }

    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidParameter { .. } => StatusCode::BAD_REQUEST,
            Self::Engine(e) => match e {
                Error::InvalidRequest { .. } | Error::Format { .. } | Error::RangeExhausted { .. } => {
                    StatusCode::BAD_REQUEST
                }
                Error::BatchIncomplete { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                Error::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
            },
            Self::ServiceShutdown => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!("Request failed: {}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }
        (status, self.to_string()).into_response()
    }
}
