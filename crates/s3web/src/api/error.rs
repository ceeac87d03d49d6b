use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::debug;

use crate::storage::{ErrorKind, StorageError};

/// A request that did not produce an object.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Method {0} not supported")]
    MethodNotAllowed(Method),
}

impl IntoResponse for StorageError {
    fn into_response(self) -> Response {
        let status = match self.kind() {
            ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            ErrorKind::NotModified => StatusCode::NOT_MODIFIED,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        debug!(%status, error = %self, "Failed");
        (status, self.to_string()).into_response()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Storage(err) => err.into_response(),
            ApiError::MethodNotAllowed(_) => {
                debug!(error = %self, "Failed");
                (StatusCode::METHOD_NOT_ALLOWED, self.to_string()).into_response()
            }
        }
    }
}
