//! Centralized error types for the castpipe core library.
//!
//! This module provides:
//! - [`MediaError`]: request-level failures, mapped to HTTP status codes
//!   and rendered as JSON error bodies
//! - [`ErrorCode`]: machine-readable codes shared by the error enums
//!
//! Lifecycle failures live in [`ServerError`](crate::api::ServerError)
//! and IP detection failures in [`NetworkError`](crate::context::NetworkError).

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::api::ServerError;
use crate::context::NetworkError;

/// Trait for error types that provide machine-readable error codes.
pub trait ErrorCode {
    /// Returns a machine-readable error code for logs and API responses.
    fn code(&self) -> &'static str;
}

impl ErrorCode for ServerError {
    fn code(&self) -> &'static str {
        match self {
            Self::Bind { .. } => "bind_failed",
            Self::File { .. } => "file_unavailable",
            Self::Runtime(_) => "runtime_failed",
            Self::AlreadyRunning => "already_running",
        }
    }
}

impl ErrorCode for NetworkError {
    fn code(&self) -> &'static str {
        match self {
            Self::Detection(_) => "ip_detection_failed",
            Self::NoIpv4 => "no_ipv4_address",
        }
    }
}

/// Failure while answering a single media request.
///
/// These never take the listener down: the offending connection gets an
/// error response and is closed.
#[derive(Debug, Error)]
pub enum MediaError {
    /// The served file disappeared after the server started.
    #[error("Media file not found: {0}")]
    FileNotFound(String),

    /// The served file exists but could not be opened or read.
    #[error("Media file unreadable: {0}")]
    FileUnreadable(#[source] std::io::Error),

    /// Failed to assemble the HTTP response.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl MediaError {
    /// Classifies an I/O error raised while opening the served file.
    pub fn from_io(err: std::io::Error, path: &std::path::Path) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::FileNotFound(path.display().to_string()),
            _ => Self::FileUnreadable(err),
        }
    }

    /// Maps the error to an appropriate HTTP status code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::FileNotFound(_) => StatusCode::NOT_FOUND,
            Self::FileUnreadable(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ErrorCode for MediaError {
    fn code(&self) -> &'static str {
        match self {
            Self::FileNotFound(_) => "file_not_found",
            Self::FileUnreadable(_) => "file_unreadable",
            Self::Internal(_) => "internal_error",
        }
    }
}

/// Convenient Result alias for request handling.
pub type MediaResult<T> = Result<T, MediaError>;

/// JSON response body for error responses.
#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    message: String,
    status: u16,
}

impl IntoResponse for MediaError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        log::warn!("[Media] Request failed ({}): {}", self.code(), self);
        let body = ErrorResponse {
            error: self.code(),
            message: self.to_string(),
            status: status.as_u16(),
        };
        // The failing connection is dropped; the listener keeps serving.
        (status, [(header::CONNECTION, "close")], Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn missing_file_maps_to_not_found() {
        let err = MediaError::from_io(
            std::io::Error::from(std::io::ErrorKind::NotFound),
            Path::new("/media/movie.mp4"),
        );
        assert_eq!(err.code(), "file_not_found");
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn permission_error_maps_to_unreadable() {
        let err = MediaError::from_io(
            std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            Path::new("/media/movie.mp4"),
        );
        assert_eq!(err.code(), "file_unreadable");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn network_errors_have_stable_codes() {
        assert_eq!(NetworkError::NoIpv4.code(), "no_ipv4_address");
        assert_eq!(
            NetworkError::Detection("no route".into()).code(),
            "ip_detection_failed"
        );
    }

    #[test]
    fn error_response_closes_connection() {
        let response = MediaError::Internal("boom".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()[header::CONNECTION], "close");
    }
}
