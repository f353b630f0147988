//! HTTP error translation.
//!
//! Handlers return `Result<_, ApiError>`; the [`IntoResponse`] impl is
//! the single place domain errors become status codes and the
//! `{"error": message}` JSON body the frontend expects.

use axum::{http::StatusCode, response::IntoResponse, Json};
use tracing::error;

/// A fixed message for errors the caller can do nothing about.
const INTERNAL_MESSAGE: &str = "An unexpected server error occurred.";

#[derive(Debug)]
pub enum ApiError {
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    BadRequest(String),
    /// Upstream (store or AI) failure surfaced with its message.
    Upstream(keepsake_core::Error),
    /// Anything uncaught; logged, reported with a fixed message.
    Internal(String),
}

impl From<keepsake_core::Error> for ApiError {
    fn from(err: keepsake_core::Error) -> Self {
        use keepsake_core::Error;
        match err {
            Error::Unauthorized(msg) => ApiError::Unauthorized(msg),
            Error::Forbidden(msg) => ApiError::Forbidden(msg),
            Error::NotFound(msg) => ApiError::NotFound(msg),
            Error::MemoryNotFound(id) => ApiError::NotFound(format!("Memory {} not found", id)),
            Error::AlbumNotFound(id) => ApiError::NotFound(format!("Album {} not found", id)),
            Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            Error::UnsupportedFileType(_) | Error::FileTooLarge(_) => {
                ApiError::BadRequest(err.to_string())
            }
            Error::Store(_)
            | Error::Storage(_)
            | Error::Request(_)
            | Error::Inference(_)
            | Error::InferenceQuota(_) => ApiError::Upstream(err),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Internal(format!("serialization failed: {}", err))
    }
}

impl From<axum::extract::multipart::MultipartError> for ApiError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        ApiError::BadRequest(format!("Upload error: {}", err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Upstream(err) => {
                error!(error = %err, "upstream call failed");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            ApiError::Internal(msg) => {
                error!(error = %msg, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_string())
            }
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;
    use keepsake_core::Error;

    #[test]
    fn test_unsupported_file_type_maps_to_400() {
        let api: ApiError = Error::UnsupportedFileType("application/pdf".into()).into();
        match &api {
            ApiError::BadRequest(msg) => assert!(msg.contains("application/pdf")),
            other => panic!("expected BadRequest, got {:?}", other),
        }
        assert_eq!(api.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_file_too_large_maps_to_400() {
        let api: ApiError = Error::FileTooLarge("video.mp4".into()).into();
        assert_eq!(api.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_unauthorized_maps_to_401() {
        let api: ApiError = Error::Unauthorized("invalid token".into()).into();
        assert_eq!(api.into_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_not_found_maps_to_404() {
        let api: ApiError = Error::AlbumNotFound(uuid::Uuid::nil()).into();
        assert_eq!(api.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_store_error_maps_to_500_with_message() {
        let api: ApiError = Error::Store("connection refused".into()).into();
        assert_eq!(
            api.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_serialization_error_maps_to_500() {
        let bad = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let api: ApiError = bad.into();
        match &api {
            ApiError::Internal(_) => {}
            other => panic!("expected Internal, got {:?}", other),
        }
        assert_eq!(
            api.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_hides_details() {
        let api = ApiError::Internal("secret stack trace".into());
        let response = api.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
