//! Error types for keepsake.

use thiserror::Error;

/// Result type alias using keepsake's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for keepsake operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Store (BaaS) request failed or returned an error payload
    #[error("Store error: {0}")]
    Store(String),

    /// Object storage operation failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Memory not found
    #[error("Memory not found: {0}")]
    MemoryNotFound(uuid::Uuid),

    /// Album not found
    #[error("Album not found: {0}")]
    AlbumNotFound(uuid::Uuid),

    /// Inference/generation failed
    #[error("Inference error: {0}")]
    Inference(String),

    /// Generation quota exhausted on the upstream model
    #[error("Inference quota exceeded: {0}")]
    InferenceQuota(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Uploaded file type outside the image/video/audio allowlist
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// Uploaded file exceeds the per-file size ceiling
    #[error("File too large: {0}")]
    FileTooLarge(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Authentication/authorization failed
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Forbidden (authenticated but not authorized)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}
