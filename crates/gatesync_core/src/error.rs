//! Error types for GateSync core.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Durable storage is unavailable or failed.
    #[error("storage error: {0}")]
    Storage(#[from] gatesync_storage::StorageError),

    /// A stored record could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(String),
}

impl CoreError {
    /// Creates a codec error from any displayable cause.
    pub fn codec(cause: impl std::fmt::Display) -> Self {
        Self::Codec(cause.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_error_converts() {
        let err: CoreError = gatesync_storage::StorageError::Closed.into();
        assert!(matches!(err, CoreError::Storage(_)));
        assert_eq!(err.to_string(), "storage error: storage is closed");
    }

    #[test]
    fn codec_error_display() {
        let err = CoreError::codec("unexpected end of input");
        assert_eq!(err.to_string(), "codec error: unexpected end of input");
    }
}
