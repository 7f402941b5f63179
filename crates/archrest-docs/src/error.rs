//! Error types for the documentation crate.

use thiserror::Error;

/// Errors that can occur while rendering documentation.
#[derive(Debug, Error)]
pub enum DocsError {
    /// Failed to serialize the OpenAPI document to JSON.
    #[error("Failed to serialize OpenAPI document: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// The docs mount path is unusable.
    #[error("Invalid documentation path '{path}': {reason}")]
    InvalidPath {
        /// The configured path.
        path: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// Result type for documentation operations.
pub type DocsResult<T> = Result<T, DocsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialization_error() {
        let err: DocsError = serde_json::from_str::<String>("invalid")
            .unwrap_err()
            .into();
        assert!(matches!(err, DocsError::SerializationError(_)));
        assert!(err.to_string().contains("serialize"));
    }

    #[test]
    fn test_invalid_path_error() {
        let err = DocsError::InvalidPath {
            path: "docs".to_string(),
            reason: "must start with '/'".to_string(),
        };
        assert!(err.to_string().contains("docs"));
        assert!(err.to_string().contains("must start"));
    }
}
