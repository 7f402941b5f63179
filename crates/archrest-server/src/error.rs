//! Server error types.

use crate::sequence::SequenceMarker;
use thiserror::Error;

/// Errors raised while assembling or starting a server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A required sequence marker is absent.
    #[error("setup sequence is missing the {0} marker")]
    MissingMarker(SequenceMarker),

    /// A sequence marker appears more than once.
    #[error("setup sequence contains the {0} marker more than once")]
    DuplicateMarker(SequenceMarker),

    /// `StartListening` comes before `RegisterRoutes`.
    #[error("setup sequence must register routes before it starts listening")]
    MarkerOrder,

    /// A route declares a validation schema but no validation strategy is configured.
    #[error("route {controller}.{method} declares a validation schema but no validation strategy is configured")]
    ValidationNotConfigured {
        /// Controller name.
        controller: String,
        /// Method name.
        method: String,
    },

    /// The listener could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address that was requested.
        addr: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The configured hostname and port do not form an address.
    #[error("invalid listen address: {0}")]
    InvalidAddress(String),

    /// The documentation page could not be set up.
    #[error(transparent)]
    Docs(#[from] archrest_docs::DocsError),

    /// The configuration is invalid.
    #[error(transparent)]
    Config(#[from] archrest_config::ConfigError),

    /// Logging could not be initialized.
    #[error(transparent)]
    Telemetry(#[from] archrest_telemetry::TelemetryError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_marker_names_marker() {
        let err = ServerError::MissingMarker(SequenceMarker::StartListening);
        assert_eq!(
            err.to_string(),
            "setup sequence is missing the StartListening marker"
        );
    }

    #[test]
    fn test_validation_not_configured() {
        let err = ServerError::ValidationNotConfigured {
            controller: "UsersController".to_string(),
            method: "create".to_string(),
        };
        assert!(err.to_string().contains("UsersController.create"));
    }

    #[test]
    fn test_bind_error_keeps_source() {
        let err = ServerError::Bind {
            addr: "127.0.0.1:80".to_string(),
            source: std::io::Error::from(std::io::ErrorKind::AddrInUse),
        };
        assert!(err.to_string().starts_with("failed to bind 127.0.0.1:80"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
