//! Telemetry error types.

use thiserror::Error;

/// Errors that can occur while setting up telemetry.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Failed to initialize logging.
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    /// A global subscriber was already installed.
    #[error("Logging already initialized: {0}")]
    AlreadyInitialized(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TelemetryError::LoggingInit("bad directive".to_string());
        assert_eq!(err.to_string(), "Failed to initialize logging: bad directive");
    }

    #[test]
    fn test_error_variants() {
        let _ = TelemetryError::AlreadyInitialized("global default".to_string());
        let _ = TelemetryError::InvalidConfig("empty service name".to_string());
    }
}
