//! Errors raised while loading or validating a [`RestConfig`](crate::RestConfig).

use std::path::PathBuf;
use thiserror::Error;

/// Configuration loading and validation failures.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required configuration file does not exist.
    #[error("config file {} does not exist", path.display())]
    FileNotFound {
        /// Requested path.
        path: PathBuf,
    },

    /// The file exists but could not be read.
    #[error("cannot read config file {}", path.display())]
    ReadError {
        /// Requested path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The TOML document is malformed or has unknown keys.
    #[error("invalid TOML config: {0}")]
    TomlError(#[from] toml::de::Error),

    /// The JSON document is malformed or has unknown keys.
    #[error("invalid JSON config: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Only `.toml` and `.json` files are understood.
    #[error("unsupported config file extension `{0}`")]
    UnsupportedFormat(String),

    /// A value parsed but is not acceptable for a REST server.
    #[error("{field} {reason}")]
    InvalidValue {
        /// Dotted path of the offending key, e.g. `server.port`.
        field: String,
        /// What is wrong with it.
        reason: String,
    },

    /// An `ARCHREST_*` override could not be converted to the key's type.
    #[error("environment override {var}: {reason}")]
    EnvParseError {
        /// Variable name.
        var: String,
        /// Expected type.
        reason: String,
    },

    /// A `.env` file was found but could not be applied.
    #[error("cannot apply .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),
}

impl ConfigError {
    pub(crate) fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    pub(crate) fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadError {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn env_parse_error(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EnvParseError {
            var: var.into(),
            reason: reason.into(),
        }
    }
}
