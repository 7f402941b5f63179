//! Root configuration type and its builder.

use archrest_core::{FileUploadOptions, HttpErrorsOptions};
use archrest_telemetry::LogConfig;
use archrest_validation::ValidationOptions;
use serde::{Deserialize, Serialize};

use crate::{ConfigError, ServerConfig, SwaggerSection};

/// Complete Archrest server configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and
/// environment variables.
///
/// ```
/// use archrest_config::RestConfig;
///
/// let config = RestConfig::default();
/// assert_eq!(config.server.port, 3000);
/// assert!(config.validation.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct RestConfig {
    /// Listener settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Validation engine options. Installs the default schema validator when set.
    #[serde(default)]
    pub validation: Option<ValidationOptions>,

    /// File upload limits and destination.
    #[serde(default)]
    pub upload: FileUploadOptions,

    /// API documentation. Nothing is served when unset.
    #[serde(default)]
    pub swagger: Option<SwaggerSection>,

    /// Logging setup.
    #[serde(default)]
    pub logging: LogConfig,

    /// Built-in error rendering.
    #[serde(default)]
    pub errors: HttpErrorsOptions,
}

impl RestConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> RestConfigBuilder {
        RestConfigBuilder::new()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - the port is 0 and `allow_ephemeral_port` is not set
    /// - the hostname is empty
    /// - the swagger path does not start with `/`
    /// - an upload limit is 0
    /// - the log level is not a valid filter directive
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 && !self.server.allow_ephemeral_port {
            return Err(ConfigError::invalid_value(
                "server.port",
                "must not be 0 unless allow_ephemeral_port is set",
            ));
        }

        if self.server.hostname.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "server.hostname",
                "must not be empty",
            ));
        }

        if let Some(swagger) = &self.swagger {
            if !swagger.path.starts_with('/') {
                return Err(ConfigError::invalid_value(
                    "swagger.path",
                    format!("must start with '/': {}", swagger.path),
                ));
            }
        }

        let limits = [
            ("upload.max_file_size", self.upload.max_file_size.map(|v| v == 0)),
            ("upload.max_files", self.upload.max_files.map(|v| v == 0)),
            ("upload.max_fields", self.upload.max_fields.map(|v| v == 0)),
        ];
        for (field, is_zero) in limits {
            if is_zero == Some(true) {
                return Err(ConfigError::invalid_value(field, "must be greater than 0"));
            }
        }

        self.logging
            .validate()
            .map_err(|e| ConfigError::invalid_value("logging", e.to_string()))?;

        Ok(())
    }

    /// Development preset: pretty debug logs and internal error messages in responses.
    #[must_use]
    pub fn development() -> Self {
        Self {
            logging: LogConfig::development(),
            errors: HttpErrorsOptions {
                expose_internal_messages: true,
            },
            validation: Some(ValidationOptions::default()),
            ..Self::default()
        }
    }

    /// Production preset: JSON logs, generic error messages, listening on all interfaces.
    #[must_use]
    pub fn production() -> Self {
        Self {
            server: ServerConfig {
                hostname: "0.0.0.0".to_string(),
                ..ServerConfig::default()
            },
            logging: LogConfig::production(),
            validation: Some(ValidationOptions::default()),
            ..Self::default()
        }
    }
}

/// Builder for [`RestConfig`].
#[derive(Debug, Default)]
pub struct RestConfigBuilder {
    config: RestConfig,
}

impl RestConfigBuilder {
    /// Create a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the server section.
    #[must_use]
    pub fn server(mut self, server: ServerConfig) -> Self {
        self.config.server = server;
        self
    }

    /// Enable validation with the given options.
    #[must_use]
    pub fn validation(mut self, options: ValidationOptions) -> Self {
        self.config.validation = Some(options);
        self
    }

    /// Set the upload section.
    #[must_use]
    pub fn upload(mut self, upload: FileUploadOptions) -> Self {
        self.config.upload = upload;
        self
    }

    /// Serve API documentation.
    #[must_use]
    pub fn swagger(mut self, swagger: SwaggerSection) -> Self {
        self.config.swagger = Some(swagger);
        self
    }

    /// Set the logging section.
    #[must_use]
    pub fn logging(mut self, logging: LogConfig) -> Self {
        self.config.logging = logging;
        self
    }

    /// Set the error rendering options.
    #[must_use]
    pub fn errors(mut self, errors: HttpErrorsOptions) -> Self {
        self.config.errors = errors;
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> RestConfig {
        self.config
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if validation fails.
    pub fn build_validated(self) -> Result<RestConfig, ConfigError> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = RestConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.swagger.is_none());
        assert!(!config.errors.expose_internal_messages);
    }

    #[test]
    fn test_builder_sections() {
        let config = RestConfig::builder()
            .server(ServerConfig {
                port: 8080,
                ..Default::default()
            })
            .validation(ValidationOptions::default())
            .swagger(SwaggerSection::default())
            .build();

        assert_eq!(config.server.port, 8080);
        assert!(config.validation.is_some());
        assert_eq!(config.swagger.map(|s| s.path), Some("/docs".to_string()));
    }

    #[test]
    fn test_validate_port_zero() {
        let mut config = RestConfig::default();
        config.server.port = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("server.port"));

        config.server.allow_ephemeral_port = true;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_hostname() {
        let config = RestConfig::builder()
            .server(ServerConfig {
                hostname: String::new(),
                ..Default::default()
            })
            .build_validated();
        assert!(config.unwrap_err().to_string().contains("server.hostname"));
    }

    #[test]
    fn test_validate_swagger_path() {
        let config = RestConfig::builder()
            .swagger(SwaggerSection {
                path: "docs".to_string(),
                ..Default::default()
            })
            .build();
        assert!(config.validate().unwrap_err().to_string().contains("swagger.path"));
    }

    #[test]
    fn test_validate_zero_upload_limit() {
        let config = RestConfig::builder()
            .upload(FileUploadOptions {
                max_files: Some(0),
                ..Default::default()
            })
            .build();
        assert!(config
            .validate()
            .unwrap_err()
            .to_string()
            .contains("upload.max_files"));
    }

    #[test]
    fn test_validate_log_level() {
        let mut config = RestConfig::default();
        config.logging.level = "[[[".to_string();
        assert!(config.validate().unwrap_err().to_string().contains("logging"));
    }

    #[test]
    fn test_presets() {
        let dev = RestConfig::development();
        assert_eq!(dev.logging.level, "debug");
        assert!(dev.errors.expose_internal_messages);

        let prod = RestConfig::production();
        assert!(prod.logging.json_format);
        assert_eq!(prod.server.hostname, "0.0.0.0");
        assert!(prod.validate().is_ok());
    }

    #[test]
    fn test_unknown_section_rejected() {
        let result: Result<RestConfig, _> = toml::from_str("[authorization]\nenabled = true");
        assert!(result.is_err());
    }
}
