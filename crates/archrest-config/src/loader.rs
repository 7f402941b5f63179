//! Layered configuration loading.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use archrest_validation::{Presence, ValidationOptions};

use crate::{ConfigError, RestConfig, SwaggerSection};

/// Default environment variable prefix.
pub const DEFAULT_ENV_PREFIX: &str = "ARCHREST";

/// Configuration loader with layered approach.
///
/// Later layers override earlier ones:
/// 1. Default values
/// 2. Configuration file (TOML or JSON, chosen by extension)
/// 3. Environment variables named `PREFIX_SECTION__KEY`
///
/// ```no_run
/// use archrest_config::ConfigLoader;
///
/// # fn main() -> Result<(), archrest_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_dotenv()?
///     .with_optional_file("archrest.toml")?
///     .with_env_prefix("ARCHREST")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: RestConfig,
    env_prefix: Option<String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a loader starting from default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: RestConfig::default(),
            env_prefix: None,
        }
    }

    /// Start with the development preset.
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = RestConfig::development();
        self
    }

    /// Start with the production preset.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = RestConfig::production();
        self
    }

    /// Load configuration from a `.toml` or `.json` file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file is missing, unreadable, has an
    /// unsupported extension or does not parse.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;
        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        self.config = Self::parse(&content, &format)?;
        Ok(self)
    }

    /// Load configuration from a file if it exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be loaded.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load configuration from a string in the given format (`toml` or `json`).
    ///
    /// ```
    /// use archrest_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string("[server]\nport = 8080", "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.server.port, 8080);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if parsing fails.
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = Self::parse(content, &format.to_lowercase())?;
        Ok(self)
    }

    /// Apply environment overrides with the given prefix at [`load`](Self::load).
    ///
    /// With prefix `ARCHREST`, `ARCHREST_SERVER__PORT=8080` sets `server.port`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.trim_end_matches('_').to_uppercase());
        self
    }

    /// Apply environment overrides with the `ARCHREST` prefix.
    #[must_use]
    pub fn with_default_env(self) -> Self {
        self.with_env_prefix(DEFAULT_ENV_PREFIX)
    }

    /// Load a `.env` file from the current directory or its parents, if any.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Dotenv` if a `.env` file exists but is malformed.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(e) if e.not_found() => Ok(self),
            Err(e) => Err(e.into()),
        }
    }

    /// Load a specific `.env` file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Dotenv` if the file is missing or malformed.
    pub fn with_dotenv_path<P: Into<PathBuf>>(self, path: P) -> Result<Self, ConfigError> {
        dotenvy::from_path(path.into())?;
        Ok(self)
    }

    /// Apply environment overrides and validate.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an environment value does not parse or the
    /// result fails [`RestConfig::validate`].
    pub fn load(mut self) -> Result<RestConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            let vars: Vec<(String, String)> = env::vars()
                .filter(|(key, _)| key.starts_with(&prefix))
                .collect();
            for (key, value) in vars {
                self.apply_env_var(&key, &value, &prefix)?;
            }
        }

        self.config.validate()?;
        Ok(self.config)
    }

    /// Finalize without environment overrides or validation.
    #[must_use]
    pub fn load_unvalidated(self) -> RestConfig {
        self.config
    }

    fn parse(content: &str, format: &str) -> Result<RestConfig, ConfigError> {
        match format {
            "toml" => Ok(toml::from_str(content)?),
            "json" => Ok(serde_json::from_str(content)?),
            other => Err(ConfigError::UnsupportedFormat(other.to_string())),
        }
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let Some(path) = key
            .strip_prefix(prefix)
            .and_then(|rest| rest.strip_prefix('_'))
        else {
            return Ok(());
        };

        let parts: Vec<&str> = path.split("__").collect();
        let config = &mut self.config;

        match parts.as_slice() {
            ["SERVER", "HOSTNAME"] => config.server.hostname = value.to_string(),
            ["SERVER", "PORT"] => config.server.port = parse_number(key, value)?,
            ["SERVER", "SHUTDOWN_TIMEOUT_SECS"] => {
                config.server.shutdown_timeout_secs = parse_number(key, value)?;
            }
            ["SERVER", "ALLOW_EPHEMERAL_PORT"] => {
                config.server.allow_ephemeral_port = parse_flag(key, value)?;
            }

            ["VALIDATION", "ENABLED"] => {
                config.validation = if parse_flag(key, value)? {
                    Some(config.validation.take().unwrap_or_default())
                } else {
                    None
                };
            }
            ["VALIDATION", field] => {
                let options = config
                    .validation
                    .get_or_insert_with(ValidationOptions::default);
                match *field {
                    "ABORT_EARLY" => options.abort_early = parse_flag(key, value)?,
                    "ALLOW_UNKNOWN" => options.allow_unknown = parse_flag(key, value)?,
                    "CONVERT" => options.convert = parse_flag(key, value)?,
                    "PRESENCE" => options.presence = Some(parse_presence(key, value)?),
                    _ => {}
                }
            }

            ["UPLOAD", "DEST"] => config.upload.dest = Some(PathBuf::from(value)),
            ["UPLOAD", "MAX_FILE_SIZE"] => {
                config.upload.max_file_size = Some(parse_number(key, value)?);
            }
            ["UPLOAD", "MAX_FILES"] => config.upload.max_files = Some(parse_number(key, value)?),
            ["UPLOAD", "MAX_FIELDS"] => config.upload.max_fields = Some(parse_number(key, value)?),

            ["SWAGGER", "PATH"] => {
                config
                    .swagger
                    .get_or_insert_with(SwaggerSection::default)
                    .path = value.to_string();
            }
            ["SWAGGER", "ENABLE_ALL_ROUTES"] => {
                config
                    .swagger
                    .get_or_insert_with(SwaggerSection::default)
                    .options
                    .enable_all_routes = Some(parse_flag(key, value)?);
            }
            ["SWAGGER", "INFO", "TITLE"] => {
                config
                    .swagger
                    .get_or_insert_with(SwaggerSection::default)
                    .options
                    .info
                    .title = Some(value.to_string());
            }
            ["SWAGGER", "INFO", "VERSION"] => {
                config
                    .swagger
                    .get_or_insert_with(SwaggerSection::default)
                    .options
                    .info
                    .version = Some(value.to_string());
            }

            ["LOGGING", "ENABLED"] => config.logging.enabled = parse_flag(key, value)?,
            ["LOGGING", "LEVEL"] => config.logging.level = value.to_string(),
            ["LOGGING", "JSON_FORMAT"] => config.logging.json_format = parse_flag(key, value)?,
            ["LOGGING", "INCLUDE_TARGET"] => {
                config.logging.include_target = parse_flag(key, value)?;
            }
            ["LOGGING", "INCLUDE_LOCATION"] => {
                config.logging.include_location = parse_flag(key, value)?;
            }
            ["LOGGING", "INCLUDE_THREAD_IDS"] => {
                config.logging.include_thread_ids = parse_flag(key, value)?;
            }
            ["LOGGING", "SERVICE_NAME"] => config.logging.service_name = value.to_string(),

            ["ERRORS", "EXPOSE_INTERNAL_MESSAGES"] => {
                config.errors.expose_internal_messages = parse_flag(key, value)?;
            }

            // Unrecognized keys under the prefix are ignored.
            _ => {}
        }

        Ok(())
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    parse_bool(value).ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))
}

fn parse_presence(key: &str, value: &str) -> Result<Presence, ConfigError> {
    match value.to_lowercase().as_str() {
        "optional" => Ok(Presence::Optional),
        "required" => Ok(Presence::Required),
        "forbidden" => Ok(Presence::Forbidden),
        _ => Err(ConfigError::env_parse_error(
            key,
            "expected 'optional', 'required' or 'forbidden'",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loader_new() {
        let config = ConfigLoader::new().load().unwrap();
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_loader_presets() {
        let config = ConfigLoader::new().with_development().load().unwrap();
        assert_eq!(config.logging.level, "debug");

        let config = ConfigLoader::new().with_production().load().unwrap();
        assert!(config.logging.json_format);
    }

    #[test]
    fn test_loader_with_string_toml() {
        let toml = r#"
            [server]
            hostname = "0.0.0.0"
            port = 8080

            [validation]
            abort_early = false

            [upload]
            max_files = 4
        "#;

        let config = ConfigLoader::new()
            .with_string(toml, "toml")
            .unwrap()
            .load()
            .unwrap();

        assert_eq!(config.server.address(), "0.0.0.0:8080");
        let validation = config.validation.unwrap();
        assert!(!validation.abort_early);
        assert!(validation.convert);
        assert_eq!(config.upload.max_files, Some(4));
    }

    #[test]
    fn test_loader_with_string_json() {
        let json = r#"{"server": {"port": 4000}, "errors": {"expose_internal_messages": true}}"#;

        let config = ConfigLoader::new()
            .with_string(json, "JSON")
            .unwrap()
            .load()
            .unwrap();

        assert_eq!(config.server.port, 4000);
        assert!(config.errors.expose_internal_messages);
    }

    #[test]
    fn test_loader_unsupported_format() {
        let result = ConfigLoader::new().with_string("port: 1", "yaml");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_loader_with_file_not_found() {
        let result = ConfigLoader::new().with_file("/nonexistent/archrest.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
    }

    #[test]
    fn test_loader_with_optional_file_not_found() {
        let config = ConfigLoader::new()
            .with_optional_file("/nonexistent/archrest.toml")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("true"), Some(true));
        assert_eq!(parse_bool("YES"), Some(true));
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
        assert_eq!(parse_bool(""), None);
    }

    #[test]
    fn test_apply_env_var_server() {
        let mut loader = ConfigLoader::new();
        loader
            .apply_env_var("TEST_SERVER__HOSTNAME", "0.0.0.0", "TEST")
            .unwrap();
        loader.apply_env_var("TEST_SERVER__PORT", "9000", "TEST").unwrap();
        assert_eq!(loader.config.server.address(), "0.0.0.0:9000");
    }

    #[test]
    fn test_apply_env_var_invalid_integer() {
        let mut loader = ConfigLoader::new();
        let result = loader.apply_env_var("TEST_SERVER__PORT", "eighty", "TEST");
        assert!(matches!(result, Err(ConfigError::EnvParseError { .. })));
    }

    #[test]
    fn test_apply_env_var_creates_sections() {
        let mut loader = ConfigLoader::new();
        loader
            .apply_env_var("TEST_VALIDATION__PRESENCE", "required", "TEST")
            .unwrap();
        loader
            .apply_env_var("TEST_SWAGGER__INFO__TITLE", "Orders", "TEST")
            .unwrap();

        let validation = loader.config.validation.as_ref().unwrap();
        assert_eq!(validation.presence, Some(Presence::Required));
        let swagger = loader.config.swagger.as_ref().unwrap();
        assert_eq!(swagger.path, "/docs");
        assert_eq!(swagger.options.info.title.as_deref(), Some("Orders"));
    }

    #[test]
    fn test_apply_env_var_disables_validation() {
        let mut loader = ConfigLoader::new().with_production();
        loader
            .apply_env_var("TEST_VALIDATION__ENABLED", "false", "TEST")
            .unwrap();
        assert!(loader.config.validation.is_none());
    }

    #[test]
    fn test_apply_env_var_logging_and_errors() {
        let mut loader = ConfigLoader::new();
        loader
            .apply_env_var("TEST_LOGGING__LEVEL", "debug", "TEST")
            .unwrap();
        loader
            .apply_env_var("TEST_ERRORS__EXPOSE_INTERNAL_MESSAGES", "true", "TEST")
            .unwrap();
        assert_eq!(loader.config.logging.level, "debug");
        assert!(loader.config.errors.expose_internal_messages);
    }

    #[test]
    fn test_apply_env_var_ignores_other_keys() {
        let mut loader = ConfigLoader::new();
        loader.apply_env_var("TESTING", "1", "TEST").unwrap();
        loader.apply_env_var("TEST_UNKNOWN__KEY", "1", "TEST").unwrap();
        assert_eq!(loader.config, RestConfig::default());
    }
}
