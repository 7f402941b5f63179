//! Configuration section types.

use archrest_docs::SwaggerOptions;
use serde::{Deserialize, Serialize};

/// HTTP listener section.
///
/// ```
/// use archrest_config::ServerConfig;
///
/// let config = ServerConfig {
///     hostname: "0.0.0.0".to_string(),
///     port: 8080,
///     ..Default::default()
/// };
/// assert_eq!(config.address(), "0.0.0.0:8080");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Host name or IP address to bind.
    #[serde(default = "default_hostname")]
    pub hostname: String,

    /// TCP port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Graceful shutdown timeout in seconds.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,

    /// Accept port 0 and let the OS pick a free port.
    #[serde(default)]
    pub allow_ephemeral_port: bool,
}

impl ServerConfig {
    /// `hostname:port` as passed to the listener.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.hostname, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            hostname: default_hostname(),
            port: default_port(),
            shutdown_timeout_secs: default_shutdown_timeout(),
            allow_ephemeral_port: false,
        }
    }
}

fn default_hostname() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_shutdown_timeout() -> u64 {
    30
}

/// API documentation section.
///
/// When present, the Swagger UI is served at `path` and the document at
/// `{path}/openapi.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SwaggerSection {
    /// Mount path of the Swagger UI page.
    #[serde(default = "default_swagger_path")]
    pub path: String,

    /// Document metadata, servers and security schemes.
    #[serde(default)]
    pub options: SwaggerOptions,
}

impl Default for SwaggerSection {
    fn default() -> Self {
        Self {
            path: default_swagger_path(),
            options: SwaggerOptions::default(),
        }
    }
}

fn default_swagger_path() -> String {
    "/docs".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.address(), "127.0.0.1:3000");
        assert_eq!(config.shutdown_timeout_secs, 30);
        assert!(!config.allow_ephemeral_port);
    }

    #[test]
    fn test_server_partial_toml() {
        let config: ServerConfig = toml::from_str("port = 8080").unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.hostname, "127.0.0.1");
    }

    #[test]
    fn test_server_unknown_field() {
        let result: Result<ServerConfig, _> = toml::from_str("http_addr = \"0.0.0.0:80\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_swagger_section_nested_options() {
        let section: SwaggerSection = toml::from_str(
            r#"
            path = "/api-docs"

            [options]
            enable_all_routes = false

            [options.info]
            title = "Orders"
            version = "1.0.0"
            "#,
        )
        .unwrap();
        assert_eq!(section.path, "/api-docs");
        assert_eq!(section.options.enable_all_routes, Some(false));
        assert_eq!(section.options.info.title.as_deref(), Some("Orders"));
    }
}
