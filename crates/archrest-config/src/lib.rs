//! Typed configuration for Archrest servers.
//!
//! - TOML and JSON configuration files
//! - Environment variable overrides
//! - Strict parsing (unknown fields are rejected)
//! - Layered loading (defaults → file → env)
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! hostname = "0.0.0.0"
//! port = 8080
//!
//! [validation]
//! abort_early = false
//!
//! [upload]
//! dest = "/var/lib/archrest/uploads"
//! max_file_size = 10485760
//!
//! [swagger]
//! path = "/docs"
//!
//! [swagger.options.info]
//! title = "Orders API"
//! version = "1.0.0"
//!
//! [logging]
//! level = "info"
//! json_format = true
//!
//! [errors]
//! expose_internal_messages = false
//! ```
//!
//! # Environment Variable Overrides
//!
//! Values can be overridden with `PREFIX_SECTION__KEY` variables:
//!
//! - `ARCHREST_SERVER__PORT=9000`
//! - `ARCHREST_LOGGING__LEVEL=debug`
//! - `ARCHREST_SWAGGER__INFO__TITLE="Orders API"`

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::{RestConfig, RestConfigBuilder};
pub use error::ConfigError;
pub use loader::{ConfigLoader, DEFAULT_ENV_PREFIX};
pub use schema::{ServerConfig, SwaggerSection};
