//! Loading configuration from files and the process environment.

use archrest_config::{ConfigError, ConfigLoader};
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

fn write_file(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_toml_file() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        &dir,
        "archrest.toml",
        r#"
        [server]
        port = 8081

        [swagger]
        path = "/api-docs"

        [swagger.options.info]
        title = "Orders"
        "#,
    );

    let config = ConfigLoader::new().with_file(&path).unwrap().load().unwrap();
    assert_eq!(config.server.port, 8081);
    let swagger = config.swagger.unwrap();
    assert_eq!(swagger.path, "/api-docs");
    assert_eq!(swagger.options.info.title.as_deref(), Some("Orders"));
}

#[test]
fn test_json_file() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        &dir,
        "archrest.json",
        r#"{ "upload": { "max_file_size": 1024, "max_fields": 10 } }"#,
    );

    let config = ConfigLoader::new().with_file(&path).unwrap().load().unwrap();
    assert_eq!(config.upload.max_file_size, Some(1024));
    assert_eq!(config.upload.max_fields, Some(10));
}

#[test]
fn test_unknown_field_in_file() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "archrest.toml", "[server]\nhttp_addr = \"0.0.0.0:80\"\n");

    let result = ConfigLoader::new().with_file(&path);
    assert!(matches!(result, Err(ConfigError::TomlError(_))));
}

#[test]
fn test_unsupported_extension() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "archrest.yaml", "server: {}");

    let result = ConfigLoader::new().with_file(&path);
    assert!(matches!(result, Err(ConfigError::UnsupportedFormat(ext)) if ext == "yaml"));
}

#[test]
fn test_file_values_fail_validation() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "archrest.toml", "[server]\nport = 0\n");

    let result = ConfigLoader::new().with_file(&path).unwrap().load();
    assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
}

#[test]
fn test_env_overrides_file() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "archrest.toml", "[server]\nport = 8081\n");

    std::env::set_var("ARCHREST_LOADER_ENV_SERVER__PORT", "9099");
    std::env::set_var("ARCHREST_LOADER_ENV_LOGGING__JSON_FORMAT", "false");

    let config = ConfigLoader::new()
        .with_file(&path)
        .unwrap()
        .with_env_prefix("ARCHREST_LOADER_ENV_")
        .load()
        .unwrap();

    assert_eq!(config.server.port, 9099);
    assert!(!config.logging.json_format);
}

#[test]
fn test_invalid_env_value() {
    std::env::set_var("ARCHREST_LOADER_BAD_UPLOAD__MAX_FILES", "many");

    let result = ConfigLoader::new()
        .with_env_prefix("ARCHREST_LOADER_BAD")
        .load();

    assert!(matches!(result, Err(ConfigError::EnvParseError { var, .. })
        if var == "ARCHREST_LOADER_BAD_UPLOAD__MAX_FILES"));
}

#[test]
fn test_dotenv_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "ARCHREST_LOADER_DOTENV_SERVER__HOSTNAME=0.0.0.0").unwrap();

    let config = ConfigLoader::new()
        .with_dotenv_path(file.path())
        .unwrap()
        .with_env_prefix("ARCHREST_LOADER_DOTENV")
        .load()
        .unwrap();

    assert_eq!(config.server.hostname, "0.0.0.0");
}
