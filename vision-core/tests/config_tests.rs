//! Integration tests for configuration loading and validation

use std::env;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use vision_core::config::{load_from_json, load_from_yaml, ConfigError, ValidationErrorKind};
use vision_core::protocol::Transport;
use vision_core::VisionAnalysisService;

/// Helper to create a test config file
fn create_test_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_load_valid_yaml_config() {
    env::set_var("VISION_CFG_TEST_KEY", "yaml-key");

    let yaml = r#"
version: "0.1"
provider:
  endpoint: https://my-resource.cognitiveservices.azure.com
  api_key: ${VISION_CFG_TEST_KEY}
  default_transport: Sdk
resilience:
  max_concurrency: 4
  retry:
    max_attempts: 4
connection:
  request_timeout_ms: 15000
"#;

    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "vision.yaml", yaml);

    let config = load_from_yaml(path).unwrap();
    assert_eq!(config.version, "0.1");
    assert_eq!(config.provider.api_key.expose_secret(), "yaml-key");
    assert_eq!(config.provider.default_transport, Transport::Typed);
    assert_eq!(config.resilience.max_concurrency, 4);
    assert_eq!(config.resilience.retry.max_attempts, 4);
    assert_eq!(config.resilience.retry.base_delay_ms, 400);
    assert_eq!(config.connection.request_timeout_ms, 15000);

    // The key never shows up in debug output
    assert!(!format!("{:?}", config).contains("yaml-key"));

    env::remove_var("VISION_CFG_TEST_KEY");
}

#[test]
fn test_load_valid_json_config() {
    let json = r#"{
        "version": "0.1",
        "provider": {
            "endpoint": "https://vision.example.com",
            "api_key": "json-key",
            "key_header": "subscription-key",
            "analyze_path": "/analyze"
        },
        "uploads": { "max_file_size_bytes": 1048576 }
    }"#;

    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "vision.json", json);

    let config = load_from_json(path).unwrap();
    assert_eq!(config.provider.key_header, "subscription-key");
    assert_eq!(config.provider.analyze_path, "/analyze");
    assert_eq!(config.uploads.max_file_size_bytes, 1_048_576);
    assert_eq!(config.uploads.allowed_content_types.len(), 3);

    assert!(VisionAnalysisService::from_config(&config).is_ok());
}

#[test]
fn test_missing_env_var_is_reported() {
    let yaml = r#"
version: "0.1"
provider:
  endpoint: https://vision.example.com
  api_key: ${VISION_CFG_DEFINITELY_UNSET}
"#;

    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "vision.yaml", yaml);

    match load_from_yaml(path) {
        Err(ConfigError::EnvVarNotFound { var }) => assert_eq!(var, "VISION_CFG_DEFINITELY_UNSET"),
        other => panic!("Expected EnvVarNotFound, got {:?}", other),
    }
}

#[test]
fn test_invalid_endpoint_reports_field_path() {
    let yaml = r#"
version: "0.1"
provider:
  endpoint: "not a url"
  api_key: key
"#;

    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "vision.yaml", yaml);

    match load_from_yaml(path) {
        Err(ConfigError::ValidationError(err)) => {
            assert_eq!(err.field_path, "provider.endpoint");
            assert!(matches!(err.kind, ValidationErrorKind::InvalidUrl { .. }));
        }
        other => panic!("Expected validation error, got {:?}", other),
    }
}

#[test]
fn test_zero_concurrency_reports_field_path() {
    let yaml = r#"
version: "0.1"
provider:
  endpoint: https://vision.example.com
  api_key: key
resilience:
  max_concurrency: 0
"#;

    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "vision.yaml", yaml);

    match load_from_yaml(path) {
        Err(ConfigError::ValidationError(err)) => {
            assert_eq!(err.field_path, "resilience.max_concurrency");
            assert!(matches!(err.kind, ValidationErrorKind::OutOfRange { .. }));
        }
        other => panic!("Expected validation error, got {:?}", other),
    }
}

#[test]
fn test_missing_api_key_reports_field_path() {
    let yaml = r#"
version: "0.1"
provider:
  endpoint: https://vision.example.com
  api_key: ""
"#;

    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "vision.yaml", yaml);

    match load_from_yaml(path) {
        Err(ConfigError::ValidationError(err)) => assert_eq!(err.field_path, "provider.api_key"),
        other => panic!("Expected validation error, got {:?}", other),
    }
}

#[test]
fn test_malformed_yaml_reports_location() {
    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "vision.yaml", "version: \"0.1\"\nprovider: [unclosed\n");

    match load_from_yaml(path) {
        Err(ConfigError::ParseError { line, .. }) => assert!(line.is_some()),
        other => panic!("Expected parse error, got {:?}", other),
    }
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let result = load_from_yaml(dir.path().join("absent.yaml"));
    assert!(matches!(result, Err(ConfigError::IoError { .. })));
}
