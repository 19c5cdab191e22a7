//! Integration tests for layered configuration resolution
//!
//! Covers the CLI → ENV → TOML → default priority order, missing and
//! malformed config files, and bearer token handling.
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Every test that reads the process environment is marked #[serial].

use civic_common::config::{
    CliOverrides, ConfigResolver, ModelSource, ServiceConfig, TomlConfig, ENV_BIND_ADDRESS, ENV_CONFIG_PATH, ENV_HF_TOKEN,
    ENV_MODEL_PATH, ENV_TEXT_ENDPOINT,
};
use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::NamedTempFile;

fn clear_env() {
    for name in [
        ENV_CONFIG_PATH,
        ENV_BIND_ADDRESS,
        ENV_MODEL_PATH,
        ENV_TEXT_ENDPOINT,
        ENV_HF_TOKEN,
    ] {
        env::remove_var(name);
    }
}

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp config");
    file.write_all(content.as_bytes()).expect("write temp config");
    file
}

fn cli_with_config(path: PathBuf) -> CliOverrides {
    CliOverrides {
        config_path: Some(path),
        ..Default::default()
    }
}

#[test]
#[serial]
fn test_defaults_when_config_empty() {
    clear_env();
    let file = write_config("");

    let config = ConfigResolver::new(cli_with_config(file.path().to_path_buf()))
        .resolve()
        .expect("empty config should resolve");

    assert_eq!(config.bind_address.to_string(), "127.0.0.1:5000");
    assert_eq!(
        config.cors_allowed_origins,
        vec!["http://localhost:5173", "http://127.0.0.1:5173"]
    );
    assert_eq!(config.log_level, "info");
    assert_eq!(config.text_classifier.timeout, Duration::from_secs(30));
    assert!(config
        .text_classifier
        .endpoint
        .ends_with("/models/valhalla/distilbart-mnli-12-3"));
    assert!(config.text_classifier.api_token.is_none());
    assert_eq!(config.model.input_size, 224);
    assert_eq!(config.model.download_timeout, Duration::from_secs(60));
    match config.model.source {
        ModelSource::Hub { repo, file, .. } => {
            assert_eq!(repo, "SoloScript/SmartGovModel");
            assert_eq!(file, "image_modelv2.onnx");
        }
        other => panic!("expected hub source, got {:?}", other),
    }
    assert_eq!(config.config_file.as_deref(), Some(file.path()));
}

#[test]
#[serial]
fn test_toml_values_applied() {
    clear_env();
    let file = write_config(
        r#"
        bind_address = "0.0.0.0:8081"
        cors_allowed_origins = ["https://civic.example"]

        [logging]
        level = "debug"

        [text_classifier]
        endpoint = "http://127.0.0.1:9999/zero-shot"
        timeout_secs = 7
        api_token = "toml-token"

        [model]
        repo = "org/other"
        cache_dir = "/tmp/civic-cache"
        input_size = 256
        download_timeout_secs = 15
        "#,
    );

    let config = ConfigResolver::new(cli_with_config(file.path().to_path_buf()))
        .resolve()
        .unwrap();

    assert_eq!(config.bind_address.to_string(), "0.0.0.0:8081");
    assert_eq!(config.cors_allowed_origins, vec!["https://civic.example"]);
    assert_eq!(config.log_level, "debug");
    assert_eq!(config.text_classifier.endpoint, "http://127.0.0.1:9999/zero-shot");
    assert_eq!(config.text_classifier.timeout, Duration::from_secs(7));
    assert_eq!(config.text_classifier.api_token.as_deref(), Some("toml-token"));
    assert_eq!(config.model.input_size, 256);
    assert_eq!(config.model.download_timeout, Duration::from_secs(15));
    match config.model.source {
        ModelSource::Hub {
            repo, cache_dir, ..
        } => {
            assert_eq!(repo, "org/other");
            assert_eq!(cache_dir, PathBuf::from("/tmp/civic-cache"));
        }
        other => panic!("expected hub source, got {:?}", other),
    }
}

#[test]
#[serial]
fn test_env_overrides_toml() {
    clear_env();
    let file = write_config(
        r#"
        bind_address = "0.0.0.0:8081"

        [text_classifier]
        endpoint = "http://toml.invalid/"
        api_token = "toml-token"
        "#,
    );
    env::set_var(ENV_BIND_ADDRESS, "127.0.0.1:6001");
    env::set_var(ENV_TEXT_ENDPOINT, "http://env.invalid/");
    env::set_var(ENV_HF_TOKEN, "env-token");
    env::set_var(ENV_MODEL_PATH, "/env/model.onnx");

    let config = ConfigResolver::new(cli_with_config(file.path().to_path_buf()))
        .resolve()
        .unwrap();
    clear_env();

    assert_eq!(config.bind_address.to_string(), "127.0.0.1:6001");
    assert_eq!(config.text_classifier.endpoint, "http://env.invalid/");
    assert_eq!(config.text_classifier.api_token.as_deref(), Some("env-token"));
    assert_eq!(
        config.model.source,
        ModelSource::LocalPath(PathBuf::from("/env/model.onnx"))
    );
}

#[test]
#[serial]
fn test_cli_overrides_env() {
    clear_env();
    let file = write_config("");
    env::set_var(ENV_BIND_ADDRESS, "127.0.0.1:6001");
    env::set_var(ENV_MODEL_PATH, "/env/model.onnx");

    let cli = CliOverrides {
        config_path: Some(file.path().to_path_buf()),
        bind_address: Some("127.0.0.1:7001".to_string()),
        model_path: Some(PathBuf::from("/cli/model.onnx")),
        log_level: Some("trace".to_string()),
    };
    let config = ConfigResolver::new(cli).resolve().unwrap();
    clear_env();

    assert_eq!(config.bind_address.to_string(), "127.0.0.1:7001");
    assert_eq!(
        config.model.source,
        ModelSource::LocalPath(PathBuf::from("/cli/model.onnx"))
    );
    assert_eq!(config.log_level, "trace");
}

#[test]
#[serial]
fn test_config_path_from_env() {
    clear_env();
    let file = write_config("bind_address = \"127.0.0.1:5111\"");
    env::set_var(ENV_CONFIG_PATH, file.path());

    let config = ConfigResolver::new(CliOverrides::default()).resolve().unwrap();
    clear_env();

    assert_eq!(config.bind_address.to_string(), "127.0.0.1:5111");
}

#[test]
#[serial]
fn test_blank_token_treated_as_absent() {
    clear_env();
    let file = write_config("[text_classifier]\napi_token = \"   \"");
    env::set_var(ENV_HF_TOKEN, "");

    let config = ConfigResolver::new(cli_with_config(file.path().to_path_buf()))
        .resolve()
        .unwrap();
    clear_env();

    assert!(config.text_classifier.api_token.is_none());
}

#[test]
#[serial]
fn test_explicit_missing_config_is_error() {
    clear_env();
    let result = ConfigResolver::new(cli_with_config(PathBuf::from(
        "/nonexistent/civic-classifier/config.toml",
    )))
    .resolve();

    let err = result.expect_err("missing explicit config must fail");
    assert!(err.to_string().contains("Config file not found"));
}

#[test]
#[serial]
fn test_malformed_config_is_error() {
    clear_env();
    let file = write_config("bind_address = [not valid toml");

    let err = ConfigResolver::new(cli_with_config(file.path().to_path_buf()))
        .resolve()
        .expect_err("malformed config must fail");
    assert!(err.to_string().contains("Parse"));
}

#[test]
#[serial]
fn test_invalid_bind_address_is_error() {
    clear_env();
    let file = write_config("bind_address = \"not-an-address\"");

    let err = ConfigResolver::new(cli_with_config(file.path().to_path_buf()))
        .resolve()
        .expect_err("invalid address must fail");
    assert!(err.to_string().contains("Invalid bind address"));
}

#[test]
#[serial]
fn test_zero_timeout_is_error() {
    clear_env();
    let file = write_config("[text_classifier]\ntimeout_secs = 0");

    assert!(ConfigResolver::new(cli_with_config(file.path().to_path_buf()))
        .resolve()
        .is_err());
}

#[test]
#[serial]
fn test_zero_download_timeout_is_error() {
    clear_env();
    let file = write_config("[model]\ndownload_timeout_secs = 0");

    let err = ConfigResolver::new(cli_with_config(file.path().to_path_buf()))
        .resolve()
        .expect_err("zero download timeout must fail");
    assert!(err.to_string().contains("download_timeout_secs"));
}

/// Log sink shared between the subscriber and the test
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn summary_output(config: &ServiceConfig) -> String {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    tracing::subscriber::with_default(subscriber, || config.log_summary());

    let bytes = logs.0.lock().unwrap().clone();
    String::from_utf8(bytes).unwrap()
}

#[test]
#[serial]
fn test_summary_warns_without_config_file() {
    clear_env();
    let config = ConfigResolver::new(CliOverrides::default())
        .resolve_with(TomlConfig::default(), None)
        .unwrap();

    let output = summary_output(&config);
    assert!(output.contains("WARN"), "{}", output);
    assert!(output.contains("No config file found, using defaults"));
    assert!(output.contains("Resolved service configuration"));
}

#[test]
#[serial]
fn test_summary_names_loaded_file_and_hides_token() {
    clear_env();
    let file = write_config("[text_classifier]\napi_token = \"hf_secret\"");
    let config = ConfigResolver::new(cli_with_config(file.path().to_path_buf()))
        .resolve()
        .unwrap();

    let output = summary_output(&config);
    assert!(output.contains("Loaded config file"));
    assert!(output.contains(&file.path().display().to_string()));
    assert!(!output.contains("hf_secret"));
}
