//! Configuration loading and resolution
//!
//! Every setting is resolved in the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing config file never prevents startup; an unreadable or
//! malformed one does.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Environment variable naming an explicit config file
pub const ENV_CONFIG_PATH: &str = "CIVIC_CONFIG";
/// Environment variable overriding the listen address
pub const ENV_BIND_ADDRESS: &str = "CIVIC_BIND_ADDRESS";
/// Environment variable pointing at a local image model file
pub const ENV_MODEL_PATH: &str = "CIVIC_MODEL_PATH";
/// Environment variable overriding the zero-shot endpoint URL
pub const ENV_TEXT_ENDPOINT: &str = "CIVIC_TEXT_ENDPOINT";
/// Bearer credential for the hosted inference API and model hub
pub const ENV_HF_TOKEN: &str = "HF_TOKEN";

/// Compiled defaults used when no other source provides a value
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub bind_address: SocketAddr,
    pub cors_allowed_origins: Vec<String>,
    pub log_level: String,
    pub text_endpoint: String,
    pub text_timeout: Duration,
    pub hub_url: String,
    pub model_repo: String,
    pub model_revision: String,
    pub model_file: String,
    pub model_cache_dir: PathBuf,
    pub input_size: u32,
    pub download_timeout: Duration,
}

impl CompiledDefaults {
    pub fn new() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 5000)),
            cors_allowed_origins: vec![
                "http://localhost:5173".to_string(),
                "http://127.0.0.1:5173".to_string(),
            ],
            log_level: "info".to_string(),
            text_endpoint:
                "https://api-inference.huggingface.co/models/valhalla/distilbart-mnli-12-3"
                    .to_string(),
            text_timeout: Duration::from_secs(30),
            hub_url: "https://huggingface.co".to_string(),
            model_repo: "SoloScript/SmartGovModel".to_string(),
            model_revision: "main".to_string(),
            model_file: "image_modelv2.onnx".to_string(),
            model_cache_dir: default_cache_dir(),
            input_size: 224,
            download_timeout: Duration::from_secs(60),
        }
    }
}

impl Default for CompiledDefaults {
    fn default() -> Self {
        Self::new()
    }
}

/// `[logging]` table
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: Option<String>,
}

/// `[text_classifier]` table
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TextClassifierToml {
    pub endpoint: Option<String>,
    pub timeout_secs: Option<u64>,
    pub api_token: Option<String>,
}

/// `[model]` table
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ModelToml {
    pub repo: Option<String>,
    pub revision: Option<String>,
    pub file: Option<String>,
    pub hub_url: Option<String>,
    pub path: Option<PathBuf>,
    pub cache_dir: Option<PathBuf>,
    pub input_size: Option<u32>,
    pub download_timeout_secs: Option<u64>,
}

/// On-disk config file contents; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TomlConfig {
    pub bind_address: Option<String>,
    pub cors_allowed_origins: Option<Vec<String>>,
    pub logging: LoggingConfig,
    pub text_classifier: TextClassifierToml,
    pub model: ModelToml,
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config_path: Option<PathBuf>,
    pub bind_address: Option<String>,
    pub model_path: Option<PathBuf>,
    pub log_level: Option<String>,
}

/// Remote zero-shot classifier settings
#[derive(Clone)]
pub struct TextClassifierSettings {
    pub endpoint: String,
    pub timeout: Duration,
    /// Bearer credential; `None` uses the unauthenticated tier
    pub api_token: Option<String>,
}

impl std::fmt::Debug for TextClassifierSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextClassifierSettings")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Where the image model comes from
#[derive(Debug, Clone, PartialEq)]
pub enum ModelSource {
    /// Explicit local file, used as-is
    LocalPath(PathBuf),
    /// File in a model hub repository, cached locally after first download
    Hub {
        hub_url: String,
        repo: String,
        revision: String,
        file: String,
        cache_dir: PathBuf,
    },
}

impl std::fmt::Display for ModelSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelSource::LocalPath(path) => write!(f, "{}", path.display()),
            ModelSource::Hub {
                repo,
                revision,
                file,
                ..
            } => write!(f, "{}@{}/{}", repo, revision, file),
        }
    }
}

/// Image model settings
#[derive(Debug, Clone)]
pub struct ModelSettings {
    pub source: ModelSource,
    /// Square input resolution expected by the model
    pub input_size: u32,
    /// Longest a hub download may go without receiving data
    pub download_timeout: Duration,
}

/// Fully resolved service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind_address: SocketAddr,
    pub cors_allowed_origins: Vec<String>,
    pub log_level: String,
    pub text_classifier: TextClassifierSettings,
    pub model: ModelSettings,
    /// Config file actually read, if any
    pub config_file: Option<PathBuf>,
}

/// Read and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// First existing default config file location
///
/// Checks `<user config dir>/civic-classifier/config.toml`, then
/// `/etc/civic-classifier/config.toml` on Linux.
pub fn default_config_path() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("civic-classifier").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/civic-classifier/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Default model cache location for the platform
fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .map(|d| d.join("civic-classifier").join("models"))
        .unwrap_or_else(|| PathBuf::from("./civic_models"))
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Treat empty or whitespace-only tokens as absent
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_bind_address(raw: &str) -> Result<SocketAddr> {
    raw.parse()
        .map_err(|e| Error::Config(format!("Invalid bind address '{}': {}", raw, e)))
}

/// Resolves a [`ServiceConfig`] from CLI, environment, TOML and defaults
pub struct ConfigResolver {
    cli: CliOverrides,
    defaults: CompiledDefaults,
}

impl ConfigResolver {
    pub fn new(cli: CliOverrides) -> Self {
        Self {
            cli,
            defaults: CompiledDefaults::new(),
        }
    }

    /// Locate the config file to read, if any
    ///
    /// An explicitly requested file (CLI or environment) must exist.
    fn config_file(&self) -> Result<Option<PathBuf>> {
        let explicit = self
            .cli
            .config_path
            .clone()
            .or_else(|| env_value(ENV_CONFIG_PATH).map(PathBuf::from));

        match explicit {
            Some(path) if path.exists() => Ok(Some(path)),
            Some(path) => Err(Error::Config(format!(
                "Config file not found: {}",
                path.display()
            ))),
            None => Ok(default_config_path()),
        }
    }

    pub fn resolve(&self) -> Result<ServiceConfig> {
        let config_file = self.config_file()?;
        let toml = match &config_file {
            Some(path) => load_toml_config(path)?,
            None => TomlConfig::default(),
        };

        self.resolve_with(toml, config_file)
    }

    /// Merge an already-loaded TOML config with CLI, environment and defaults
    pub fn resolve_with(
        &self,
        toml: TomlConfig,
        config_file: Option<PathBuf>,
    ) -> Result<ServiceConfig> {
        let d = &self.defaults;

        let bind_address = match self
            .cli
            .bind_address
            .clone()
            .or_else(|| env_value(ENV_BIND_ADDRESS))
            .or(toml.bind_address)
        {
            Some(raw) => parse_bind_address(&raw)?,
            None => d.bind_address,
        };

        let cors_allowed_origins = toml
            .cors_allowed_origins
            .unwrap_or_else(|| d.cors_allowed_origins.clone());

        let log_level = self
            .cli
            .log_level
            .clone()
            .or(toml.logging.level)
            .unwrap_or_else(|| d.log_level.clone());

        let timeout_secs = toml
            .text_classifier
            .timeout_secs
            .unwrap_or(d.text_timeout.as_secs());
        if timeout_secs == 0 {
            return Err(Error::Config(
                "text_classifier.timeout_secs must be greater than zero".to_string(),
            ));
        }

        let api_token = non_blank(env_value(ENV_HF_TOKEN))
            .or_else(|| non_blank(toml.text_classifier.api_token));

        let text_classifier = TextClassifierSettings {
            endpoint: env_value(ENV_TEXT_ENDPOINT)
                .or(toml.text_classifier.endpoint)
                .unwrap_or_else(|| d.text_endpoint.clone()),
            timeout: Duration::from_secs(timeout_secs),
            api_token,
        };

        let model_path = self
            .cli
            .model_path
            .clone()
            .or_else(|| env_value(ENV_MODEL_PATH).map(PathBuf::from))
            .or(toml.model.path);

        let source = match model_path {
            Some(path) => ModelSource::LocalPath(path),
            None => ModelSource::Hub {
                hub_url: toml.model.hub_url.unwrap_or_else(|| d.hub_url.clone()),
                repo: toml.model.repo.unwrap_or_else(|| d.model_repo.clone()),
                revision: toml
                    .model
                    .revision
                    .unwrap_or_else(|| d.model_revision.clone()),
                file: toml.model.file.unwrap_or_else(|| d.model_file.clone()),
                cache_dir: toml
                    .model
                    .cache_dir
                    .unwrap_or_else(|| d.model_cache_dir.clone()),
            },
        };

        let input_size = toml.model.input_size.unwrap_or(d.input_size);
        if input_size == 0 {
            return Err(Error::Config(
                "model.input_size must be greater than zero".to_string(),
            ));
        }

        let download_secs = toml
            .model
            .download_timeout_secs
            .unwrap_or(d.download_timeout.as_secs());
        if download_secs == 0 {
            return Err(Error::Config(
                "model.download_timeout_secs must be greater than zero".to_string(),
            ));
        }

        Ok(ServiceConfig {
            bind_address,
            cors_allowed_origins,
            log_level,
            text_classifier,
            model: ModelSettings {
                source,
                input_size,
                download_timeout: Duration::from_secs(download_secs),
            },
            config_file,
        })
    }
}

impl ServiceConfig {
    /// Report where the configuration came from
    ///
    /// Call after the tracing subscriber is installed.
    pub fn log_summary(&self) {
        match &self.config_file {
            Some(path) => info!("Loaded config file: {}", path.display()),
            None => warn!("No config file found, using defaults"),
        }
        debug!(config = ?self, "Resolved service configuration");
    }
}
