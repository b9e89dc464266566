//! Layered configuration: defaults, then the first config file found, then
//! `SKILLMESH_*` environment variables.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info, warn};

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },
}

impl ConfigError {
    fn invalid(key: &str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub executor: ExecutorConfig,
    pub router: RouterConfig,
    pub complexity: ComplexityConfig,
    pub logging: LoggingSettings,
}

impl CoreConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.executor.default_timeout_ms == 0 {
            return Err(ConfigError::invalid(
                "executor.default_timeout_ms",
                "must be greater than zero",
            ));
        }
        if self.executor.max_concurrency == Some(0) {
            return Err(ConfigError::invalid(
                "executor.max_concurrency",
                "must be greater than zero when set",
            ));
        }
        if self.router.default_skill.trim().is_empty() {
            return Err(ConfigError::invalid("router.default_skill", "must not be empty"));
        }
        if !(0.0..=1.0).contains(&self.router.default_confidence) {
            return Err(ConfigError::invalid(
                "router.default_confidence",
                "must be within 0.0..=1.0",
            ));
        }
        if self.complexity.batch_chunk_size == 0 {
            return Err(ConfigError::invalid(
                "complexity.batch_chunk_size",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    pub default_timeout_ms: u64,
    /// Cap on concurrently running invocations in a batch; unbounded when unset
    pub max_concurrency: Option<usize>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: 30_000,
            max_concurrency: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    pub default_skill: String,
    pub default_confidence: f64,
    /// Inputs with more words than this are de-weighted
    pub long_text_words: usize,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            default_skill: "general_inquiry".to_string(),
            default_confidence: 0.5,
            long_text_words: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplexityConfig {
    pub batch_chunk_size: usize,
    pub slow_execution_ms: u64,
    pub cyclomatic_threshold: u32,
    pub cognitive_threshold: u32,
    pub dependency_threshold: u32,
    pub async_op_threshold: u32,
    pub external_call_threshold: u32,
    pub execution_time_threshold_ms: u64,
}

impl Default for ComplexityConfig {
    fn default() -> Self {
        Self {
            batch_chunk_size: 10,
            slow_execution_ms: 5_000,
            cyclomatic_threshold: 10,
            cognitive_threshold: 15,
            dependency_threshold: 5,
            async_op_threshold: 3,
            external_call_threshold: 2,
            execution_time_threshold_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

pub struct ConfigLoader {
    config_paths: Vec<PathBuf>,
    env_prefix: String,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            config_paths: Self::default_config_paths(),
            env_prefix: "SKILLMESH_".to_string(),
        }
    }

    /// Check this path before the defaults
    pub fn with_path(mut self, path: PathBuf) -> Self {
        self.config_paths.insert(0, path);
        self
    }

    /// Only consult the given paths
    pub fn with_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.config_paths = paths;
        self
    }

    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    fn default_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from(".skillmeshrc.toml"),
            PathBuf::from("skillmesh.toml"),
            PathBuf::from("skillmesh.json"),
        ];

        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".config").join("skillmesh").join("config.toml"));
        }

        paths
    }

    pub async fn load(&self) -> Result<CoreConfig> {
        let mut config = CoreConfig::default();

        for path in &self.config_paths {
            if !path.exists() {
                continue;
            }
            match self.load_file(path).await {
                Ok(file_config) => {
                    info!("Loaded configuration from: {}", path.display());
                    config = file_config;
                    break;
                }
                Err(e) => {
                    warn!("Failed to load config from {}: {:#}", path.display(), e);
                }
            }
        }

        let config = self.apply_env_overrides(config)?;
        config.validate()?;
        debug!(?config, "Configuration resolved");
        Ok(config)
    }

    pub async fn load_file(&self, path: &Path) -> Result<CoreConfig> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        match extension {
            "toml" | "" => toml::from_str(&content).context("Failed to parse TOML config"),
            "json" => serde_json::from_str(&content).context("Failed to parse JSON config"),
            _ => toml::from_str(&content)
                .or_else(|_| serde_json::from_str(&content))
                .context("Failed to parse config file"),
        }
    }

    fn var(&self, name: &str) -> Option<String> {
        env::var(format!("{}{}", self.env_prefix, name)).ok()
    }

    pub fn apply_env_overrides(&self, mut config: CoreConfig) -> Result<CoreConfig> {
        if let Some(timeout) = self.var("DEFAULT_TIMEOUT_MS") {
            config.executor.default_timeout_ms = timeout.trim().parse().map_err(|_| {
                ConfigError::invalid("DEFAULT_TIMEOUT_MS", format!("not a number: {timeout}"))
            })?;
        }

        if let Some(limit) = self.var("MAX_CONCURRENCY") {
            config.executor.max_concurrency = match limit.trim() {
                "" | "none" | "unbounded" => None,
                value => Some(value.parse().map_err(|_| {
                    ConfigError::invalid("MAX_CONCURRENCY", format!("not a number: {limit}"))
                })?),
            };
        }

        if let Some(skill) = self.var("DEFAULT_SKILL") {
            config.router.default_skill = skill;
        }

        if let Some(level) = self.var("LOG_LEVEL") {
            config.logging.level = level;
        }

        if let Some(json) = self.var("LOG_JSON") {
            config.logging.json = matches!(json.to_lowercase().as_str(), "1" | "true" | "yes");
        }

        Ok(config)
    }

    pub async fn save_config(&self, config: &CoreConfig, path: &Path) -> Result<()> {
        let content = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::to_string_pretty(config)?,
            _ => toml::to_string_pretty(config)?,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        fs::write(path, content).await?;
        info!("Configuration saved to: {}", path.display());
        Ok(())
    }
}
