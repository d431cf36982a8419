//! Configuration loading, validation, and management for Confidant.
//!
//! Loads configuration from `~/.confidant/config.toml` (or an explicit path)
//! with environment variable overrides. Validates all settings at startup.

use confidant_core::knowledge::{DEFAULT_KNOWLEDGE_DIR, DEFAULT_KNOWLEDGE_EXTENSION};
use confidant_core::message::DEFAULT_HISTORY_WINDOW;
use confidant_core::provider::GenerationConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.confidant/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Which model to load and how
    #[serde(default)]
    pub model: ModelConfig,

    /// Initial values of the generation sliders
    #[serde(default)]
    pub generation: GenerationDefaults,

    /// Conversation settings
    #[serde(default)]
    pub conversation: ConversationConfig,

    /// Knowledge file scanning
    #[serde(default)]
    pub knowledge: KnowledgeConfig,

    /// Web widget server
    #[serde(default)]
    pub gateway: GatewayConfig,
}

fn default_true() -> bool {
    true
}

/// Model construction parameters.
///
/// `preset` is either a known alias (`mistral-7b`, `tinyllama`, ...) or a path
/// to a local `.gguf` file. `repo`, `file` and `tokenizer_repo` override the
/// preset's values when set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_preset")]
    pub preset: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokenizer_repo: Option<String>,

    #[serde(default = "default_model_type")]
    pub model_type: String,

    /// Never offload layers to a GPU
    #[serde(default = "default_true")]
    pub cpu_only: bool,

    #[serde(default = "default_threads")]
    pub threads: usize,

    #[serde(default = "default_context_length")]
    pub context_length: usize,

    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Sampling seed
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_preset() -> String {
    "mistral-7b".into()
}
fn default_model_type() -> String {
    "mistral".into()
}
fn default_threads() -> usize {
    8
}
fn default_context_length() -> usize {
    4096
}
fn default_batch_size() -> usize {
    1
}
fn default_seed() -> u64 {
    42
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            preset: default_preset(),
            repo: None,
            file: None,
            tokenizer_repo: None,
            model_type: default_model_type(),
            cpu_only: true,
            threads: default_threads(),
            context_length: default_context_length(),
            batch_size: default_batch_size(),
            seed: default_seed(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationDefaults {
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    512
}

impl Default for GenerationDefaults {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl GenerationDefaults {
    /// Validated slider values.
    pub fn to_generation_config(&self) -> Result<GenerationConfig, ConfigError> {
        GenerationConfig::new(self.temperature, self.max_tokens)
            .map_err(|e| ConfigError::ValidationError(format!("generation: {e}")))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    /// How many trailing turns are sent to the model
    #[serde(default = "default_history_window")]
    pub history_window: usize,
}

fn default_history_window() -> usize {
    DEFAULT_HISTORY_WINDOW
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            history_window: default_history_window(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    #[serde(default = "default_knowledge_dir")]
    pub directory: PathBuf,

    #[serde(default = "default_knowledge_extension")]
    pub extension: String,
}

fn default_knowledge_dir() -> PathBuf {
    PathBuf::from(DEFAULT_KNOWLEDGE_DIR)
}
fn default_knowledge_extension() -> String {
    DEFAULT_KNOWLEDGE_EXTENSION.into()
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            directory: default_knowledge_dir(),
            extension: default_knowledge_extension(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    5006
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `path`, or the default path
    /// (`~/.confidant/config.toml`) when `None`.
    ///
    /// Environment variables override file values:
    /// - `CONFIDANT_MODEL`: model preset or `.gguf` path
    /// - `CONFIDANT_KNOWLEDGE_DIR`: knowledge directory
    /// - `CONFIDANT_PORT`: gateway port
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let default_path = Self::default_path();
        let mut config = Self::load_from(path.unwrap_or(&default_path))?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from an environment lookup.
    fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(model) = lookup("CONFIDANT_MODEL") {
            self.model.preset = model;
        }

        if let Some(dir) = lookup("CONFIDANT_KNOWLEDGE_DIR") {
            self.knowledge.directory = PathBuf::from(dir);
        }

        if let Some(port) = lookup("CONFIDANT_PORT") {
            self.gateway.port = port.parse().map_err(|_| {
                ConfigError::ValidationError(format!("CONFIDANT_PORT is not a valid port: {port}"))
            })?;
        }

        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".confidant")
    }

    /// `~/.confidant/config.toml`.
    pub fn default_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        self.generation.to_generation_config()?;

        if self.conversation.history_window == 0 {
            return Err(ConfigError::ValidationError(
                "conversation.history_window must be at least 1".into(),
            ));
        }

        if self.model.threads == 0 || self.model.batch_size == 0 {
            return Err(ConfigError::ValidationError(
                "model.threads and model.batch_size must be at least 1".into(),
            ));
        }

        if self.model.context_length < 256 {
            return Err(ConfigError::ValidationError(
                "model.context_length must be at least 256".into(),
            ));
        }

        if self.knowledge.extension.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "knowledge.extension must not be empty".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
