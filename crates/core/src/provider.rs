//! Model traits: the abstraction over the inference backend.
//!
//! Loading a model is slow (download + weights) and generation is CPU-bound,
//! so both traits are **blocking**. Callers run them on a
//! blocking worker (`tokio::task::spawn_blocking`), never on the async runtime.
//!
//! Implementations: local GGUF via Candle (`confidant-providers`), scripted
//! stubs in tests.

use crate::error::{ProviderError, SettingsError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Lower bound of the creativity slider.
pub const MIN_TEMPERATURE: f32 = 0.1;
/// Upper bound of the creativity slider.
pub const MAX_TEMPERATURE: f32 = 1.5;
/// Lower bound of the response length slider.
pub const MIN_MAX_TOKENS: u32 = 64;
/// Upper bound of the response length slider.
pub const MAX_MAX_TOKENS: u32 = 2048;

/// Fixed sampling knobs that are not user-adjustable.
pub const TOP_K: usize = 40;
pub const TOP_P: f64 = 0.9;
pub const REPETITION_PENALTY: f32 = 1.15;
pub const STOP_SEQUENCES: [&str; 2] = ["User:", "Assistant:"];

/// The user-adjustable generation settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    temperature: f32,
    max_tokens: u32,
}

impl GenerationConfig {
    /// Validated constructor.
    pub fn new(temperature: f32, max_tokens: u32) -> Result<Self, SettingsError> {
        let mut config = Self::default();
        config.set_temperature(temperature)?;
        config.set_max_tokens(max_tokens)?;
        Ok(config)
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    pub fn set_temperature(&mut self, value: f32) -> Result<(), SettingsError> {
        if !(MIN_TEMPERATURE..=MAX_TEMPERATURE).contains(&value) {
            return Err(SettingsError::Temperature {
                value,
                min: MIN_TEMPERATURE,
                max: MAX_TEMPERATURE,
            });
        }
        self.temperature = value;
        Ok(())
    }

    pub fn set_max_tokens(&mut self, value: u32) -> Result<(), SettingsError> {
        if !(MIN_MAX_TOKENS..=MAX_MAX_TOKENS).contains(&value) {
            return Err(SettingsError::MaxTokens {
                value,
                min: MIN_MAX_TOKENS,
                max: MAX_MAX_TOKENS,
            });
        }
        self.max_tokens = value;
        Ok(())
    }

    /// Snapshot into the full parameter set for one inference call.
    pub fn sampling(&self) -> SamplingParams {
        SamplingParams {
            temperature: self.temperature,
            max_new_tokens: self.max_tokens,
            top_k: TOP_K,
            top_p: TOP_P,
            repetition_penalty: REPETITION_PENALTY,
            stop: STOP_SEQUENCES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 512,
        }
    }
}

/// Everything the generator needs to sample a completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingParams {
    pub temperature: f32,
    pub max_new_tokens: u32,
    pub top_k: usize,
    pub top_p: f64,
    pub repetition_penalty: f32,
    /// Generation stops as soon as the output contains any of these
    pub stop: Vec<String>,
}

impl Default for SamplingParams {
    fn default() -> Self {
        GenerationConfig::default().sampling()
    }
}

/// A loaded model that turns a prompt into text.
pub trait TextGenerator: Send + Sync {
    /// Run one full (non-streamed) completion. Blocks the calling thread.
    fn generate(&self, prompt: &str, params: &SamplingParams) -> Result<String, ProviderError>;
}

/// Builds a [`TextGenerator`]. May download weights and take minutes.
pub trait ModelLoader: Send + Sync {
    /// A human-readable description of what will be loaded (for status output).
    fn describe(&self) -> String;

    /// Load the model. Blocks the calling thread.
    fn load(&self) -> Result<Arc<dyn TextGenerator>, ProviderError>;
}
