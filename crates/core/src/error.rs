//! Error types for the Confidant domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use std::path::PathBuf;
use thiserror::Error;

/// The top-level error type for all Confidant operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Knowledge errors ---
    #[error("Knowledge error: {0}")]
    Knowledge(#[from] KnowledgeError),

    // --- Channel errors ---
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    // --- Settings errors ---
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Errors raised while loading a model or running inference.
///
/// `Clone` so a load failure can be kept in the model state and shown again.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to load model: {0}")]
    LoadFailed(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Prompt of {prompt_tokens} tokens does not fit the {context_length}-token context window")]
    ContextOverflow {
        prompt_tokens: usize,
        context_length: usize,
    },
}

#[derive(Debug, Error)]
pub enum KnowledgeError {
    #[error("Failed to read knowledge directory {path}: {reason}")]
    ReadDir { path: PathBuf, reason: String },
}

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("Channel not configured: {0}")]
    NotConfigured(String),

    #[error("Message delivery failed to {channel}: {reason}")]
    DeliveryFailed { channel: String, reason: String },

    #[error("Channel connection lost: {0}")]
    ConnectionLost(String),
}

/// Rejected values for the user-adjustable generation settings.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SettingsError {
    #[error("temperature must be between {min} and {max}, got {value}")]
    Temperature { value: f32, min: f32, max: f32 },

    #[error("max_tokens must be between {min} and {max}, got {value}")]
    MaxTokens { value: u32, min: u32, max: u32 },
}
