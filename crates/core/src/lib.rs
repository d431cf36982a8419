//! # Confidant Core
//!
//! Domain types, traits, and error definitions for the Confidant personal
//! assistant. Beyond serde, thiserror and tracing it only pulls in tokio's `sync`
//! channels and async-trait for the [`Channel`] trait; no web, inference or
//! storage crates. The provider, assistant and surface crates build on it.
//!
//! ## Design Philosophy
//!
//! The model backend and the chat surfaces are external collaborators, so they
//! are defined as traits here (`ModelLoader`, `TextGenerator`, `Channel`).
//! Implementations live in their respective crates. This enables:
//! - Running the assistant against a real GGUF model or a scripted stub
//! - Easy testing without downloading gigabytes of weights
//! - Clean dependency graph (all crates depend inward on core)

pub mod channel;
pub mod error;
pub mod knowledge;
pub mod message;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use channel::{Channel, ChannelId, Submission, SubmissionStream};
pub use error::{Error, Result};
pub use knowledge::{KnowledgeFiles, KnowledgeStore, PersonalKnowledge};
pub use message::{ConversationHistory, ConversationTurn, Role};
pub use provider::{GenerationConfig, ModelLoader, SamplingParams, TextGenerator};
