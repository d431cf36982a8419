//! Model presets: friendly aliases that resolve to HuggingFace repos + filenames.
//!
//! Resolution never touches the network, so it is available with or without
//! the `local` feature (the `status` command uses it to show what would load).

use confidant_config::ModelConfig;
use confidant_core::error::ProviderError;
use std::path::{Path, PathBuf};

/// A known GGUF model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelPreset {
    pub repo: &'static str,
    pub gguf_file: &'static str,
    pub tokenizer_repo: &'static str,
    pub model_type: &'static str,
}

/// Aliases accepted by [`resolve_preset`], for help output.
pub const PRESET_NAMES: &[&str] = &["mistral-7b", "tinyllama", "llama2-7b", "zephyr-7b"];

pub fn resolve_preset(alias: &str) -> Option<ModelPreset> {
    match alias.to_lowercase().as_str() {
        "mistral-7b" | "mistral" | "mistral-7b-instruct" => Some(ModelPreset {
            repo: "TheBloke/Mistral-7B-Instruct-v0.1-GGUF",
            gguf_file: "mistral-7b-instruct-v0.1.Q4_K_M.gguf",
            tokenizer_repo: "mistralai/Mistral-7B-Instruct-v0.1",
            model_type: "mistral",
        }),
        "tinyllama" | "tiny-llama" | "tinyllama-1.1b" => Some(ModelPreset {
            repo: "TheBloke/TinyLlama-1.1B-Chat-v1.0-GGUF",
            gguf_file: "tinyllama-1.1b-chat-v1.0.Q4_K_M.gguf",
            tokenizer_repo: "TinyLlama/TinyLlama-1.1B-Chat-v1.0",
            model_type: "llama",
        }),
        "llama2-7b" | "llama-2-7b" | "llama2" => Some(ModelPreset {
            repo: "TheBloke/Llama-2-7B-Chat-GGUF",
            gguf_file: "llama-2-7b-chat.Q4_K_M.gguf",
            tokenizer_repo: "hf-internal-testing/llama-tokenizer",
            model_type: "llama",
        }),
        "zephyr-7b" | "zephyr" => Some(ModelPreset {
            repo: "TheBloke/zephyr-7B-beta-GGUF",
            gguf_file: "zephyr-7b-beta.Q4_K_M.gguf",
            tokenizer_repo: "HuggingFaceH4/zephyr-7b-beta",
            model_type: "mistral",
        }),
        _ => None,
    }
}

/// Where the weights come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    /// Downloaded (and cached) from the HuggingFace Hub
    Hub {
        repo: String,
        gguf_file: String,
        tokenizer_repo: String,
    },
    /// A GGUF file on disk; the tokenizer is `tokenizer.json` next to it
    /// unless `tokenizer_repo` is set.
    File {
        path: PathBuf,
        tokenizer_repo: Option<String>,
    },
}

/// Fully resolved construction parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    pub source: ModelSource,
    pub model_type: String,
    pub cpu_only: bool,
    pub threads: usize,
    pub context_length: usize,
    pub batch_size: usize,
    pub seed: u64,
}

impl ModelSpec {
    /// Resolve a configured preset, path, or explicit repo/file triple.
    pub fn from_config(config: &ModelConfig) -> Result<Self, ProviderError> {
        let source = if config.preset.ends_with(".gguf") {
            ModelSource::File {
                path: PathBuf::from(&config.preset),
                tokenizer_repo: config.tokenizer_repo.clone(),
            }
        } else if let Some(preset) = resolve_preset(&config.preset) {
            ModelSource::Hub {
                repo: config.repo.clone().unwrap_or_else(|| preset.repo.into()),
                gguf_file: config.file.clone().unwrap_or_else(|| preset.gguf_file.into()),
                tokenizer_repo: config
                    .tokenizer_repo
                    .clone()
                    .unwrap_or_else(|| preset.tokenizer_repo.into()),
            }
        } else {
            match (&config.repo, &config.file, &config.tokenizer_repo) {
                (Some(repo), Some(file), Some(tokenizer_repo)) => ModelSource::Hub {
                    repo: repo.clone(),
                    gguf_file: file.clone(),
                    tokenizer_repo: tokenizer_repo.clone(),
                },
                _ => {
                    return Err(ProviderError::ModelNotFound(format!(
                        "Unknown model '{}'. Available presets: {}. \
                         Or provide a path to a .gguf file, or set repo, file and tokenizer_repo.",
                        config.preset,
                        PRESET_NAMES.join(", ")
                    )));
                }
            }
        };

        Ok(Self {
            source,
            model_type: config.model_type.clone(),
            cpu_only: config.cpu_only,
            threads: config.threads,
            context_length: config.context_length,
            batch_size: config.batch_size,
            seed: config.seed,
        })
    }

    /// One-line human description.
    pub fn describe(&self) -> String {
        let weights = match &self.source {
            ModelSource::Hub {
                repo, gguf_file, ..
            } => format!("{gguf_file} from {repo}"),
            ModelSource::File { path, .. } => path.display().to_string(),
        };
        format!(
            "{weights} ({}, {}, {} threads, context {})",
            self.model_type,
            if self.cpu_only { "CPU only" } else { "GPU if available" },
            self.threads,
            self.context_length
        )
    }

    /// Local GGUF path, when the source is a file.
    pub fn local_path(&self) -> Option<&Path> {
        match &self.source {
            ModelSource::File { path, .. } => Some(path),
            ModelSource::Hub { .. } => None,
        }
    }
}
