//! Local inference: runs GGUF-quantized language models on your own hardware.
//!
//! Uses [Candle](https://github.com/huggingface/candle) (Rust-native ML) to run
//! quantized Llama-architecture models (Mistral, TinyLlama, Llama 2, Zephyr)
//! with no API keys. Weights and tokenizers are fetched once from the
//! HuggingFace Hub and cached.
//!
//! # Example
//! ```bash
//! confidant chat --load
//! CONFIDANT_MODEL=tinyllama confidant serve
//! CONFIDANT_MODEL=/path/to/model.gguf confidant chat
//! ```

use crate::earliest_stop;
use crate::presets::{ModelSource, ModelSpec};
use candle_core::quantized::gguf_file;
use candle_core::{DType, Device, Tensor};
use candle_transformers::generation::{LogitsProcessor, Sampling};
use candle_transformers::models::quantized_llama as qlm;
use candle_transformers::utils::apply_repeat_penalty;
use confidant_core::error::ProviderError;
use confidant_core::provider::{ModelLoader, SamplingParams, TextGenerator};
use hf_hub::api::sync::Api;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokenizers::Tokenizer;
use tracing::{debug, info, warn};

/// How many trailing tokens the repetition penalty looks at.
const REPEAT_LAST_N: usize = 64;

/// Loads a [`LocalModel`] from a resolved [`ModelSpec`].
pub struct LocalModelLoader {
    spec: ModelSpec,
}

impl LocalModelLoader {
    pub fn new(spec: ModelSpec) -> Self {
        Self { spec }
    }
}

impl ModelLoader for LocalModelLoader {
    fn describe(&self) -> String {
        self.spec.describe()
    }

    fn load(&self) -> Result<Arc<dyn TextGenerator>, ProviderError> {
        let model: Arc<dyn TextGenerator> = Arc::new(LocalModel::load(&self.spec)?);
        Ok(model)
    }
}

/// A GGUF model held in memory.
///
/// Thread-safe: the weights (and their KV cache) sit behind a Mutex because
/// Candle inference mutates the cache on every forward pass.
pub struct LocalModel {
    state: Mutex<LocalModelState>,
    context_length: usize,
    seed: u64,
}

/// The loaded model state (tokenizer + weights).
struct LocalModelState {
    model: qlm::ModelWeights,
    tokenizer: Tokenizer,
    device: Device,
    eos_token_id: u32,
}

impl LocalModel {
    /// Download (if needed) and load the weights. Takes minutes for 7B models.
    pub fn load(spec: &ModelSpec) -> Result<Self, ProviderError> {
        let device = if spec.cpu_only {
            Device::Cpu
        } else {
            Device::cuda_if_available(0).map_err(map_candle_err)?
        };

        let pool_threads = candle_core::utils::get_num_threads();
        if pool_threads != spec.threads {
            warn!(
                configured = spec.threads,
                available = pool_threads,
                "Candle thread pool differs from the configured thread count; \
                 set RAYON_NUM_THREADS to match"
            );
        }

        info!(
            model = %spec.describe(),
            batch_size = spec.batch_size,
            "Downloading/loading local model"
        );

        let (model_path, tokenizer_path) = fetch_files(&spec.source)?;

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| ProviderError::LoadFailed(format!("Failed to load tokenizer: {e}")))?;

        let mut file = std::fs::File::open(&model_path)
            .map_err(|e| ProviderError::LoadFailed(format!("Failed to open model file: {e}")))?;

        let gguf = gguf_file::Content::read(&mut file)
            .map_err(|e| ProviderError::LoadFailed(format!("Failed to parse GGUF file: {e}")))?;

        let model = qlm::ModelWeights::from_gguf(gguf, &mut file, &device)
            .map_err(|e| ProviderError::LoadFailed(format!("Failed to load model weights: {e}")))?;

        let eos_token_id = tokenizer
            .token_to_id("</s>")
            .or_else(|| tokenizer.token_to_id("<|endoftext|>"))
            .or_else(|| tokenizer.token_to_id("<|eot_id|>"))
            .unwrap_or(2); // fallback to common EOS id

        info!(eos_token_id, "Local model loaded successfully");

        Ok(Self {
            state: Mutex::new(LocalModelState {
                model,
                tokenizer,
                device,
                eos_token_id,
            }),
            context_length: spec.context_length,
            seed: spec.seed,
        })
    }
}

/// Resolve the GGUF weights and `tokenizer.json` to local paths.
fn fetch_files(source: &ModelSource) -> Result<(PathBuf, PathBuf), ProviderError> {
    match source {
        ModelSource::Hub {
            repo,
            gguf_file,
            tokenizer_repo,
        } => {
            let api = Api::new().map_err(|e| {
                ProviderError::Network(format!("Failed to initialize HuggingFace Hub API: {e}"))
            })?;

            let model_path = api.model(repo.clone()).get(gguf_file).map_err(|e| {
                ProviderError::Network(format!(
                    "Failed to download model '{gguf_file}' from '{repo}': {e}"
                ))
            })?;
            info!(path = %model_path.display(), "Model file ready");

            let tokenizer_path = download_tokenizer(&api, tokenizer_repo)?;
            Ok((model_path, tokenizer_path))
        }
        ModelSource::File {
            path,
            tokenizer_repo,
        } => {
            if !path.exists() {
                return Err(ProviderError::ModelNotFound(format!(
                    "GGUF file not found: {}",
                    path.display()
                )));
            }

            let tokenizer_path = match tokenizer_repo {
                Some(repo) => {
                    let api = Api::new().map_err(|e| {
                        ProviderError::Network(format!("HuggingFace Hub API error: {e}"))
                    })?;
                    download_tokenizer(&api, repo)?
                }
                None => sibling_tokenizer(path)?,
            };
            Ok((path.clone(), tokenizer_path))
        }
    }
}

fn download_tokenizer(api: &Api, repo: &str) -> Result<PathBuf, ProviderError> {
    api.model(repo.to_string())
        .get("tokenizer.json")
        .map_err(|e| ProviderError::Network(format!("Failed to download tokenizer from '{repo}': {e}")))
}

fn sibling_tokenizer(path: &Path) -> Result<PathBuf, ProviderError> {
    let tokenizer_path = path.with_file_name("tokenizer.json");
    if tokenizer_path.exists() {
        Ok(tokenizer_path)
    } else {
        Err(ProviderError::NotConfigured(format!(
            "No tokenizer.json next to {}; set model.tokenizer_repo",
            path.display()
        )))
    }
}

impl TextGenerator for LocalModel {
    fn generate(&self, prompt: &str, params: &SamplingParams) -> Result<String, ProviderError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.generate(prompt, params, self.context_length, self.seed)
    }
}

impl LocalModelState {
    /// Run inference: tokenize → generate tokens → decode.
    fn generate(
        &mut self,
        prompt: &str,
        params: &SamplingParams,
        context_length: usize,
        seed: u64,
    ) -> Result<String, ProviderError> {
        let encoding = self
            .tokenizer
            .encode(prompt, true)
            .map_err(|e| ProviderError::Inference(format!("Tokenization failed: {e}")))?;
        let prompt_tokens = encoding.get_ids().to_vec();

        if prompt_tokens.len() >= context_length {
            return Err(ProviderError::ContextOverflow {
                prompt_tokens: prompt_tokens.len(),
                context_length,
            });
        }
        let max_new = (params.max_new_tokens as usize).min(context_length - prompt_tokens.len());

        debug!(
            prompt_tokens = prompt_tokens.len(),
            max_new,
            temperature = params.temperature,
            "Starting local generation"
        );

        let sampling = if params.temperature <= 0.0 {
            Sampling::ArgMax
        } else {
            Sampling::TopKThenTopP {
                k: params.top_k,
                p: params.top_p,
                temperature: params.temperature as f64,
            }
        };
        let mut logits_processor = LogitsProcessor::from_sampling(seed, sampling);

        let mut context = prompt_tokens.clone();
        let mut generated: Vec<u32> = Vec::new();
        let mut input = prompt_tokens;
        let mut index_pos = 0;
        let mut text = String::new();

        for _ in 0..max_new {
            let input_tensor = Tensor::new(input.as_slice(), &self.device)
                .map_err(map_candle_err)?
                .unsqueeze(0)
                .map_err(map_candle_err)?;

            let logits = self
                .model
                .forward(&input_tensor, index_pos)
                .map_err(map_candle_err)?;
            index_pos += input.len();

            // (1, vocab) → (vocab)
            let logits = logits
                .squeeze(0)
                .map_err(map_candle_err)?
                .to_dtype(DType::F32)
                .map_err(map_candle_err)?;

            let logits = if (params.repetition_penalty - 1.0).abs() < f32::EPSILON {
                logits
            } else {
                let start = context.len().saturating_sub(REPEAT_LAST_N);
                apply_repeat_penalty(&logits, params.repetition_penalty, &context[start..])
                    .map_err(map_candle_err)?
            };

            let next_token = logits_processor.sample(&logits).map_err(map_candle_err)?;
            if next_token == self.eos_token_id {
                break;
            }

            context.push(next_token);
            generated.push(next_token);

            text = self
                .tokenizer
                .decode(&generated, true)
                .map_err(|e| ProviderError::Inference(format!("Detokenization failed: {e}")))?;

            if let Some(cut) = earliest_stop(&text, &params.stop) {
                text.truncate(cut);
                break;
            }

            input = vec![next_token];
        }

        debug!(
            completion_tokens = generated.len(),
            output_len = text.len(),
            "Generation complete"
        );

        Ok(text)
    }
}

/// Map Candle errors to ProviderError.
fn map_candle_err(e: candle_core::Error) -> ProviderError {
    ProviderError::Inference(format!("Candle inference error: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_gguf_file_is_model_not_found() {
        let source = ModelSource::File {
            path: PathBuf::from("/nonexistent/model.gguf"),
            tokenizer_repo: None,
        };
        assert!(matches!(
            fetch_files(&source),
            Err(ProviderError::ModelNotFound(_))
        ));
    }

    #[test]
    fn missing_sibling_tokenizer_is_not_configured() {
        let err = sibling_tokenizer(Path::new("/nonexistent/model.gguf")).unwrap_err();
        assert!(matches!(err, ProviderError::NotConfigured(_)));
        assert!(err.to_string().contains("tokenizer_repo"));
    }
}
