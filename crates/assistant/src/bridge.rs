//! Runs blocking inference off the async runtime.
//!
//! A generation is handed to a `spawn_blocking` worker and its result comes
//! back through a oneshot channel. At most one generation per session is in
//! flight; [`GenerationBridge::try_acquire`] enforces that.

use confidant_core::provider::{SamplingParams, TextGenerator};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Reply when the bridge is asked to generate without a model.
pub const ENGINE_NOT_LOADED: &str = "AI engine not loaded. Type /load to initialize.";

/// Prefix of every generation failure reply.
pub const GENERATION_ERROR_PREFIX: &str = "⚠️ Error generating response: ";

#[derive(Debug, Clone, Default)]
pub struct GenerationBridge {
    in_flight: Arc<AtomicBool>,
}

/// Releases the in-flight slot when dropped.
#[derive(Debug)]
pub struct InFlightGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

impl GenerationBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the in-flight slot, or `None` if a generation is running.
    pub fn try_acquire(&self) -> Option<InFlightGuard> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard {
                flag: Arc::clone(&self.in_flight),
            })
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Generate a reply for `prompt`. Never fails: errors become reply text.
    pub async fn generate(
        &self,
        generator: Option<Arc<dyn TextGenerator>>,
        prompt: String,
        params: SamplingParams,
    ) -> String {
        let Some(generator) = generator else {
            return ENGINE_NOT_LOADED.to_string();
        };

        debug!(
            prompt_chars = prompt.len(),
            max_new_tokens = params.max_new_tokens,
            temperature = params.temperature,
            "Dispatching generation"
        );

        let (tx, rx) = oneshot::channel();
        tokio::task::spawn_blocking(move || {
            let result = generator.generate(&prompt, &params);
            // The receiver is gone only if the caller was cancelled
            let _ = tx.send(result);
        });

        match rx.await {
            Ok(Ok(raw)) => clean_response(&raw),
            Ok(Err(e)) => {
                warn!(error = %e, "Generation failed");
                format!("{GENERATION_ERROR_PREFIX}{e}")
            }
            Err(_) => {
                warn!("Generation worker stopped without a result");
                format!("{GENERATION_ERROR_PREFIX}generation worker stopped unexpectedly")
            }
        }
    }
}

/// Keep the text after the last `Assistant:` and before any `[INSTRUCTION]`.
pub fn clean_response(raw: &str) -> String {
    let tail = raw.rsplit("Assistant:").next().unwrap_or(raw).trim();
    tail.split("[INSTRUCTION]").next().unwrap_or(tail).trim().to_string()
}
