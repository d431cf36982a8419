//! Model loaders for Confidant.
//!
//! All loaders implement `confidant_core::ModelLoader`. [`build_loader`]
//! picks the right one from configuration: the Candle-backed local model when
//! the `local` feature is enabled, otherwise a loader that explains how to
//! enable it. Either way a failure surfaces at `/load` time, never at startup.

#[cfg(feature = "local")]
pub mod local;
pub mod presets;

#[cfg(feature = "local")]
pub use local::{LocalModel, LocalModelLoader};
pub use presets::{ModelSource, ModelSpec, resolve_preset};

use confidant_config::AppConfig;
use confidant_core::error::ProviderError;
use confidant_core::provider::{ModelLoader, TextGenerator};
use std::sync::Arc;

/// Build the model loader described by `config`.
pub fn build_loader(config: &AppConfig) -> Arc<dyn ModelLoader> {
    let spec = match ModelSpec::from_config(&config.model) {
        Ok(spec) => spec,
        Err(e) => {
            tracing::warn!(error = %e, "Model configuration cannot be resolved");
            return Arc::new(FailingLoader {
                description: config.model.preset.clone(),
                error: e,
            });
        }
    };

    #[cfg(feature = "local")]
    {
        Arc::new(LocalModelLoader::new(spec))
    }

    #[cfg(not(feature = "local"))]
    {
        Arc::new(FailingLoader {
            description: spec.describe(),
            error: ProviderError::NotConfigured(
                "this build has no local inference support; rebuild with `--features local`"
                    .into(),
            ),
        })
    }
}

/// A loader that always fails with the same error.
pub struct FailingLoader {
    description: String,
    error: ProviderError,
}

impl FailingLoader {
    pub fn new(description: impl Into<String>, error: ProviderError) -> Self {
        Self {
            description: description.into(),
            error,
        }
    }
}

impl ModelLoader for FailingLoader {
    fn describe(&self) -> String {
        self.description.clone()
    }

    fn load(&self) -> Result<Arc<dyn TextGenerator>, ProviderError> {
        Err(self.error.clone())
    }
}

/// Byte offset of the first stop sequence found in `text`, if any.
pub fn earliest_stop(text: &str, stops: &[String]) -> Option<usize> {
    stops
        .iter()
        .filter(|s| !s.is_empty())
        .filter_map(|s| text.find(s.as_str()))
        .min()
}

#[cfg(test)]
mod tests {
    use super::*;
    use confidant_config::ModelConfig;

    fn stops() -> Vec<String> {
        vec!["User:".into(), "Assistant:".into()]
    }

    #[test]
    fn earliest_stop_picks_first_occurrence() {
        let text = "Sure thing.\nAssistant: again\nUser: more";
        assert_eq!(earliest_stop(text, &stops()), Some(12));
    }

    #[test]
    fn earliest_stop_none_without_marker() {
        assert_eq!(earliest_stop("plain answer", &stops()), None);
        assert_eq!(earliest_stop("anything", &[String::new()]), None);
    }

    #[test]
    fn unresolvable_model_fails_at_load_time() {
        let config = AppConfig {
            model: ModelConfig {
                preset: "no-such-model".into(),
                ..ModelConfig::default()
            },
            ..AppConfig::default()
        };
        let loader = build_loader(&config);
        assert_eq!(loader.describe(), "no-such-model");
        assert!(matches!(
            loader.load(),
            Err(ProviderError::ModelNotFound(_))
        ));
    }

    #[test]
    fn failing_loader_repeats_its_error() {
        let loader = FailingLoader::new("stub", ProviderError::Network("offline".into()));
        assert!(loader.load().is_err());
        assert!(loader.load().is_err());
    }
}
