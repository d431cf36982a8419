//! Shared model lifecycle.
//!
//! One [`ModelHandle`] per process, shared by every surface through an `Arc`.
//! The state machine is:
//!
//! ```text
//! Unloaded ──▶ Loading ──▶ Ready
//!                 │  ▲
//!                 ▼  │ (retry)
//!               Failed
//! ```
//!
//! Loading runs on a blocking worker. The check-and-set that moves the state
//! to `Loading` happens under a single lock, so concurrent `/load` requests
//! never start two loads.

use confidant_core::provider::{ModelLoader, TextGenerator};
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, warn};

/// Current model state. `Ready` owns the generator.
#[derive(Clone)]
pub enum ModelState {
    Unloaded,
    Loading,
    Ready(Arc<dyn TextGenerator>),
    Failed(String),
}

impl ModelState {
    pub fn status(&self) -> ModelStatus {
        match self {
            ModelState::Unloaded => ModelStatus::Unloaded,
            ModelState::Loading => ModelStatus::Loading,
            ModelState::Ready(_) => ModelStatus::Ready,
            ModelState::Failed(reason) => ModelStatus::Failed(reason.clone()),
        }
    }

    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(&self, next: &ModelState) -> bool {
        matches!(
            (self, next),
            (ModelState::Unloaded, ModelState::Loading)
                | (ModelState::Failed(_), ModelState::Loading)
                | (ModelState::Loading, ModelState::Ready(_))
                | (ModelState::Loading, ModelState::Failed(_))
        )
    }
}

impl fmt::Debug for ModelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelState::Unloaded => write!(f, "Unloaded"),
            ModelState::Loading => write!(f, "Loading"),
            ModelState::Ready(_) => write!(f, "Ready"),
            ModelState::Failed(reason) => write!(f, "Failed({reason:?})"),
        }
    }
}

/// Observable projection of [`ModelState`], without the generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "lowercase")]
pub enum ModelStatus {
    Unloaded,
    Loading,
    Ready,
    Failed(String),
}

impl ModelStatus {
    /// Short machine-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            ModelStatus::Unloaded => "unloaded",
            ModelStatus::Loading => "loading",
            ModelStatus::Ready => "ready",
            ModelStatus::Failed(_) => "failed",
        }
    }

    /// The status line shown next to the chat.
    pub fn label(&self) -> String {
        match self {
            ModelStatus::Unloaded => "⚪ Model not loaded".into(),
            ModelStatus::Loading => "🟡 Loading AI engine (5-10 minutes)...".into(),
            ModelStatus::Ready => "🟢 AI Engine Ready".into(),
            ModelStatus::Failed(reason) => format!("🔴 Error: {reason}"),
        }
    }

    pub fn is_settled(&self) -> bool {
        matches!(self, ModelStatus::Ready | ModelStatus::Failed(_))
    }
}

#[derive(Debug, Error)]
#[error("invalid model state transition: {from} -> {to}")]
pub struct TransitionError {
    pub from: &'static str,
    pub to: &'static str,
}

/// What a load request did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadTrigger {
    Started,
    AlreadyLoading,
    AlreadyLoaded,
}

/// The process-wide model slot.
pub struct ModelHandle {
    state: Mutex<ModelState>,
    loader: Arc<dyn ModelLoader>,
    status: watch::Sender<ModelStatus>,
}

impl ModelHandle {
    pub fn new(loader: Arc<dyn ModelLoader>) -> Self {
        let (status, _) = watch::channel(ModelStatus::Unloaded);
        Self {
            state: Mutex::new(ModelState::Unloaded),
            loader,
            status,
        }
    }

    fn lock(&self) -> MutexGuard<'_, ModelState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Apply a checked transition while holding the state lock.
    fn transition(
        &self,
        state: &mut ModelState,
        next: ModelState,
    ) -> Result<ModelStatus, TransitionError> {
        if !state.can_transition_to(&next) {
            return Err(TransitionError {
                from: state.status().name(),
                to: next.status().name(),
            });
        }
        *state = next;
        let status = state.status();
        self.status.send_replace(status.clone());
        Ok(status)
    }

    pub fn status(&self) -> ModelStatus {
        self.lock().status()
    }

    pub fn status_label(&self) -> String {
        self.status().label()
    }

    /// What the loader will load.
    pub fn describe(&self) -> String {
        self.loader.describe()
    }

    /// The generator, once `Ready`.
    pub fn generator(&self) -> Option<Arc<dyn TextGenerator>> {
        match &*self.lock() {
            ModelState::Ready(generator) => Some(Arc::clone(generator)),
            _ => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(*self.lock(), ModelState::Ready(_))
    }

    pub fn subscribe(&self) -> watch::Receiver<ModelStatus> {
        self.status.subscribe()
    }

    /// Wait until the model is `Ready` or `Failed`.
    pub async fn settled(&self) -> ModelStatus {
        let mut rx = self.subscribe();
        let settled = match rx.wait_for(ModelStatus::is_settled).await {
            Ok(status) => status.clone(),
            // The sender lives in `self`, so this only happens mid-drop
            Err(_) => self.status(),
        };
        settled
    }

    /// Start loading unless a load is running or already done.
    ///
    /// `on_settled` runs once the load finishes, with the final status.
    /// Must be called from within a Tokio runtime.
    pub fn start_load<F>(self: &Arc<Self>, on_settled: F) -> LoadTrigger
    where
        F: FnOnce(&ModelStatus) + Send + 'static,
    {
        {
            let mut state = self.lock();
            match *state {
                ModelState::Loading => return LoadTrigger::AlreadyLoading,
                ModelState::Ready(_) => return LoadTrigger::AlreadyLoaded,
                ModelState::Unloaded | ModelState::Failed(_) => {}
            }
            if let Err(e) = self.transition(&mut state, ModelState::Loading) {
                warn!(error = %e, "Refusing to start model load");
                return LoadTrigger::AlreadyLoading;
            }
        }

        info!(model = %self.loader.describe(), "Loading AI engine");

        let handle = Arc::clone(self);
        tokio::spawn(async move {
            let loader = Arc::clone(&handle.loader);
            let outcome = tokio::task::spawn_blocking(move || loader.load()).await;

            let next = match outcome {
                Ok(Ok(generator)) => {
                    info!("AI engine ready");
                    ModelState::Ready(generator)
                }
                Ok(Err(e)) => {
                    warn!(error = %e, "AI engine failed to load");
                    ModelState::Failed(e.to_string())
                }
                Err(e) => {
                    warn!(error = %e, "Model load task failed");
                    ModelState::Failed(format!("Model load task failed: {e}"))
                }
            };

            let status = {
                let mut state = handle.lock();
                match handle.transition(&mut state, next) {
                    Ok(status) => status,
                    Err(e) => {
                        warn!(error = %e, "Dropping load result");
                        state.status()
                    }
                }
            };
            on_settled(&status);
        });

        LoadTrigger::Started
    }
}
