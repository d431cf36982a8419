//! One conversation with the assistant.
//!
//! A [`Session`] owns the model-facing history, the visible transcript and the
//! generation settings, and shares the process-wide [`ModelHandle`]. Every
//! surface (terminal, web) talks to it through [`Session::handle_message`].

use crate::bridge::{GENERATION_ERROR_PREFIX, GenerationBridge};
use crate::command::Command;
use crate::model::{LoadTrigger, ModelHandle, ModelStatus};
use crate::prompt::PromptBuilder;
use crate::router::{Action, CommandRouter, LOAD_NOOP, LOAD_STARTED};
use crate::transcript::{
    Sender, Transcript, TranscriptEntry, load_error_message, loading_message, ready_message,
    welcome_message,
};
use confidant_config::AppConfig;
use confidant_core::error::{Error, SettingsError};
use confidant_core::knowledge::{KnowledgeFiles, KnowledgeStore, PersonalKnowledge};
use confidant_core::message::{ConversationHistory, ConversationTurn};
use confidant_core::provider::GenerationConfig;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Reply to conversation text before the model is loaded.
pub const MODEL_NOT_READY: &str =
    "⚠️ Please type /load to initialize the AI engine first (5-10 min first time)";

/// Reply while a previous generation is still running.
pub const STILL_THINKING: &str =
    "⏳ Still thinking about your previous message. Please wait for that reply first.";

/// Default display name for the person typing.
pub const DEFAULT_SENDER: &str = "User";

/// Snapshot for status displays.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStatus {
    pub state: &'static str,
    pub label: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub knowledge_files: usize,
}

/// A partial settings change; absent fields are left alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct SettingsUpdate {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

pub struct Session {
    id: Uuid,
    knowledge: Arc<KnowledgeStore>,
    router: CommandRouter,
    prompts: PromptBuilder,
    bridge: GenerationBridge,
    model: Arc<ModelHandle>,
    history: Arc<Mutex<ConversationHistory>>,
    settings: Mutex<GenerationConfig>,
    transcript: Arc<Mutex<Transcript>>,
    /// Bumped on every reset so late replies don't land in a cleared history
    epoch: Arc<AtomicU64>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

impl Session {
    pub fn new(
        knowledge: Arc<KnowledgeStore>,
        model: Arc<ModelHandle>,
        settings: GenerationConfig,
        history_window: usize,
    ) -> Self {
        let welcome = welcome_message(&knowledge);
        Self {
            id: Uuid::new_v4(),
            router: CommandRouter::new(Arc::clone(&knowledge)),
            prompts: PromptBuilder::new(knowledge.personal.clone()),
            bridge: GenerationBridge::new(),
            model,
            history: Arc::new(Mutex::new(ConversationHistory::new(history_window))),
            settings: Mutex::new(settings),
            transcript: Arc::new(Mutex::new(Transcript::new(welcome))),
            epoch: Arc::new(AtomicU64::new(0)),
            knowledge,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn model(&self) -> &Arc<ModelHandle> {
        &self.model
    }

    pub fn knowledge(&self) -> &KnowledgeStore {
        &self.knowledge
    }

    /// Handle one user message. `None` means there is nothing to reply
    /// (after `/clear`).
    pub async fn handle_message(&self, text: &str, sender: &str) -> Option<String> {
        self.record(TranscriptEntry::new(Sender::User, sender, text));

        let reply = match Command::parse(text) {
            Some(command) => {
                debug!(session = %self.id, ?command, "Routing command");
                match self.router.route(&command) {
                    Action::Reply(reply) => reply,
                    Action::ClearConversation => {
                        self.reset();
                        return None;
                    }
                    Action::LoadModel => match self.start_model_load() {
                        LoadTrigger::Started => LOAD_STARTED.to_string(),
                        LoadTrigger::AlreadyLoading | LoadTrigger::AlreadyLoaded => {
                            LOAD_NOOP.to_string()
                        }
                    },
                }
            }
            None => self.converse(text.trim()).await,
        };

        self.record(TranscriptEntry::assistant(reply.clone()));
        Some(reply)
    }

    async fn converse(&self, input: &str) -> String {
        let Some(generator) = self.model.generator() else {
            return MODEL_NOT_READY.to_string();
        };
        let Some(guard) = self.bridge.try_acquire() else {
            debug!(session = %self.id, "Generation already in flight");
            return STILL_THINKING.to_string();
        };

        let epoch = self.epoch.load(Ordering::Acquire);
        let prompt = {
            let mut history = lock(&self.history);
            let prompt = self.prompts.build(input, &history);
            history.push(ConversationTurn::user(input));
            prompt
        };
        let params = lock(&self.settings).sampling();

        // The slot and the history update belong to the task and outlive a
        // dropped caller.
        let bridge = self.bridge.clone();
        let history = Arc::clone(&self.history);
        let current_epoch = Arc::clone(&self.epoch);
        let task = tokio::spawn(async move {
            let _guard = guard;
            let reply = bridge.generate(Some(generator), prompt, params).await;
            if current_epoch.load(Ordering::Acquire) == epoch {
                lock(&history).push(ConversationTurn::assistant(reply.clone()));
            }
            reply
        });

        match task.await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(session = %self.id, error = %e, "Generation task failed");
                format!("{GENERATION_ERROR_PREFIX}{e}")
            }
        }
    }

    /// Whether a generation is still running for this session.
    pub fn is_generating(&self) -> bool {
        self.bridge.is_busy()
    }

    fn record(&self, entry: TranscriptEntry) {
        lock(&self.transcript).push(entry);
    }

    /// Clear the history and show only the welcome message.
    pub fn reset(&self) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
        lock(&self.history).clear();
        lock(&self.transcript).reset();
        info!(session = %self.id, "Conversation cleared");
    }

    /// Kick off a model load, reporting progress in this session's transcript.
    pub fn start_model_load(&self) -> LoadTrigger {
        let transcript = Arc::clone(&self.transcript);
        let knowledge = Arc::clone(&self.knowledge);
        let trigger = self.model.start_load(move |status| {
            let panel = match status {
                ModelStatus::Ready => ready_message(&knowledge),
                ModelStatus::Failed(reason) => load_error_message(reason),
                ModelStatus::Unloaded | ModelStatus::Loading => return,
            };
            lock(&transcript).push(TranscriptEntry::system(panel));
        });

        if trigger == LoadTrigger::Started {
            self.record(TranscriptEntry::system(loading_message(
                &self.model.describe(),
            )));
        }
        trigger
    }

    pub fn transcript(&self) -> Vec<TranscriptEntry> {
        lock(&self.transcript).entries().to_vec()
    }

    pub fn history(&self) -> Vec<ConversationTurn> {
        lock(&self.history).all().to_vec()
    }

    pub fn settings(&self) -> GenerationConfig {
        *lock(&self.settings)
    }

    /// Apply `update` atomically: either every field is valid and applied,
    /// or nothing changes.
    pub fn update_settings(&self, update: SettingsUpdate) -> Result<GenerationConfig, SettingsError> {
        let mut settings = lock(&self.settings);
        let mut next = *settings;
        if let Some(temperature) = update.temperature {
            next.set_temperature(temperature)?;
        }
        if let Some(max_tokens) = update.max_tokens {
            next.set_max_tokens(max_tokens)?;
        }
        *settings = next;
        debug!(
            temperature = next.temperature(),
            max_tokens = next.max_tokens(),
            "Generation settings updated"
        );
        Ok(next)
    }

    pub fn status_label(&self) -> String {
        self.model.status_label()
    }

    pub fn status(&self) -> SessionStatus {
        let model = self.model.status();
        let settings = self.settings();
        SessionStatus {
            state: model.name(),
            label: model.label(),
            temperature: settings.temperature(),
            max_tokens: settings.max_tokens(),
            knowledge_files: self.knowledge.files.len(),
        }
    }
}

/// Build a session from configuration: scan the knowledge folder, resolve the
/// model loader, apply generation defaults.
pub fn build_session(config: &AppConfig) -> Result<Session, Error> {
    let files = KnowledgeFiles::load(&config.knowledge.directory, &config.knowledge.extension)?;
    info!(
        dir = %config.knowledge.directory.display(),
        files = files.len(),
        "Knowledge files loaded"
    );
    let knowledge = KnowledgeStore::new(PersonalKnowledge::vamshi(), files)
        .with_source_dir(&config.knowledge.directory);

    let settings = config
        .generation
        .to_generation_config()
        .map_err(|e| Error::Config {
            message: e.to_string(),
        })?;

    let model = Arc::new(ModelHandle::new(confidant_providers::build_loader(config)));

    Ok(Session::new(
        Arc::new(knowledge),
        model,
        settings,
        config.conversation.history_window,
    ))
}
