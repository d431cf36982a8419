//! The visible chat log.
//!
//! Unlike [`confidant_core::ConversationHistory`], which is what the model
//! sees, the transcript is what the user sees: every message including command
//! replies and system panels. It always starts with the welcome message.

use crate::command::COMMAND_HELP;
use chrono::{DateTime, Utc};
use confidant_core::knowledge::KnowledgeStore;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Display name for assistant replies.
pub const ASSISTANT_NAME: &str = "Vamshi's AI";
/// Display name for system panels.
pub const SYSTEM_NAME: &str = "System";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub id: Uuid,
    pub sender: Sender,
    /// Display name shown above the message
    pub name: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl TranscriptEntry {
    pub fn new(sender: Sender, name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender,
            name: name.into(),
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Sender::Assistant, ASSISTANT_NAME, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Sender::System, SYSTEM_NAME, content)
    }
}

#[derive(Debug, Clone)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
    welcome: String,
}

impl Transcript {
    /// A transcript holding only `welcome`.
    pub fn new(welcome: impl Into<String>) -> Self {
        let welcome = welcome.into();
        Self {
            entries: vec![TranscriptEntry::system(welcome.clone())],
            welcome,
        }
    }

    pub fn push(&mut self, entry: TranscriptEntry) {
        self.entries.push(entry);
    }

    /// Drop everything and show the welcome message again.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.entries.push(TranscriptEntry::system(self.welcome.clone()));
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// --- System panels ---

pub fn welcome_message(knowledge: &KnowledgeStore) -> String {
    let p = &knowledge.personal;
    let field: Vec<&str> = p.background.split_whitespace().take(2).collect();
    let commands: String = COMMAND_HELP
        .iter()
        .map(|(cmd, desc)| format!("  {cmd}: {desc}\n"))
        .collect();

    format!(
        "👋 Welcome to Your Personal AI Assistant, {owner}!\n\
         I'm your customized AI powered by Mistral 7B with knowledge about:\n\
         • Your professional background in {field}\n\
         • Your current projects: {projects}\n\
         • Your personal preferences and interests\n\
         \n\
         Special Commands:\n\
         {commands}\
         \n\
         Type /load to initialize the AI engine (5-10 min first time)",
        owner = p.owner,
        field = field.join(" "),
        projects = p.project_titles().join(", "),
    )
}

pub fn loading_message(model: &str) -> String {
    format!(
        "⚙️ Initializing Vamshi's Personal AI Assistant\n\
         Downloading and loading {model}...\n\
         • This only happens once\n\
         • Subsequent starts will be faster\n\
         • Working entirely on CPU"
    )
}

pub fn ready_message(knowledge: &KnowledgeStore) -> String {
    format!(
        "✅ Vamshi's Personal AI Assistant is Ready!\n\
         Now with enhanced knowledge about:\n\
         • Your {} core interests\n\
         • Your {} active projects\n\
         • {} personal knowledge files integrated\n\
         How can I assist you today?",
        knowledge.personal.interests.len(),
        knowledge.personal.projects.len(),
        knowledge.files.len(),
    )
}

pub fn load_error_message(reason: &str) -> String {
    format!(
        "❌ Error Loading AI Engine\n\
         Error: {reason}\n\
         Possible solutions:\n\
         • Check internet connection\n\
         • Ensure you have 5GB+ disk space\n\
         • Try again later"
    )
}
