//! Command dispatch.
//!
//! Every read-only command is answered here from the [`KnowledgeStore`].
//! Commands that change state are handed back to the session as an
//! [`Action`].

use crate::command::{COMMAND_HELP, Command};
use confidant_core::knowledge::KnowledgeStore;
use std::sync::Arc;

/// Longest `/file` reply before truncation, in characters.
pub const FILE_PREVIEW_CHARS: usize = 2000;

pub const LOAD_STARTED: &str = "🔄 Starting AI engine initialization...";
pub const LOAD_NOOP: &str = "ℹ️ AI engine is already loading or loaded";

/// What the session should do with a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Answer with this text
    Reply(String),
    /// Empty the history and reset the transcript; no reply
    ClearConversation,
    /// Start loading the model
    LoadModel,
}

#[derive(Debug, Clone)]
pub struct CommandRouter {
    knowledge: Arc<KnowledgeStore>,
}

impl CommandRouter {
    pub fn new(knowledge: Arc<KnowledgeStore>) -> Self {
        Self { knowledge }
    }

    pub fn route(&self, command: &Command) -> Action {
        let personal = &self.knowledge.personal;
        match command {
            Command::Projects => Action::Reply(format!(
                "🔨 {}'s Current Projects:\n{}",
                personal.owner,
                bullets(&personal.projects)
            )),
            Command::Interests => Action::Reply(format!(
                "🎯 {}'s Main Interests:\n{}",
                personal.owner,
                bullets(&personal.interests)
            )),
            Command::Background => Action::Reply(format!(
                "📚 Professional Background:\n{}",
                personal.background
            )),
            Command::Prefs => {
                let prefs: Vec<String> = personal
                    .preferences
                    .iter()
                    .map(|(name, value)| format!("{name}: {value}"))
                    .collect();
                Action::Reply(format!("❤️ Personal Preferences:\n{}", bullets(&prefs)))
            }
            Command::Files => Action::Reply(self.list_files()),
            Command::File(name) => Action::Reply(self.show_file(name)),
            Command::Clear => Action::ClearConversation,
            Command::Load => Action::LoadModel,
            Command::Unknown(_) => Action::Reply(unknown_command()),
        }
    }

    fn list_files(&self) -> String {
        let files = &self.knowledge.files;
        if files.is_empty() {
            return format!(
                "📂 No personal knowledge files found in '{}' folder",
                self.knowledge.folder_name()
            );
        }
        let names: Vec<&str> = files.names().collect();
        format!(
            "📂 Available Knowledge Files:\n{}\n\nUse '/file filename.txt' to view contents",
            bullets(&names)
        )
    }

    fn show_file(&self, name: &str) -> String {
        match self.knowledge.files.get(name) {
            Some(content) => truncate_chars(content, FILE_PREVIEW_CHARS),
            None => format!("❌ File {name} not found. Use '/files' to list available files."),
        }
    }
}

fn bullets<S: AsRef<str>>(items: &[S]) -> String {
    items
        .iter()
        .map(|item| format!("• {}", item.as_ref()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn unknown_command() -> String {
    let commands: Vec<String> = COMMAND_HELP
        .iter()
        .map(|(cmd, desc)| format!("{cmd}: {desc}"))
        .collect();
    format!(
        "❓ Unknown command. Available special commands:\n{}",
        commands.join("\n")
    )
}

/// First `max` characters of `text`, plus `...` when anything was cut.
fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
