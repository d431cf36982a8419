//! Prompt assembly for the local model.
//!
//! Layout, after whitespace normalization:
//!
//! ```text
//! [VAMSHI'S PERSONAL CONTEXT]
//! Background: ...
//! Current Interests: ...
//! Active Projects: ...
//! Personal Preferences: ...
//! [CONVERSATION HISTORY]
//! User: ...
//! Assistant: ...
//! [INSTRUCTION]
//! Using Vamshi's personal context and conversation history, ...
//! User: <new input>
//! Assistant: <space>
//! ```

use confidant_core::knowledge::PersonalKnowledge;
use confidant_core::message::{ConversationHistory, ConversationTurn};
use regex::Regex;
use std::sync::LazyLock;
use tracing::warn;

/// A line break followed by any run of whitespace (including blank lines).
static INDENTED_BREAK: LazyLock<Option<Regex>> = LazyLock::new(|| match Regex::new(r"\n\s+") {
    Ok(re) => Some(re),
    Err(e) => {
        warn!(error = %e, "Line-break pattern failed to compile, using line-by-line normalization");
        None
    }
});

/// Renders prompts from the personal profile and recent conversation turns.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    personal: PersonalKnowledge,
}

impl PromptBuilder {
    pub fn new(personal: PersonalKnowledge) -> Self {
        Self { personal }
    }

    /// Build the full prompt for `input`.
    ///
    /// `history` must not yet contain `input`; only its `recent()` window is
    /// rendered.
    pub fn build(&self, input: &str, history: &ConversationHistory) -> String {
        self.build_from_turns(input, history.recent())
    }

    /// Build the prompt from an explicit list of prior turns, oldest first.
    pub fn build_from_turns(&self, input: &str, turns: &[ConversationTurn]) -> String {
        let mut template = self.context_block();
        template.push_str("\n[CONVERSATION HISTORY]\n");
        for turn in turns {
            template.push_str(turn.role.label());
            template.push_str(": ");
            template.push_str(&turn.content);
            template.push('\n');
        }
        template.push_str(
            "\n[INSTRUCTION]\n\
             Using Vamshi's personal context and conversation history, \
             provide a helpful, detailed response to:",
        );

        let mut prompt = normalize(&template);
        prompt.push_str("\nUser: ");
        prompt.push_str(input);
        prompt.push_str("\nAssistant: ");
        prompt
    }

    fn context_block(&self) -> String {
        let p = &self.personal;
        let preferences = p
            .preferences
            .iter()
            .map(|(name, value)| format!("{name} ({value})"))
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "[VAMSHI'S PERSONAL CONTEXT]\n\
             Background: {}\n\
             Current Interests: {}\n\
             Active Projects: {}\n\
             Personal Preferences: {}\n",
            p.background,
            p.interests.join(", "),
            p.project_titles().join(", "),
            preferences,
        )
    }
}

/// Collapse every newline-plus-whitespace run to a bare newline, then trim.
pub fn normalize(text: &str) -> String {
    match INDENTED_BREAK.as_ref() {
        Some(re) => re.replace_all(text, "\n").trim().to_string(),
        None => collapse_lines(text),
    }
}

/// Same result as the regex: later lines lose leading whitespace and blank
/// lines disappear.
fn collapse_lines(text: &str) -> String {
    let mut lines = text.split('\n');
    let mut out = lines.next().unwrap_or_default().to_string();
    for line in lines.map(str::trim_start).filter(|line| !line.is_empty()) {
        out.push('\n');
        out.push_str(line);
    }
    out.trim().to_string()
}
