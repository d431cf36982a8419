//! Slash-command parsing.
//!
//! Raw input becomes a tagged [`Command`] here; dispatch happens in
//! [`crate::router`]. Matching is case-insensitive. `/file <name>` is the only
//! parameterized command and keeps the filename's original case.

/// Every command with its help text, in display order.
pub const COMMAND_HELP: &[(&str, &str)] = &[
    ("/projects", "Show Vamshi's current projects"),
    ("/interests", "List Vamshi's main interests"),
    ("/background", "Show professional background"),
    ("/prefs", "Show personal preferences"),
    ("/files", "List available knowledge files"),
    ("/file [filename]", "Show contents of a specific knowledge file"),
    ("/clear", "Clear conversation history"),
    ("/load", "Initialize the AI engine"),
];

const FILE_PREFIX: &str = "/file ";

/// A recognized slash-command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Projects,
    Interests,
    Background,
    Prefs,
    Files,
    /// `/file <name>`; the name may be empty
    File(String),
    Clear,
    Load,
    /// Starts with `/` but matches nothing above
    Unknown(String),
}

impl Command {
    /// Parse user input. `None` means plain conversation text.
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if !input.starts_with('/') {
            return None;
        }

        let lowered = input.to_lowercase();
        let command = match lowered.as_str() {
            "/projects" => Command::Projects,
            "/interests" => Command::Interests,
            "/background" => Command::Background,
            "/prefs" => Command::Prefs,
            "/files" => Command::Files,
            "/clear" => Command::Clear,
            "/load" => Command::Load,
            _ if lowered.starts_with(FILE_PREFIX) => {
                // ASCII prefix, so the byte offset is valid in the original too
                Command::File(input[FILE_PREFIX.len()..].trim().to_string())
            }
            _ => Command::Unknown(input.to_string()),
        };
        Some(command)
    }

    /// Whether running the command changes session or model state.
    pub fn is_side_effecting(&self) -> bool {
        matches!(self, Command::Clear | Command::Load)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_not_a_command() {
        assert_eq!(Command::parse("Hello there"), None);
        assert_eq!(Command::parse("what about /projects?"), None);
    }

    #[test]
    fn exact_commands_are_case_insensitive() {
        assert_eq!(Command::parse("/projects"), Some(Command::Projects));
        assert_eq!(Command::parse("/PROJECTS"), Some(Command::Projects));
        assert_eq!(Command::parse("/Interests"), Some(Command::Interests));
        assert_eq!(Command::parse("/background"), Some(Command::Background));
        assert_eq!(Command::parse("/prefs"), Some(Command::Prefs));
        assert_eq!(Command::parse("/files"), Some(Command::Files));
        assert_eq!(Command::parse("/clear"), Some(Command::Clear));
        assert_eq!(Command::parse("/Load"), Some(Command::Load));
    }

    #[test]
    fn file_command_keeps_filename_case() {
        assert_eq!(
            Command::parse("/FILE Notes.txt"),
            Some(Command::File("Notes.txt".into()))
        );
        assert_eq!(
            Command::parse("/file   my notes.txt  "),
            Some(Command::File("my notes.txt".into()))
        );
    }

    #[test]
    fn file_without_argument_is_unknown() {
        assert_eq!(
            Command::parse("/file"),
            Some(Command::Unknown("/file".into()))
        );
    }

    #[test]
    fn unrecognized_slash_input_is_unknown() {
        assert_eq!(
            Command::parse("/weather today"),
            Some(Command::Unknown("/weather today".into()))
        );
        assert_eq!(
            Command::parse("/projectsx"),
            Some(Command::Unknown("/projectsx".into()))
        );
    }

    #[test]
    fn only_clear_and_load_have_side_effects() {
        assert!(Command::Clear.is_side_effecting());
        assert!(Command::Load.is_side_effecting());
        assert!(!Command::Files.is_side_effecting());
        assert!(!Command::File("a.txt".into()).is_side_effecting());
    }

    #[test]
    fn help_lists_every_command() {
        assert_eq!(COMMAND_HELP.len(), 8);
        assert!(COMMAND_HELP.iter().any(|(c, _)| *c == "/file [filename]"));
    }
}
