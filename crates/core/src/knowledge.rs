//! Knowledge store: the static facts the assistant answers from.
//!
//! Two read-only sources are combined:
//!
//! 1. **Personal knowledge**: a hard-coded profile (background, interests,
//!    projects, preferences) built once at startup
//! 2. **Knowledge files**: plain-text files scanned once from a directory
//!    (e.g. `./personal_knowledge/*.txt`)
//!
//! A missing directory simply yields no files. Unreadable or non-UTF-8 files
//! are skipped with a warning.

use crate::error::KnowledgeError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Default directory scanned for knowledge files.
pub const DEFAULT_KNOWLEDGE_DIR: &str = "personal_knowledge";

/// Default file extension for knowledge files.
pub const DEFAULT_KNOWLEDGE_EXTENSION: &str = "txt";

/// The owner's profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalKnowledge {
    /// Whose assistant this is
    pub owner: String,

    /// Professional background
    pub background: String,

    /// Interests, in display order
    pub interests: Vec<String>,

    /// Projects as `"title: description"`
    pub projects: Vec<String>,

    /// Preferences as ordered `(name, value)` pairs
    pub preferences: Vec<(String, String)>,
}

impl PersonalKnowledge {
    /// The built-in profile.
    pub fn vamshi() -> Self {
        Self {
            owner: "Vamshi".into(),
            background: "Computer Science graduate with specialization in Machine Learning \
                         from a top university. Currently working on advanced AI systems."
                .into(),
            interests: vec![
                "Artificial Intelligence".into(),
                "Quantum Computing".into(),
                "Classical Music".into(),
                "Hiking".into(),
            ],
            projects: vec![
                "Personalized Learning Assistant: An AI system that adapts to individual \
                 learning styles"
                    .into(),
                "Quantum ML Algorithms: Developing hybrid quantum-classical machine \
                 learning models"
                    .into(),
            ],
            preferences: vec![
                ("Programming Language".into(), "Python".into()),
                ("Music Composer".into(), "Ludwig van Beethoven".into()),
                ("Hiking Location".into(), "Swiss Alps".into()),
                (
                    "Research Focus".into(),
                    "Explainable AI and Quantum Neural Networks".into(),
                ),
            ],
        }
    }

    /// Project titles: the text before the first `:` of each project.
    pub fn project_titles(&self) -> Vec<&str> {
        self.projects
            .iter()
            .map(|p| p.split(':').next().unwrap_or(p).trim())
            .collect()
    }
}

impl Default for PersonalKnowledge {
    fn default() -> Self {
        Self::vamshi()
    }
}

/// Filename → content map of auxiliary text documents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnowledgeFiles {
    files: BTreeMap<String, String>,
}

impl KnowledgeFiles {
    /// Scan `dir` (non-recursively) for files ending in `.{extension}`.
    ///
    /// A directory that does not exist yields an empty map.
    pub fn load(dir: &Path, extension: &str) -> Result<Self, KnowledgeError> {
        if !dir.exists() {
            debug!(dir = %dir.display(), "Knowledge directory not found, no files loaded");
            return Ok(Self::default());
        }

        let entries = std::fs::read_dir(dir).map_err(|e| KnowledgeError::ReadDir {
            path: dir.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file())
            .filter(|p| {
                p.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext == extension)
            })
            .collect();

        // Sort for deterministic ordering
        paths.sort();

        let mut files = BTreeMap::new();
        for path in paths {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                warn!(file = %path.display(), "Skipping knowledge file with non-UTF-8 name");
                continue;
            };
            match std::fs::read_to_string(&path) {
                Ok(content) => {
                    debug!(file = %path.display(), bytes = content.len(), "Loaded knowledge file");
                    files.insert(name.to_string(), content);
                }
                Err(e) => {
                    warn!(file = %path.display(), error = %e, "Skipping unreadable knowledge file");
                }
            }
        }

        Ok(Self { files })
    }

    /// Build directly from `(name, content)` pairs.
    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            files: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Exact filename lookup.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.files.get(name).map(String::as_str)
    }

    /// Filenames in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Everything the assistant knows, read-only after construction.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeStore {
    pub personal: PersonalKnowledge,
    pub files: KnowledgeFiles,
    /// Where the files came from (shown when none were found)
    pub source_dir: Option<PathBuf>,
}

impl KnowledgeStore {
    pub fn new(personal: PersonalKnowledge, files: KnowledgeFiles) -> Self {
        Self {
            personal,
            files,
            source_dir: None,
        }
    }

    pub fn with_source_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.source_dir = Some(dir.into());
        self
    }

    /// Display name of the knowledge folder.
    pub fn folder_name(&self) -> String {
        self.source_dir
            .as_deref()
            .and_then(|d| d.file_name())
            .and_then(|n| n.to_str())
            .unwrap_or(DEFAULT_KNOWLEDGE_DIR)
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_titles_stop_at_first_colon() {
        let knowledge = PersonalKnowledge::vamshi();
        assert_eq!(
            knowledge.project_titles(),
            vec!["Personalized Learning Assistant", "Quantum ML Algorithms"]
        );
    }

    #[test]
    fn missing_directory_yields_empty_files() {
        let files = KnowledgeFiles::load(Path::new("/nonexistent/knowledge"), "txt").unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn loads_only_matching_extension() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "first notes").unwrap();
        std::fs::write(dir.path().join("cv.txt"), "resume").unwrap();
        std::fs::write(dir.path().join("image.png"), [0u8, 159, 146, 150]).unwrap();
        std::fs::create_dir(dir.path().join("nested.txt")).unwrap();

        let files = KnowledgeFiles::load(dir.path(), "txt").unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files.get("notes.txt"), Some("first notes"));
        assert_eq!(files.names().collect::<Vec<_>>(), vec!["cv.txt", "notes.txt"]);
        assert!(files.get("image.png").is_none());
    }

    #[test]
    fn skips_non_utf8_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.txt"), [0xffu8, 0xfe, 0xfd]).unwrap();
        std::fs::write(dir.path().join("good.txt"), "ok").unwrap();

        let files = KnowledgeFiles::load(dir.path(), "txt").unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files.get("good.txt"), Some("ok"));
    }

    #[test]
    fn folder_name_defaults_when_unset() {
        let store = KnowledgeStore::default();
        assert_eq!(store.folder_name(), "personal_knowledge");

        let store = KnowledgeStore::default().with_source_dir("/home/v/notes");
        assert_eq!(store.folder_name(), "notes");
    }
}
