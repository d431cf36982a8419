//! # Confidant Assistant
//!
//! The conversation engine behind every surface.
//!
//! ```text
//! input ──▶ Command::parse ──▶ CommandRouter ──▶ reply / action
//!   │
//!   └─ plain text ──▶ PromptBuilder ──▶ GenerationBridge ──▶ ModelHandle
//! ```
//!
//! - [`command`]: slash-command parsing
//! - [`router`]: command replies from the knowledge store
//! - [`prompt`]: prompt rendering with personal context and history
//! - [`bridge`]: blocking inference on a worker, one generation at a time
//! - [`model`]: shared model lifecycle (`Unloaded → Loading → Ready | Failed`)
//! - [`transcript`]: the visible chat log and system panels
//! - [`session`]: ties it all together

pub mod bridge;
pub mod command;
pub mod model;
pub mod prompt;
pub mod router;
pub mod session;
pub mod transcript;

pub use bridge::{GenerationBridge, clean_response};
pub use command::{COMMAND_HELP, Command};
pub use model::{LoadTrigger, ModelHandle, ModelState, ModelStatus};
pub use prompt::PromptBuilder;
pub use router::{Action, CommandRouter};
pub use session::{DEFAULT_SENDER, Session, SessionStatus, SettingsUpdate, build_session};
pub use transcript::{Sender, Transcript, TranscriptEntry};
