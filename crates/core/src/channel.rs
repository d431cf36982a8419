//! Chat surfaces.
//!
//! A [`Channel`] is where the user types: it yields [`Submission`]s and
//! shows the assistant's replies. The session behind it is the same for
//! every surface.

use crate::error::ChannelError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelId(pub String);

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One line of user input, as typed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub channel: ChannelId,
    /// Display name recorded in the transcript
    pub sender: String,
    pub text: String,
}

impl Submission {
    pub fn new(channel: &ChannelId, sender: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            channel: channel.clone(),
            sender: sender.into(),
            text: text.into(),
        }
    }
}

/// Submissions in arrival order. Closes when the user leaves.
pub type SubmissionStream = mpsc::Receiver<Result<Submission, ChannelError>>;

#[async_trait]
pub trait Channel: Send + Sync {
    /// Short surface name ("cli", "web").
    fn name(&self) -> &str;

    fn id(&self) -> &ChannelId;

    /// Begin reading input. A channel can be started once.
    async fn start(&self) -> Result<SubmissionStream, ChannelError>;

    /// Show a reply.
    async fn send(&self, content: &str) -> Result<(), ChannelError>;

    /// Show that a reply is being generated.
    async fn send_typing(&self) -> Result<(), ChannelError> {
        Ok(())
    }
}
