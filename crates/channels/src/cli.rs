//! Terminal chat.
//!
//! Lines come from stdin (or any async reader in tests); replies go to
//! stdout with the assistant's name in front.

use async_trait::async_trait;
use confidant_core::channel::{Channel, ChannelId, Submission, SubmissionStream};
use confidant_core::error::ChannelError;
use std::sync::Mutex;
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::debug;

type LineSource = Box<dyn AsyncBufRead + Send + Unpin>;

/// Display name printed in front of replies.
const REPLY_PREFIX: &str = "Vamshi's AI";

/// Sender name recorded for terminal input.
const TERMINAL_SENDER: &str = "User";

pub struct CliChannel {
    id: ChannelId,
    /// Taken by the first `start`
    input: Mutex<Option<LineSource>>,
}

impl CliChannel {
    /// Read from stdin.
    pub fn stdin() -> Self {
        Self::from_reader(BufReader::new(io::stdin()))
    }

    pub fn from_reader<R>(reader: R) -> Self
    where
        R: AsyncBufRead + Send + Unpin + 'static,
    {
        Self {
            id: ChannelId("cli".into()),
            input: Mutex::new(Some(Box::new(reader))),
        }
    }

    /// Whether `line` ends the session.
    pub fn is_exit(line: &str) -> bool {
        matches!(line, "exit" | "quit" | "/exit" | "/quit" | ":q")
    }
}

/// Forward non-blank lines until EOF, an exit word, or the receiver going away.
async fn pump_lines(
    source: LineSource,
    channel: ChannelId,
    tx: mpsc::Sender<Result<Submission, ChannelError>>,
) {
    let mut lines = source.lines();
    let failure = loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => return,
            Err(e) => break ChannelError::ConnectionLost(e.to_string()),
        };

        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if CliChannel::is_exit(text) {
            debug!("Exit requested from terminal");
            return;
        }

        let submission = Submission::new(&channel, TERMINAL_SENDER, text);
        if tx.send(Ok(submission)).await.is_err() {
            return;
        }
    };
    let _ = tx.send(Err(failure)).await;
}

#[async_trait]
impl Channel for CliChannel {
    fn name(&self) -> &str {
        "cli"
    }

    fn id(&self) -> &ChannelId {
        &self.id
    }

    async fn start(&self) -> Result<SubmissionStream, ChannelError> {
        let source = self
            .input
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
            .ok_or_else(|| ChannelError::NotConfigured("terminal input already in use".into()))?;

        let (tx, rx) = mpsc::channel(32);
        tokio::spawn(pump_lines(source, self.id.clone(), tx));
        Ok(rx)
    }

    async fn send(&self, content: &str) -> Result<(), ChannelError> {
        println!("{REPLY_PREFIX}: {content}\n");
        Ok(())
    }

    async fn send_typing(&self) -> Result<(), ChannelError> {
        println!("{REPLY_PREFIX} is thinking...");
        Ok(())
    }
}
