//! `confidant chat`: Interactive or single-message chat mode.

use confidant_assistant::{Command, ModelStatus, Session, build_session};
use confidant_channels::CliChannel;
use confidant_config::AppConfig;
use confidant_core::channel::Channel;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

pub async fn run(
    config_path: Option<&Path>,
    message: Option<String>,
    load: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load(config_path).map_err(|e| format!("Failed to load config: {e}"))?;
    let session = Arc::new(build_session(&config)?);

    if let Some(msg) = message {
        // Single message mode
        if load {
            eprintln!("  Loading AI engine ({})...", session.model().describe());
            session.start_model_load();
            let status = session.model().settled().await;
            eprintln!("  {}", status.label());
            if let ModelStatus::Failed(_) = status {
                return Err("AI engine failed to load".into());
            }
        }

        eprint!("  Thinking...");
        let reply = session.handle_message(&msg, "User").await;
        eprint!("\r              \r");
        if let Some(reply) = reply {
            println!("{reply}");
        }
        return Ok(());
    }

    // Interactive mode
    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║      Confidant — Personal AI Assistant       ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Model:      {}", session.model().describe());
    println!(
        "  Knowledge:  {} files from {}",
        session.knowledge().files.len(),
        config.knowledge.directory.display()
    );
    println!("  Status:     {}", session.status_label());
    println!();
    if let Some(welcome) = session.transcript().first() {
        for line in welcome.content.lines() {
            println!("  {line}");
        }
    }
    println!();
    println!("  Type 'exit' or Ctrl+D to quit.");
    println!();

    announce_model_changes(&session);
    if load {
        session.start_model_load();
    }

    let channel = CliChannel::stdin();
    let mut rx = channel.start().await.map_err(|e| format!("Channel error: {e}"))?;

    prompt()?;
    while let Some(result) = rx.recv().await {
        match result {
            Ok(submission) => {
                let is_conversation = Command::parse(&submission.text).is_none();
                if is_conversation && session.model().is_ready() {
                    channel.send_typing().await?;
                }

                match session.handle_message(&submission.text, &submission.sender).await {
                    Some(reply) => channel.send(&reply).await?,
                    None => println!("  Conversation cleared.\n"),
                }
            }
            Err(e) => {
                eprintln!("  Input error: {e}");
                break;
            }
        }
        prompt()?;
    }

    println!("\n  Goodbye!");
    Ok(())
}

fn prompt() -> std::io::Result<()> {
    print!("  You > ");
    std::io::stdout().flush()
}

/// Print the status line whenever the model finishes loading.
fn announce_model_changes(session: &Session) {
    let mut status = session.model().subscribe();
    tokio::spawn(async move {
        while status.changed().await.is_ok() {
            let current = status.borrow_and_update().clone();
            if current.is_settled() {
                println!("\n  {}", current.label());
                if let Err(e) = prompt() {
                    tracing::debug!(error = %e, "Failed to redraw prompt");
                }
            }
        }
    });
}
