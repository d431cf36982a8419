//! `confidant serve`: Start the web chat page and HTTP API.

use confidant_config::AppConfig;
use std::path::Path;

pub async fn run(
    config_path: Option<&Path>,
    port_override: Option<u16>,
    load: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config =
        AppConfig::load(config_path).map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("🤖 Confidant");
    println!("   Chat page:  http://{}:{}/", config.gateway.host, config.gateway.port);
    println!("   Model:      {}", config.model.preset);
    println!(
        "   Engine:     {}",
        if load { "loading now" } else { "type /load in the chat to start it" }
    );

    confidant_gateway::start(config, load).await?;

    Ok(())
}
