//! `confidant status`: Show configuration and model status.

use confidant_config::AppConfig;
use confidant_core::knowledge::KnowledgeFiles;
use confidant_providers::ModelSpec;
use std::path::Path;

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load(config_path).map_err(|e| format!("Failed to load config: {e}"))?;

    println!("🤖 Confidant Status");
    println!("===================");
    println!("  Config dir:   {}", AppConfig::config_dir().display());
    match ModelSpec::from_config(&config.model) {
        Ok(spec) => println!("  Model:        {}", spec.describe()),
        Err(e) => println!("  Model:        ⚠️  {e}"),
    }
    println!(
        "  Inference:    {}",
        if cfg!(feature = "local") {
            "local (Candle)"
        } else {
            "not compiled in; rebuild with `--features local`"
        }
    );
    println!(
        "  Generation:   temperature {}, max {} tokens",
        config.generation.temperature, config.generation.max_tokens
    );
    println!("  History:      last {} turns", config.conversation.history_window);

    let files = KnowledgeFiles::load(&config.knowledge.directory, &config.knowledge.extension)?;
    println!(
        "  Knowledge:    {} *.{} files in {}",
        files.len(),
        config.knowledge.extension,
        config.knowledge.directory.display()
    );
    println!("  Gateway:      {}:{}", config.gateway.host, config.gateway.port);

    // Check config file existence
    let config_file = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(AppConfig::default_path);
    if config_file.exists() {
        println!("\n  ✅ Config file found");
    } else {
        println!("\n  ⚠️  No config file — run `confidant onboard` first");
    }

    Ok(())
}
