//! `confidant onboard`: First-time setup.

use confidant_config::AppConfig;
use std::path::Path;

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(AppConfig::default_path);

    println!("🤖 Confidant — First-Time Setup");
    println!("===============================\n");

    if let Some(config_dir) = config_path.parent().filter(|d| !d.as_os_str().is_empty()) {
        if !config_dir.exists() {
            std::fs::create_dir_all(config_dir)?;
            println!("✅ Created config directory: {}", config_dir.display());
        } else {
            println!("  Config directory exists: {}", config_dir.display());
        }
    }

    // Create config file
    if config_path.exists() {
        println!("\n⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or delete and re-run onboard.\n");
    } else {
        std::fs::write(&config_path, AppConfig::default_toml())?;
        println!("✅ Created config.toml at: {}", config_path.display());
    }

    // Knowledge folder, relative to where `chat`/`serve` will run
    let config = AppConfig::load(Some(config_path.as_path()))?;
    let knowledge_dir = &config.knowledge.directory;
    if !knowledge_dir.exists() {
        std::fs::create_dir_all(knowledge_dir)?;
        println!("✅ Created knowledge folder: {}", knowledge_dir.display());

        let sample = knowledge_dir.join(format!("about_me.{}", config.knowledge.extension));
        std::fs::write(
            &sample,
            concat!(
                "Notes the assistant can show with /file.\n\n",
                "- Current focus: (edit this)\n",
                "- Reading list: (edit this)\n",
            ),
        )?;
        println!("✅ Created {}", sample.display());
    }

    println!("\n📝 Next steps:");
    println!("   1. Put .{} files in {}", config.knowledge.extension, knowledge_dir.display());
    println!("   2. Run: confidant chat --load");
    println!("   3. Or open the web page: confidant serve\n");

    println!("🎉 Setup complete!\n");

    Ok(())
}
