//! Server initialization command

use anyhow::Result;
use mcd::Config;
use std::path::Path;

pub async fn run(config_path: &str) -> Result<()> {
    println!("Initializing mcd server...\n");

    // Check if config already exists
    if Path::new(config_path).exists() {
        println!("Error: Configuration file already exists: {}", config_path);
        println!("Remove it first or use a different path.");
        return Ok(());
    }

    let config = Config::default();

    tokio::fs::create_dir_all(&config.storage.root_path).await?;
    println!("✓ Storage directory: {}", config.storage.root_path.display());

    config.save(config_path)?;
    println!("✓ Configuration created: {}", config_path);

    println!();
    println!("Authentication is disabled. Set security.auth_token in");
    println!("{} to require clients to AUTH first.", config_path);
    println!();
    println!("Start the server with: mcd --config {} serve", config_path);

    Ok(())
}
