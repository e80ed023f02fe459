//! Server info command

use anyhow::Result;
use mcd::Config;

pub async fn run(config_path: &str) -> Result<()> {
    let config = Config::load(config_path)?;

    println!("Server Information");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Address:     {}:{}", config.server.address, config.server.port);
    println!("Backlog:     {}", config.server.backlog);
    println!();
    println!("Storage:     {}", config.storage.root_path.display());
    println!(
        "Max upload:  {}",
        config
            .upload_limit()
            .map_or_else(|| "unlimited".to_string(), |limit| format!("{limit} bytes"))
    );
    println!(
        "Auth:        {}",
        if config.auth_token().is_some() { "required" } else { "disabled" }
    );
    println!("Log level:   {}", config.logging.level);

    Ok(())
}
