//! Mini Cloud Server Daemon (mcd)

use anyhow::Result;
use clap::{Parser, Subcommand};
use mcd::Config;
use tracing_subscriber::EnvFilter;

mod cli;

#[derive(Parser)]
#[command(name = "mcd")]
#[command(about = "Mini Cloud Server Daemon", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "mcd.json")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new server (first-time setup)
    Init,

    /// Run the file server
    Serve(cli::serve::ServeArgs),

    /// Show server information
    Info,

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over the configured level
    let level = Config::load(&cli.config)
        .map(|config| config.logging.level)
        .unwrap_or_else(|_| "info".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true)
        .with_level(true)
        .init();

    match cli.command {
        Commands::Init => cli::init::run(&cli.config).await,
        Commands::Serve(args) => cli::serve::run(&cli.config, args).await,
        Commands::Info => cli::info::run(&cli.config).await,
        Commands::Version => {
            println!("mcd version {}", env!("CARGO_PKG_VERSION"));
            println!("Protocol version: {}", mccore::protocol::PROTOCOL_VERSION);
            Ok(())
        }
    }
}
