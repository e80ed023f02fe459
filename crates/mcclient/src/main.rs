//! Mini Cloud command-line client (mcclient)

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use mccore::protocol::DEFAULT_PORT;
use mccore::Client;
use mcclient::{download_files, upload_files};
use std::path::PathBuf;
use tokio::net::TcpStream;
use tracing_subscriber::EnvFilter;

/// Most files accepted by a single upload or download invocation
const MAX_BATCH: usize = 32;

#[derive(Parser)]
#[command(name = "mcclient")]
#[command(about = "Mini Cloud Client", long_about = None)]
#[command(version)]
struct Cli {
    /// Server host
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Server port
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Shared secret sent with AUTH before the first request
    #[arg(long)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload local files
    Upload {
        #[arg(required = true, num_args = 1..=MAX_BATCH)]
        paths: Vec<PathBuf>,
    },

    /// Download files by name
    Download {
        #[arg(required = true, num_args = 1..=MAX_BATCH)]
        names: Vec<String>,

        /// Directory to save into
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// Download every listed file
    DownloadAll {
        /// Directory to save into
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// List stored files
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let mut client = Client::connect((cli.host.as_str(), cli.port)).await?;
    if let Some(token) = &cli.token {
        let message = client.auth(token).await?;
        println!("[SERVER] {}", message);
    }

    let failures = run_command(&mut client, cli.command).await?;

    let goodbye = client.quit().await?;
    println!("[SERVER] {}", goodbye);

    if failures > 0 {
        bail!("{} transfer(s) failed", failures);
    }
    Ok(())
}

/// Run one subcommand; returns the number of per-file failures.
///
/// An error means the connection is no longer usable.
async fn run_command(client: &mut Client<TcpStream>, command: Commands) -> Result<usize> {
    let mut failures = 0;

    match command {
        Commands::Upload { paths } => {
            failures += upload_files(client, &paths).await?;
        }
        Commands::Download { names, output } => {
            failures += download_files(client, &names, &output).await?;
        }
        Commands::DownloadAll { output } => {
            let names = client.list().await?;
            if names.is_empty() {
                println!("No files on server");
            }
            failures += download_files(client, &names, &output).await?;
        }
        Commands::List => {
            let names = client.list().await?;
            if names.is_empty() {
                println!("(empty)");
            }
            for name in names {
                println!("{}", name);
            }
        }
    }

    Ok(failures)
}
