//! Server serve command

use anyhow::{Context, Result};
use clap::Args;
use futures::StreamExt;
use mcd::{Config, Server};
use signal_hook::consts::signal::{SIGINT, SIGTERM};
use signal_hook_tokio::Signals;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

/// Overrides applied on top of the configuration file
#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Listening port
    #[arg(short, long)]
    port: Option<u16>,

    /// Storage directory
    #[arg(short, long)]
    storage: Option<PathBuf>,

    /// Shared secret clients must send with AUTH
    #[arg(long)]
    token: Option<String>,

    /// Maximum upload size in bytes (0 = unlimited)
    #[arg(long)]
    max_upload: Option<u64>,
}

impl ServeArgs {
    fn apply(self, config: &mut Config) {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(storage) = self.storage {
            config.storage.root_path = storage;
        }
        if let Some(token) = self.token {
            config.security.auth_token = Some(token);
        }
        if let Some(limit) = self.max_upload {
            config.storage.max_upload_bytes = Some(limit);
        }
    }
}

pub async fn run(config_path: &str, args: ServeArgs) -> Result<()> {
    let mut config = Config::load(config_path).with_context(|| {
        format!("Failed to load {config_path} (run `mcd init` to create it)")
    })?;
    args.apply(&mut config);

    tracing::info!("Starting mcd server");

    let server = Server::bind(config).await?;

    let shutdown = CancellationToken::new();
    let force = CancellationToken::new();
    let signals = Signals::new([SIGINT, SIGTERM]).context("Failed to install signal handlers")?;
    let signals_handle = signals.handle();
    let signal_task = tokio::spawn(watch_signals(signals, shutdown.clone(), force.clone()));

    let sessions = server.run(shutdown).await?;

    if !sessions.is_empty() {
        tracing::info!("Waiting for active sessions (signal again to exit now)");
    }
    tokio::select! {
        _ = sessions.wait() => {}
        _ = force.cancelled() => {
            tracing::warn!("Exiting with {} session(s) still running", sessions.len());
        }
    }

    signals_handle.close();
    signal_task.await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// First signal stops accepting; a second one stops waiting for sessions
async fn watch_signals(mut signals: Signals, shutdown: CancellationToken, force: CancellationToken) {
    while let Some(signal) = signals.next().await {
        if shutdown.is_cancelled() {
            tracing::info!("Received signal {} again", signal);
            force.cancel();
            break;
        }
        tracing::info!("Received signal {}, shutting down", signal);
        shutdown.cancel();
    }
}
