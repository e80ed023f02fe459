//! Connection acceptor

use crate::connection::handle_connection;
use crate::{Config, ServerState};
use anyhow::{Context, Result};
use futures::FutureExt;
use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{lookup_host, TcpListener, TcpSocket};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// Pause after a failed accept so descriptor exhaustion does not spin the loop
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

pub struct Server {
    listener: TcpListener,
    state: Arc<ServerState>,
    sessions: TaskTracker,
}

impl Server {
    /// Prepare storage and bind the listening socket
    pub async fn bind(config: Config) -> Result<Self> {
        let addr = lookup_host((config.server.address.as_str(), config.server.port))
            .await
            .with_context(|| format!("Failed to resolve {}", config.server.address))?
            .next()
            .with_context(|| format!("No address for {}", config.server.address))?;

        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()?
        } else {
            TcpSocket::new_v6()?
        };
        socket.set_reuseaddr(true)?;
        socket
            .bind(addr)
            .with_context(|| format!("Failed to bind {}", addr))?;
        let listener = socket.listen(config.server.backlog)?;

        let state = ServerState::new(config).await?;

        Ok(Self {
            listener,
            state: Arc::new(state),
            sessions: TaskTracker::new(),
        })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Shared server state
    pub fn state(&self) -> &Arc<ServerState> {
        &self.state
    }

    /// Accept connections until `shutdown` is cancelled.
    ///
    /// Each connection runs in its own task. On shutdown the listener is
    /// released and the closed tracker of still-running sessions is returned;
    /// those sessions are left to finish on their own.
    pub async fn run(self, shutdown: CancellationToken) -> Result<TaskTracker> {
        let Self {
            listener,
            state,
            sessions,
        } = self;

        tracing::info!(
            "Listening on {} (storage={}, auth={}, max_upload={})",
            listener.local_addr()?,
            state.storage.root().display(),
            if state.auth_token().is_some() { "required" } else { "disabled" },
            state
                .upload_limit()
                .map_or_else(|| "unlimited".to_string(), |limit| format!("{limit} bytes"))
        );

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("Shutdown requested, no longer accepting connections");
                    break;
                }
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        let state = Arc::clone(&state);
                        sessions.spawn(run_contained(stream, peer, state));
                    }
                    Err(e) => {
                        tracing::warn!("Failed to accept connection: {}", e);
                        tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                    }
                }
            }
        }

        drop(listener);
        sessions.close();

        if !sessions.is_empty() {
            tracing::info!("{} session(s) still running", sessions.len());
        }

        Ok(sessions)
    }
}

/// Run one session, keeping its errors and panics away from the acceptor
async fn run_contained(stream: tokio::net::TcpStream, peer: SocketAddr, state: Arc<ServerState>) {
    match AssertUnwindSafe(handle_connection(stream, peer, state))
        .catch_unwind()
        .await
    {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::warn!("Session with {} ended with error: {:#}", peer, e),
        Err(_) => tracing::error!("Session with {} panicked", peer),
    }
}
