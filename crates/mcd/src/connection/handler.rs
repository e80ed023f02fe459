//! Connection handler for individual clients

use crate::connection::Session;
use crate::handlers::{self, Flow};
use crate::state::ServerState;
use anyhow::{Context, Result};
use mccore::Command;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

/// Handle an incoming client connection
pub async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    state: Arc<ServerState>,
) -> Result<()> {
    stream.set_nodelay(true)?;

    let id = state.allocate_session_id();
    tracing::info!("Connection from {} assigned session {}", peer, id);

    let session = Session::new(id, peer, stream, state);
    run_session(session).await?;

    tracing::info!("Session {} ({}) disconnected", id, peer);
    Ok(())
}

/// Run the request loop until the peer leaves, sends QUIT, or the stream
/// can no longer be framed. The stream is closed when the session is dropped.
pub async fn run_session<S>(mut session: Session<S>) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    loop {
        let request = match session.recv_request().await {
            Ok(request) => request,
            Err(e) if e.is_clean_close() => {
                tracing::debug!("Session {} connection closed by peer", session.id);
                return Ok(());
            }
            Err(e) if e.is_malformed_header() => {
                return Err(e).context("Malformed request header");
            }
            Err(e) => return Err(e).context("Failed to read request"),
        };

        tracing::info!(
            "Session {} {} cmd={} filename={} payload={} bytes",
            session.id,
            session.peer,
            request.command,
            request.display_name(),
            request.payload_len()
        );

        if !session.is_authenticated() && request.command != Command::Auth {
            handlers::reject(&mut session, &request, "Authentication required").await?;
            continue;
        }

        if handlers::dispatch(&mut session, &request).await? == Flow::Close {
            return Ok(());
        }
    }
}
