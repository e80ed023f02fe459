//! AUTH handler

use super::{reject, Flow};
use crate::connection::{Request, Session};
use anyhow::{Context, Result};
use mccore::codec::recv_all;
use mccore::protocol::MAX_AUTH_TOKEN_LEN;
use mccore::Command;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};

/// Handle AUTH.
///
/// The payload is the token. A wrong token closes the connection.
pub async fn handle_auth<S>(session: &mut Session<S>, request: &Request) -> Result<Flow>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let len = request.payload_len();

    if session.is_authenticated() {
        session.drain(len).await?;
        session.reply(Command::Auth, "", "Already authenticated").await?;
        return Ok(Flow::Continue);
    }

    let state = Arc::clone(session.state());
    let Some(expected) = state.auth_token() else {
        session.drain(len).await?;
        session.authenticate();
        session.reply(Command::Auth, "", "AUTH not required").await?;
        return Ok(Flow::Continue);
    };

    if len == 0 || len > MAX_AUTH_TOKEN_LEN as u64 {
        return reject(session, request, "Invalid auth token length").await;
    }

    let token = recv_all(session.stream_mut(), len as usize)
        .await
        .context("Failed to read auth token")?;

    if token[..] != *expected.as_bytes() {
        tracing::warn!("Session {} ({}) sent an invalid auth token", session.id, session.peer);
        session.reply_error("Invalid auth token").await?;
        return Ok(Flow::Close);
    }

    session.authenticate();
    tracing::info!("Session {} authenticated", session.id);
    session.reply(Command::Auth, "", "AUTH OK").await?;
    Ok(Flow::Continue)
}
