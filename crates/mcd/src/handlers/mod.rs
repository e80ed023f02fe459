//! Request handlers
//!
//! Every handler consumes exactly the payload its request announced, either
//! by using it or by draining it, so the next header starts on a frame
//! boundary. An `Err` means the stream can no longer be framed and the
//! session must end.

pub mod auth;
pub mod download;
pub mod list;
pub mod upload;

use crate::connection::{Request, Session};
use crate::storage::is_safe_filename;
use anyhow::{Context, Result};
use mccore::Command;
use tokio::io::{AsyncRead, AsyncWrite};

/// What the session loop does after a handler returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Close,
}

/// Dispatch a request to its handler
pub async fn dispatch<S>(session: &mut Session<S>, request: &Request) -> Result<Flow>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    match request.command {
        Command::Auth => auth::handle_auth(session, request).await,
        Command::Upload => upload::handle_upload(session, request).await,
        Command::Download => download::handle_download(session, request).await,
        Command::List => list::handle_list(session, request).await,
        Command::Quit => {
            session.drain(request.payload_len()).await?;
            session.reply(Command::Quit, "", "Goodbye").await?;
            Ok(Flow::Close)
        }
        Command::Error => reject(session, request, "Unsupported command").await,
    }
}

/// Drain the request payload and answer with an ERROR frame
pub(crate) async fn reject<S>(session: &mut Session<S>, request: &Request, message: &str) -> Result<Flow>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    session
        .drain(request.payload_len())
        .await
        .context("Failed to drain rejected payload")?;
    session.reply_error(message).await?;
    Ok(Flow::Continue)
}

/// Filename of a request that needs one, or the message to reject it with
pub(crate) fn required_filename(request: &Request) -> std::result::Result<&str, String> {
    match request.filename.as_deref() {
        Some("") => Err(format!("{} requires filename", request.command)),
        Some(name) if is_safe_filename(name) => Ok(name),
        _ => Err("Invalid filename".to_string()),
    }
}
