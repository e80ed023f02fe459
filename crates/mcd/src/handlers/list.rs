//! LIST handler

use super::Flow;
use crate::connection::{Request, Session};
use crate::storage::render_listing;
use anyhow::Result;
use mccore::Command;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};

/// Handle LIST: one stored name per line
pub async fn handle_list<S>(session: &mut Session<S>, request: &Request) -> Result<Flow>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    session.drain(request.payload_len()).await?;

    let state = Arc::clone(session.state());
    match state.storage.list().await {
        Ok(names) => {
            let listing = render_listing(&names);
            session.reply(Command::List, "", &listing).await?;
        }
        Err(e) => {
            tracing::warn!("Session {} listing failed: {:?}", session.id, e);
            session.reply_error(&e.to_string()).await?;
        }
    }

    Ok(Flow::Continue)
}
