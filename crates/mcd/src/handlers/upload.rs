//! UPLOAD handler

use super::{reject, required_filename, Flow};
use crate::connection::{Request, Session};
use anyhow::Result;
use mccore::Command;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};

/// Handle UPLOAD: the payload becomes the content of the named file
pub async fn handle_upload<S>(session: &mut Session<S>, request: &Request) -> Result<Flow>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let name = match required_filename(request) {
        Ok(name) => name,
        Err(message) => return reject(session, request, &message).await,
    };

    let len = request.payload_len();
    let state = Arc::clone(session.state());

    if let Some(limit) = state.upload_limit()
        && len > limit
    {
        return reject(session, request, &format!("Upload exceeds limit ({limit} bytes)")).await;
    }

    let id = session.id;
    match state.storage.upload(name, session.stream_mut(), len, id).await {
        Ok(written) => {
            tracing::info!("Session {} stored {} ({} bytes)", id, name, written);
            session.reply(Command::Upload, name, "UPLOAD OK").await?;
            Ok(Flow::Continue)
        }
        Err(e) if e.is_fatal() => {
            // The peer is most likely gone; the reply is best effort
            if let Err(send_err) = session.reply_error(&e.to_string()).await {
                tracing::debug!("Session {} could not report failed upload: {}", id, send_err);
            }
            Err(anyhow::Error::new(e).context(format!("Upload of {name} aborted")))
        }
        Err(e) => {
            tracing::warn!("Session {} upload of {} failed: {:?}", id, name, e);
            session.reply_error(&e.to_string()).await?;
            Ok(Flow::Continue)
        }
    }
}
