//! DOWNLOAD handler

use super::{reject, required_filename, Flow};
use crate::connection::{Request, Session};
use anyhow::{bail, Context, Result};
use mccore::codec::send_all;
use mccore::protocol::TRANSFER_CHUNK_SIZE;
use mccore::{Command, PacketHeader};
use std::io::ErrorKind;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};

/// Handle DOWNLOAD: reply with the file size, the filename, then the content
pub async fn handle_download<S>(session: &mut Session<S>, request: &Request) -> Result<Flow>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let name = match required_filename(request) {
        Ok(name) => name,
        Err(message) => return reject(session, request, &message).await,
    };

    session.drain(request.payload_len()).await?;

    let state = Arc::clone(session.state());
    let (mut file, size) = match state.storage.open_download(name).await {
        Ok(opened) => opened,
        Err(e) => {
            session.reply_error(&e.to_string()).await?;
            return Ok(Flow::Continue);
        }
    };

    // From here on the reply frame is committed: any failure desynchronizes
    // the stream and ends the session.
    let header = PacketHeader::build(Command::Download, name, size)?;
    session.send_head(&header, name).await?;
    stream_file(session.stream_mut(), &mut file, size)
        .await
        .with_context(|| format!("Download of {name} aborted"))?;
    session.flush().await?;

    tracing::info!("Session {} sent {} ({} bytes)", session.id, name, size);
    Ok(Flow::Continue)
}

/// Copy exactly `size` bytes from `file` to `writer`
async fn stream_file<W, R>(writer: &mut W, file: &mut R, size: u64) -> Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
    R: AsyncRead + Unpin + ?Sized,
{
    let mut buf = vec![0u8; TRANSFER_CHUNK_SIZE];
    let mut remaining = size;

    while remaining > 0 {
        let chunk = remaining.min(buf.len() as u64) as usize;
        let n = match file.read(&mut buf[..chunk]).await {
            Ok(0) => bail!("file ended {remaining} bytes short of its announced size"),
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e).context("Failed to read file"),
        };
        send_all(writer, &buf[..n]).await?;
        remaining -= n as u64;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stream_file_copies_exact_size() {
        let data = vec![5u8; TRANSFER_CHUNK_SIZE + 100];
        let mut out = Vec::new();

        let mut file = &data[..];
        stream_file(&mut out, &mut file, data.len() as u64).await.unwrap();
        assert_eq!(out, data);
    }

    #[tokio::test]
    async fn test_stream_file_fails_when_file_shrinks() {
        let mut out = Vec::new();
        let mut file: &[u8] = b"short";

        let err = stream_file(&mut out, &mut file, 10).await.unwrap_err();
        assert!(err.to_string().contains("5 bytes short"));
    }

    #[tokio::test]
    async fn test_stream_file_ignores_growth() {
        let mut out = Vec::new();
        let mut file: &[u8] = b"0123456789";

        stream_file(&mut out, &mut file, 4).await.unwrap();
        assert_eq!(out, b"0123");
    }
}
