//! Session management

use crate::state::ServerState;
use mccore::codec::{drain, recv_filename, recv_header, send_all, send_frame, send_header};
use mccore::{Command, PacketHeader, ProtocolError};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

/// One received request: header plus filename.
///
/// The payload is still on the stream.
#[derive(Debug, Clone)]
pub struct Request {
    pub header: PacketHeader,
    pub command: Command,
    /// Filename as sent; `None` if it was not valid UTF-8
    pub filename: Option<String>,
}

impl Request {
    /// Declared payload length
    pub fn payload_len(&self) -> u64 {
        self.header.payload_len
    }

    /// Filename for log lines
    pub fn display_name(&self) -> &str {
        match self.filename.as_deref() {
            Some("") => "(none)",
            Some(name) => name,
            None => "(invalid)",
        }
    }
}

/// Server side of one accepted connection
pub struct Session<S> {
    /// Session id, unique for the life of the process
    pub id: u64,

    /// Peer address
    pub peer: SocketAddr,

    stream: S,
    authenticated: bool,
    state: Arc<ServerState>,
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Create a session; it starts authenticated when no token is configured
    pub fn new(id: u64, peer: SocketAddr, stream: S, state: Arc<ServerState>) -> Self {
        let authenticated = state.auth_token().is_none();
        Self {
            id,
            peer,
            stream,
            authenticated,
            state,
        }
    }

    /// Check if the session is authenticated
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Mark the session as authenticated
    pub fn authenticate(&mut self) {
        self.authenticated = true;
    }

    /// Shared server state
    pub fn state(&self) -> &Arc<ServerState> {
        &self.state
    }

    /// Underlying stream, for streaming payloads
    pub fn stream_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    /// Receive the next request header and filename
    pub async fn recv_request(&mut self) -> Result<Request, ProtocolError> {
        let header = recv_header(&mut self.stream).await?;
        let command = header.command()?;
        let filename = String::from_utf8(recv_filename(&mut self.stream, &header).await?).ok();

        Ok(Request {
            header,
            command,
            filename,
        })
    }

    /// Discard a payload the handler will not consume
    pub async fn drain(&mut self, len: u64) -> Result<(), ProtocolError> {
        drain(&mut self.stream, len).await
    }

    /// Send a frame with a text payload
    pub async fn reply(&mut self, command: Command, filename: &str, message: &str) -> Result<(), ProtocolError> {
        send_frame(&mut self.stream, command, filename, message.as_bytes()).await
    }

    /// Send an ERROR frame
    pub async fn reply_error(&mut self, message: &str) -> Result<(), ProtocolError> {
        tracing::debug!("Session {} error reply: {}", self.id, message);
        self.reply(Command::Error, "", message).await
    }

    /// Send a header and filename; the payload follows separately
    pub async fn send_head(&mut self, header: &PacketHeader, filename: &str) -> Result<(), ProtocolError> {
        send_header(&mut self.stream, header).await?;
        send_all(&mut self.stream, filename.as_bytes()).await
    }

    /// Flush buffered output
    pub async fn flush(&mut self) -> Result<(), ProtocolError> {
        self.stream.flush().await?;
        Ok(())
    }
}
