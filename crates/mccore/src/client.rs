//! Async client for the Mini Cloud protocol

use crate::codec::{drain, recv_all, recv_exact, recv_filename, recv_header, send_all, send_frame, send_header};
use crate::error::{ProtocolError, Result};
use crate::protocol::{Command, PacketHeader, TRANSFER_CHUNK_SIZE};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpStream, ToSocketAddrs};

/// Placeholder line the server sends for an empty listing
pub const EMPTY_LISTING: &str = "(empty)";

/// A reply frame whose header and filename have been read.
///
/// The payload is still on the stream.
#[derive(Debug, Clone)]
pub struct Reply {
    pub header: PacketHeader,
    pub command: Command,
    pub filename: String,
}

/// Client connection
pub struct Client<S = TcpStream> {
    stream: S,
}

impl Client<TcpStream> {
    /// Connect to a server
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        Ok(Self::new(stream))
    }
}

impl<S> Client<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap an established stream
    pub fn new(stream: S) -> Self {
        Self { stream }
    }

    /// Give back the underlying stream
    pub fn into_inner(self) -> S {
        self.stream
    }

    /// Authenticate with a shared-secret token
    pub async fn auth(&mut self, token: &str) -> Result<String> {
        send_frame(&mut self.stream, Command::Auth, "", token.as_bytes()).await?;
        self.recv_message(Command::Auth).await
    }

    /// Upload `len` bytes read from `reader` under `name`
    pub async fn upload<R>(&mut self, name: &str, reader: &mut R, len: u64) -> Result<String>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let header = PacketHeader::build(Command::Upload, name, len)?;
        send_header(&mut self.stream, &header).await?;
        send_all(&mut self.stream, name.as_bytes()).await?;

        let mut buf = vec![0u8; TRANSFER_CHUNK_SIZE];
        let mut remaining = len;
        while remaining > 0 {
            let chunk = remaining.min(buf.len() as u64) as usize;
            recv_exact(reader, &mut buf[..chunk]).await?;
            send_all(&mut self.stream, &buf[..chunk]).await?;
            remaining -= chunk as u64;
        }
        self.stream.flush().await?;

        self.recv_message(Command::Upload).await
    }

    /// Upload an in-memory buffer under `name`
    pub async fn upload_bytes(&mut self, name: &str, data: &[u8]) -> Result<String> {
        let mut reader = data;
        self.upload(name, &mut reader, data.len() as u64).await
    }

    /// Download `name` into `writer`, returning the number of bytes received
    pub async fn download_to<W>(&mut self, name: &str, writer: &mut W) -> Result<u64>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let len = self.request_download(name).await?;
        self.recv_payload(writer, len).await
    }

    /// Send DOWNLOAD and wait for the reply header, returning the payload size.
    ///
    /// The payload is left on the stream; read it with [`Client::recv_payload`]
    /// or discard it with [`Client::skip_payload`].
    pub async fn request_download(&mut self, name: &str) -> Result<u64> {
        send_frame(&mut self.stream, Command::Download, name, &[]).await?;
        let reply = self.recv_reply(Command::Download).await?;
        Ok(reply.header.payload_len)
    }

    /// Copy a `len` byte payload from the stream into `writer`.
    ///
    /// If `writer` fails the rest of the payload is still consumed and the
    /// error is reported as [`ProtocolError::Local`].
    pub async fn recv_payload<W>(&mut self, writer: &mut W, len: u64) -> Result<u64>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let mut buf = vec![0u8; TRANSFER_CHUNK_SIZE];
        let mut remaining = len;
        while remaining > 0 {
            let chunk = remaining.min(buf.len() as u64) as usize;
            recv_exact(&mut self.stream, &mut buf[..chunk]).await?;
            remaining -= chunk as u64;

            if let Err(e) = writer.write_all(&buf[..chunk]).await {
                drain(&mut self.stream, remaining).await?;
                return Err(ProtocolError::Local(e));
            }
        }
        writer.flush().await.map_err(ProtocolError::Local)?;

        Ok(len)
    }

    /// Discard a payload announced by a reply
    pub async fn skip_payload(&mut self, len: u64) -> Result<()> {
        drain(&mut self.stream, len).await
    }

    /// Download `name` into memory
    pub async fn download_bytes(&mut self, name: &str) -> Result<Vec<u8>> {
        let mut data = Vec::new();
        self.download_to(name, &mut data).await?;
        Ok(data)
    }

    /// List stored files
    pub async fn list(&mut self) -> Result<Vec<String>> {
        send_frame(&mut self.stream, Command::List, "", &[]).await?;
        let listing = self.recv_message(Command::List).await?;

        Ok(listing
            .lines()
            .filter(|line| !line.is_empty() && *line != EMPTY_LISTING)
            .map(str::to_string)
            .collect())
    }

    /// End the session
    pub async fn quit(&mut self) -> Result<String> {
        send_frame(&mut self.stream, Command::Quit, "", &[]).await?;
        self.recv_message(Command::Quit).await
    }

    /// Read a reply header and filename.
    ///
    /// An ERROR frame becomes [`ProtocolError::Server`]; any other command
    /// than `expected` is drained and reported as unexpected.
    pub async fn recv_reply(&mut self, expected: Command) -> Result<Reply> {
        let header = recv_header(&mut self.stream).await?;
        let command = header.command()?;
        let filename = String::from_utf8_lossy(&recv_filename(&mut self.stream, &header).await?).into_owned();

        if command == Command::Error && expected != Command::Error {
            let message = self.recv_text(header.payload_len).await?;
            return Err(ProtocolError::Server(message));
        }

        if command != expected {
            drain(&mut self.stream, header.payload_len).await?;
            return Err(ProtocolError::UnexpectedCommand {
                expected,
                got: command,
            });
        }

        Ok(Reply {
            header,
            command,
            filename,
        })
    }

    async fn recv_message(&mut self, expected: Command) -> Result<String> {
        let reply = self.recv_reply(expected).await?;
        self.recv_text(reply.header.payload_len).await
    }

    async fn recv_text(&mut self, len: u64) -> Result<String> {
        let len = usize::try_from(len)
            .map_err(|_| ProtocolError::InvalidArgument(format!("text payload of {len} bytes")))?;
        let bytes = recv_all(&mut self.stream, len).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
