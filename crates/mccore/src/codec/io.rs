//! Reliable full-length transfer over a byte stream

use super::HeaderCodec;
use crate::error::{ProtocolError, Result};
use crate::protocol::{Command, PacketHeader, MAX_FILENAME_LEN, TRANSFER_CHUNK_SIZE};
use bytes::BytesMut;
use std::io::ErrorKind;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::codec::{Decoder, Encoder};

/// Write all of `buf`, retrying on interruption and short writes.
pub async fn send_all<W>(writer: &mut W, mut buf: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    while !buf.is_empty() {
        match writer.write(buf).await {
            Ok(0) => return Err(std::io::Error::from(ErrorKind::WriteZero).into()),
            Ok(n) => buf = &buf[n..],
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}

/// Fill `buf` completely, retrying on interruption.
///
/// Fails with [`ProtocolError::ShortRead`] if the stream ends first.
pub async fn recv_exact<R>(reader: &mut R, buf: &mut [u8]) -> Result<()>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]).await {
            Ok(0) => {
                return Err(ProtocolError::ShortRead {
                    read: filled,
                    expected: buf.len(),
                });
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}

/// Read exactly `len` bytes.
pub async fn recv_all<R>(reader: &mut R, len: usize) -> Result<BytesMut>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut buf = BytesMut::zeroed(len);
    recv_exact(reader, &mut buf).await?;
    Ok(buf)
}

/// Send a header in wire byte order.
pub async fn send_header<W>(writer: &mut W, header: &PacketHeader) -> Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut buf = BytesMut::with_capacity(PacketHeader::SIZE);
    HeaderCodec.encode(*header, &mut buf)?;
    send_all(writer, &buf).await
}

/// Receive and validate a header.
///
/// The filename and payload that follow are left on the stream.
pub async fn recv_header<R>(reader: &mut R) -> Result<PacketHeader>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut buf = recv_all(reader, PacketHeader::SIZE).await?;
    HeaderCodec
        .decode(&mut buf)?
        .ok_or(ProtocolError::ShortRead {
            read: buf.len(),
            expected: PacketHeader::SIZE,
        })
}

/// Receive the raw filename bytes announced by `header`.
pub async fn recv_filename<R>(reader: &mut R, header: &PacketHeader) -> Result<Vec<u8>>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let len = header.filename_len as usize;
    if len > MAX_FILENAME_LEN {
        return Err(ProtocolError::FilenameTooLong {
            len: u64::from(header.filename_len),
            max: MAX_FILENAME_LEN,
        });
    }

    let mut name = vec![0u8; len];
    recv_exact(reader, &mut name).await?;
    Ok(name)
}

/// Read and discard exactly `len` bytes.
pub async fn drain<R>(reader: &mut R, len: u64) -> Result<()>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut buf = [0u8; TRANSFER_CHUNK_SIZE];
    let mut remaining = len;
    while remaining > 0 {
        let chunk = remaining.min(buf.len() as u64) as usize;
        recv_exact(reader, &mut buf[..chunk]).await?;
        remaining -= chunk as u64;
    }

    Ok(())
}

/// Send a complete frame: header, filename, payload.
pub async fn send_frame<W>(writer: &mut W, command: Command, filename: &str, payload: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let header = PacketHeader::build(command, filename, payload.len() as u64)?;
    send_header(writer, &header).await?;
    send_all(writer, filename.as_bytes()).await?;
    send_all(writer, payload).await?;
    writer.flush().await?;
    Ok(())
}
