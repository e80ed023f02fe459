//! Atomic upload: write to a temporary file, then rename over the target

use super::error::{Result, StorageError};
use super::Storage;
use mccore::codec::{drain, recv_exact};
use mccore::protocol::TRANSFER_CHUNK_SIZE;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

/// Longest prefix of the target name kept in a temporary file name
const TEMP_NAME_PREFIX_MAX: usize = 200;

impl Storage {
    /// Stream `len` bytes from `reader` into `name`.
    ///
    /// `tag` identifies the uploading session so concurrent uploads of the
    /// same name never share a temporary file. The final path only ever holds
    /// the previous content or the complete new content.
    ///
    /// On a local write failure the rest of the payload is still consumed so
    /// the stream stays framed. A failure to read from `reader` is returned as
    /// [`StorageError::Transfer`].
    pub async fn upload<R>(&self, name: &str, reader: &mut R, len: u64, tag: u64) -> Result<u64>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let final_path = self.path_for(name)?;
        let temp_path = self.temp_path_for(name, tag);

        let mut file = match File::create(&temp_path).await {
            Ok(file) => file,
            Err(e) => {
                drain(reader, len).await.map_err(StorageError::Transfer)?;
                return Err(StorageError::TempFile(e));
            }
        };

        let received = match receive_into(reader, &mut file, len).await {
            Ok(()) => file.sync_all().await.map_err(StorageError::Write),
            Err(e) => Err(e),
        };
        drop(file);
        if let Err(e) = received {
            remove_temp(&temp_path).await;
            return Err(e);
        }

        if let Err(e) = fs::rename(&temp_path, &final_path).await {
            remove_temp(&temp_path).await;
            return Err(StorageError::Rename(e));
        }

        tracing::debug!("Stored {} ({} bytes)", final_path.display(), len);
        Ok(len)
    }

    /// `.{name}.{pid}.{tag}.tmp` inside the storage root
    fn temp_path_for(&self, name: &str, tag: u64) -> PathBuf {
        let mut end = name.len().min(TEMP_NAME_PREFIX_MAX);
        while !name.is_char_boundary(end) {
            end -= 1;
        }

        self.root
            .join(format!(".{}.{}.{}.tmp", &name[..end], std::process::id(), tag))
    }
}

/// Copy `len` bytes from `reader` to `writer`.
///
/// A failing `writer` does not stop the read side: the remaining payload is
/// drained before [`StorageError::Write`] is returned.
async fn receive_into<R, W>(reader: &mut R, writer: &mut W, len: u64) -> Result<()>
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut buf = vec![0u8; TRANSFER_CHUNK_SIZE];
    let mut remaining = len;

    while remaining > 0 {
        let chunk = remaining.min(buf.len() as u64) as usize;
        recv_exact(reader, &mut buf[..chunk])
            .await
            .map_err(StorageError::Transfer)?;
        remaining -= chunk as u64;

        if let Err(e) = writer.write_all(&buf[..chunk]).await {
            drain(reader, remaining).await.map_err(StorageError::Transfer)?;
            return Err(StorageError::Write(e));
        }
    }

    writer.flush().await.map_err(StorageError::Write)?;
    Ok(())
}

/// Whether `name` is the temporary file of an upload running in this process
pub(super) fn is_upload_temp_name(name: &str) -> bool {
    let Some(stem) = name.strip_prefix('.').and_then(|rest| rest.strip_suffix(".tmp")) else {
        return false;
    };

    let mut parts = stem.rsplitn(3, '.');
    let (Some(tag), Some(pid), Some(target)) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };

    !target.is_empty() && tag.parse::<u64>().is_ok() && pid.parse::<u32>() == Ok(std::process::id())
}

async fn remove_temp(path: &Path) {
    if let Err(e) = fs::remove_file(path).await {
        tracing::warn!("Failed to remove temp file {}: {}", path.display(), e);
    }
}
