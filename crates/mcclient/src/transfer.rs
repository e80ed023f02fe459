//! Upload and download of local files

use anyhow::{bail, Context, Result};
use mccore::protocol::MAX_FILENAME_LEN;
use mccore::{Client, ProtocolError};
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::{AsyncRead, AsyncWrite};

/// Fallback local name when the remote one has no usable component
const DEFAULT_DOWNLOAD_NAME: &str = "download.bin";

/// Local file name for a remote name: its last path component
pub fn local_name_for(remote: &str) -> &str {
    let base = remote.rsplit('/').next().unwrap_or_default();
    match base {
        "" | "." | ".." => DEFAULT_DOWNLOAD_NAME,
        base => base,
    }
}

/// Upload a local file under its base name
pub async fn upload_path<S>(client: &mut Client<S>, path: &Path) -> Result<String>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let meta = fs::metadata(path)
        .await
        .with_context(|| format!("Cannot stat {}", path.display()))?;
    if !meta.is_file() {
        bail!("{} is not a regular file", path.display());
    }

    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("{} has no usable file name", path.display()))?;
    if name.len() > MAX_FILENAME_LEN {
        bail!("File name too long (max {} bytes): {}", MAX_FILENAME_LEN, name);
    }

    let mut file = File::open(path)
        .await
        .with_context(|| format!("Cannot open {}", path.display()))?;

    tracing::debug!("Uploading {} as {} ({} bytes)", path.display(), name, meta.len());
    let message = client.upload(name, &mut file, meta.len()).await?;
    Ok(message)
}

/// Download `remote` into `dir`, returning the local path and size.
///
/// The local file is only touched once the server has answered with the
/// content. Data is received into a hidden `.part` file that is renamed over
/// the target when complete, so a failed download leaves any existing local
/// file as it was.
pub async fn download_to_dir<S>(client: &mut Client<S>, remote: &str, dir: &Path) -> Result<(PathBuf, u64)>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let local_name = local_name_for(remote);
    let local = dir.join(local_name);
    let partial = dir.join(format!(".{local_name}.part"));

    let len = client.request_download(remote).await?;

    let mut file = match File::create(&partial).await {
        Ok(file) => file,
        Err(e) => {
            client.skip_payload(len).await?;
            return Err(e).with_context(|| format!("Cannot create {}", partial.display()));
        }
    };

    let received: Result<()> = async {
        client.recv_payload(&mut file, len).await?;
        file.sync_all().await?;
        drop(file);
        fs::rename(&partial, &local)
            .await
            .with_context(|| format!("Cannot move download into {}", local.display()))
    }
    .await;

    if let Err(e) = received {
        fs::remove_file(&partial).await.ok();
        return Err(e);
    }

    Ok((local, len))
}

/// Whether the connection can carry further requests after `err`.
///
/// Errors raised before anything was sent, server ERROR replies and local
/// failures whose payload was drained all leave the stream framed. Anything
/// else may have cut a frame short.
pub fn connection_usable(err: &anyhow::Error) -> bool {
    err.downcast_ref::<ProtocolError>()
        .is_none_or(ProtocolError::is_recoverable)
}

/// Upload each path in turn, returning the number of failed files.
///
/// Stops with an error as soon as a failure leaves the connection unusable.
pub async fn upload_files<S>(client: &mut Client<S>, paths: &[PathBuf]) -> Result<usize>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut failures = 0;
    for path in paths {
        match upload_path(client, path).await {
            Ok(message) => println!("[SERVER] {}: {}", path.display(), message),
            Err(e) if connection_usable(&e) => {
                eprintln!("Upload of {} failed: {:#}", path.display(), e);
                failures += 1;
            }
            Err(e) => return Err(e.context(format!("Upload of {} aborted the connection", path.display()))),
        }
    }
    Ok(failures)
}

/// Download each name into `dir`, returning the number of failed files.
///
/// Stops with an error as soon as a failure leaves the connection unusable.
pub async fn download_files<S>(client: &mut Client<S>, names: &[String], dir: &Path) -> Result<usize>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut failures = 0;
    for name in names {
        match download_to_dir(client, name, dir).await {
            Ok((path, size)) => println!("Downloaded {} ({} bytes) -> {}", name, size, path.display()),
            Err(e) if connection_usable(&e) => {
                eprintln!("Download of {} failed: {:#}", name, e);
                failures += 1;
            }
            Err(e) => return Err(e.context(format!("Download of {name} aborted the connection"))),
        }
    }
    Ok(failures)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mccore::codec::{recv_all, recv_filename, recv_header, send_all, send_frame, send_header};
    use mccore::{Command, PacketHeader};

    #[test]
    fn test_local_name_for() {
        assert_eq!(local_name_for("report.pdf"), "report.pdf");
        assert_eq!(local_name_for("a/b/c.txt"), "c.txt");
        assert_eq!(local_name_for(""), "download.bin");
        assert_eq!(local_name_for("dir/"), "download.bin");
        assert_eq!(local_name_for(".."), "download.bin");
    }

    #[tokio::test]
    async fn test_upload_path_uses_base_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"remember").unwrap();

        let (client, mut server) = tokio::io::duplex(64 * 1024);
        let mut client = Client::new(client);

        let peer = tokio::spawn(async move {
            let header = recv_header(&mut server).await.unwrap();
            let name = recv_filename(&mut server, &header).await.unwrap();
            let payload = recv_all(&mut server, header.payload_len as usize).await.unwrap();
            send_frame(&mut server, Command::Upload, "notes.txt", b"UPLOAD OK").await.unwrap();
            (name, payload.to_vec())
        });

        let message = upload_path(&mut client, &path).await.unwrap();
        assert_eq!(message, "UPLOAD OK");

        let (name, payload) = peer.await.unwrap();
        assert_eq!(name, b"notes.txt");
        assert_eq!(payload, b"remember");
    }

    #[tokio::test]
    async fn test_upload_path_rejects_directory() {
        let dir = tempfile::tempdir().unwrap();
        let (client, _server) = tokio::io::duplex(1024);
        let mut client = Client::new(client);

        assert!(upload_path(&mut client, dir.path()).await.is_err());
    }

    #[tokio::test]
    async fn test_download_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let (client, mut server) = tokio::io::duplex(64 * 1024);
        let mut client = Client::new(client);

        let peer = tokio::spawn(async move {
            let header = recv_header(&mut server).await.unwrap();
            recv_filename(&mut server, &header).await.unwrap();
            let reply = PacketHeader::build(Command::Download, "data.bin", 6).unwrap();
            send_header(&mut server, &reply).await.unwrap();
            send_all(&mut server, b"data.bin").await.unwrap();
            send_all(&mut server, b"abcdef").await.unwrap();
        });

        let (path, size) = download_to_dir(&mut client, "data.bin", dir.path()).await.unwrap();
        peer.await.unwrap();

        assert_eq!(size, 6);
        assert_eq!(path, dir.path().join("data.bin"));
        assert_eq!(std::fs::read(&path).unwrap(), b"abcdef");
    }

    #[tokio::test]
    async fn test_failed_download_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let (client, mut server) = tokio::io::duplex(4096);
        let mut client = Client::new(client);

        let peer = tokio::spawn(async move {
            let header = recv_header(&mut server).await.unwrap();
            recv_filename(&mut server, &header).await.unwrap();
            send_frame(&mut server, Command::Error, "", b"File not found").await.unwrap();
        });

        let err = download_to_dir(&mut client, "missing.txt", dir.path()).await.unwrap_err();
        peer.await.unwrap();

        assert!(err.to_string().contains("File not found"));
        assert!(!dir.path().join("missing.txt").exists());
        assert!(!dir.path().join(".missing.txt.part").exists());
    }

    #[tokio::test]
    async fn test_server_error_keeps_existing_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let existing = dir.path().join("report.txt");
        std::fs::write(&existing, b"precious local data").unwrap();

        let (client, mut server) = tokio::io::duplex(4096);
        let mut client = Client::new(client);

        let peer = tokio::spawn(async move {
            let header = recv_header(&mut server).await.unwrap();
            recv_filename(&mut server, &header).await.unwrap();
            send_frame(&mut server, Command::Error, "", b"File not found").await.unwrap();
        });

        let err = download_to_dir(&mut client, "report.txt", dir.path()).await.unwrap_err();
        peer.await.unwrap();

        assert!(connection_usable(&err));
        assert_eq!(std::fs::read(&existing).unwrap(), b"precious local data");
    }

    #[tokio::test]
    async fn test_download_replaces_local_file_when_complete() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("data.bin"), b"old").unwrap();

        let (client, mut server) = tokio::io::duplex(64 * 1024);
        let mut client = Client::new(client);

        let peer = tokio::spawn(async move {
            let header = recv_header(&mut server).await.unwrap();
            recv_filename(&mut server, &header).await.unwrap();
            send_frame(&mut server, Command::Download, "data.bin", b"fresh").await.unwrap();
        });

        download_to_dir(&mut client, "data.bin", dir.path()).await.unwrap();
        peer.await.unwrap();

        assert_eq!(std::fs::read(dir.path().join("data.bin")).unwrap(), b"fresh");
        assert!(!dir.path().join(".data.bin.part").exists());
    }

    #[tokio::test]
    async fn test_short_local_source_is_not_recoverable() {
        let (client, _server) = tokio::io::duplex(64 * 1024);
        let mut client = Client::new(client);

        // Announces 10 bytes but the source ends after 3
        let mut source: &[u8] = b"abc";
        let err = client.upload("shrunk.txt", &mut source, 10).await.unwrap_err();

        assert!(!connection_usable(&err.into()));
        assert!(connection_usable(&anyhow::anyhow!("x is not a regular file")));
    }

    #[tokio::test]
    async fn test_upload_files_continues_after_server_error() {
        let dir = tempfile::tempdir().unwrap();
        let paths = vec![dir.path().join("a.txt"), dir.path().join("b.txt")];
        for path in &paths {
            std::fs::write(path, b"data").unwrap();
        }

        let (client, mut server) = tokio::io::duplex(64 * 1024);
        let mut client = Client::new(client);

        let peer = tokio::spawn(async move {
            let replies: [(Command, &[u8]); 2] = [
                (Command::Error, b"Upload exceeds limit (1 bytes)"),
                (Command::Upload, b"UPLOAD OK"),
            ];
            for (command, message) in replies {
                let header = recv_header(&mut server).await.unwrap();
                let name = recv_filename(&mut server, &header).await.unwrap();
                recv_all(&mut server, header.payload_len as usize).await.unwrap();

                let name = String::from_utf8(name).unwrap();
                send_frame(&mut server, command, &name, message).await.unwrap();
            }
        });

        assert_eq!(upload_files(&mut client, &paths).await.unwrap(), 1);
        peer.await.unwrap();
    }

    #[tokio::test]
    async fn test_upload_files_stops_when_connection_breaks() {
        let dir = tempfile::tempdir().unwrap();
        let paths = vec![dir.path().join("a.txt"), dir.path().join("b.txt")];
        for path in &paths {
            std::fs::write(path, b"data").unwrap();
        }

        let (client, mut server) = tokio::io::duplex(64 * 1024);
        let mut client = Client::new(client);

        // Reads the first request, then hangs up without replying
        let peer = tokio::spawn(async move {
            let header = recv_header(&mut server).await.unwrap();
            recv_filename(&mut server, &header).await.unwrap();
            recv_all(&mut server, header.payload_len as usize).await.unwrap();
        });

        let err = upload_files(&mut client, &paths).await.unwrap_err();
        peer.await.unwrap();

        assert!(!connection_usable(&err));
        assert!(format!("{err:#}").contains("a.txt"));
    }
}
