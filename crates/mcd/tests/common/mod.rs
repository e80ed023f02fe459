//! Shared helpers for integration tests

#![allow(dead_code)]

use mccore::codec::{recv_all, recv_filename, recv_header, send_all, send_header};
use mccore::{Command, PacketHeader};
use mcd::Config;
use tokio::io::{AsyncRead, AsyncWrite};

/// A reply frame read in full
#[derive(Debug)]
pub struct Frame {
    pub command: Command,
    pub filename: String,
    pub payload: Vec<u8>,
}

impl Frame {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }
}

/// Configuration for a test server rooted at `root`
pub fn test_config(root: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.server.address = "127.0.0.1".to_string();
    config.server.port = 0; // OS will assign a free port
    config.storage.root_path = root.to_path_buf();
    config
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Send a request frame with raw filename bytes
pub async fn send_request<S>(stream: &mut S, command: Command, filename: &[u8], payload: &[u8])
where
    S: AsyncWrite + Unpin,
{
    let mut header = PacketHeader::build(command, "", payload.len() as u64).unwrap();
    header.filename_len = filename.len() as u32;
    send_header(stream, &header).await.unwrap();
    send_all(stream, filename).await.unwrap();
    send_all(stream, payload).await.unwrap();
}

/// Read one complete reply frame
pub async fn read_frame<S>(stream: &mut S) -> Frame
where
    S: AsyncRead + Unpin,
{
    let header = recv_header(stream).await.unwrap();
    let filename = recv_filename(stream, &header).await.unwrap();
    let payload = recv_all(stream, header.payload_len as usize).await.unwrap();

    Frame {
        command: header.command().unwrap(),
        filename: String::from_utf8(filename).unwrap(),
        payload: payload.to_vec(),
    }
}

/// Read a reply and check it is an ERROR with `message`
pub async fn expect_error<S>(stream: &mut S, message: &str)
where
    S: AsyncRead + Unpin,
{
    let frame = read_frame(stream).await;
    assert_eq!(frame.command, Command::Error, "reply: {:?}", frame.text());
    assert_eq!(frame.text(), message);
}

/// Whether the peer has closed the stream
pub async fn is_closed<S>(stream: &mut S) -> bool
where
    S: AsyncRead + Unpin,
{
    matches!(recv_header(stream).await, Err(e) if e.is_clean_close())
}
