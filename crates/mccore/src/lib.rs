//! # mccore
//!
//! Core protocol library for Mini Cloud implementations.
//!
//! This library provides the building blocks shared by the server and its
//! clients:
//!
//! - Protocol constants, the command set and the 18-byte packet header
//! - Header codec and reliable full-length stream I/O
//! - Frame helpers (filename, drain, whole-frame send)
//! - An async [`Client`]
//!
//! ## Example
//!
//! ```rust,no_run
//! use mccore::Client;
//!
//! # async fn demo() -> mccore::Result<()> {
//! let mut client = Client::connect("127.0.0.1:9000").await?;
//! client.auth("secret").await?;
//! client.upload_bytes("hello.txt", b"hello").await?;
//! for name in client.list().await? {
//!     println!("{name}");
//! }
//! client.quit().await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod codec;
pub mod error;
pub mod protocol;

// Re-export commonly used types
pub use client::Client;
pub use error::{ProtocolError, Result};
pub use protocol::{Command, PacketHeader};
