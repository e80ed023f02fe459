//! Error types

use crate::protocol::Command;
use thiserror::Error;

/// Protocol errors
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Bad magic: 0x{0:08X}")]
    BadMagic(u32),

    #[error("Protocol version mismatch: {0}")]
    BadVersion(u8),

    #[error("Invalid command: {0}")]
    BadCommand(u8),

    #[error("Filename too long: {len} bytes (max: {max})")]
    FilenameTooLong { len: u64, max: usize },

    #[error("Short read: got {read} of {expected} bytes")]
    ShortRead { read: usize, expected: usize },

    #[error("Server error: {0}")]
    Server(String),

    #[error("Unexpected reply: expected {expected}, got {got}")]
    UnexpectedCommand { expected: Command, got: Command },

    #[error("Local I/O error: {0}")]
    Local(#[source] std::io::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProtocolError {
    /// True when the peer closed the stream cleanly between frames.
    pub fn is_clean_close(&self) -> bool {
        matches!(self, ProtocolError::ShortRead { read: 0, .. })
    }

    /// True when the stream is still on a frame boundary and the
    /// connection may carry further requests.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ProtocolError::Server(_)
                | ProtocolError::UnexpectedCommand { .. }
                | ProtocolError::Local(_)
        )
    }

    /// True for malformed-header errors reported by [`PacketHeader::validate`].
    ///
    /// [`PacketHeader::validate`]: crate::protocol::PacketHeader::validate
    pub fn is_malformed_header(&self) -> bool {
        matches!(
            self,
            ProtocolError::BadMagic(_)
                | ProtocolError::BadVersion(_)
                | ProtocolError::BadCommand(_)
                | ProtocolError::FilenameTooLong { .. }
        )
    }
}

/// Result type for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;
