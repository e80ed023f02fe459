//! Storage error types

use mccore::ProtocolError;
use thiserror::Error;

/// Storage failures.
///
/// The display text is sent to the peer verbatim in an ERROR frame.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Invalid filename")]
    InvalidFilename,

    #[error("File not found")]
    NotFound,

    #[error("Not a regular file")]
    NotRegularFile,

    #[error("Failed to stat file")]
    Stat(#[source] std::io::Error),

    #[error("Failed to open temp file: {0}")]
    TempFile(#[source] std::io::Error),

    #[error("Failed to write file data: {0}")]
    Write(#[source] std::io::Error),

    #[error("Failed to store file: {0}")]
    Rename(#[source] std::io::Error),

    #[error("Failed to open storage dir")]
    ReadDir(#[source] std::io::Error),

    #[error("Failed to receive file data")]
    Transfer(#[source] ProtocolError),
}

impl StorageError {
    /// The connection can no longer be framed and must be closed.
    pub fn is_fatal(&self) -> bool {
        matches!(self, StorageError::Transfer(_))
    }
}

pub type Result<T> = std::result::Result<T, StorageError>;
