//! Protocol constants

/// Protocol magic: 'MCLD'
pub const PROTOCOL_MAGIC: u32 = 0x4D43_4C44;

/// Protocol version
pub const PROTOCOL_VERSION: u8 = 1;

/// Maximum filename length in bytes
pub const MAX_FILENAME_LEN: usize = 255;

/// Maximum AUTH token length in bytes
pub const MAX_AUTH_TOKEN_LEN: usize = 256;

/// Chunk size used when streaming payloads
pub const TRANSFER_CHUNK_SIZE: usize = 4096;

/// Default server port
pub const DEFAULT_PORT: u16 = 9000;

/// Default listen backlog
pub const DEFAULT_BACKLOG: u32 = 16;
