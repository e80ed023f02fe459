//! Protocol definitions and structures

pub mod constants;
pub mod header;
pub mod types;

pub use constants::*;
pub use header::PacketHeader;
pub use types::Command;
