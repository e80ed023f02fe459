//! Command enumeration

use crate::error::ProtocolError;
use std::fmt;

/// Protocol commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Command {
    Error = 0,
    Upload = 1,
    Download = 2,
    List = 3,
    Quit = 4,
    Auth = 5,
}

impl Command {
    /// Convert from u8
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Error),
            1 => Some(Self::Upload),
            2 => Some(Self::Download),
            3 => Some(Self::List),
            4 => Some(Self::Quit),
            5 => Some(Self::Auth),
            _ => None,
        }
    }

    /// Convert to u8
    #[inline]
    pub const fn to_u8(self) -> u8 {
        self as u8
    }

    /// Wire name, as used in logs
    pub const fn name(self) -> &'static str {
        match self {
            Self::Error => "ERROR",
            Self::Upload => "UPLOAD",
            Self::Download => "DOWNLOAD",
            Self::List => "LIST",
            Self::Quit => "QUIT",
            Self::Auth => "AUTH",
        }
    }
}

impl From<Command> for u8 {
    #[inline]
    fn from(value: Command) -> Self {
        value.to_u8()
    }
}

impl TryFrom<u8> for Command {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, ProtocolError> {
        Command::from_u8(value)
            .ok_or_else(|| ProtocolError::InvalidArgument(format!("unknown command {value}")))
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
