//! Packet header

use super::constants::{MAX_FILENAME_LEN, PROTOCOL_MAGIC, PROTOCOL_VERSION};
use super::types::Command;
use crate::error::{ProtocolError, Result};
use bytes::{Buf, BufMut};

/// Packet header structure (18 bytes, big-endian on the wire)
///
/// Fields hold the raw wire values so that a received header can be
/// validated before it is trusted. Use [`PacketHeader::build`] to create
/// outgoing headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    /// Constant sentinel, [`PROTOCOL_MAGIC`]
    pub magic: u32,

    /// Protocol version, [`PROTOCOL_VERSION`]
    pub version: u8,

    /// Raw command byte
    pub command: u8,

    /// Length of the filename following the header
    pub filename_len: u32,

    /// Length of the payload following the filename
    pub payload_len: u64,
}

impl PacketHeader {
    /// Size of the packet header in bytes
    pub const SIZE: usize = 18;

    /// Build a header for an outgoing frame.
    ///
    /// An empty `filename` means the frame carries none.
    pub fn build(command: Command, filename: &str, payload_len: u64) -> Result<Self> {
        if filename.len() > MAX_FILENAME_LEN {
            return Err(ProtocolError::InvalidArgument(format!(
                "filename is {} bytes (max: {})",
                filename.len(),
                MAX_FILENAME_LEN
            )));
        }

        Ok(Self {
            magic: PROTOCOL_MAGIC,
            version: PROTOCOL_VERSION,
            command: command.to_u8(),
            filename_len: filename.len() as u32,
            payload_len,
        })
    }

    /// Check that the header is well-formed
    pub fn validate(&self) -> Result<()> {
        if self.magic != PROTOCOL_MAGIC {
            return Err(ProtocolError::BadMagic(self.magic));
        }

        if self.version != PROTOCOL_VERSION {
            return Err(ProtocolError::BadVersion(self.version));
        }

        if Command::from_u8(self.command).is_none() {
            return Err(ProtocolError::BadCommand(self.command));
        }

        if self.filename_len as usize > MAX_FILENAME_LEN {
            return Err(ProtocolError::FilenameTooLong {
                len: u64::from(self.filename_len),
                max: MAX_FILENAME_LEN,
            });
        }

        Ok(())
    }

    /// Typed command
    pub fn command(&self) -> Result<Command> {
        Command::from_u8(self.command).ok_or(ProtocolError::BadCommand(self.command))
    }

    /// Parse a packet header from bytes
    pub fn from_bytes(mut buf: &[u8]) -> std::result::Result<Self, std::io::Error> {
        if buf.len() < Self::SIZE {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "Not enough bytes for packet header",
            ));
        }

        Ok(Self {
            magic: buf.get_u32(),
            version: buf.get_u8(),
            command: buf.get_u8(),
            filename_len: buf.get_u32(),
            payload_len: buf.get_u64(),
        })
    }

    /// Encode the packet header to bytes
    pub fn to_bytes(&self, buf: &mut impl BufMut) {
        buf.put_u32(self.magic);
        buf.put_u8(self.version);
        buf.put_u8(self.command);
        buf.put_u32(self.filename_len);
        buf.put_u64(self.payload_len);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    fn encode(header: &PacketHeader) -> BytesMut {
        let mut buf = BytesMut::new();
        header.to_bytes(&mut buf);
        buf
    }

    #[test]
    fn test_build_fills_magic_and_version() {
        let header = PacketHeader::build(Command::Upload, "notes.txt", 42).unwrap();
        assert_eq!(header.magic, PROTOCOL_MAGIC);
        assert_eq!(header.version, PROTOCOL_VERSION);
        assert_eq!(header.command, 1);
        assert_eq!(header.filename_len, 9);
        assert_eq!(header.payload_len, 42);
    }

    #[test]
    fn test_build_rejects_long_filename() {
        let name = "a".repeat(MAX_FILENAME_LEN + 1);
        let err = PacketHeader::build(Command::Upload, &name, 0).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidArgument(_)));

        let name = "a".repeat(MAX_FILENAME_LEN);
        assert!(PacketHeader::build(Command::Upload, &name, 0).is_ok());
    }

    #[test]
    fn test_wire_layout_is_big_endian() {
        let header = PacketHeader::build(Command::List, "ab", 0x0102_0304_0506_0708).unwrap();
        let buf = encode(&header);

        assert_eq!(buf.len(), PacketHeader::SIZE);
        assert_eq!(
            &buf[..],
            &[
                0x4D, 0x43, 0x4C, 0x44, // magic
                0x01, // version
                0x03, // command
                0x00, 0x00, 0x00, 0x02, // filename_len
                0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, // payload_len
            ]
        );
    }

    #[test]
    fn test_round_trip_preserves_fields() {
        let cases = [
            (Command::Error, "", 0u64),
            (Command::Upload, "report.pdf", 1 << 40),
            (Command::Download, "x", 0),
            (Command::Auth, "", 256),
            (Command::Quit, "", u64::MAX),
        ];

        for (command, filename, payload_len) in cases {
            let header = PacketHeader::build(command, filename, payload_len).unwrap();
            let parsed = PacketHeader::from_bytes(&encode(&header)).unwrap();
            parsed.validate().unwrap();
            assert_eq!(parsed, header);
            assert_eq!(parsed.command().unwrap(), command);
        }
    }

    #[test]
    fn test_validate_reports_each_failure() {
        let good = PacketHeader::build(Command::List, "", 0).unwrap();

        let header = PacketHeader { magic: 0xDEAD_BEEF, ..good };
        assert!(matches!(header.validate(), Err(ProtocolError::BadMagic(0xDEAD_BEEF))));

        let header = PacketHeader { version: 2, ..good };
        assert!(matches!(header.validate(), Err(ProtocolError::BadVersion(2))));

        let header = PacketHeader { command: 9, ..good };
        assert!(matches!(header.validate(), Err(ProtocolError::BadCommand(9))));

        let header = PacketHeader { filename_len: 256, ..good };
        assert!(matches!(
            header.validate(),
            Err(ProtocolError::FilenameTooLong { len: 256, max: 255 })
        ));
    }

    #[test]
    fn test_from_bytes_needs_full_header() {
        let err = PacketHeader::from_bytes(&[0u8; PacketHeader::SIZE - 1]).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::UnexpectedEof);
    }
}
