//! Header codec for encoding and decoding packet headers

use crate::error::{ProtocolError, Result};
use crate::protocol::PacketHeader;
use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

/// Codec for the fixed-size packet header.
///
/// Only the header is framed here. Filename and payload bytes follow on the
/// stream and are read by the caller, since payloads may be arbitrarily large.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeaderCodec;

impl Decoder for HeaderCodec {
    type Item = PacketHeader;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        if src.len() < PacketHeader::SIZE {
            src.reserve(PacketHeader::SIZE - src.len());
            return Ok(None);
        }

        let header = PacketHeader::from_bytes(&src[..PacketHeader::SIZE])?;
        src.advance(PacketHeader::SIZE);

        // Reject before the caller reads anything that follows
        header.validate()?;

        Ok(Some(header))
    }
}

impl Encoder<PacketHeader> for HeaderCodec {
    type Error = ProtocolError;

    fn encode(&mut self, item: PacketHeader, dst: &mut BytesMut) -> Result<()> {
        dst.reserve(PacketHeader::SIZE);
        item.to_bytes(dst);
        Ok(())
    }
}
