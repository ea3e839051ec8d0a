//! The 10-byte binary packet header and its US-ASCII payload.

use byteorder::{BigEndian, ByteOrder};
use bytes::{BufMut, BytesMut};
use strum::FromRepr;

use crate::addr::OverlayAddr;
use crate::WireError;

pub const HEADER_LEN: usize = 10;
pub const MAX_PACKET_LEN: usize = 1400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRepr)]
#[repr(u8)]
pub enum Protocol {
    Data = 1,
    Control = 2,
}

/// A decoded overlay packet: 10-byte header plus an ASCII payload.
///
/// `ttl` is treated as an unsigned 8-bit counter (spec.md's Open Questions:
/// the original used a signed byte for a field with unsigned semantics).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub protocol: Protocol,
    pub ttl: u8,
    pub src_adr: OverlayAddr,
    pub dest_adr: OverlayAddr,
    pub payload: String,
}

impl Packet {
    pub fn new(
        protocol: Protocol,
        ttl: u8,
        src_adr: OverlayAddr,
        dest_adr: OverlayAddr,
        payload: impl Into<String>,
    ) -> Self {
        Packet {
            protocol,
            ttl,
            src_adr,
            dest_adr,
            payload: payload.into(),
        }
    }

    /// Serializes this packet to its wire form: 10-byte big-endian header
    /// followed by the raw payload bytes.
    pub fn encode(&self) -> Result<Vec<u8>, WireError> {
        if !self.payload.is_ascii() {
            return Err(WireError::NotAscii);
        }
        let total = HEADER_LEN + self.payload.len();
        if total > MAX_PACKET_LEN {
            return Err(WireError::TooLarge(total));
        }
        let mut buf = BytesMut::with_capacity(total);
        buf.put_u8(self.protocol as u8);
        buf.put_u8(self.ttl);
        buf.put_u32(self.src_adr.0);
        buf.put_u32(self.dest_adr.0);
        buf.put_slice(self.payload.as_bytes());
        Ok(buf.to_vec())
    }

    /// Parses a wire-form datagram back into a [`Packet`].
    pub fn decode(bytes: &[u8]) -> Result<Self, WireError> {
        if bytes.len() < HEADER_LEN {
            return Err(WireError::TooShort(bytes.len()));
        }
        if bytes.len() > MAX_PACKET_LEN {
            return Err(WireError::TooLarge(bytes.len()));
        }
        let protocol = Protocol::from_repr(bytes[0]).ok_or(WireError::UnknownProtocol(bytes[0]))?;
        let ttl = bytes[1];
        let src_adr = OverlayAddr(BigEndian::read_u32(&bytes[2..6]));
        let dest_adr = OverlayAddr(BigEndian::read_u32(&bytes[6..10]));
        let payload_bytes = &bytes[HEADER_LEN..];
        if !payload_bytes.is_ascii() {
            return Err(WireError::NotAscii);
        }
        let payload = String::from_utf8_lossy(payload_bytes).into_owned();
        Ok(Packet {
            protocol,
            ttl,
            src_adr,
            dest_adr,
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_roundtrip() {
        let p = Packet::new(
            Protocol::Data,
            99,
            OverlayAddr(0x0102_0304),
            OverlayAddr(0x0A0B_0C0D),
            "hello world",
        );
        let wire = p.encode().unwrap();
        assert_eq!(wire.len(), HEADER_LEN + "hello world".len());
        let decoded = Packet::decode(&wire).unwrap();
        assert_eq!(decoded, p);
    }

    #[test]
    fn header_layout_is_big_endian() {
        let p = Packet::new(
            Protocol::Control,
            5,
            OverlayAddr(1),
            OverlayAddr(2),
            "x",
        );
        let wire = p.encode().unwrap();
        assert_eq!(wire[0], 2); // protocol
        assert_eq!(wire[1], 5); // ttl
        assert_eq!(&wire[2..6], &[0, 0, 0, 1]); // srcAdr
        assert_eq!(&wire[6..10], &[0, 0, 0, 2]); // destAdr
        assert_eq!(&wire[10..], b"x");
    }

    #[test]
    fn rejects_too_short() {
        assert!(Packet::decode(&[0u8; 4]).is_err());
    }

    #[test]
    fn rejects_oversized_payload() {
        let p = Packet::new(
            Protocol::Data,
            1,
            OverlayAddr(0),
            OverlayAddr(0),
            "a".repeat(MAX_PACKET_LEN),
        );
        assert!(p.encode().is_err());
    }

    #[test]
    fn rejects_unknown_protocol_byte() {
        let mut wire = vec![0u8; HEADER_LEN];
        wire[0] = 77;
        assert!(Packet::decode(&wire).is_err());
    }
}
