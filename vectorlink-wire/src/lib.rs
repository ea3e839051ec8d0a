//! Wire-level building blocks for the overlay path-vector router: overlay
//! addresses and prefixes, the binary packet header, and the control-plane
//! payload grammar (`RPv0`). Kept in its own crate so both the forwarding
//! plane and the routing plane depend on a single parsed representation
//! rather than re-parsing strings at each call site.

pub mod addr;
pub mod control;
pub mod packet;

pub use addr::{AddrParseError, OverlayAddr, Prefix};
pub use control::{ControlBody, ControlParseError};
pub use packet::{Packet, Protocol, HEADER_LEN, MAX_PACKET_LEN};

#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("datagram too short: {0} bytes")]
    TooShort(usize),
    #[error("datagram too large: {0} bytes (max {MAX_PACKET_LEN})")]
    TooLarge(usize),
    #[error("payload is not US-ASCII")]
    NotAscii,
    #[error("unknown protocol byte: {0}")]
    UnknownProtocol(u8),
    #[error(transparent)]
    Addr(#[from] AddrParseError),
    #[error(transparent)]
    Control(#[from] ControlParseError),
}
