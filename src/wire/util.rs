//! Byte-level helpers shared by every message codec in this module.
//!
//! Every field on the wire is big-endian, so these helpers don't need to
//! carry an endianness parameter.

use bytes::{Buf, BufMut, BytesMut};
use std::net::Ipv6Addr;
use thiserror::Error;

/// A message is corrupt. The caller discards it and counts it as malformed;
/// nothing here is fatal to the node.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum WireError {
    #[error("message ended before a fixed-size field could be read")]
    Truncated,
    #[error("option declared length {declared} but only {remaining} bytes remained")]
    OptionOverrun { declared: usize, remaining: usize },
    #[error("option had an illegal fixed length: {0}")]
    BadOptionLength(usize),
    #[error("unrecognized metric-container type {0}")]
    UnknownMetricContainerType(u8),
}

macro_rules! ensure_remaining {
    ($buf:expr, $len:expr) => {
        if $buf.remaining() < $len {
            return Err(WireError::Truncated);
        }
    };
}
pub(crate) use ensure_remaining;

pub(crate) fn read_u16<T: Buf>(buf: &mut T) -> Result<u16, WireError> {
    ensure_remaining!(buf, 2);
    Ok(buf.get_u16())
}

pub(crate) fn read_u32<T: Buf>(buf: &mut T) -> Result<u32, WireError> {
    ensure_remaining!(buf, 4);
    Ok(buf.get_u32())
}

pub(crate) fn read_u8<T: Buf>(buf: &mut T) -> Result<u8, WireError> {
    ensure_remaining!(buf, 1);
    Ok(buf.get_u8())
}

pub(crate) fn read_ipv6<T: Buf>(buf: &mut T) -> Result<Ipv6Addr, WireError> {
    ensure_remaining!(buf, 16);
    let mut octets = [0u8; 16];
    buf.copy_to_slice(&mut octets);
    Ok(Ipv6Addr::from(octets))
}

pub(crate) fn put_ipv6(out: &mut BytesMut, addr: &Ipv6Addr) {
    out.put_slice(&addr.octets());
}

/// Number of octets needed to hold `prefix_len` bits, RPL's TARGET/ROUTE_INFO
/// prefix encoding (`ceil(prefix_len / 8)`).
pub(crate) fn prefix_octets(prefix_len: u8) -> usize {
    (usize::from(prefix_len) + 7) / 8
}

/// Read `prefix_octets(prefix_len)` bytes into a zero-padded 16-byte prefix,
/// as the reference implementation's `memcpy(&prefix, ..., (len+7)/8)` does.
pub(crate) fn read_prefix<T: Buf>(buf: &mut T, prefix_len: u8) -> Result<Ipv6Addr, WireError> {
    let n = prefix_octets(prefix_len);
    ensure_remaining!(buf, n);
    let mut octets = [0u8; 16];
    buf.copy_to_slice(&mut octets[..n]);
    Ok(Ipv6Addr::from(octets))
}

pub(crate) fn put_prefix(out: &mut BytesMut, addr: &Ipv6Addr, prefix_len: u8) {
    let n = prefix_octets(prefix_len);
    out.put_slice(&addr.octets()[..n]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_octets_rounds_up() {
        assert_eq!(prefix_octets(0), 0);
        assert_eq!(prefix_octets(1), 1);
        assert_eq!(prefix_octets(8), 1);
        assert_eq!(prefix_octets(9), 2);
        assert_eq!(prefix_octets(128), 16);
    }

    #[test]
    fn read_u16_truncated() {
        let mut buf: &[u8] = &[0x01];
        assert_eq!(read_u16(&mut buf), Err(WireError::Truncated));
    }
}
