//! DIS (DODAG Information Solicitation), RFC 6550 §6.2.1. Payload is just
//! a flags octet (currently unused) and a reserved octet.

use super::util::*;
use bytes::{Buf, BufMut, Bytes, BytesMut};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Dis {
    pub flags: u8,
}

impl Dis {
    pub fn parse(mut buf: Bytes) -> Result<Dis, WireError> {
        let flags = read_u8(&mut buf)?;
        if buf.remaining() >= 1 {
            buf.advance(1); // reserved
        }
        Ok(Dis { flags })
    }

    pub fn write_to(&self, out: &mut BytesMut) {
        out.put_u8(self.flags);
        out.put_u8(0); // reserved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let dis = Dis { flags: 0 };
        let mut buf = BytesMut::new();
        dis.write_to(&mut buf);
        assert_eq!(Dis::parse(buf.freeze()).unwrap(), dis);
    }

    #[test]
    fn truncated_is_rejected() {
        assert!(matches!(Dis::parse(Bytes::new()), Err(WireError::Truncated)));
    }
}
