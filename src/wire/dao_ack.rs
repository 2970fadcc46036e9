//! DAO-ACK, RFC 6550 §6.4.3. DCO-ACK shares this exact wire shape, so
//! [`DaoAck`] is reused for both; the caller distinguishes them by the
//! ICMPv6 code the message arrived with.

use super::util::*;
use crate::lollipop::Lollipop;
use crate::wire::AckStatus;
use bytes::{Buf, BufMut, Bytes, BytesMut};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DaoAck {
    pub instance_id: u8,
    pub sequence: Lollipop,
    pub status: AckStatus,
}

impl DaoAck {
    pub fn parse(mut buf: Bytes) -> Result<DaoAck, WireError> {
        let instance_id = read_u8(&mut buf)?;
        ensure_remaining!(buf, 1);
        buf.advance(1); // reserved
        let sequence = Lollipop::new(read_u8(&mut buf)?);
        let status = AckStatus::from_wire(read_u8(&mut buf)?);
        Ok(DaoAck {
            instance_id,
            sequence,
            status,
        })
    }

    pub fn write_to(&self, out: &mut BytesMut) {
        out.put_u8(self.instance_id);
        out.put_u8(0); // reserved
        out.put_u8(self.sequence.value());
        out.put_u8(self.status.to_wire());
    }

    /// Offset of the `Sequence` byte — the forwarding path rewrites it in
    /// place when relaying an ACK toward the original requester.
    pub const SEQUENCE_OFFSET: usize = 2;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let ack = DaoAck {
            instance_id: 30,
            sequence: Lollipop::new(201),
            status: AckStatus::UnableToAccept,
        };
        let mut buf = BytesMut::new();
        ack.write_to(&mut buf);
        let decoded = DaoAck::parse(buf.freeze()).unwrap();
        assert_eq!(decoded, ack);
        assert!(decoded.status.is_nack());
    }

    #[test]
    fn truncated_is_rejected() {
        let buf = Bytes::from_static(&[30, 0]);
        assert!(matches!(DaoAck::parse(buf), Err(WireError::Truncated)));
    }
}
