//! DIO (DODAG Information Object) — the advertisement message, RFC 6550 §6.3.1.

use super::options::{write_option, OptionsIter, RplOption};
use super::util::*;
use crate::lollipop::Lollipop;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::net::Ipv6Addr;

const GROUNDED_MASK: u8 = 0x80;
const MOP_MASK: u8 = 0x38;
const MOP_SHIFT: u8 = 3;
const PREF_MASK: u8 = 0x07;

/// Mode of Operation advertised in a DIO's flags byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeOfOperation {
    NoDownwardRoutes,
    NonStoring,
    Storing,
    StoringWithMulticast,
    /// Any MOP value this codec doesn't special-case; carried so unknown
    /// peers' DIOs still decode instead of being rejected outright.
    Other(u8),
}

impl ModeOfOperation {
    fn from_wire(v: u8) -> ModeOfOperation {
        match v {
            0 => ModeOfOperation::NoDownwardRoutes,
            1 => ModeOfOperation::NonStoring,
            2 => ModeOfOperation::Storing,
            3 => ModeOfOperation::StoringWithMulticast,
            other => ModeOfOperation::Other(other),
        }
    }

    fn to_wire(self) -> u8 {
        match self {
            ModeOfOperation::NoDownwardRoutes => 0,
            ModeOfOperation::NonStoring => 1,
            ModeOfOperation::Storing => 2,
            ModeOfOperation::StoringWithMulticast => 3,
            ModeOfOperation::Other(v) => v,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dio {
    pub instance_id: u8,
    pub version: Lollipop,
    pub rank: u16,
    pub grounded: bool,
    pub mop: ModeOfOperation,
    pub preference: u8,
    pub dtsn: Lollipop,
    pub dag_id: Ipv6Addr,
    /// Options in wire order. Unrecognized option types are kept as
    /// `RplOption::Unknown` so re-encoding is still faithful.
    pub options: Vec<RplOption>,
}

impl Dio {
    pub fn parse(mut buf: Bytes) -> Result<Dio, WireError> {
        let instance_id = read_u8(&mut buf)?;
        let version = Lollipop::new(read_u8(&mut buf)?);
        let rank = read_u16(&mut buf)?;
        let flags = read_u8(&mut buf)?;
        let dtsn = Lollipop::new(read_u8(&mut buf)?);
        ensure_remaining!(buf, 2);
        buf.advance(2); // reserved
        let dag_id = read_ipv6(&mut buf)?;

        let grounded = flags & GROUNDED_MASK != 0;
        let mop = ModeOfOperation::from_wire((flags & MOP_MASK) >> MOP_SHIFT);
        let preference = flags & PREF_MASK;

        let mut options = Vec::new();
        for opt in OptionsIter::new(buf) {
            options.push(opt?);
        }

        Ok(Dio {
            instance_id,
            version,
            rank,
            grounded,
            mop,
            preference,
            dtsn,
            dag_id,
            options,
        })
    }

    pub fn write_to(&self, out: &mut BytesMut) {
        out.put_u8(self.instance_id);
        out.put_u8(self.version.value());
        out.put_u16(self.rank);
        let flags = (if self.grounded { GROUNDED_MASK } else { 0 })
            | ((self.mop.to_wire() << MOP_SHIFT) & MOP_MASK)
            | (self.preference & PREF_MASK);
        out.put_u8(flags);
        out.put_u8(self.dtsn.value());
        out.put_u16(0); // reserved
        put_ipv6(out, &self.dag_id);
        for opt in &self.options {
            write_option(out, opt);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::options::{DagConf, MetricContainer, MetricContainerType, MetricValue};

    fn sample() -> Dio {
        Dio {
            instance_id: 30,
            version: Lollipop::new(240),
            rank: 512,
            grounded: true,
            mop: ModeOfOperation::Storing,
            preference: 5,
            dtsn: Lollipop::new(241),
            dag_id: "2001:db8::1".parse().unwrap(),
            options: vec![
                RplOption::DagMetricContainer(MetricContainer {
                    mc_type: MetricContainerType::Etx,
                    flags: 0,
                    aggregation: 0,
                    precedence: 0,
                    value: MetricValue::Etx(384),
                }),
                RplOption::DagConf(DagConf {
                    path_control: 0,
                    dio_interval_doublings: 20,
                    dio_interval_min: 3,
                    dio_redundancy: 10,
                    max_rankinc: 0,
                    min_hoprankinc: 256,
                    ocp: 1,
                    default_lifetime: 0xff,
                    lifetime_unit: 0xffff,
                }),
            ],
        }
    }

    #[test]
    fn round_trips() {
        let dio = sample();
        let mut buf = BytesMut::new();
        dio.write_to(&mut buf);
        let decoded = Dio::parse(buf.freeze()).unwrap();
        assert_eq!(decoded, dio);
    }

    #[test]
    fn flags_byte_bit_layout() {
        let dio = sample();
        let mut buf = BytesMut::new();
        dio.write_to(&mut buf);
        // byte offset 4 is the G|MOP|Prf flags byte.
        let flags = buf[4];
        assert_eq!(flags & GROUNDED_MASK, GROUNDED_MASK);
        assert_eq!((flags & MOP_MASK) >> MOP_SHIFT, 2); // Storing
        assert_eq!(flags & PREF_MASK, 5);
    }

    #[test]
    fn truncated_base_is_rejected() {
        let buf = Bytes::from_static(&[1, 2, 3]);
        assert!(matches!(Dio::parse(buf), Err(WireError::Truncated)));
    }

    #[test]
    fn metric_container_overrun_rejects_whole_message() {
        let mut buf = BytesMut::new();
        buf.put_u8(30); // instance_id
        buf.put_u8(240); // version
        buf.put_u16(0); // rank
        buf.put_u8(0); // flags
        buf.put_u8(240); // dtsn
        buf.put_u16(0); // reserved
        put_ipv6(&mut buf, &"2001:db8::1".parse().unwrap());
        buf.put_u8(2); // DAG_METRIC_CONTAINER
        buf.put_u8(200); // declared length, far past what follows
        buf.put_u8(2);
        let err = Dio::parse(buf.freeze()).unwrap_err();
        assert!(matches!(err, WireError::OptionOverrun { .. }));
    }
}
