//! TLV option stream used inside DIO/DAO/DCO payloads.
//!
//! Reformulated from the reference implementation's inline
//! `for (i = pos; i < buffer_length; i += len)` loop (see
//! `original_source/rpl/rpl-icmp6.c`) as a pull-style iterator: each `next()`
//! call yields one typed option record, or a single `WireError` if the
//! stream is corrupt. Handlers then `match` on the variants they care about
//! and ignore the rest, so a caller can `for opt in OptionsIter::new(body)
//! { ... }`.

use super::util::*;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::net::Ipv6Addr;

pub const OPT_PAD1: u8 = 0x00;
pub const OPT_DAG_METRIC_CONTAINER: u8 = 2;
pub const OPT_ROUTE_INFO: u8 = 3;
pub const OPT_DAG_CONF: u8 = 4;
pub const OPT_TARGET: u8 = 5;
pub const OPT_TRANSIT: u8 = 6;
pub const OPT_PREFIX_INFO: u8 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricContainerType {
    None,
    Etx,
    Energy,
}

impl MetricContainerType {
    pub fn from_wire(v: u8) -> Option<MetricContainerType> {
        match v {
            0 => Some(MetricContainerType::None),
            2 => Some(MetricContainerType::Etx),
            7 => Some(MetricContainerType::Energy),
            _ => None,
        }
    }

    pub fn to_wire(self) -> u8 {
        match self {
            MetricContainerType::None => 0,
            MetricContainerType::Etx => 2,
            MetricContainerType::Energy => 7,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricValue {
    None,
    Etx(u16),
    Energy { flags: u8, energy_est: u8 },
}

/// `DAG_METRIC_CONTAINER` option (type 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricContainer {
    pub mc_type: MetricContainerType,
    pub flags: u8,
    pub aggregation: u8,
    pub precedence: u8,
    pub value: MetricValue,
}

/// `ROUTE_INFO` option (type 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteInfo {
    pub prefix_len: u8,
    pub flags: u8,
    pub lifetime: u32,
    pub prefix: Ipv6Addr,
}

/// `DAG_CONF` option (type 4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DagConf {
    pub path_control: u8,
    pub dio_interval_doublings: u8,
    pub dio_interval_min: u8,
    pub dio_redundancy: u8,
    pub max_rankinc: u16,
    pub min_hoprankinc: u16,
    pub ocp: u16,
    pub default_lifetime: u8,
    pub lifetime_unit: u16,
}

/// `TARGET` option (type 5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    pub prefix_len: u8,
    pub prefix: Ipv6Addr,
}

/// `TRANSIT` option (type 6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transit {
    pub flags: u8,
    pub path_control: u8,
    pub path_sequence: u8,
    pub path_lifetime: u8,
    /// Present only in non-storing mode, when the option is at least 20
    /// bytes long.
    pub parent_address: Option<Ipv6Addr>,
}

/// `PREFIX_INFO` option (type 8).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefixInfo {
    pub prefix_len: u8,
    pub flags: u8,
    pub valid_lifetime: u32,
    pub preferred_lifetime: u32,
    pub prefix: Ipv6Addr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RplOption {
    DagMetricContainer(MetricContainer),
    RouteInfo(RouteInfo),
    DagConf(DagConf),
    Target(Target),
    Transit(Transit),
    PrefixInfo(PrefixInfo),
    /// A recognized-format-but-unrecognized-type option, or one we don't
    /// interpret. Carried so a caller can still see it went by; handlers
    /// ignore it — unknown option types are skipped, they do not cause
    /// discard.
    Unknown { option_type: u8, payload: Bytes },
}

/// Pull iterator over an option stream. Stops (returning `None`) once the
/// buffer is exhausted; returns `Some(Err(_))` exactly once if a malformed
/// option is found, after which the caller should discard the whole
/// message: any option whose declared length would extend past the
/// payload end causes the whole message to be rejected as malformed.
pub struct OptionsIter<B> {
    buf: B,
    errored: bool,
}

impl<B: Buf> OptionsIter<B> {
    pub fn new(buf: B) -> Self {
        OptionsIter {
            buf,
            errored: false,
        }
    }
}

impl<B: Buf> Iterator for OptionsIter<B> {
    type Item = Result<RplOption, WireError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.errored || self.buf.remaining() == 0 {
            return None;
        }
        match self.parse_one() {
            Ok(opt) => Some(Ok(opt)),
            Err(e) => {
                self.errored = true;
                Some(Err(e))
            }
        }
    }
}

impl<B: Buf> OptionsIter<B> {
    fn parse_one(&mut self) -> Result<RplOption, WireError> {
        let buf = &mut self.buf;
        let option_type = read_u8(buf)?;
        if option_type == OPT_PAD1 {
            return Ok(RplOption::Unknown {
                option_type: OPT_PAD1,
                payload: Bytes::new(),
            });
        }
        let len = usize::from(read_u8(buf)?);
        if buf.remaining() < len {
            return Err(WireError::OptionOverrun {
                declared: len,
                remaining: buf.remaining(),
            });
        }
        let payload = buf.copy_to_bytes(len);
        let mut p = &payload[..];
        match option_type {
            OPT_DAG_METRIC_CONTAINER => parse_metric_container(&mut p).map(RplOption::DagMetricContainer),
            OPT_ROUTE_INFO => parse_route_info(&mut p, len).map(RplOption::RouteInfo),
            OPT_DAG_CONF => parse_dag_conf(&mut p, len).map(RplOption::DagConf),
            OPT_TARGET => parse_target(&mut p, len).map(RplOption::Target),
            OPT_TRANSIT => parse_transit(&mut p, len).map(RplOption::Transit),
            OPT_PREFIX_INFO => parse_prefix_info(&mut p, len).map(RplOption::PrefixInfo),
            _ => Ok(RplOption::Unknown { option_type, payload }),
        }
    }
}

fn parse_metric_container(p: &mut &[u8]) -> Result<MetricContainer, WireError> {
    if p.remaining() < 3 {
        return Err(WireError::BadOptionLength(p.remaining()));
    }
    let mc_type_byte = read_u8(p)?;
    let byte3 = read_u8(p)?;
    let byte4 = read_u8(p)?;
    let flags = (byte3 << 1) | (byte4 >> 7);
    let aggregation = (byte4 >> 4) & 0x3;
    let precedence = byte4 & 0xf;
    let mc_type = MetricContainerType::from_wire(mc_type_byte)
        .ok_or(WireError::UnknownMetricContainerType(mc_type_byte))?;
    let value = match mc_type {
        MetricContainerType::None => MetricValue::None,
        MetricContainerType::Etx => {
            let mc_len = read_u8(p)?;
            if mc_len != 2 || p.remaining() < 2 {
                return Err(WireError::BadOptionLength(usize::from(mc_len)));
            }
            MetricValue::Etx(read_u16(p)?)
        }
        MetricContainerType::Energy => {
            let mc_len = read_u8(p)?;
            if mc_len != 2 || p.remaining() < 2 {
                return Err(WireError::BadOptionLength(usize::from(mc_len)));
            }
            let flags = read_u8(p)?;
            let energy_est = read_u8(p)?;
            MetricValue::Energy { flags, energy_est }
        }
    };
    Ok(MetricContainer {
        mc_type,
        flags,
        aggregation,
        precedence,
        value,
    })
}

fn parse_route_info(p: &mut &[u8], len: usize) -> Result<RouteInfo, WireError> {
    if len < 6 {
        return Err(WireError::BadOptionLength(len));
    }
    let prefix_len = read_u8(p)?;
    let flags = read_u8(p)?;
    let lifetime = read_u32(p)?;
    let prefix = read_prefix(p, prefix_len)?;
    Ok(RouteInfo {
        prefix_len,
        flags,
        lifetime,
        prefix,
    })
}

fn parse_dag_conf(p: &mut &[u8], len: usize) -> Result<DagConf, WireError> {
    if len != 14 {
        return Err(WireError::BadOptionLength(len));
    }
    let path_control = read_u8(p)?;
    let dio_interval_doublings = read_u8(p)?;
    let dio_interval_min = read_u8(p)?;
    let dio_redundancy = read_u8(p)?;
    let max_rankinc = read_u16(p)?;
    let min_hoprankinc = read_u16(p)?;
    let ocp = read_u16(p)?;
    let _reserved = read_u8(p)?;
    let default_lifetime = read_u8(p)?;
    let lifetime_unit = read_u16(p)?;
    Ok(DagConf {
        path_control,
        dio_interval_doublings,
        dio_interval_min,
        dio_redundancy,
        max_rankinc,
        min_hoprankinc,
        ocp,
        default_lifetime,
        lifetime_unit,
    })
}

fn parse_target(p: &mut &[u8], len: usize) -> Result<Target, WireError> {
    if len < 2 {
        return Err(WireError::BadOptionLength(len));
    }
    let _flags = read_u8(p)?;
    let prefix_len = read_u8(p)?;
    let prefix = read_prefix(p, prefix_len)?;
    Ok(Target { prefix_len, prefix })
}

fn parse_transit(p: &mut &[u8], len: usize) -> Result<Transit, WireError> {
    if len < 4 {
        return Err(WireError::BadOptionLength(len));
    }
    let flags = read_u8(p)?;
    let path_control = read_u8(p)?;
    let path_sequence = read_u8(p)?;
    let path_lifetime = read_u8(p)?;
    let parent_address = if len >= 20 {
        Some(read_ipv6(p)?)
    } else {
        None
    };
    Ok(Transit {
        flags,
        path_control,
        path_sequence,
        path_lifetime,
        parent_address,
    })
}

fn parse_prefix_info(p: &mut &[u8], len: usize) -> Result<PrefixInfo, WireError> {
    if len != 30 {
        return Err(WireError::BadOptionLength(len));
    }
    let prefix_len = read_u8(p)?;
    let flags = read_u8(p)?;
    let valid_lifetime = read_u32(p)?;
    let preferred_lifetime = read_u32(p)?;
    let _reserved = read_u32(p)?;
    let prefix = read_ipv6(p)?;
    Ok(PrefixInfo {
        prefix_len,
        flags,
        valid_lifetime,
        preferred_lifetime,
        prefix,
    })
}

/// Encode one option back onto the wire. The inverse of [`OptionsIter`];
/// `Unknown` options round-trip their raw payload verbatim.
pub fn write_option(out: &mut BytesMut, opt: &RplOption) {
    match opt {
        RplOption::Unknown { option_type: OPT_PAD1, .. } => out.put_u8(OPT_PAD1),
        RplOption::Unknown { option_type, payload } => {
            out.put_u8(*option_type);
            out.put_u8(payload.len() as u8);
            out.put_slice(payload);
        }
        RplOption::DagMetricContainer(mc) => {
            let (mc_len, value_bytes): (u8, [u8; 2]) = match mc.value {
                MetricValue::None => (0, [0, 0]),
                MetricValue::Etx(v) => (2, v.to_be_bytes()),
                MetricValue::Energy { flags, energy_est } => (2, [flags, energy_est]),
            };
            out.put_u8(OPT_DAG_METRIC_CONTAINER);
            out.put_u8(4 + mc_len);
            out.put_u8(mc.mc_type.to_wire());
            out.put_u8(mc.flags >> 1);
            out.put_u8(((mc.flags & 1) << 7) | ((mc.aggregation & 0x3) << 4) | (mc.precedence & 0xf));
            if mc_len > 0 {
                out.put_u8(mc_len);
                out.put_slice(&value_bytes[..usize::from(mc_len)]);
            }
        }
        RplOption::RouteInfo(ri) => {
            let n = prefix_octets(ri.prefix_len);
            out.put_u8(OPT_ROUTE_INFO);
            out.put_u8((2 + 4 + n) as u8);
            out.put_u8(ri.prefix_len);
            out.put_u8(ri.flags);
            out.put_u32(ri.lifetime);
            put_prefix(out, &ri.prefix, ri.prefix_len);
        }
        RplOption::DagConf(dc) => {
            out.put_u8(OPT_DAG_CONF);
            out.put_u8(14);
            out.put_u8(dc.path_control);
            out.put_u8(dc.dio_interval_doublings);
            out.put_u8(dc.dio_interval_min);
            out.put_u8(dc.dio_redundancy);
            out.put_u16(dc.max_rankinc);
            out.put_u16(dc.min_hoprankinc);
            out.put_u16(dc.ocp);
            out.put_u8(0); // reserved
            out.put_u8(dc.default_lifetime);
            out.put_u16(dc.lifetime_unit);
        }
        RplOption::Target(t) => {
            let n = prefix_octets(t.prefix_len);
            out.put_u8(OPT_TARGET);
            out.put_u8((2 + n) as u8);
            out.put_u8(0); // flags, always 0
            out.put_u8(t.prefix_len);
            put_prefix(out, &t.prefix, t.prefix_len);
        }
        RplOption::Transit(t) => {
            out.put_u8(OPT_TRANSIT);
            out.put_u8(if t.parent_address.is_some() { 20 } else { 4 });
            out.put_u8(t.flags);
            out.put_u8(t.path_control);
            out.put_u8(t.path_sequence);
            out.put_u8(t.path_lifetime);
            if let Some(addr) = t.parent_address {
                put_ipv6(out, &addr);
            }
        }
        RplOption::PrefixInfo(pi) => {
            out.put_u8(OPT_PREFIX_INFO);
            out.put_u8(30);
            out.put_u8(pi.prefix_len);
            out.put_u8(pi.flags);
            out.put_u32(pi.valid_lifetime);
            out.put_u32(pi.preferred_lifetime);
            out.put_u32(0); // reserved
            put_ipv6(out, &pi.prefix);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pad1_advances_by_one_with_no_payload() {
        let buf: &[u8] = &[OPT_PAD1, OPT_PAD1, OPT_TARGET, 2, 0, 64];
        let mut it = OptionsIter::new(buf);
        assert!(matches!(it.next(), Some(Ok(RplOption::Unknown { option_type: OPT_PAD1, .. }))));
        assert!(matches!(it.next(), Some(Ok(RplOption::Unknown { option_type: OPT_PAD1, .. }))));
        let target = it.next().unwrap().unwrap();
        assert!(matches!(target, RplOption::Target(Target { prefix_len: 64, .. })));
        assert!(it.next().is_none());
    }

    #[test]
    fn unknown_option_is_skipped_not_discarded() {
        let buf: &[u8] = &[200, 3, 1, 2, 3, OPT_TARGET, 2, 0, 32];
        let mut it = OptionsIter::new(buf);
        assert!(matches!(it.next(), Some(Ok(RplOption::Unknown { option_type: 200, .. }))));
        assert!(matches!(it.next(), Some(Ok(RplOption::Target(_)))));
    }

    #[test]
    fn overrun_option_rejects_whole_stream() {
        let buf: &[u8] = &[OPT_TARGET, 200, 0, 32];
        let mut it = OptionsIter::new(buf);
        assert!(matches!(it.next(), Some(Err(WireError::OptionOverrun { .. }))));
        assert!(it.next().is_none());
    }

    #[test]
    fn metric_container_roundtrip_fields() {
        // type=ETX(2), flags=0b1010101 spread across two bytes, aggr=1, prec=3
        let flags: u8 = 0b1010101;
        let byte3 = flags >> 1;
        let byte4 = ((flags & 1) << 7) | (1 << 4) | 3;
        let buf: &[u8] = &[
            OPT_DAG_METRIC_CONTAINER,
            6,
            2, // ETX
            byte3,
            byte4,
            2, // mc_len
            0x00,
            0x80,
        ];
        let mut it = OptionsIter::new(buf);
        let opt = it.next().unwrap().unwrap();
        match opt {
            RplOption::DagMetricContainer(mc) => {
                assert_eq!(mc.mc_type, MetricContainerType::Etx);
                assert_eq!(mc.flags, flags);
                assert_eq!(mc.aggregation, 1);
                assert_eq!(mc.precedence, 3);
                assert_eq!(mc.value, MetricValue::Etx(0x80));
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn transit_without_parent_address_in_storing_mode() {
        let buf: &[u8] = &[OPT_TRANSIT, 4, 0, 0, 7, 30];
        let mut it = OptionsIter::new(buf);
        let opt = it.next().unwrap().unwrap();
        match opt {
            RplOption::Transit(t) => {
                assert_eq!(t.path_sequence, 7);
                assert_eq!(t.path_lifetime, 30);
                assert_eq!(t.parent_address, None);
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn target_round_trips_through_write_option() {
        let target = RplOption::Target(Target {
            prefix_len: 48,
            prefix: "2001:db8::".parse().unwrap(),
        });
        let mut out = BytesMut::new();
        write_option(&mut out, &target);
        let mut it = OptionsIter::new(out.freeze());
        assert_eq!(it.next().unwrap().unwrap(), target);
        assert!(it.next().is_none());
    }
}
