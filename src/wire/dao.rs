//! DAO (Destination Advertisement Object), RFC 6550 §6.4.1.

use super::options::{write_option, OptionsIter, RplOption};
use super::util::*;
use crate::lollipop::Lollipop;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::net::Ipv6Addr;

const K_FLAG: u8 = 0x80;
const D_FLAG: u8 = 0x40;

#[derive(Debug, Clone, PartialEq)]
pub struct Dao {
    pub instance_id: u8,
    /// `K` — sender wants a DAO-ACK.
    pub ack_requested: bool,
    pub sequence: Lollipop,
    pub dag_id: Option<Ipv6Addr>,
    pub options: Vec<RplOption>,
}

impl Dao {
    pub fn parse(mut buf: Bytes) -> Result<Dao, WireError> {
        let instance_id = read_u8(&mut buf)?;
        let flags = read_u8(&mut buf)?;
        let ack_requested = flags & K_FLAG != 0;
        let has_dag_id = flags & D_FLAG != 0;
        ensure_remaining!(buf, 1);
        buf.advance(1); // reserved
        let sequence = Lollipop::new(read_u8(&mut buf)?);
        let dag_id = if has_dag_id {
            Some(read_ipv6(&mut buf)?)
        } else {
            None
        };

        let mut options = Vec::new();
        for opt in OptionsIter::new(buf) {
            options.push(opt?);
        }

        Ok(Dao {
            instance_id,
            ack_requested,
            sequence,
            dag_id,
            options,
        })
    }

    pub fn write_to(&self, out: &mut BytesMut) {
        out.put_u8(self.instance_id);
        let mut flags = 0u8;
        if self.ack_requested {
            flags |= K_FLAG;
        }
        if self.dag_id.is_some() {
            flags |= D_FLAG;
        }
        out.put_u8(flags);
        out.put_u8(0); // reserved
        out.put_u8(self.sequence.value());
        if let Some(dag_id) = self.dag_id {
            put_ipv6(out, &dag_id);
        }
        for opt in &self.options {
            write_option(out, opt);
        }
    }

    /// Offset of the `Sequence` byte within the encoded payload — DAO
    /// forwarding rewrites this single byte in place rather than
    /// re-encoding the whole message (the reference's `prepare_for_dao_fwd`).
    pub const SEQUENCE_OFFSET: usize = 3;

    /// `Target` option, if one was present (every storing/non-storing DAO
    /// this engine acts on carries exactly one).
    pub fn target(&self) -> Option<&super::options::Target> {
        self.options.iter().find_map(|o| match o {
            RplOption::Target(t) => Some(t),
            _ => None,
        })
    }

    /// The most recent `Transit` option — the final lifetime used is from
    /// the last TRANSIT option.
    pub fn transit(&self) -> Option<&super::options::Transit> {
        self.options.iter().rev().find_map(|o| match o {
            RplOption::Transit(t) => Some(t),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::options::Transit;

    fn sample(dag_id: Option<Ipv6Addr>) -> Dao {
        Dao {
            instance_id: 30,
            ack_requested: true,
            sequence: Lollipop::new(200),
            dag_id,
            options: vec![
                RplOption::Target(super::super::options::Target {
                    prefix_len: 128,
                    prefix: "2001:db8::1".parse().unwrap(),
                }),
                RplOption::Transit(Transit {
                    flags: 0,
                    path_control: 0,
                    path_sequence: 5,
                    path_lifetime: 30,
                    parent_address: None,
                }),
            ],
        }
    }

    #[test]
    fn round_trips_without_dag_id() {
        let dao = sample(None);
        let mut buf = BytesMut::new();
        dao.write_to(&mut buf);
        assert_eq!(Dao::parse(buf.freeze()).unwrap(), dao);
    }

    #[test]
    fn round_trips_with_dag_id() {
        let dao = sample(Some("2001:db8:f00::1".parse().unwrap()));
        let mut buf = BytesMut::new();
        dao.write_to(&mut buf);
        let decoded = Dao::parse(buf.freeze()).unwrap();
        assert_eq!(decoded, dao);
        assert!(decoded.dag_id.is_some());
    }

    #[test]
    fn transit_picks_the_last_one() {
        let mut dao = sample(None);
        dao.options.push(RplOption::Transit(Transit {
            flags: 0,
            path_control: 0,
            path_sequence: 9,
            path_lifetime: 60,
            parent_address: None,
        }));
        assert_eq!(dao.transit().unwrap().path_sequence, 9);
    }

    #[test]
    fn sequence_offset_matches_layout() {
        let dao = sample(None);
        let mut buf = BytesMut::new();
        dao.write_to(&mut buf);
        assert_eq!(buf[Dao::SEQUENCE_OFFSET], 200);
    }
}
