//! DCO (Destination Cleanup Object), RFC 6550 §6.4 extension used to
//! revoke a downward route whose next-hop changed. Same base shape as a
//! DAO, carried under a distinct ICMPv6 code and its own lollipop
//! sequence space (`dco_sequence`).

use super::options::{write_option, OptionsIter, RplOption};
use super::util::*;
use crate::lollipop::Lollipop;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::net::Ipv6Addr;

const K_FLAG: u8 = 0x80;
const D_FLAG: u8 = 0x40;

#[derive(Debug, Clone, PartialEq)]
pub struct Dco {
    pub instance_id: u8,
    pub ack_requested: bool,
    pub sequence: Lollipop,
    pub dag_id: Option<Ipv6Addr>,
    pub options: Vec<RplOption>,
}

impl Dco {
    pub fn parse(mut buf: Bytes) -> Result<Dco, WireError> {
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

        Ok(Dco {
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

    pub fn target(&self) -> Option<&super::options::Target> {
        self.options.iter().find_map(|o| match o {
            RplOption::Target(t) => Some(t),
            _ => None,
        })
    }

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
    use crate::wire::options::{Target, Transit};

    #[test]
    fn round_trips() {
        let dco = Dco {
            instance_id: 30,
            ack_requested: true,
            sequence: Lollipop::new(50),
            dag_id: None,
            options: vec![
                RplOption::Target(Target {
                    prefix_len: 64,
                    prefix: "2001:db8:1::".parse().unwrap(),
                }),
                RplOption::Transit(Transit {
                    flags: 0,
                    path_control: 0,
                    path_sequence: 4,
                    path_lifetime: 0,
                    parent_address: None,
                }),
            ],
        };
        let mut buf = BytesMut::new();
        dco.write_to(&mut buf);
        let decoded = Dco::parse(buf.freeze()).unwrap();
        assert_eq!(decoded, dco);
        assert_eq!(decoded.target().unwrap().prefix_len, 64);
        assert_eq!(decoded.transit().unwrap().path_sequence, 4);
    }
}
