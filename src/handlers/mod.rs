//! Inbound message dispatch: one file per RPL message kind, mirroring
//! the `wire` module's layout. [`Node::handle_message`] is the single
//! entry point a collaborator's ICMPv6 receive path calls into.

pub mod dao_ack;
pub mod dao_nonstoring;
pub mod dao_storing;
pub mod dco;
pub mod dio;
pub mod dis;

use crate::node::{Collaborators, Node};
use crate::wire::dio::ModeOfOperation;
use crate::wire::RplCode;
use bytes::Bytes;
use std::net::Ipv6Addr;

impl<C: Collaborators> Node<C> {
    /// Decode the ICMPv6 code and route to the matching handler. `from` is
    /// the IPv6 source address; `dest_is_multicast` says whether the
    /// packet was addressed to us directly or to a multicast group (DIS
    /// and storing-mode DAO both branch on this).
    pub fn handle_message(&mut self, code: u8, from: Ipv6Addr, dest_is_multicast: bool, payload: Bytes) {
        let code = match RplCode::from_wire(code) {
            Some(c) => c,
            None => {
                tracing::warn!(code, "unrecognized RPL ICMPv6 code");
                self.stats.malformed_msgs += 1;
                return;
            }
        };
        match code {
            RplCode::Dis => self.handle_dis(from, dest_is_multicast, payload),
            RplCode::Dio => self.handle_dio(from, payload),
            RplCode::Dao => self.dispatch_dao(from, dest_is_multicast, payload),
            RplCode::DaoAck => self.handle_dao_ack(from, payload),
            RplCode::Dco => self.handle_dco(from, payload),
            RplCode::DcoAck => self.handle_dco_ack(from, payload),
        }
    }

    fn dispatch_dao(&mut self, from: Ipv6Addr, dest_is_multicast: bool, payload: Bytes) {
        let instance_id = match payload.first() {
            Some(&id) => id,
            None => {
                self.stats.malformed_msgs += 1;
                return;
            }
        };
        let mop = self.instance_by_id.get(&instance_id).and_then(|&idx| self.instances.get(idx)).map(|i| i.mop);
        match mop {
            Some(ModeOfOperation::NonStoring) => self.handle_dao_nonstoring(from, payload),
            _ => self.handle_dao_storing(from, dest_is_multicast, payload),
        }
    }
}
