//! DCO (Destination Cleanup Object) input/output: withdraw a downward
//! route when its path sequence has advanced and the next hop has moved
//! on.

use crate::lollipop::Lollipop;
use crate::model::arena::Index;
use crate::model::Instance;
use crate::node::{Collaborators, Node};
use crate::wire::{AckStatus, Dco, RplCode};
use bytes::{Bytes, BytesMut};
use std::net::Ipv6Addr;

impl<C: Collaborators> Node<C> {
    pub fn handle_dco(&mut self, from: Ipv6Addr, payload: Bytes) {
        let dco = match Dco::parse(payload) {
            Ok(dco) => dco,
            Err(e) => {
                tracing::warn!(error = ?e, "malformed DCO");
                self.stats.malformed_msgs += 1;
                return;
            }
        };
        self.stats.dco_recvd += 1;

        let instance_idx = match self.instance_by_id.get(&dco.instance_id) {
            Some(&idx) => idx,
            None => return,
        };

        if let Some(dag_id) = dco.dag_id {
            let current = self.instances.get(instance_idx).and_then(|i| i.current_dag).and_then(|idx| self.dags.get(idx));
            if current.map(|d| d.dag_id) != Some(dag_id) {
                tracing::debug!("ignoring DCO for a different DAG");
                return;
            }
        }

        let target = match dco.target() {
            Some(t) => *t,
            None => return,
        };
        let transit = dco.transit().copied();
        let path_lifetime = transit.map(|t| t.path_lifetime).unwrap_or(0);
        let path_sequence = transit.map(|t| Lollipop::new(t.path_sequence)).unwrap_or_default();

        if self.own_address_matches(target.prefix) {
            tracing::debug!("received a DCO for my own address, ignoring");
            self.stats.dco_ignored += 1;
            if dco.ack_requested {
                self.send_dco_ack(dco.instance_id, from, dco.sequence, AckStatus::NegativeAckDco);
            }
            return;
        }

        let route_handle = self.routes.lookup(target.prefix, target.prefix_len);
        let route = route_handle.and_then(|h| self.route_meta.get(&h).copied().map(|m| (h, m)));

        match route {
            Some((handle, meta)) if path_lifetime == 0 => {
                let next_hop = meta.next_hop;
                if path_sequence.greater_than(meta.dao_path_sequence) {
                    self.stats.dco_forwarded += 1;
                    self.routes.remove(handle);
                    self.route_meta.remove(&handle);
                    self.forward_dco(&dco, next_hop);
                } else {
                    self.stats.dco_ignored += 1;
                }
                if dco.ack_requested {
                    self.send_dco_ack(dco.instance_id, from, dco.sequence, AckStatus::UnconditionalAccept);
                }
            }
            _ => {
                tracing::debug!("no route entry found for the DCO target");
                if dco.ack_requested {
                    self.send_dco_ack(dco.instance_id, from, dco.sequence, AckStatus::NegativeAckDco);
                }
            }
        }
    }

    fn own_address_matches(&self, addr: Ipv6Addr) -> bool {
        self.icmpv6.own_global_address() == Some(addr)
    }

    fn forward_dco(&mut self, dco: &Dco, dest: Ipv6Addr) {
        let mut buf = BytesMut::new();
        dco.write_to(&mut buf);
        if let Err(e) = self.icmpv6.send(dest, RplCode::Dco, &buf) {
            tracing::warn!(?e, "failed to forward DCO");
        }
    }

    /// The reference's `dco_output`: tell `dest` to drop its route to
    /// `prefix` because the next hop changed under it.
    pub fn send_dco(&mut self, instance_idx: Index<Instance>, prefix: Ipv6Addr, prefix_len: u8, dest: Ipv6Addr, path_sequence: Lollipop) {
        let instance_id = match self.instances.get(instance_idx) {
            Some(i) => i.instance_id,
            None => return,
        };
        let sequence = self
            .instances
            .get_mut(instance_idx)
            .map(|i| {
                i.dco_sequence = i.dco_sequence.increment();
                i.dco_sequence
            })
            .unwrap_or_default();

        let dco = Dco {
            instance_id,
            ack_requested: true,
            sequence,
            dag_id: None,
            options: vec![
                crate::wire::RplOption::Target(crate::wire::Target { prefix_len, prefix }),
                crate::wire::RplOption::Transit(crate::wire::Transit {
                    flags: 0,
                    path_control: 0,
                    path_sequence: path_sequence.value(),
                    path_lifetime: 0,
                    parent_address: None,
                }),
            ],
        };
        let mut buf = BytesMut::new();
        dco.write_to(&mut buf);
        self.stats.dco_sent += 1;
        if let Err(e) = self.icmpv6.send(dest, RplCode::Dco, &buf) {
            tracing::warn!(?e, "failed to send DCO");
        }
    }

    pub fn send_dco_ack(&mut self, instance_id: u8, dest: Ipv6Addr, sequence: Lollipop, status: AckStatus) {
        let ack = crate::wire::DaoAck { instance_id, sequence, status };
        let mut buf = BytesMut::new();
        ack.write_to(&mut buf);
        if let Err(e) = self.icmpv6.send(dest, RplCode::DcoAck, &buf) {
            tracing::warn!(?e, "failed to send DCO-ACK");
        }
    }

    /// DCO-ACK carries no retry semantics on this side — the reference's
    /// `dco_ack_input` is an empty stub, it only exists so the ICMPv6
    /// handler table has somewhere to route the code to.
    pub fn handle_dco_ack(&mut self, _from: Ipv6Addr, _payload: Bytes) {}
}
