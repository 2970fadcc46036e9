//! DAO input/output for the storing mode of operation.

use crate::external::NeighborAddReason;
use crate::lollipop::Lollipop;
use crate::model::dag_rank;
use crate::node::{Collaborators, Node};
use crate::wire::dao::Dao;
use crate::wire::{AckStatus, RplCode};
use bytes::Bytes;
use std::net::Ipv6Addr;

const ZERO_LIFETIME: u8 = 0;

impl<C: Collaborators> Node<C> {
    pub fn handle_dao_storing(&mut self, from: Ipv6Addr, dest_is_multicast: bool, payload: Bytes) {
        let dao = match Dao::parse(payload) {
            Ok(dao) => dao,
            Err(e) => {
                tracing::warn!(error = ?e, "malformed DAO");
                self.stats.malformed_msgs += 1;
                return;
            }
        };

        let instance_idx = match self.instance_by_id.get(&dao.instance_id) {
            Some(&idx) => idx,
            None => {
                tracing::debug!(instance_id = dao.instance_id, "DAO for unknown instance");
                return;
            }
        };
        let (dag_idx, min_hoprankinc, dao_lifetime_unit, dao_default_lifetime) = match self.instances.get(instance_idx) {
            Some(i) => match i.current_dag {
                Some(dag_idx) => (dag_idx, i.min_hoprankinc, i.lifetime_unit, i.default_lifetime),
                None => return,
            },
            None => return,
        };
        let dag = match self.dags.get(dag_idx) {
            Some(d) => d.clone(),
            None => return,
        };

        if let Some(dag_id) = dao.dag_id {
            if dag_id != dag.dag_id {
                tracing::debug!("ignoring DAO for a different DAG");
                return;
            }
        }

        let is_root = dag.rank == 256 && dag.preferred_parent.is_none();
        self.stats.dao_recvd += 1;

        if !dest_is_multicast {
            if let Some(parent_idx) = dag
                .parents
                .iter()
                .copied()
                .find(|&idx| self.parents.get(idx).map(|p| p.address) == Some(from))
            {
                let parent_rank = self.parents.get(parent_idx).map(|p| p.rank).unwrap_or(0);
                let is_preferred = dag.preferred_parent == Some(parent_idx);
                if is_preferred || dag_rank(parent_rank, min_hoprankinc) < dag_rank(dag.rank, min_hoprankinc) {
                    tracing::warn!("loop detected on DAO from parent");
                    self.poison_and_purge_parent(parent_idx);
                    return;
                }
            }
        }

        let target = match dao.target() {
            Some(t) => *t,
            None => {
                tracing::debug!("DAO carried no TARGET option");
                return;
            }
        };
        let transit = dao.transit().copied();
        let raw_lifetime = transit.map(|t| t.path_lifetime).unwrap_or(dao_default_lifetime);
        let path_sequence = transit.map(|t| Lollipop::new(t.path_sequence)).unwrap_or_default();

        if self.icmpv6.addr_is_multicast(target.prefix) {
            // No per-engine multicast routing table is modeled (that's
            // treated as external); skip straight to forwarding.
            self.forward_dao_storing(instance_idx, dag_idx, &dao, from, is_root);
            return;
        }

        if raw_lifetime == ZERO_LIFETIME {
            self.handle_nopath_dao(instance_idx, dag_idx, &dao, from, target.prefix, target.prefix_len);
            return;
        }

        match self.neighbors.add(from, NeighborAddReason::Dao) {
            Some(_) => {}
            None => {
                tracing::warn!(sender = ?from, "no room in neighbor cache for DAO sender");
                if dao.ack_requested {
                    let status = if is_root {
                        AckStatus::UnableToAddRouteAtRoot
                    } else {
                        AckStatus::UnableToAccept
                    };
                    self.send_dao_ack(dao.instance_id, from, dao.sequence, status);
                }
                return;
            }
        }

        let route_handle = match self.routes.lookup(target.prefix, target.prefix_len) {
            Some(h) => h,
            None => match self.routes.add(target.prefix, target.prefix_len, from) {
                Some(h) => h,
                None => {
                    self.stats.mem_overflows += 1;
                    if dao.ack_requested {
                        let status = if is_root {
                            AckStatus::UnableToAddRouteAtRoot
                        } else {
                            AckStatus::UnableToAccept
                        };
                        self.send_dao_ack(dao.instance_id, from, dao.sequence, status);
                    }
                    return;
                }
            },
        };

        let lifetime_secs = u32::from(raw_lifetime) * u32::from(dao_lifetime_unit);
        let previous = self.route_meta.get(&route_handle).copied();
        let was_pending_with_same_seq =
            previous.map(|p| p.dao_pending && p.dao_seqno_in == dao.sequence).unwrap_or(false);

        let mut meta = previous.unwrap_or_else(|| crate::model::RouteMeta::new(target.prefix, target.prefix_len, from, lifetime_secs));
        meta.lifetime = lifetime_secs;
        meta.nopath_received = false;
        meta.dao_path_sequence = path_sequence;
        meta.next_hop = from;

        let should_ack = dao.ack_requested
            && ((!previous.map(|p| p.dao_pending).unwrap_or(false) && previous.map(|p| p.dao_seqno_in == dao.sequence).unwrap_or(false))
                || is_root);

        let out_seq = if was_pending_with_same_seq {
            meta.dao_seqno_out
        } else {
            let next = self.instances.get_mut(instance_idx).map(|i| {
                i.dao_sequence = i.dao_sequence.increment();
                i.dao_sequence
            });
            next.unwrap_or_default()
        };
        meta.dao_seqno_in = dao.sequence;
        meta.dao_seqno_out = out_seq;
        meta.dao_pending = true;
        self.route_meta.insert(route_handle, meta);

        let prev_next_hop = previous.map(|p| p.next_hop);

        if let Some(preferred_addr) = dag.preferred_parent.and_then(|idx| self.parents.get(idx)).map(|p| p.address) {
            self.send_dao_relay(&dao, preferred_addr, out_seq);
            self.stats.dao_forwarded += 1;
        }

        if should_ack {
            self.send_dao_ack(dao.instance_id, from, dao.sequence, AckStatus::UnconditionalAccept);
        }

        if let Some(prev) = prev_next_hop {
            if prev != from {
                self.send_dco(instance_idx, target.prefix, target.prefix_len, prev, path_sequence);
            }
        }
    }

    fn handle_nopath_dao(
        &mut self,
        instance_idx: crate::model::arena::Index<crate::model::Instance>,
        dag_idx: crate::model::arena::Index<crate::model::Dag>,
        dao: &Dao,
        from: Ipv6Addr,
        prefix: Ipv6Addr,
        prefix_len: u8,
    ) {
        self.stats.dao_recvd -= 1;
        // stats.dao_recvd was already counted before the lifetime was known.
        let instance_id = dao.instance_id;

        if let Some(route_handle) = self.routes.lookup(prefix, prefix_len) {
            if let Some(meta) = self.route_meta.get_mut(&route_handle) {
                if !meta.nopath_received && meta.next_hop == from {
                    meta.nopath_received = true;
                    meta.lifetime = self.config.nopath_removal_delay_s;

                    let preferred_addr = self
                        .dags
                        .get(dag_idx)
                        .and_then(|d| d.preferred_parent)
                        .and_then(|idx| self.parents.get(idx))
                        .map(|p| p.address);
                    if let Some(addr) = preferred_addr {
                        let out_seq = self
                            .instances
                            .get_mut(instance_idx)
                            .map(|i| {
                                i.dao_sequence = i.dao_sequence.increment();
                                i.dao_sequence
                            })
                            .unwrap_or_default();
                        meta.dao_seqno_in = dao.sequence;
                        meta.dao_seqno_out = out_seq;
                        self.send_dao_relay(dao, addr, out_seq);
                        self.stats.npdao_forwarded += 1;
                    }
                }
            }
        }

        self.stats.npdao_recvd += 1;
        if dao.ack_requested {
            self.send_dao_ack(instance_id, from, dao.sequence, AckStatus::UnconditionalAccept);
        }
    }

    fn forward_dao_storing(
        &mut self,
        _instance_idx: crate::model::arena::Index<crate::model::Instance>,
        dag_idx: crate::model::arena::Index<crate::model::Dag>,
        dao: &Dao,
        _from: Ipv6Addr,
        _is_root: bool,
    ) {
        if let Some(addr) = self
            .dags
            .get(dag_idx)
            .and_then(|d| d.preferred_parent)
            .and_then(|idx| self.parents.get(idx))
            .map(|p| p.address)
        {
            self.send_dao_relay(dao, addr, dao.sequence);
            self.stats.dao_forwarded += 1;
        }
    }

    /// Relay a DAO toward `dest`, rewriting only the `Sequence` byte — the
    /// rest of the payload (including options) is forwarded verbatim, so we
    /// reuse the exact bytes we received rather than re-encoding them.
    fn send_dao_relay(&mut self, dao: &Dao, dest: Ipv6Addr, out_sequence: Lollipop) {
        let mut relayed = dao.clone();
        relayed.sequence = out_sequence;
        let mut buf = bytes::BytesMut::new();
        relayed.write_to(&mut buf);
        if let Err(e) = self.icmpv6.send(dest, RplCode::Dao, &buf) {
            tracing::warn!(?e, "failed to relay DAO");
        }
    }
}
