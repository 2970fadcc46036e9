//! DAO-ACK input/output and the retransmit-timer driver.

use crate::lollipop::Lollipop;
use crate::model::arena::Index;
use crate::model::Instance;
use crate::node::{Collaborators, Node};
use crate::of::AckOutcome;
use crate::wire::{AckStatus, DaoAck, RplCode};
use bytes::{Bytes, BytesMut};
use std::net::Ipv6Addr;

impl<C: Collaborators> Node<C> {
    pub fn handle_dao_ack(&mut self, from: Ipv6Addr, payload: Bytes) {
        let ack = match DaoAck::parse(payload) {
            Ok(ack) => ack,
            Err(e) => {
                tracing::warn!(error = ?e, "malformed DAO-ACK");
                self.stats.malformed_msgs += 1;
                return;
            }
        };

        let instance_idx = match self.instance_by_id.get(&ack.instance_id) {
            Some(&idx) => idx,
            None => return,
        };

        // Storing mode only acts on a DAO-ACK from a known parent; anything
        // else is dropped (mirrors the reference's `rpl_find_parent` guard
        // in `dao_ack_input`).
        let dag_idx = match self.instances.get(instance_idx).and_then(|i| i.current_dag) {
            Some(idx) => idx,
            None => return,
        };
        let from_known_parent = self
            .dags
            .get(dag_idx)
            .map(|d| d.parents.iter().any(|&p| self.parents.get(p).map(|p| p.address) == Some(from)))
            .unwrap_or(false);
        if !from_known_parent {
            tracing::debug!("dropping DAO-ACK from an unknown parent");
            return;
        }

        let is_mine = self
            .instances
            .get(instance_idx)
            .map(|i| matches!(i.dao_state, crate::dao_state::DaoState::WaitingAck { sequence, .. } if sequence == ack.sequence))
            .unwrap_or(false);

        if is_mine {
            self.accept_own_dao_ack(instance_idx, ack.status);
        } else {
            self.forward_dao_ack(&ack);
        }
    }

    fn accept_own_dao_ack(&mut self, instance_idx: Index<Instance>, status: AckStatus) {
        let instance_id = self.instances.get(instance_idx).map(|i| i.instance_id).unwrap_or(0);
        if let Some(instance) = self.instances.get_mut(instance_idx) {
            instance.has_downward_route = !status.is_nack();
            instance.dao_state.cancel();
        }
        self.timer.stop(instance_id);

        let outcome = if status.is_nack() { AckOutcome::Reject } else { AckOutcome::Accept };
        self.apply_dao_ack_callback(instance_idx, outcome);

        if status.is_nack() && self.config.repair_on_dao_nack {
            self.trigger_local_repair(instance_idx);
        }
    }

    /// We registered a downstream node's DAO and are relaying its ACK back:
    /// look the pending registration up by the sequence we handed out,
    /// rewrite the sequence byte to the one the registrant originally sent,
    /// and forward.
    fn forward_dao_ack(&mut self, ack: &DaoAck) {
        let entry = self
            .route_meta
            .iter()
            .find(|(_, meta)| meta.dao_pending && meta.dao_seqno_out == ack.sequence)
            .map(|(&handle, meta)| (handle, meta.dao_seqno_in, meta.next_hop));

        let (handle, seqno_in, next_hop) = match entry {
            Some(e) => e,
            None => {
                tracing::debug!(sequence = ack.sequence.value(), "no route entry to forward DAO-ACK to");
                return;
            }
        };

        if let Some(meta) = self.route_meta.get_mut(&handle) {
            meta.dao_pending = false;
        }

        let mut relayed = *ack;
        relayed.sequence = seqno_in;
        let mut buf = BytesMut::new();
        relayed.write_to(&mut buf);
        if let Err(e) = self.icmpv6.send(next_hop, RplCode::DaoAck, &buf) {
            tracing::warn!(?e, "failed to forward DAO-ACK");
        }

        if ack.status.is_nack() {
            self.routes.remove(handle);
            self.route_meta.remove(&handle);
        }
    }

    pub fn send_dao_ack(&mut self, instance_id: u8, dest: Ipv6Addr, sequence: Lollipop, status: AckStatus) {
        let ack = DaoAck { instance_id, sequence, status };
        let mut buf = BytesMut::new();
        ack.write_to(&mut buf);
        if let Err(e) = self.icmpv6.send(dest, RplCode::DaoAck, &buf) {
            tracing::warn!(?e, "failed to send DAO-ACK");
        }
    }

    /// Drive the retransmit timer for one instance's outstanding DAO
    /// (the reference's `handle_dao_retransmission`). The caller owns the
    /// actual timer firing; this just advances the state machine and
    /// re-sends or gives up.
    pub fn on_dao_retransmit_timeout(&mut self, instance_id: u8) {
        let instance_idx = match self.instance_by_id.get(&instance_id) {
            Some(&idx) => idx,
            None => return,
        };
        let (max_retransmissions, timeout_ms, legacy) = (
            self.config.max_dao_retransmissions,
            self.config.dao_retransmission_timeout_ms,
            self.instances.get(instance_idx).map(|i| i.is_legacy_no_ack(&self.config)).unwrap_or(false),
        );
        let jitter = self.timer.random(timeout_ms / 2);

        let outcome = match self.instances.get_mut(instance_idx) {
            Some(instance) => instance.dao_state.tick(max_retransmissions, timeout_ms, jitter, legacy),
            None => return,
        };

        match outcome {
            crate::dao_state::RetransmitOutcome::Retry { sequence, next_delay_ms } => {
                self.resend_own_dao(instance_idx, sequence);
                self.timer.set(instance_id, next_delay_ms);
            }
            crate::dao_state::RetransmitOutcome::GiveUp { triggers_repair } => {
                self.apply_dao_ack_callback(instance_idx, AckOutcome::Timeout);
                if triggers_repair {
                    self.stats.local_repairs += 1;
                    self.trigger_local_repair(instance_idx);
                }
            }
        }
    }

    fn apply_dao_ack_callback(&mut self, instance_idx: Index<Instance>, outcome: AckOutcome) {
        let of = match self.instances.get(instance_idx) {
            Some(i) => i.of.as_of(),
            None => return,
        };
        match of.dao_ack_callback(outcome) {
            crate::of::DaoAckAction::None => {}
            crate::of::DaoAckAction::RecordFailedTransmissions { count } => {
                if let Some(addr) = self.own_global_address() {
                    self.link_stats.record_tx(addr, crate::external::TxStatus::NoAck, count);
                }
            }
        }
    }

    fn own_global_address(&self) -> Option<Ipv6Addr> {
        self.icmpv6.own_global_address()
    }

    fn resend_own_dao(&mut self, instance_idx: Index<Instance>, sequence: Lollipop) {
        let dag_idx = match self.instances.get(instance_idx).and_then(|i| i.current_dag) {
            Some(idx) => idx,
            None => return,
        };
        let preferred_addr = self
            .dags
            .get(dag_idx)
            .and_then(|d| d.preferred_parent)
            .and_then(|idx| self.parents.get(idx))
            .map(|p| p.address);
        let (addr, default_lifetime, own_prefix) = match (preferred_addr, self.own_global_address()) {
            (Some(addr), Some(prefix)) => (addr, self.instances.get(instance_idx).map(|i| i.default_lifetime).unwrap_or(0), prefix),
            _ => return,
        };

        let dao = crate::wire::Dao {
            instance_id: self.instances.get(instance_idx).map(|i| i.instance_id).unwrap_or(0),
            ack_requested: true,
            sequence,
            dag_id: None,
            options: vec![
                crate::wire::RplOption::Target(crate::wire::Target { prefix_len: 128, prefix: own_prefix }),
                crate::wire::RplOption::Transit(crate::wire::Transit {
                    flags: 0,
                    path_control: 0,
                    path_sequence: 0,
                    path_lifetime: default_lifetime,
                    parent_address: None,
                }),
            ],
        };
        let mut buf = BytesMut::new();
        dao.write_to(&mut buf);
        if let Err(e) = self.icmpv6.send(addr, RplCode::Dao, &buf) {
            tracing::warn!(?e, "failed to retransmit DAO");
        }
    }

    /// Originate a DAO registering our own global address (the reference's
    /// `dao_output`): bump the instance's own sequence, arm the
    /// retransmit/ack state machine if the lifetime isn't zero, and send.
    /// In feather mode nothing is sent at all (reference's
    /// `dao_output_target_seq` feather-mode guard).
    pub fn send_dao(&mut self, instance_id: u8, lifetime: u8) {
        if self
            .instance_by_id
            .get(&instance_id)
            .and_then(|&idx| self.instances.get(idx))
            .map(|i| i.mode == crate::model::instance::OperatingMode::Feather)
            .unwrap_or(true)
        {
            return;
        }
        let own_prefix = match self.own_global_address() {
            Some(p) => p,
            None => {
                tracing::debug!("no global address set, suppressing DAO");
                return;
            }
        };
        let instance_idx = match self.instance_by_id.get(&instance_id) {
            Some(&idx) => idx,
            None => return,
        };
        let dag_idx = match self.instances.get(instance_idx).and_then(|i| i.current_dag) {
            Some(idx) => idx,
            None => return,
        };
        let addr = match self.dags.get(dag_idx).and_then(|d| d.preferred_parent).and_then(|idx| self.parents.get(idx)) {
            Some(p) => p.address,
            None => return,
        };

        let sequence = self
            .instances
            .get_mut(instance_idx)
            .map(|i| {
                i.dao_sequence = i.dao_sequence.increment();
                i.dao_sequence
            })
            .unwrap_or_default();

        if lifetime != 0 {
            let timeout_ms = self.config.dao_retransmission_timeout_ms;
            let (state, _) = crate::dao_state::DaoState::start(sequence, timeout_ms, 0);
            if let Some(instance) = self.instances.get_mut(instance_idx) {
                instance.dao_state = state;
            }
            self.timer.set(instance_id, timeout_ms);
        } else if let Some(instance) = self.instances.get_mut(instance_idx) {
            instance.has_downward_route = false;
        }

        let dao = crate::wire::Dao {
            instance_id,
            ack_requested: lifetime != 0,
            sequence,
            dag_id: None,
            options: vec![
                crate::wire::RplOption::Target(crate::wire::Target { prefix_len: 128, prefix: own_prefix }),
                crate::wire::RplOption::Transit(crate::wire::Transit {
                    flags: 0,
                    path_control: 0,
                    path_sequence: 0,
                    path_lifetime: lifetime,
                    parent_address: None,
                }),
            ],
        };
        let mut buf = BytesMut::new();
        dao.write_to(&mut buf);
        self.stats.dao_sent += 1;
        if let Err(e) = self.icmpv6.send(addr, RplCode::Dao, &buf) {
            tracing::warn!(?e, "failed to send DAO");
        }
    }

    /// Local repair: poison the current preferred parent's rank so the
    /// next `recompute_preferred_parent` looks elsewhere, and kick the
    /// trickle timer to speed up discovery of a replacement.
    pub(crate) fn trigger_local_repair(&mut self, instance_idx: Index<Instance>) {
        let instance_id = match self.instances.get(instance_idx) {
            Some(i) => i.instance_id,
            None => return,
        };
        if let Some(instance) = self.instances.get_mut(instance_idx) {
            instance.dao_state = crate::dao_state::DaoState::LocalRepair;
        }
        if let Some(dag_idx) = self.instances.get(instance_idx).and_then(|i| i.current_dag) {
            if let Some(parent_idx) = self.dags.get(dag_idx).and_then(|d| d.preferred_parent) {
                self.poison_and_purge_parent(parent_idx);
            }
        }
        self.trickle.reset(instance_id);
    }
}
