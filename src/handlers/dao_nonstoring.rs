//! DAO input for the non-storing mode of operation: the DAO only tells
//! the root "my parent is X", which the root folds into its
//! source-routing table; nothing is ever forwarded further.

use crate::node::{Collaborators, Node};
use crate::wire::{AckStatus, Dao};
use bytes::Bytes;
use std::net::Ipv6Addr;

const ZERO_LIFETIME: u8 = 0;

impl<C: Collaborators> Node<C> {
    pub fn handle_dao_nonstoring(&mut self, from: Ipv6Addr, payload: Bytes) {
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
            None => return,
        };
        let dag_id = match self.instances.get(instance_idx).and_then(|i| i.current_dag).and_then(|idx| self.dags.get(idx)) {
            Some(d) => d.dag_id,
            None => return,
        };
        if let Some(want) = dao.dag_id {
            if want != dag_id {
                tracing::debug!("ignoring DAO for a different DAG");
                return;
            }
        }

        let target = match dao.target() {
            Some(t) => *t,
            None => return,
        };
        let transit = dao.transit().copied();
        // The parent address is only present when the TRANSIT option is
        // long enough to carry it.
        let parent = transit.and_then(|t| t.parent_address).unwrap_or(Ipv6Addr::UNSPECIFIED);
        let lifetime_byte = transit.map(|t| t.path_lifetime).unwrap_or(0);
        let lifetime_unit = self.instances.get(instance_idx).map(|i| i.lifetime_unit).unwrap_or(1);

        if lifetime_byte == ZERO_LIFETIME {
            self.source_routes_remove(target.prefix, parent);
        } else {
            let lifetime_secs = u32::from(lifetime_byte) * u32::from(lifetime_unit);
            self.source_routes_upsert(target.prefix, parent, lifetime_secs);
        }

        if dao.ack_requested {
            self.send_dao_ack(dao.instance_id, from, dao.sequence, AckStatus::UnconditionalAccept);
        }
    }

    /// Non-storing mode's source-routing table has no dedicated external
    /// trait (only storing mode's `RouteTable` is a collaborator); we fold
    /// each `(child, parent)` edge into the same `RouteTable` keyed on the
    /// child prefix with a /128 mask, which is exactly the granularity a
    /// non-storing DAO ever reports.
    fn source_routes_upsert(&mut self, child: Ipv6Addr, parent: Ipv6Addr, lifetime: u32) {
        let handle = match self.routes.lookup(child, 128) {
            Some(h) => h,
            None => match self.routes.add(child, 128, parent) {
                Some(h) => h,
                None => {
                    self.stats.mem_overflows += 1;
                    return;
                }
            },
        };
        let meta = self
            .route_meta
            .entry(handle)
            .or_insert_with(|| crate::model::RouteMeta::new(child, 128, parent, lifetime));
        meta.next_hop = parent;
        meta.lifetime = lifetime;
        meta.nopath_received = false;
    }

    fn source_routes_remove(&mut self, child: Ipv6Addr, parent: Ipv6Addr) {
        if let Some(handle) = self.routes.lookup(child, 128) {
            if self.routes.next_hop(handle) == parent {
                self.routes.remove(handle);
                self.route_meta.remove(&handle);
            }
        }
    }
}
