//! DIS input/output.

use crate::external::NeighborAddReason;
use crate::node::{Collaborators, Node};
use crate::wire::{Dis, RplCode};
use bytes::{Bytes, BytesMut};
use std::net::Ipv6Addr;

/// RFC 6550's link-local "All-RPL-Nodes" multicast address.
pub const ALL_RPL_NODES: Ipv6Addr = Ipv6Addr::new(0xff02, 0, 0, 0, 0, 0, 0, 0x001a);

impl<C: Collaborators> Node<C> {
    pub fn handle_dis(&mut self, from: Ipv6Addr, dest_is_multicast: bool, payload: Bytes) {
        if Dis::parse(payload).is_err() {
            self.stats.malformed_msgs += 1;
            return;
        }

        if dest_is_multicast {
            if self.config.leaf_only {
                // A multicast DIS never resets the trickle timer for a leaf.
                return;
            }
            let instance_ids: Vec<u8> = self.instance_by_id.keys().copied().collect();
            for instance_id in instance_ids {
                self.trickle.reset(instance_id);
            }
            return;
        }

        let instance_ids: Vec<u8> = self.instance_by_id.keys().copied().collect();
        for instance_id in instance_ids {
            match self.neighbors.add(from, NeighborAddReason::Dis) {
                Some(_) => self.send_dio(instance_id, Some(from)),
                None => {
                    tracing::warn!(sender = ?from, "no room in neighbor cache for DIS sender");
                    self.stats.mem_overflows += 1;
                }
            }
        }
    }

    pub fn send_dis(&mut self, dest: Option<Ipv6Addr>) {
        let dis = Dis { flags: 0 };
        let mut buf = BytesMut::new();
        dis.write_to(&mut buf);
        let dest = dest.unwrap_or(ALL_RPL_NODES);
        if let Err(e) = self.icmpv6.send(dest, RplCode::Dis, &buf) {
            tracing::warn!(?e, "failed to send DIS");
        }
    }
}
