//! A candidate parent within one DAG's parent set.

use super::arena::Index;
use super::Dag;
use std::net::Ipv6Addr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parent {
    /// Non-owning back-reference; the owning `Dag` is always removed from
    /// `Dag::parents` before a `Parent` is dropped from its arena.
    pub dag: Index<Dag>,
    /// Key into the neighbor cache. RPL parents are identified by their
    /// link-layer/IPv6 address, not by a stable handle of our own, so the
    /// neighbor cache is re-queried by address whenever a handle is
    /// needed.
    pub address: Ipv6Addr,
    /// Rank advertised in the parent's last DIO.
    pub rank: u16,
    /// Scaled link metric (ETX for MRHOF, hop-count-derived for OF0).
    pub link_metric: u16,
    pub updated: bool,
    pub stale: bool,
}

impl Parent {
    pub fn new(dag: Index<Dag>, address: Ipv6Addr) -> Parent {
        Parent {
            dag,
            address,
            rank: super::INFINITE_RANK,
            link_metric: 0,
            updated: true,
            stale: false,
        }
    }

    /// A parent is no longer usable once we've poisoned it to
    /// `INFINITE_RANK` (loop detection) or marked it stale.
    pub fn is_poisoned(&self) -> bool {
        self.rank == super::INFINITE_RANK
    }
}
