//! Contracts for the subsystems this crate treats as out of scope: the
//! IPv6/ICMPv6 stack, neighbor cache, route table, link-layer statistics,
//! trickle timer, and a generic timer. The engine is generic over
//! implementations of these traits so it never depends on a concrete
//! network stack.

use crate::wire::RplCode;
use std::net::Ipv6Addr;

/// Send/receive primitives and address classification, normally backed by
/// a 6LoWPAN/IPv6 stack.
pub trait Icmpv6Stack {
    type Error: std::fmt::Debug;

    fn send(&mut self, dest: Ipv6Addr, code: RplCode, payload: &[u8]) -> Result<(), Self::Error>;
    fn addr_is_multicast(&self, addr: Ipv6Addr) -> bool;
    fn addr_is_linklocal(&self, addr: Ipv6Addr) -> bool;
    /// `None` until the node has configured a global address (e.g. from a
    /// received `PREFIX_INFO`); DAO/DCO emission is a no-op until then.
    fn own_global_address(&self) -> Option<Ipv6Addr>;
}

/// Why a neighbor is being added, passed through to the cache so it can
/// apply its own eviction policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeighborAddReason {
    Dis,
    Dio,
    Dao,
}

pub trait NeighborCache {
    type Handle: Copy + Eq + std::hash::Hash;

    fn lookup(&self, addr: Ipv6Addr) -> Option<Self::Handle>;
    /// `None` means the cache had no room for a new entry.
    fn add(&mut self, addr: Ipv6Addr, reason: NeighborAddReason) -> Option<Self::Handle>;
}

pub trait RouteTable {
    type Handle: Copy + Eq + std::hash::Hash;

    fn lookup(&self, prefix: Ipv6Addr, prefix_len: u8) -> Option<Self::Handle>;
    fn add(&mut self, prefix: Ipv6Addr, prefix_len: u8, next_hop: Ipv6Addr) -> Option<Self::Handle>;
    fn next_hop(&self, handle: Self::Handle) -> Ipv6Addr;
    fn remove(&mut self, handle: Self::Handle);
}

/// Outcome of a single link-layer transmission, as reported by the
/// underlying MAC (mirrors Contiki's `MAC_TX_OK` / `MAC_TX_NOACK` / other).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxStatus {
    Ok,
    NoAck,
    Other,
}

pub trait LinkStats {
    type LinkAddr: Copy + Eq;

    /// Current ETX estimate for a neighbor, scaled by the OF's
    /// `ETX_DIVISOR`; `None` if nothing has been observed yet.
    fn etx_of(&self, addr: Self::LinkAddr) -> Option<u16>;
    fn record_tx(&mut self, addr: Self::LinkAddr, status: TxStatus, num_tx: u8);
}

/// Reset/suspend interface onto the trickle timer subsystem; only the
/// part the engine needs to drive is exposed.
pub trait Trickle {
    fn reset(&mut self, instance_id: u8);
}

/// Single-shot timer used for the DAO retransmit timer. Exactly one of
/// these is ever outstanding per instance (the reference embeds one
/// `ctimer` per `rpl_instance_t`), so it's addressed directly by
/// `instance_id` rather than through an opaque handle; firing invokes
/// [`crate::node::Node::on_dao_retransmit_timeout`].
pub trait Timer {
    fn set(&mut self, instance_id: u8, delay_ms: u32);
    fn stop(&mut self, instance_id: u8);
    /// Uniform random value in `[0, bound)`, used for retransmission
    /// jitter.
    fn random(&mut self, bound: u32) -> u32;
}
