//! DAO-specific metadata the engine tracks alongside each route-table
//! entry. Storage itself lives behind [`crate::external::RouteTable`];
//! this is the engine's own shadow record of the fields that table
//! doesn't expose: sequence numbers, pending/NOPATH bits.

use crate::lollipop::Lollipop;
use std::net::Ipv6Addr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteMeta {
    pub prefix: Ipv6Addr,
    pub prefix_len: u8,
    pub next_hop: Ipv6Addr,
    pub lifetime: u32,
    pub dao_seqno_in: Lollipop,
    pub dao_seqno_out: Lollipop,
    pub dao_path_sequence: Lollipop,
    pub dao_pending: bool,
    pub nopath_received: bool,
}

impl RouteMeta {
    pub fn new(prefix: Ipv6Addr, prefix_len: u8, next_hop: Ipv6Addr, lifetime: u32) -> RouteMeta {
        RouteMeta {
            prefix,
            prefix_len,
            next_hop,
            lifetime,
            dao_seqno_in: Lollipop::init(),
            dao_seqno_out: Lollipop::init(),
            dao_path_sequence: Lollipop::init(),
            dao_pending: false,
            nopath_received: false,
        }
    }
}
