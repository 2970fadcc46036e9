//! A single DODAG within an instance. Most nodes only ever have one
//! joined DAG per instance; the arena still allows several so a node can
//! evaluate competing DAGs before committing.

use super::arena::Index;
use super::{Instance, Parent};
use crate::lollipop::Lollipop;
use std::net::Ipv6Addr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefixInfo {
    pub prefix: Ipv6Addr,
    pub prefix_len: u8,
    pub flags: u8,
    pub lifetime: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dag {
    pub instance: Index<Instance>,
    pub dag_id: Ipv6Addr,
    pub version: Lollipop,
    pub rank: u16,
    pub grounded: bool,
    /// 3-bit DAG preference, as advertised.
    pub preference: u8,
    pub joined: bool,
    pub preferred_parent: Option<Index<Parent>>,
    pub parents: Vec<Index<Parent>>,
    pub prefix_info: Option<PrefixInfo>,
}

impl Dag {
    pub fn new(instance: Index<Instance>, dag_id: Ipv6Addr, version: Lollipop) -> Dag {
        Dag {
            instance,
            dag_id,
            version,
            rank: super::INFINITE_RANK,
            grounded: false,
            preference: 0,
            joined: false,
            preferred_parent: None,
            parents: Vec::new(),
            prefix_info: None,
        }
    }

    /// Detach a parent from this DAG's bookkeeping. Caller still owns
    /// removing it from the shared parent arena.
    pub fn remove_parent(&mut self, parent: Index<Parent>) {
        self.parents.retain(|&p| p != parent);
        if self.preferred_parent == Some(parent) {
            self.preferred_parent = None;
            self.joined = false;
            self.rank = super::INFINITE_RANK;
        }
    }
}
