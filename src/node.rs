//! Top-level engine: owns the instance/DAG/parent arenas and the
//! external collaborators, and is the type the `handlers` module's
//! `impl` blocks attach to.

use crate::config::Config;
use crate::external::{Icmpv6Stack, LinkStats, NeighborCache, RouteTable, Timer, Trickle};
use crate::model::arena::{Arena, Index};
use crate::model::{Dag, Instance, Parent, RouteMeta};
use crate::of::ObjectiveFunctionKind;
use crate::stats::Stats;
use std::collections::HashMap;
use std::net::Ipv6Addr;

/// Bundles the six external-collaborator traits into one type parameter
/// so [`Node`] doesn't need six generic parameters repeated at every
/// call site; implement it once for your concrete stack.
pub trait Collaborators {
    type Icmpv6: Icmpv6Stack;
    type Neighbors: NeighborCache;
    type Routes: RouteTable;
    type LinkStats: LinkStats<LinkAddr = Ipv6Addr>;
    type Trickle: Trickle;
    type Timer: Timer;
}

pub struct Node<C: Collaborators> {
    pub config: Config,
    pub stats: Stats,

    pub icmpv6: C::Icmpv6,
    pub neighbors: C::Neighbors,
    pub routes: C::Routes,
    pub link_stats: C::LinkStats,
    pub trickle: C::Trickle,
    pub timer: C::Timer,

    pub(crate) instances: Arena<Instance>,
    pub(crate) instance_by_id: HashMap<u8, Index<Instance>>,
    pub(crate) dags: Arena<Dag>,
    pub(crate) parents: Arena<Parent>,
    pub(crate) route_meta: HashMap<<C::Routes as RouteTable>::Handle, RouteMeta>,
}

/// Matches the reference's fixed-size `instance_table`/parent pools
/// rather than growing unboundedly.
pub const MAX_INSTANCES: usize = 4;
pub const MAX_DAGS: usize = 8;
pub const MAX_PARENTS: usize = 32;

impl<C: Collaborators> Node<C> {
    pub fn new(
        config: Config,
        icmpv6: C::Icmpv6,
        neighbors: C::Neighbors,
        routes: C::Routes,
        link_stats: C::LinkStats,
        trickle: C::Trickle,
        timer: C::Timer,
    ) -> Self {
        Node {
            config,
            stats: Stats::default(),
            icmpv6,
            neighbors,
            routes,
            link_stats,
            trickle,
            timer,
            instances: Arena::with_capacity(MAX_INSTANCES),
            instance_by_id: HashMap::new(),
            dags: Arena::with_capacity(MAX_DAGS),
            parents: Arena::with_capacity(MAX_PARENTS),
            route_meta: HashMap::new(),
        }
    }

    pub fn instance(&self, instance_id: u8) -> Option<&Instance> {
        let idx = *self.instance_by_id.get(&instance_id)?;
        self.instances.get(idx)
    }

    pub fn instance_mut(&mut self, instance_id: u8) -> Option<&mut Instance> {
        let idx = *self.instance_by_id.get(&instance_id)?;
        self.instances.get_mut(idx)
    }

    /// An Instance is created on receipt of the first DIO with an
    /// unknown `instance_id`, or by configuration at the root. Returns
    /// `None` on pool exhaustion (`mem_overflows`).
    pub(crate) fn get_or_create_instance(
        &mut self,
        instance_id: u8,
        of: ObjectiveFunctionKind,
    ) -> Option<Index<Instance>> {
        if let Some(&idx) = self.instance_by_id.get(&instance_id) {
            return Some(idx);
        }
        let instance = Instance::new(instance_id, of, &self.config);
        let idx = self.instances.try_insert(instance)?;
        self.instance_by_id.insert(instance_id, idx);
        Some(idx)
    }

    /// Destroy an Instance's DAGs and parents before removing it, so no
    /// `Parent.dag`/`Dag.instance` back-reference is left dangling.
    pub fn destroy_instance(&mut self, instance_id: u8) {
        if let Some(idx) = self.instance_by_id.remove(&instance_id) {
            if let Some(instance) = self.instances.remove(idx) {
                for dag_idx in instance.dags {
                    self.destroy_dag(dag_idx);
                }
            }
        }
        self.timer.stop(instance_id);
    }

    pub(crate) fn destroy_dag(&mut self, dag_idx: Index<Dag>) {
        if let Some(dag) = self.dags.remove(dag_idx) {
            for parent_idx in dag.parents {
                self.parents.remove(parent_idx);
            }
        }
    }

    /// Poison then purge a parent: set its rank to infinite (loop
    /// detection / staleness), detach it from its DAG, and free its slot.
    pub(crate) fn poison_and_purge_parent(&mut self, parent_idx: Index<Parent>) {
        let dag_idx = match self.parents.get_mut(parent_idx) {
            Some(parent) => {
                parent.rank = crate::model::INFINITE_RANK;
                parent.updated = true;
                parent.dag
            }
            None => return,
        };
        if let Some(dag) = self.dags.get_mut(dag_idx) {
            dag.remove_parent(parent_idx);
        }
        self.parents.remove(parent_idx);
    }
}
