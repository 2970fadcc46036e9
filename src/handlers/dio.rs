//! DIO input/output.

use crate::lollipop::Lollipop;
use crate::model::arena::Index;
use crate::model::dag::PrefixInfo as DagPrefixInfo;
use crate::model::{Dag, Parent, INFINITE_RANK};
use crate::node::{Collaborators, Node};
use crate::of::{ObjectiveFunctionKind, ParentChoice};
use crate::wire::options::{DagConf, MetricContainer, PrefixInfo, RplOption};
use crate::wire::{Dio, RplCode};
use bytes::{Bytes, BytesMut};
use std::net::Ipv6Addr;

/// Root rank, RFC 6550's `ROOT_RANK`.
const ROOT_RANK: u16 = 256;

impl<C: Collaborators> Node<C> {
    pub fn handle_dio(&mut self, from: Ipv6Addr, payload: Bytes) {
        let dio = match Dio::parse(payload) {
            Ok(dio) => dio,
            Err(e) => {
                tracing::warn!(error = ?e, "malformed DIO");
                self.stats.malformed_msgs += 1;
                return;
            }
        };
        self.stats.dio_recvd += 1;

        let dag_conf = dio.options.iter().find_map(|o| match o {
            RplOption::DagConf(dc) => Some(*dc),
            _ => None,
        });
        let of_kind = dag_conf
            .and_then(|dc| ObjectiveFunctionKind::from_ocp(dc.ocp))
            .unwrap_or(ObjectiveFunctionKind::Mrhof);

        let instance_idx = match self.get_or_create_instance(dio.instance_id, of_kind) {
            Some(idx) => idx,
            None => {
                tracing::warn!(instance_id = dio.instance_id, "no room for a new instance");
                self.stats.mem_overflows += 1;
                return;
            }
        };

        if let Some(dc) = dag_conf {
            self.apply_dag_conf(instance_idx, dc);
        }

        let dag_idx = match self.find_or_create_dag(instance_idx, dio.dag_id, dio.version) {
            Some(idx) => idx,
            None => {
                self.stats.mem_overflows += 1;
                return;
            }
        };

        if let Some(dag) = self.dags.get_mut(dag_idx) {
            dag.grounded = dio.grounded;
            dag.preference = dio.preference;
            if let Some(pi) = dio.options.iter().find_map(|o| match o {
                RplOption::PrefixInfo(pi) => Some(*pi),
                _ => None,
            }) {
                dag.prefix_info = Some(DagPrefixInfo {
                    prefix: pi.prefix,
                    prefix_len: pi.prefix_len,
                    flags: pi.flags,
                    lifetime: pi.valid_lifetime,
                });
            }
        }

        let parent_idx = match self.find_or_create_parent(dag_idx, from) {
            Some(idx) => idx,
            None => {
                self.stats.mem_overflows += 1;
                return;
            }
        };
        if let Some(parent) = self.parents.get_mut(parent_idx) {
            parent.rank = dio.rank;
            parent.updated = true;
        }

        if let Some(instance) = self.instances.get_mut(instance_idx) {
            instance.current_dag = Some(dag_idx);
            instance.mop = dio.mop;
        }

        self.recompute_preferred_parent(instance_idx, dag_idx);
    }

    fn apply_dag_conf(&mut self, instance_idx: Index<crate::model::Instance>, dc: DagConf) {
        if let Some(instance) = self.instances.get_mut(instance_idx) {
            instance.dio_intdoubl = dc.dio_interval_doublings;
            instance.dio_intmin = dc.dio_interval_min;
            instance.dio_redundancy = dc.dio_redundancy;
            instance.max_rankinc = dc.max_rankinc;
            instance.min_hoprankinc = dc.min_hoprankinc;
            instance.default_lifetime = dc.default_lifetime;
            instance.lifetime_unit = dc.lifetime_unit;
        }
    }

    fn find_or_create_dag(
        &mut self,
        instance_idx: Index<crate::model::Instance>,
        dag_id: Ipv6Addr,
        version: Lollipop,
    ) -> Option<Index<Dag>> {
        let existing = self
            .instances
            .get(instance_idx)?
            .dags
            .iter()
            .copied()
            .find(|&idx| self.dags.get(idx).map(|d| d.dag_id) == Some(dag_id));

        if let Some(dag_idx) = existing {
            let is_global_repair = self
                .dags
                .get(dag_idx)
                .map(|d| version.greater_than(d.version))
                .unwrap_or(false);
            if is_global_repair {
                // A strictly newer version is a global repair: every
                // parent under the old version is stale.
                let parents_to_poison: Vec<Index<Parent>> =
                    self.dags.get(dag_idx).map(|d| d.parents.clone()).unwrap_or_default();
                for p in parents_to_poison {
                    self.poison_and_purge_parent(p);
                }
                if let Some(dag) = self.dags.get_mut(dag_idx) {
                    dag.version = version;
                    dag.joined = false;
                    dag.preferred_parent = None;
                    dag.rank = INFINITE_RANK;
                }
                self.trickle.reset(self.instances.get(instance_idx)?.instance_id);
            }
            return Some(dag_idx);
        }

        let dag_idx = self.dags.try_insert(Dag::new(instance_idx, dag_id, version))?;
        if let Some(instance) = self.instances.get_mut(instance_idx) {
            instance.dags.push(dag_idx);
        }
        Some(dag_idx)
    }

    fn find_or_create_parent(&mut self, dag_idx: Index<Dag>, address: Ipv6Addr) -> Option<Index<Parent>> {
        let existing = self
            .dags
            .get(dag_idx)?
            .parents
            .iter()
            .copied()
            .find(|&idx| self.parents.get(idx).map(|p| p.address) == Some(address));
        if let Some(idx) = existing {
            return Some(idx);
        }
        let parent_idx = self.parents.try_insert(Parent::new(dag_idx, address))?;
        if let Some(dag) = self.dags.get_mut(dag_idx) {
            dag.parents.push(parent_idx);
        }
        Some(parent_idx)
    }

    /// Re-run parent selection for one DAG: pick the OF's favorite among
    /// non-poisoned candidates that rank below us, recompute our own
    /// rank from it, and update `joined`/`preferred_parent` (the
    /// reference's `rpl_process_dio`, folded in here rather than kept as a
    /// separate indirection since this crate owns the whole model).
    fn recompute_preferred_parent(&mut self, instance_idx: Index<crate::model::Instance>, dag_idx: Index<Dag>) {
        let (of, min_hoprankinc) = match self.instances.get(instance_idx) {
            Some(i) => (i.of, i.min_hoprankinc),
            None => return,
        };
        let of = of.as_of();

        let current_rank = self.dags.get(dag_idx).map(|d| d.rank).unwrap_or(INFINITE_RANK);
        let preferred = self.dags.get(dag_idx).and_then(|d| d.preferred_parent);

        let candidates: Vec<Index<Parent>> = self
            .dags
            .get(dag_idx)
            .map(|d| d.parents.clone())
            .unwrap_or_default()
            .into_iter()
            .filter(|&idx| {
                self.parents
                    .get(idx)
                    .map(|p| !p.is_poisoned() && p.rank < current_rank)
                    .unwrap_or(false)
            })
            .collect();

        let mut best: Option<Index<Parent>> = None;
        for &cand in &candidates {
            best = Some(match best {
                None => cand,
                Some(b) => {
                    let b_parent = self.parents.get(b).unwrap();
                    let c_parent = self.parents.get(cand).unwrap();
                    let choice = of.best_parent(
                        b_parent,
                        preferred == Some(b),
                        c_parent,
                        preferred == Some(cand),
                        min_hoprankinc,
                    );
                    match choice {
                        ParentChoice::First => b,
                        ParentChoice::Second => cand,
                    }
                }
            });
        }

        match best {
            Some(parent_idx) => {
                let parent = self.parents.get(parent_idx).unwrap();
                let new_rank = of.calculate_rank(Some(parent), 0, min_hoprankinc);
                if let Some(dag) = self.dags.get_mut(dag_idx) {
                    if new_rank == INFINITE_RANK {
                        dag.joined = false;
                        dag.preferred_parent = None;
                        dag.rank = INFINITE_RANK;
                    } else {
                        dag.preferred_parent = Some(parent_idx);
                        dag.rank = new_rank;
                        dag.joined = true;
                    }
                }
            }
            None => {
                if let Some(dag) = self.dags.get_mut(dag_idx) {
                    dag.joined = false;
                    dag.preferred_parent = None;
                    dag.rank = INFINITE_RANK;
                }
            }
        }
    }

    /// Unicast reply to a DIS solicitor, or (for non-leaf nodes with no
    /// explicit destination) a multicast advertisement.
    pub fn send_dio(&mut self, instance_id: u8, dest: Option<Ipv6Addr>) {
        let instance_idx = match self.instance_by_id.get(&instance_id) {
            Some(&idx) => idx,
            None => return,
        };
        let dag_idx = match self.instances.get(instance_idx).and_then(|i| i.current_dag) {
            Some(idx) => idx,
            None => return,
        };
        let dag = match self.dags.get(dag_idx) {
            Some(d) => d.clone(),
            None => return,
        };

        if dest.is_none() && self.config.leaf_only {
            // Leaf nodes never emit multicast DIOs.
            return;
        }

        let is_root = dag.rank == ROOT_RANK && dag.preferred_parent.is_none();
        if dest.is_none() && self.config.refresh_dao_routes && is_root {
            if let Some(instance) = self.instances.get_mut(instance_idx) {
                instance.dtsn_out = instance.dtsn_out.increment();
            }
        }

        let instance = match self.instances.get(instance_idx) {
            Some(i) => i,
            None => return,
        };

        let mut options = Vec::new();
        if instance.mc.mc_type != crate::wire::options::MetricContainerType::None {
            options.push(RplOption::DagMetricContainer(MetricContainer {
                mc_type: instance.mc.mc_type,
                flags: instance.mc.flags,
                aggregation: instance.mc.aggregation,
                precedence: instance.mc.precedence,
                value: instance.mc.value,
            }));
        }
        options.push(RplOption::DagConf(DagConf {
            path_control: 0,
            dio_interval_doublings: instance.dio_intdoubl,
            dio_interval_min: instance.dio_intmin,
            dio_redundancy: instance.dio_redundancy,
            max_rankinc: instance.max_rankinc,
            min_hoprankinc: instance.min_hoprankinc,
            ocp: instance.of.as_of().ocp(),
            default_lifetime: instance.default_lifetime,
            lifetime_unit: instance.lifetime_unit,
        }));
        if let Some(pi) = dag.prefix_info {
            options.push(RplOption::PrefixInfo(PrefixInfo {
                prefix_len: pi.prefix_len,
                flags: pi.flags,
                valid_lifetime: pi.lifetime,
                preferred_lifetime: pi.lifetime,
                prefix: pi.prefix,
            }));
        }

        let rank = if self.config.leaf_only { INFINITE_RANK } else { dag.rank };
        let dio = Dio {
            instance_id,
            version: dag.version,
            rank,
            grounded: dag.grounded,
            mop: instance.mop,
            preference: dag.preference,
            dtsn: instance.dtsn_out,
            dag_id: dag.dag_id,
            options,
        };
        let mut buf = BytesMut::new();
        dio.write_to(&mut buf);
        let target = dest.unwrap_or(crate::handlers::dis::ALL_RPL_NODES);
        if dest.is_some() {
            self.stats.dio_sent_u += 1;
        } else {
            self.stats.dio_sent_m += 1;
        }
        if let Err(e) = self.icmpv6.send(target, RplCode::Dio, &buf) {
            tracing::warn!(?e, "failed to send DIO");
        }
    }
}
