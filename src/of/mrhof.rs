//! MRHOF (Minimum Rank with Hysteresis Objective Function, RFC 6719)
//! using ETX as both link metric and aggregated path metric.

use super::{AckOutcome, DaoAckAction, ObjectiveFunction, ParentChoice};
use crate::external::TxStatus;
use crate::model::{Dag, Instance, Parent, INFINITE_RANK};
use crate::wire::options::{MetricContainerType, MetricValue};

pub const ETX_DIVISOR: u16 = 128;
pub const MAX_LINK_METRIC: u16 = 10;
pub const MAX_PATH_COST: u16 = 100 * ETX_DIVISOR;
pub const PARENT_SWITCH_THRESHOLD_DIV: u16 = 2;
pub const ETX_ALPHA: u32 = 90;
pub const ETX_SCALE: u32 = 100;
/// Link metric assumed for a not-yet-measured parent, scaled by
/// `ETX_DIVISOR`.
pub const INIT_LINK_METRIC: u16 = 2;

pub struct Mrhof;

impl Mrhof {
    pub const OCP: u16 = 1;

    fn path_metric(p: &Parent) -> u16 {
        p.rank.saturating_add(p.link_metric)
    }
}

impl ObjectiveFunction for Mrhof {
    fn ocp(&self) -> u16 {
        Self::OCP
    }

    fn neighbor_link_callback(&self, parent: &mut Parent, status: TxStatus, num_tx: u8) {
        let packet_etx = match status {
            TxStatus::Ok => u16::from(num_tx) * ETX_DIVISOR,
            TxStatus::NoAck => MAX_LINK_METRIC * ETX_DIVISOR,
            TxStatus::Other => return,
        };
        let old = u32::from(parent.link_metric);
        let new = (old * ETX_ALPHA + u32::from(packet_etx) * (ETX_SCALE - ETX_ALPHA)) / ETX_SCALE;
        parent.link_metric = new.min(u32::from(u16::MAX)) as u16;
    }

    fn best_parent(
        &self,
        p1: &Parent,
        p1_is_preferred: bool,
        p2: &Parent,
        p2_is_preferred: bool,
        _min_hoprankinc: u16,
    ) -> ParentChoice {
        let m1 = Self::path_metric(p1);
        let m2 = Self::path_metric(p2);
        let diff = m1.abs_diff(m2);
        if (p1_is_preferred || p2_is_preferred) && diff <= ETX_DIVISOR / PARENT_SWITCH_THRESHOLD_DIV {
            return if p1_is_preferred {
                ParentChoice::First
            } else {
                ParentChoice::Second
            };
        }
        if m1 <= m2 {
            ParentChoice::First
        } else {
            ParentChoice::Second
        }
    }

    fn calculate_rank(&self, parent: Option<&Parent>, mut base_rank: u16, _min_hoprankinc: u16) -> u16 {
        let increase = match parent {
            None if base_rank == 0 => return INFINITE_RANK,
            None => INIT_LINK_METRIC * ETX_DIVISOR,
            Some(p) => {
                if base_rank == 0 {
                    base_rank = p.rank;
                }
                p.link_metric
            }
        };
        base_rank.saturating_add(increase).min(INFINITE_RANK)
    }

    fn update_metric_container(&self, instance: &mut Instance, path_metric: u16) {
        instance.mc.aggregation = 0; // additive
        instance.mc.flags = 0;
        instance.mc.precedence = 0;
        instance.mc.value = match instance.mc.mc_type {
            MetricContainerType::Etx => MetricValue::Etx(path_metric.min(MAX_PATH_COST)),
            MetricContainerType::Energy => MetricValue::Energy {
                flags: 0,
                energy_est: path_metric.min(255) as u8,
            },
            MetricContainerType::None => MetricValue::None,
        };
    }

    fn dao_ack_callback(&self, _status: AckOutcome) -> DaoAckAction {
        DaoAckAction::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::arena::{Arena, Index};

    fn parent(rank: u16, link_metric: u16) -> Parent {
        let mut instances: Arena<Instance> = Arena::with_capacity(1);
        let instance_idx: Index<Instance> = instances
            .try_insert(Instance::new(1, super::super::ObjectiveFunctionKind::Mrhof, &crate::config::Config::default()))
            .unwrap();
        let mut dags: Arena<Dag> = Arena::with_capacity(1);
        let dag_idx: Index<Dag> = dags
            .try_insert(Dag::new(
                instance_idx,
                "2001:db8::".parse().unwrap(),
                crate::lollipop::Lollipop::init(),
            ))
            .unwrap();
        let mut p = Parent::new(dag_idx, "2001:db8::1".parse().unwrap());
        p.rank = rank;
        p.link_metric = link_metric;
        p
    }

    #[test]
    fn scenario_1_hysteresis_keeps_preferred() {
        let p1 = parent(256, 128); // path = 384
        let p2 = parent(256, 96); // path = 352, diff = 32 <= 64
        let choice = Mrhof.best_parent(&p1, true, &p2, false, 0);
        assert_eq!(choice, ParentChoice::First);
    }

    #[test]
    fn scenario_2_switch_when_improvement_exceeds_threshold() {
        let p1 = parent(256, 128); // path = 384
        let p2 = parent(256, 32); // path = 288, diff = 96 > 64
        let choice = Mrhof.best_parent(&p1, true, &p2, false, 0);
        assert_eq!(choice, ParentChoice::Second);
    }

    #[test]
    fn calculate_rank_with_no_parent_and_zero_base_is_infinite() {
        assert_eq!(Mrhof.calculate_rank(None, 0, 0), INFINITE_RANK);
    }

    #[test]
    fn calculate_rank_saturates() {
        let p = parent(u16::MAX - 1, 100);
        assert_eq!(Mrhof.calculate_rank(Some(&p), 0, 0), INFINITE_RANK);
    }
}
