//! OF0 (RFC 6552), the simplest objective function: hop-count scaled by
//! link metric, no metric container.

use super::mrhof::ETX_DIVISOR;
use super::{AckOutcome, DaoAckAction, ObjectiveFunction, ParentChoice};
use crate::model::{dag_rank, Instance, Parent, INFINITE_RANK};

pub const RANK_FACTOR: u16 = 1;
pub const RANK_STRETCH: u16 = 0;
pub const MIN_STEP_OF_RANK: i32 = 1;
pub const MAX_STEP_OF_RANK: i32 = 9;

pub struct Of0;

impl Of0 {
    pub const OCP: u16 = 0;

    /// `None` means the parent is unacceptable — its raw step falls
    /// outside `[MIN_STEP_OF_RANK, MAX_STEP_OF_RANK]` (scenario 6).
    fn step_of_rank(link_metric: u16) -> Option<u16> {
        let raw = 3 * i64::from(link_metric) / i64::from(ETX_DIVISOR) - 2;
        if raw < i64::from(MIN_STEP_OF_RANK) || raw > i64::from(MAX_STEP_OF_RANK) {
            None
        } else {
            Some(raw as u16)
        }
    }

    fn rank_increase(link_metric: u16, min_hoprankinc: u16) -> Option<u16> {
        Self::step_of_rank(link_metric)
            .map(|step| (RANK_FACTOR * step + RANK_STRETCH) * min_hoprankinc)
    }

    fn path_cost(p: &Parent, min_hoprankinc: u16) -> u16 {
        match Self::step_of_rank(p.link_metric) {
            None => INFINITE_RANK,
            Some(_) => dag_rank(p.rank, min_hoprankinc)
                .saturating_mul(min_hoprankinc)
                .saturating_add(p.link_metric),
        }
    }
}

impl ObjectiveFunction for Of0 {
    fn ocp(&self) -> u16 {
        Self::OCP
    }

    fn best_parent(
        &self,
        p1: &Parent,
        p1_is_preferred: bool,
        p2: &Parent,
        p2_is_preferred: bool,
        min_hoprankinc: u16,
    ) -> ParentChoice {
        let cost1 = Self::path_cost(p1, min_hoprankinc);
        let cost2 = Self::path_cost(p2, min_hoprankinc);
        let min_difference = min_hoprankinc + min_hoprankinc / 2;
        if (p1_is_preferred || p2_is_preferred) && cost1.abs_diff(cost2) <= min_difference {
            return if p1_is_preferred {
                ParentChoice::First
            } else {
                ParentChoice::Second
            };
        }
        if cost1 <= cost2 {
            ParentChoice::First
        } else {
            ParentChoice::Second
        }
    }

    fn calculate_rank(&self, parent: Option<&Parent>, mut base_rank: u16, min_hoprankinc: u16) -> u16 {
        match parent {
            None if base_rank == 0 => INFINITE_RANK,
            None => base_rank,
            Some(p) => {
                if base_rank == 0 {
                    base_rank = p.rank;
                }
                match Self::rank_increase(p.link_metric, min_hoprankinc) {
                    Some(increase) => base_rank.saturating_add(increase).min(INFINITE_RANK),
                    None => INFINITE_RANK,
                }
            }
        }
    }

    fn update_metric_container(&self, _instance: &mut Instance, _path_metric: u16) {
        // OF0 carries no metric container; nothing to refresh.
    }

    fn dao_ack_callback(&self, status: AckOutcome) -> DaoAckAction {
        match status {
            AckOutcome::Reject | AckOutcome::Timeout => DaoAckAction::RecordFailedTransmissions { count: 10 },
            AckOutcome::Accept => DaoAckAction::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::arena::{Arena, Index};
    use crate::model::Dag;

    fn parent(rank: u16, link_metric: u16) -> Parent {
        let mut instances: Arena<Instance> = Arena::with_capacity(1);
        let instance_idx: Index<Instance> = instances
            .try_insert(Instance::new(1, super::super::ObjectiveFunctionKind::Of0, &crate::config::Config::default()))
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
    fn scenario_6_unacceptable_parent_loses_comparison() {
        let unacceptable = parent(256, 0xffff); // ETX unknown
        let acceptable = parent(256, ETX_DIVISOR); // step = 3*1-2 = 1
        let choice = Of0.best_parent(&unacceptable, false, &acceptable, false, 256);
        assert_eq!(choice, ParentChoice::Second);
        assert!(Of0::step_of_rank(unacceptable.link_metric).is_none());
        assert!(Of0::step_of_rank(acceptable.link_metric).is_some());
    }

    #[test]
    fn calculate_rank_with_no_parent_and_zero_base_is_infinite() {
        assert_eq!(Of0.calculate_rank(None, 0, 256), INFINITE_RANK);
    }

    #[test]
    fn calculate_rank_follows_step_times_min_hoprankinc() {
        let p = parent(256, ETX_DIVISOR); // step = 1
        assert_eq!(Of0.calculate_rank(Some(&p), 0, 256), 256 + 256);
    }

    #[test]
    fn dao_nack_records_ten_failed_transmissions() {
        assert_eq!(
            Of0.dao_ack_callback(AckOutcome::Timeout),
            DaoAckAction::RecordFailedTransmissions { count: 10 }
        );
    }
}
