//! Objective function framework: pluggable rank computation and
//! parent/DAG comparison behind one trait, with two concrete
//! instantiations below.

pub mod mrhof;
pub mod of0;

use crate::external::TxStatus;
use crate::model::{Dag, Instance, Parent, INFINITE_RANK};

pub use mrhof::Mrhof;
pub use of0::Of0;

/// Which concrete OF an [`Instance`] is running. A thin enum rather than
/// a trait object so the hot path (rank computation on every DIO) stays
/// monomorphized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectiveFunctionKind {
    Mrhof,
    Of0,
}

impl ObjectiveFunctionKind {
    pub fn from_ocp(ocp: u16) -> Option<ObjectiveFunctionKind> {
        match ocp {
            Mrhof::OCP => Some(ObjectiveFunctionKind::Mrhof),
            Of0::OCP => Some(ObjectiveFunctionKind::Of0),
            _ => None,
        }
    }

    pub fn as_of(self) -> &'static dyn ObjectiveFunction {
        match self {
            ObjectiveFunctionKind::Mrhof => &Mrhof,
            ObjectiveFunctionKind::Of0 => &Of0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentChoice {
    First,
    Second,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DagChoice {
    First,
    Second,
}

/// Result of a DAO-ACK, fed back to the OF so it can penalize a parent
/// that rejected our route (the reference's `dao_ack_callback`).
/// `Timeout` is a purely local outcome — the retransmit state machine
/// giving up — that never appears on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckOutcome {
    Accept,
    Reject,
    Timeout,
}

/// What an OF wants done in response to a DAO-ACK outcome. Kept as data
/// rather than a direct link-stats mutation so the OF stays free of the
/// `LinkStats` trait's address-type parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaoAckAction {
    None,
    RecordFailedTransmissions { count: u8 },
}

pub trait ObjectiveFunction {
    /// Objective Code Point identifying this OF on the wire (DAG_CONF's
    /// `ocp` field).
    fn ocp(&self) -> u16;

    fn reset(&self, dag: &mut Dag) {
        dag.rank = INFINITE_RANK;
        dag.preferred_parent = None;
        dag.joined = false;
    }

    fn neighbor_link_callback(&self, _parent: &mut Parent, _status: TxStatus, _num_tx: u8) {}

    fn best_parent(
        &self,
        p1: &Parent,
        p1_is_preferred: bool,
        p2: &Parent,
        p2_is_preferred: bool,
        min_hoprankinc: u16,
    ) -> ParentChoice;

    fn best_dag(&self, d1: &Dag, d2: &Dag) -> DagChoice {
        if d1.grounded != d2.grounded {
            return if d1.grounded {
                DagChoice::First
            } else {
                DagChoice::Second
            };
        }
        if d1.preference != d2.preference {
            return if d1.preference > d2.preference {
                DagChoice::First
            } else {
                DagChoice::Second
            };
        }
        if d1.rank <= d2.rank {
            DagChoice::First
        } else {
            DagChoice::Second
        }
    }

    fn calculate_rank(&self, parent: Option<&Parent>, base_rank: u16, min_hoprankinc: u16) -> u16;

    fn update_metric_container(&self, instance: &mut Instance, path_metric: u16);

    fn dao_ack_callback(&self, _status: AckOutcome) -> DaoAckAction {
        DaoAckAction::None
    }
}
