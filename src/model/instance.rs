//! An RPL instance: the unit that owns an objective function selection,
//! a set of DAGs, and the lollipop counters that used to be
//! process-wide globals in the reference implementation.

use super::arena::Index;
use super::Dag;
use crate::config::Config;
use crate::dao_state::DaoState;
use crate::lollipop::Lollipop;
use crate::of::ObjectiveFunctionKind;
use crate::wire::dio::ModeOfOperation;
use crate::wire::options::{MetricContainerType, MetricValue};

/// Whether the instance is actively advertising downward routes or has
/// withdrawn ("feather"/quiescent mode).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatingMode {
    Normal,
    Feather,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricContainerConfig {
    pub mc_type: MetricContainerType,
    pub flags: u8,
    pub aggregation: u8,
    pub precedence: u8,
    pub value: MetricValue,
}

pub struct Instance {
    pub instance_id: u8,
    pub of: ObjectiveFunctionKind,
    pub dags: Vec<Index<Dag>>,
    pub current_dag: Option<Index<Dag>>,
    pub mop: ModeOfOperation,
    pub dio_intmin: u8,
    pub dio_intdoubl: u8,
    pub dio_redundancy: u8,
    pub min_hoprankinc: u16,
    pub max_rankinc: u16,
    pub default_lifetime: u8,
    pub lifetime_unit: u16,
    pub dtsn_out: Lollipop,
    pub mc: MetricContainerConfig,
    pub dao_sequence: Lollipop,
    pub dco_sequence: Lollipop,
    pub path_sequence: Lollipop,
    pub has_downward_route: bool,
    pub mode: OperatingMode,
    pub dao_state: DaoState,
}

impl Instance {
    pub fn new(instance_id: u8, of: ObjectiveFunctionKind, config: &Config) -> Instance {
        Instance {
            instance_id,
            of,
            dags: Vec::new(),
            current_dag: None,
            mop: ModeOfOperation::Storing,
            dio_intmin: config.dio_interval_min,
            dio_intdoubl: config.dio_interval_doublings,
            dio_redundancy: config.dio_redundancy_constant,
            min_hoprankinc: config.min_hoprankinc,
            max_rankinc: config.max_rankinc,
            default_lifetime: config.default_lifetime,
            lifetime_unit: config.lifetime_unit,
            dtsn_out: Lollipop::init(),
            mc: MetricContainerConfig {
                mc_type: MetricContainerType::None,
                flags: 0,
                aggregation: 0,
                precedence: 0,
                value: MetricValue::None,
            },
            dao_sequence: Lollipop::init(),
            dco_sequence: Lollipop::init(),
            path_sequence: Lollipop::init(),
            has_downward_route: false,
            mode: OperatingMode::Normal,
            dao_state: DaoState::Idle,
        }
    }

    /// Is this the "legacy, no DAO-ACK expected" compatibility mode?
    pub fn is_legacy_no_ack(&self, config: &Config) -> bool {
        config.legacy_no_ack_lifetime && self.lifetime_unit == 0xffff && self.default_lifetime == 0xff
    }
}
