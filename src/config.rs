//! Compile-time defaults the reference implementation hides behind
//! `#define`s, exposed here as a runtime-configurable struct so a single
//! binary can run several profiles without recompiling.

/// Tunables for one running node. `Instance::new` copies the relevant
/// fields in; later `DAG_CONF` options from a joined DAG override them
/// per-instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub dio_interval_min: u8,
    pub dio_interval_doublings: u8,
    pub dio_redundancy_constant: u8,
    pub default_lifetime: u8,
    pub lifetime_unit: u16,
    pub min_hoprankinc: u16,
    pub max_rankinc: u16,
    pub dao_retransmission_timeout_ms: u32,
    pub max_dao_retransmissions: u8,
    pub nopath_removal_delay_s: u32,
    /// Exposed as a runtime switch rather than a compile-time `#ifdef`.
    pub leaf_only: bool,
    pub repair_on_dao_nack: bool,
    /// Lollipop-increment `dtsn_out` when the root emits a multicast DIO.
    pub refresh_dao_routes: bool,
    /// Preserve the legacy "infinite lifetime means no DAO-ACK expected"
    /// compatibility escape behind a named switch instead of an inline
    /// magic-number comparison.
    pub legacy_no_ack_lifetime: bool,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            dio_interval_min: 12,
            dio_interval_doublings: 8,
            dio_redundancy_constant: 10,
            default_lifetime: 30,
            lifetime_unit: 60,
            min_hoprankinc: 256,
            max_rankinc: 0,
            dao_retransmission_timeout_ms: 15_000,
            max_dao_retransmissions: 5,
            nopath_removal_delay_s: 60,
            leaf_only: false,
            repair_on_dao_nack: true,
            refresh_dao_routes: true,
            legacy_no_ack_lifetime: true,
        }
    }
}
