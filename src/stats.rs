//! Operator-visible counters. Field names follow the reference's
//! `rpl_stats` struct (`RPL_STAT(rpl_stats.dio_recvd++)` and friends in
//! `rpl-icmp6.c`) so anyone who's read Contiki RPL traces recognizes them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub dio_recvd: u64,
    pub dio_sent_m: u64,
    pub dio_sent_u: u64,
    pub dao_recvd: u64,
    pub dao_sent: u64,
    pub dao_forwarded: u64,
    pub npdao_recvd: u64,
    pub npdao_sent: u64,
    pub npdao_forwarded: u64,
    pub dco_recvd: u64,
    pub dco_sent: u64,
    pub dco_forwarded: u64,
    pub dco_ignored: u64,
    pub malformed_msgs: u64,
    pub mem_overflows: u64,
    pub local_repairs: u64,
}
