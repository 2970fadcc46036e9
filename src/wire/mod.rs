//! Message codec for ICMPv6-RPL (type 155): decode inbound payloads into
//! typed records, encode typed records back into wire bytes.
//!
//! One file per message kind, each with a `parse`/`write_to` pair plus its
//! own `#[cfg(test)]` module.

pub mod dao;
pub mod dao_ack;
pub mod dco;
pub mod dio;
pub mod dis;
pub mod options;
mod util;

pub use dao::Dao;
pub use dao_ack::DaoAck;
pub use dco::Dco;
pub use dio::Dio;
pub use dis::Dis;
pub use options::{
    DagConf, MetricContainer, MetricContainerType, MetricValue, OptionsIter, PrefixInfo,
    RouteInfo, RplOption, Target, Transit,
};
pub use util::WireError;

/// The ICMPv6 type used for every RPL control message (RFC 6550 §6).
pub const ICMPV6_TYPE_RPL: u8 = 155;

/// RPL control message codes, carried in the ICMPv6 header's `code` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RplCode {
    Dis,
    Dio,
    Dao,
    DaoAck,
    Dco,
    DcoAck,
}

impl RplCode {
    pub fn from_wire(code: u8) -> Option<RplCode> {
        match code {
            0x00 => Some(RplCode::Dis),
            0x01 => Some(RplCode::Dio),
            0x02 => Some(RplCode::Dao),
            0x03 => Some(RplCode::DaoAck),
            0x04 => Some(RplCode::Dco),
            0x05 => Some(RplCode::DcoAck),
            _ => None,
        }
    }

    pub fn to_wire(self) -> u8 {
        match self {
            RplCode::Dis => 0x00,
            RplCode::Dio => 0x01,
            RplCode::Dao => 0x02,
            RplCode::DaoAck => 0x03,
            RplCode::Dco => 0x04,
            RplCode::DcoAck => 0x05,
        }
    }
}

/// Status byte carried in DAO-ACK / DCO-ACK messages. `< 128` is an accept,
/// `>= 128` a reject; `Timeout` never appears on the wire, it's a purely
/// local outcome fed to the same callbacks that handle a real NACK.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckStatus {
    UnconditionalAccept,
    UnableToAccept,
    UnableToAddRouteAtRoot,
    NegativeAckDco,
    Other(u8),
    Timeout,
}

impl AckStatus {
    pub fn from_wire(v: u8) -> AckStatus {
        match v {
            0 => AckStatus::UnconditionalAccept,
            128 => AckStatus::UnableToAccept,
            129 => AckStatus::UnableToAddRouteAtRoot,
            234 => AckStatus::NegativeAckDco,
            other => AckStatus::Other(other),
        }
    }

    pub fn to_wire(self) -> u8 {
        match self {
            AckStatus::UnconditionalAccept => 0,
            AckStatus::UnableToAccept => 128,
            AckStatus::UnableToAddRouteAtRoot => 129,
            AckStatus::NegativeAckDco => 234,
            AckStatus::Other(v) => v,
            AckStatus::Timeout => 128, // never actually serialized
        }
    }

    pub fn is_nack(self) -> bool {
        self.to_wire() >= 128
    }
}
