//! DAO retransmission & ack-correlation state machine. One of these
//! lives per [`crate::model::Instance`]; it tracks only the
//! *originating* node's own outstanding DAO, not DAOs this node merely
//! forwards, a deliberate, reference-preserving choice.

use crate::lollipop::Lollipop;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaoState {
    Idle,
    WaitingAck { attempt: u8, sequence: Lollipop },
    LocalRepair,
}

impl Default for DaoState {
    fn default() -> Self {
        DaoState::Idle
    }
}

/// Outcome of a retransmit-timer tick, for the caller to act on (arm a
/// new timer, emit a repeat DAO, or trigger local repair).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetransmitOutcome {
    /// Re-emit with the same sequence; re-arm the timer for
    /// `next_delay_ms` (already jittered: `T/2 + rand(0, T/2)`).
    Retry { sequence: Lollipop, next_delay_ms: u32 },
    /// `MAX_RETRANSMISSIONS` attempts have passed with no ACK; notify the
    /// OF and trigger local repair, unless legacy no-ack mode suppresses it.
    GiveUp { triggers_repair: bool },
}

impl DaoState {
    /// Called after a fresh DAO (non-zero lifetime) has just been sent.
    /// Arms the state machine and returns the jittered initial timeout
    /// (`T/2 + rand(0, T/2)`).
    pub fn start(sequence: Lollipop, timeout_ms: u32, jitter: u32) -> (DaoState, u32) {
        let delay = timeout_ms / 2 + jitter;
        (
            DaoState::WaitingAck {
                attempt: 1,
                sequence,
            },
            delay,
        )
    }

    /// Called on each retransmit-timer tick.
    pub fn tick(
        &mut self,
        max_retransmissions: u8,
        timeout_ms: u32,
        jitter: u32,
        legacy_no_ack: bool,
    ) -> RetransmitOutcome {
        match *self {
            DaoState::WaitingAck { attempt, sequence } => {
                if attempt >= max_retransmissions {
                    *self = DaoState::LocalRepair;
                    RetransmitOutcome::GiveUp {
                        triggers_repair: !legacy_no_ack,
                    }
                } else {
                    *self = DaoState::WaitingAck {
                        attempt: attempt + 1,
                        sequence,
                    };
                    RetransmitOutcome::Retry {
                        sequence,
                        next_delay_ms: timeout_ms / 2 + jitter,
                    }
                }
            }
            DaoState::Idle | DaoState::LocalRepair => RetransmitOutcome::GiveUp {
                triggers_repair: false,
            },
        }
    }

    /// Called on DAO-ACK arrival whose sequence equals the in-flight one.
    /// Returns `true` if the ACK matched (caller should stop the
    /// retransmit timer and invoke `dao_ack_callback`).
    pub fn matches_ack(&self, acked_sequence: Lollipop) -> bool {
        matches!(self, DaoState::WaitingAck { sequence, .. } if *sequence == acked_sequence)
    }

    pub fn cancel(&mut self) {
        *self = DaoState::Idle;
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, DaoState::Idle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn five_ticks_with_no_ack_gives_up() {
        let mut state = DaoState::WaitingAck {
            attempt: 1,
            sequence: Lollipop::new(10),
        };
        for _ in 0..3 {
            let outcome = state.tick(5, 1000, 0, false);
            assert!(matches!(outcome, RetransmitOutcome::Retry { .. }));
        }
        let outcome = state.tick(5, 1000, 0, false);
        assert_eq!(outcome, RetransmitOutcome::GiveUp { triggers_repair: true });
        assert!(matches!(state, DaoState::LocalRepair));
    }

    #[test]
    fn legacy_mode_suppresses_repair() {
        let mut state = DaoState::WaitingAck {
            attempt: 5,
            sequence: Lollipop::new(10),
        };
        let outcome = state.tick(5, 1000, 0, true);
        assert_eq!(outcome, RetransmitOutcome::GiveUp { triggers_repair: false });
    }

    #[test]
    fn matching_ack_is_recognized() {
        let state = DaoState::WaitingAck {
            attempt: 2,
            sequence: Lollipop::new(50),
        };
        assert!(state.matches_ack(Lollipop::new(50)));
        assert!(!state.matches_ack(Lollipop::new(51)));
    }

    #[test]
    fn idle_never_matches() {
        assert!(!DaoState::Idle.matches_ack(Lollipop::new(0)));
    }
}
