//! 8-bit "lollipop" sequence counters used for DTSN, DAO/DCO/path sequence
//! numbers, and DAG version.
//!
//! The low half `[0, 127]` is a circular region that wraps indefinitely;
//! the high half `[128, 255]` is a linear "just booted" region a node only
//! passes through once after reset, so two nodes can tell a freshly
//! rebooted peer from one that's been running a while. Grounded on the
//! reference implementation's `RPL_LOLLIPOP_INCREMENT`/`RPL_LOLLIPOP_INIT`
//! macros in `rpl-icmp6.c`.

pub const CIRCULAR_REGION: u8 = 127;
pub const SEQUENCE_WINDOW: u8 = 16;
/// Starting value for a freshly created counter: in the linear region, near
/// its top so a handful of increments land it in the circular region.
pub const INIT: u8 = 255 - SEQUENCE_WINDOW;

/// A lollipop-sequenced counter. Plain `u8` arithmetic with the wraparound
/// and comparison rules from RFC 6550 §7.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Lollipop(u8);

impl Lollipop {
    pub fn new(value: u8) -> Self {
        Lollipop(value)
    }

    pub fn init() -> Self {
        Lollipop(INIT)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Advance by one, per the circular-vs-linear wraparound rule: once a
    /// counter reaches 255 it drops back to 128 rather than to 0, so it
    /// never re-enters the linear "just booted" region.
    pub fn increment(self) -> Self {
        let v = if self.0 == 255 {
            128
        } else {
            self.0.wrapping_add(1)
        };
        Lollipop(v)
    }

    /// Is `self` logically newer than `other`?
    pub fn greater_than(self, other: Lollipop) -> bool {
        let (a, b) = (self.0, other.0);
        let a_circular = a <= CIRCULAR_REGION;
        let b_circular = b <= CIRCULAR_REGION;
        match (a_circular, b_circular) {
            (true, true) => a != b && (i32::from(a) - i32::from(b)).rem_euclid(128) < 64,
            (false, false) => a > b,
            // Mixed regions: the linear-region value is always older.
            (true, false) => true,
            (false, true) => false,
        }
    }
}

impl Default for Lollipop {
    fn default() -> Self {
        Lollipop::init()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increment_wraps_to_circular_region_not_zero() {
        assert_eq!(Lollipop::new(255).increment(), Lollipop::new(128));
    }

    #[test]
    fn increment_is_plain_within_a_region() {
        assert_eq!(Lollipop::new(10).increment(), Lollipop::new(11));
        assert_eq!(Lollipop::new(200).increment(), Lollipop::new(201));
    }

    #[test]
    fn circular_region_wraparound_comparison() {
        // Close together: normal ordering.
        assert!(Lollipop::new(5).greater_than(Lollipop::new(3)));
        assert!(!Lollipop::new(3).greater_than(Lollipop::new(5)));
        // Wrapped: a small value can be "newer" than a large one if the
        // difference mod 128 is small enough.
        assert!(Lollipop::new(1).greater_than(Lollipop::new(126)));
        assert!(!Lollipop::new(126).greater_than(Lollipop::new(1)));
    }

    #[test]
    fn linear_region_is_plain_numeric() {
        assert!(Lollipop::new(200).greater_than(Lollipop::new(150)));
        assert!(!Lollipop::new(150).greater_than(Lollipop::new(200)));
    }

    #[test]
    fn mixed_region_linear_is_always_older() {
        assert!(Lollipop::new(10).greater_than(Lollipop::new(200)));
        assert!(!Lollipop::new(200).greater_than(Lollipop::new(10)));
    }

    #[test]
    fn irreflexive() {
        let a = Lollipop::new(42);
        assert!(!a.greater_than(a));
    }
}
