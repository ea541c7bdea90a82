//! Sequence numbers with wraparound-safe comparison.
//!
//! A session's sequence space is the full `u32` ring. The handshake starts
//! from a randomized value, so a transfer may legitimately cross the numeric
//! maximum; all ordering is therefore modular (TCP-style), never plain `<`.

use rand::Rng;

use super::constants::INITIAL_SEQ_HEADROOM;

/// A packet sequence number in a modular `u32` space.
///
/// Within one session, sequence number `k + 1` always identifies the byte
/// range immediately following packet `k`, even across the wraparound
/// boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Seq(u32);

impl Seq {
    /// Create a sequence number from its raw value.
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw `u32` value.
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Draw a randomized initial sequence number.
    ///
    /// The value is kept [`INITIAL_SEQ_HEADROOM`] below `u32::MAX` so that
    /// the largest file a session is expected to move fits without the
    /// *handshake itself* relying on wraparound; comparisons stay modular
    /// regardless.
    pub fn random_initial<R: Rng>(rng: &mut R) -> Self {
        Self(rng.gen_range(0..u32::MAX - INITIAL_SEQ_HEADROOM))
    }

    /// The sequence number immediately after this one.
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    /// This sequence number advanced by `n`.
    pub const fn add(self, n: u32) -> Self {
        Self(self.0.wrapping_add(n))
    }

    /// Modular distance from `base` to `self`.
    ///
    /// For any in-window pair this is the number of packets `self` is ahead
    /// of `base`; a value in the upper half of the ring means `self` is
    /// actually behind `base`.
    pub const fn distance(self, base: Self) -> u32 {
        self.0.wrapping_sub(base.0)
    }

    /// Modular "strictly after" comparison.
    pub const fn after(self, other: Self) -> bool {
        (self.0.wrapping_sub(other.0) as i32) > 0
    }

    /// Modular "strictly before" comparison.
    pub const fn before(self, other: Self) -> bool {
        (self.0.wrapping_sub(other.0) as i32) < 0
    }
}

impl std::fmt::Display for Seq {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for Seq {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_successor_and_distance() {
        let a = Seq::new(100);
        assert_eq!(a.next(), Seq::new(101));
        assert_eq!(a.add(5), Seq::new(105));
        assert_eq!(a.add(5).distance(a), 5);
    }

    #[test]
    fn test_modular_ordering() {
        let a = Seq::new(10);
        let b = Seq::new(20);
        assert!(b.after(a));
        assert!(a.before(b));
        assert!(!a.after(a));
        assert!(!a.before(a));
    }

    #[test]
    fn test_wraparound_ordering() {
        let near_max = Seq::new(u32::MAX - 1);
        let wrapped = near_max.add(3); // 1
        assert_eq!(wrapped.raw(), 1);
        assert!(wrapped.after(near_max));
        assert!(near_max.before(wrapped));
        assert_eq!(wrapped.distance(near_max), 3);
    }

    #[test]
    fn test_wraparound_successor() {
        assert_eq!(Seq::new(u32::MAX).next(), Seq::new(0));
    }

    #[test]
    fn test_random_initial_leaves_headroom() {
        let mut rng = rand::thread_rng();
        for _ in 0..1000 {
            let seq = Seq::random_initial(&mut rng);
            assert!(seq.raw() < u32::MAX - INITIAL_SEQ_HEADROOM);
        }
    }
}
