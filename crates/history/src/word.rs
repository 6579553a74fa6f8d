//! The 64-bit register that every compression level is built from.
//!
//! A [`Word`] holds the 64 most recent bits of the stream it is fed, keeps a
//! running popcount of them, and decimates the bits it evicts: every two
//! evicted bits are folded into one bit for the next coarser level.
//!
//! # Decimation
//!
//! Evicted bits are paired. The first bit of a pair is parked in `hold`. When
//! the second arrives the three signals `hold`, `evicted` and `carry` are
//! summed (`0..=3`). The forwarded bit is the majority (`sum >= 2`) and the
//! remainder `sum & 1` becomes the new `carry`:
//!
//! ```text
//! hold evicted carry | out carry'
//!   0     0      0   |  0    0
//!   1     0      0   |  0    1
//!   1     1      0   |  1    0
//!   1     1      1   |  1    1
//! ```
//!
//! Writing `w` for the weight of one bit at this level, the invariant
//! `2w * forwarded + w * carry == w * paired` holds after every pair, so no
//! hit mass is created or lost by rounding. The remainder is only delayed by
//! at most one bit.

use std::fmt;

const CARRY: u8 = 0b001;
const HOLD: u8 = 0b010;
const HOLD_VALID: u8 = 0b100;

/// A fixed-width shift register with incremental popcount and the control
/// state of one decimation stage.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Word {
    /// Newest bit at position 0, oldest valid bit at position `len - 1`.
    register: u64,
    /// Always equal to `register.count_ones()`.
    hits: u8,
    /// Number of valid bits in `register`, saturating at 64.
    len: u8,
    control: u8,
}

impl Word {
    /// The number of observations a register holds.
    pub const BITS: u32 = u64::BITS;

    /// Creates an empty word.
    #[must_use]
    pub const fn new() -> Self {
        Self { register: 0, hits: 0, len: 0, control: 0 }
    }

    /// Shifts `value` into the register.
    ///
    /// Returns the decimated bit to feed the next coarser level, if this
    /// update completed a pair of evicted bits.
    pub fn push(&mut self, value: bool) -> Option<bool> {
        let full = self.is_full();
        let evicted = full && (self.register >> 63) != 0;

        self.register = (self.register << 1) | u64::from(value);
        self.hits = self.hits + u8::from(value) - u8::from(evicted);

        if !full {
            self.len += 1;
            return None;
        }

        if !self.hold_valid() {
            self.control |= HOLD_VALID;
            if evicted {
                self.control |= HOLD;
            }
            return None;
        }

        let state =
            u8::from(self.hold()) + u8::from(evicted) + self.carry_bit();
        self.control = state & CARRY;

        Some(state >= 2)
    }

    /// The raw register, newest bit at position 0.
    #[must_use]
    pub const fn register(&self) -> u64 { self.register }

    /// The number of set bits in the register.
    #[must_use]
    pub const fn running_hits(&self) -> u32 { self.hits as u32 }

    /// The number of valid bits in the register.
    #[must_use]
    pub const fn len(&self) -> u32 { self.len as u32 }

    /// Returns `true` if nothing was ever pushed.
    #[must_use]
    pub const fn is_empty(&self) -> bool { self.len == 0 }

    /// Returns `true` once the register has absorbed its first 64 bits.
    #[must_use]
    pub const fn is_full(&self) -> bool { self.len as u32 == Self::BITS }

    /// The rounding remainder of the previous pair.
    #[must_use]
    pub const fn carry(&self) -> bool { self.control & CARRY != 0 }

    /// The first evicted bit of a pending pair.
    #[must_use]
    pub const fn hold(&self) -> bool { self.control & HOLD != 0 }

    /// Returns `true` if a pair is half complete.
    #[must_use]
    pub const fn hold_valid(&self) -> bool { self.control & HOLD_VALID != 0 }

    const fn carry_bit(&self) -> u8 { self.control & CARRY }
}

impl fmt::Debug for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Word")
            .field("register", &format_args!("{:064b}", self.register))
            .field("hits", &self.hits)
            .field("len", &self.len)
            .field("carry", &self.carry())
            .field("hold", &self.hold())
            .field("hold_valid", &self.hold_valid())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn fill(word: &mut Word, value: bool) {
        for _ in 0..Word::BITS {
            assert_eq!(word.push(value), None);
        }
    }

    #[test]
    fn fill_phase_forwards_nothing() {
        let mut word = Word::new();

        for n in 1..=64 {
            assert_eq!(word.push(true), None);
            assert_eq!(word.len(), n);
            assert_eq!(word.running_hits(), n);
        }

        assert!(word.is_full());
        assert!(!word.hold_valid());
        assert!(!word.carry());
    }

    #[test]
    fn evicted_bits_are_paired() {
        let mut word = Word::new();
        fill(&mut word, true);

        // first eviction is parked
        assert_eq!(word.push(false), None);
        assert!(word.hold_valid());
        assert!(word.hold());

        // second eviction completes the pair
        assert_eq!(word.push(false), Some(true));
        assert!(!word.hold_valid());
        assert!(!word.hold());
        assert!(!word.carry());
    }

    #[test]
    fn odd_pair_leaves_carry() {
        let mut word = Word::new();

        // oldest two bits: 1 then 0
        word.push(true);
        for _ in 1..Word::BITS {
            word.push(false);
        }

        assert_eq!(word.push(false), None);
        assert_eq!(word.push(false), Some(false));
        assert!(word.carry());
    }

    #[test]
    fn carry_is_spent_by_the_next_odd_pair() {
        // evicted sequence 1,0,0,1 -> pairs (1,0) and (0,1)
        let mut word = Word::new();
        for bit in [true, false, false, true] {
            word.push(bit);
        }
        for _ in 4..Word::BITS {
            word.push(false);
        }

        assert_eq!(word.push(false), None);
        assert_eq!(word.push(false), Some(false));
        assert!(word.carry());

        assert_eq!(word.push(false), None);
        assert_eq!(word.push(false), Some(true));
        assert!(!word.carry());
    }

    #[test]
    fn debug_renders_the_full_register() {
        let mut word = Word::new();
        word.push(true);

        let rendered = format!("{word:?}");
        assert!(rendered.contains(&format!("{:064b}", 1)));
    }

    proptest! {
        #[test]
        fn running_hits_tracks_popcount(bits in prop::collection::vec(any::<bool>(), 0..512)) {
            let mut word = Word::new();

            for bit in bits {
                word.push(bit);
                prop_assert_eq!(word.running_hits(), word.register().count_ones());
                prop_assert!(word.len() <= Word::BITS);
            }
        }

        #[test]
        fn decimation_conserves_hit_mass(bits in prop::collection::vec(any::<bool>(), 0..1024)) {
            let mut word = Word::new();
            let mut forwarded = 0u64;

            for &bit in &bits {
                if word.push(bit) == Some(true) {
                    forwarded += 1;
                }
            }

            let total = bits.iter().filter(|&&b| b).count() as u64;
            let retained = u64::from(word.running_hits())
                + u64::from(word.hold())
                + u64::from(word.carry());

            prop_assert_eq!(total, retained + 2 * forwarded);
        }
    }
}
