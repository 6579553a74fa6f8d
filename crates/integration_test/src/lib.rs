//! Shared input generators and oracle comparisons for `binary_history`
//! integration tests.
//!
//! Inputs are run-length patterns: alternating runs of `false` and `true`
//! whose lengths are drawn from `|N(0, scale)| + 1`. A small scale gives a
//! high-frequency pattern that flips every few observations, a large scale a
//! low-frequency one with long stretches of the same value.

#![allow(missing_docs)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_panics_doc)]

use binary_history::{CompressedHistoryStore, ExactHistoryBuffer, Stats};
use rand::{SeedableRng, rngs::StdRng};
use rand_distr::{Distribution, Normal};

// ============================================================================
// Input Patterns
// ============================================================================

/// Number of runs and run length scale of a high-frequency pattern.
pub const HIGH_FREQUENCY: (usize, f64) = (2048, 4.0);

/// Number of runs and run length scale of a low-frequency pattern.
pub const LOW_FREQUENCY: (usize, f64) = (512, 32.0);

/// `runs` alternating runs, starting with a run of `false`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn run_length_pattern(
    rng: &mut StdRng,
    runs: usize,
    scale: f64,
) -> Vec<bool> {
    let normal = Normal::new(0.0, scale).expect("scale must be finite");
    let mut pattern = Vec::new();

    for run in 0..runs {
        let length = normal.sample(rng).abs() as usize + 1;
        pattern.extend(std::iter::repeat_n(run % 2 == 1, length));
    }

    pattern
}

/// A reproducible high-frequency pattern.
pub fn high_frequency_pattern(seed: u64) -> Vec<bool> {
    let (runs, scale) = HIGH_FREQUENCY;
    run_length_pattern(&mut StdRng::seed_from_u64(seed), runs, scale)
}

/// A reproducible low-frequency pattern.
pub fn low_frequency_pattern(seed: u64) -> Vec<bool> {
    let (runs, scale) = LOW_FREQUENCY;
    run_length_pattern(&mut StdRng::seed_from_u64(seed), runs, scale)
}

// ============================================================================
// Oracle Comparison
// ============================================================================

/// The largest amount by which level `level` may overstate the hits of its
/// window.
pub const fn hit_error_bound(level: usize) -> u64 { (2u64 << level) - 1 }

/// One level of a compressed store next to the exact tally of the same
/// window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelComparison {
    pub level: usize,
    pub estimated: Stats,
    pub exact: Stats,
}

impl LevelComparison {
    /// Returns `true` if the estimate is within the decimation error bound.
    pub fn is_within_bound(&self) -> bool {
        self.estimated.updates == self.exact.updates
            && self.estimated.hits >= self.exact.hits
            && self.estimated.hits - self.exact.hits
                <= hit_error_bound(self.level)
    }

    /// The absolute difference of the two ratios, zero for empty windows.
    pub fn ratio_error(&self) -> f64 {
        match (self.estimated.ratio(), self.exact.ratio()) {
            (Some(estimated), Some(exact)) => (estimated - exact).abs(),
            _ => 0.0,
        }
    }
}

/// A compressed store and an exact buffer fed the same observations.
#[derive(Debug, Clone)]
pub struct Oracle {
    pub compressed: CompressedHistoryStore,
    pub exact: ExactHistoryBuffer,
}

impl Oracle {
    pub fn new(levels: usize) -> Self {
        Self {
            compressed: CompressedHistoryStore::new(levels)
                .expect("level count must be supported"),
            exact: ExactHistoryBuffer::new(),
        }
    }

    pub fn update(&mut self, value: bool) {
        self.compressed.update(value);
        self.exact.update(value);
    }

    /// Every level's estimate next to the exact tally of the window it
    /// claims to cover.
    #[allow(clippy::cast_possible_truncation)]
    pub fn compare(&self) -> Vec<LevelComparison> {
        self.compressed
            .histories()
            .into_iter()
            .enumerate()
            .map(|(level, estimated)| LevelComparison {
                level,
                estimated,
                exact: self.exact.window(0, estimated.updates as usize),
            })
            .collect()
    }

    /// Panics with the offending level unless every level is within bound
    /// and the lifetime totals agree.
    pub fn assert_within_bound(&self) {
        assert_eq!(self.compressed.totals(), self.exact.totals());

        for comparison in self.compare() {
            assert!(
                comparison.is_within_bound(),
                "level {} out of bound after {} updates: {comparison:?}",
                comparison.level,
                self.exact.totals().updates,
            );
        }
    }
}

impl Extend<bool> for Oracle {
    fn extend<T: IntoIterator<Item = bool>>(&mut self, iter: T) {
        for value in iter {
            self.update(value);
        }
    }
}
