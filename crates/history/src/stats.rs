//! Hit/update tallies returned by every query.

use crate::error::{Error, Result};

/// The number of `true` observations (`hits`) out of `updates` observations
/// over some window of a history.
///
/// The ratio is only defined for a non-empty window. [`Stats::ratio`] makes
/// that explicit by returning `None` rather than a fabricated number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Stats {
    /// Number of `true` observations.
    pub hits: u64,
    /// Number of observations.
    pub updates: u64,
}

impl Stats {
    /// An empty window.
    pub const EMPTY: Self = Self { hits: 0, updates: 0 };

    /// Creates a tally of `hits` out of `updates`.
    #[must_use]
    pub const fn new(hits: u64, updates: u64) -> Self { Self { hits, updates } }

    /// Returns `true` if the window holds no observations.
    #[must_use]
    pub const fn is_empty(&self) -> bool { self.updates == 0 }

    /// The fraction of `true` observations, or `None` for an empty window.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn ratio(&self) -> Option<f64> {
        (self.updates != 0).then(|| self.hits as f64 / self.updates as f64)
    }

    /// Like [`Stats::ratio`] but reports an empty window as
    /// [`Error::UndefinedRatio`].
    pub fn try_ratio(&self) -> Result<f64> {
        self.ratio().ok_or(Error::UndefinedRatio)
    }

    /// Like [`Stats::ratio`] but maps an empty window to `NaN`, for callers
    /// that aggregate with NaN-aware arithmetic.
    #[must_use]
    pub fn ratio_or_nan(&self) -> f64 { self.ratio().unwrap_or(f64::NAN) }
}

impl From<Stats> for (u64, u64, Option<f64>) {
    fn from(stats: Stats) -> Self { (stats.hits, stats.updates, stats.ratio()) }
}
