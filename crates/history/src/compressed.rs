//! A chain of [`Word`]s approximating exponentially growing windows.
//!
//! Level 0 receives every observation. Each level forwards one decimated bit
//! for every two bits it evicts, so a bit at level `i` stands for `2^i` real
//! observations (its *fidelity*) and the register of level `i` spans
//! `64 * 2^i` of them. Bits forwarded out of the last level are dropped,
//! which is how the oldest history ages out.
//!
//! # Windows
//!
//! Level `i` of [`CompressedHistoryStore::histories`] reports the cumulative
//! window over levels `0..=i`. Its update count is exact: the chain is a FIFO,
//! so the window always covers precisely the most recent
//! `sum((len_j + hold_valid_j) * 2^j)` observations. Once every level up to
//! `i` is warm that is [`CompressedHistoryStore::nominal_window`] (plus at
//! most one pending bit per level).
//!
//! Only the hit count is approximate. Decimation conserves hit mass, so the
//! reported hits exceed the exact hits of the same window by at least zero
//! and at most `2^(i+1) - 1`, which bounds the ratio error by `1/64`. While
//! the whole history still fits in levels `0..=i` the result is exact.

use crate::{
    error::{Error, Result},
    stats::Stats,
    table::History,
    word::Word,
};

/// The largest supported number of levels; the coarsest cumulative window
/// must fit in a `u64`.
pub const MAX_LEVELS: usize = 57;

/// Bounded-memory history of one boolean stream.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompressedHistoryStore {
    words: Box<[Word]>,
    updates: u64,
    hits: u64,
}

impl CompressedHistoryStore {
    /// Creates an empty store with `levels` chained words.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] unless `1 <= levels <= MAX_LEVELS`.
    pub fn new(levels: usize) -> Result<Self> {
        if levels == 0 {
            return Err(Error::InvalidArgument(
                "a store needs at least 1 level",
            ));
        }
        if levels > MAX_LEVELS {
            return Err(Error::InvalidArgument("too many levels for a store"));
        }

        Ok(Self {
            words: vec![Word::new(); levels].into_boxed_slice(),
            updates: 0,
            hits: 0,
        })
    }

    /// Creates a store whose coarsest window covers at least `window`
    /// observations.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] if no supported level count is large
    /// enough.
    pub fn with_window(window: u64) -> Result<Self> {
        Self::new(levels_for_window(window)?)
    }

    /// Records one observation.
    pub fn update(&mut self, value: bool) {
        self.updates += 1;
        self.hits += u64::from(value);

        let mut bit = value;
        for word in &mut self.words {
            match word.push(bit) {
                Some(decimated) => bit = decimated,
                None => break,
            }
        }
    }

    /// The number of chained levels.
    #[must_use]
    pub fn levels(&self) -> usize { self.words.len() }

    /// The words of the chain, finest first.
    #[must_use]
    pub fn words(&self) -> &[Word] { &self.words }

    /// Exact lifetime tally of every observation ever recorded.
    #[must_use]
    pub const fn totals(&self) -> Stats { Stats::new(self.hits, self.updates) }

    /// The window that `level` covers once it and every finer level are warm:
    /// `64 * (2^(level + 1) - 1)` observations.
    #[must_use]
    pub const fn nominal_window(level: usize) -> u64 {
        Word::BITS as u64 * ((2u64 << level) - 1)
    }

    /// The approximate tally of the cumulative window ending at `level`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] if `level` is not below
    /// [`CompressedHistoryStore::levels`].
    pub fn history(&self, level: usize) -> Result<Stats> {
        if level >= self.levels() {
            return Err(Error::InvalidArgument(
                "level is beyond the last level",
            ));
        }

        Ok(self.windows().nth(level).unwrap_or_default())
    }

    /// The approximate tallies of every cumulative window, finest first.
    #[must_use]
    pub fn histories(&self) -> Vec<Stats> {
        let histories: Vec<Stats> = self.windows().collect();

        if tracing::enabled!(tracing::Level::TRACE) {
            for (level, (word, stats)) in
                self.words.iter().zip(&histories).enumerate()
            {
                tracing::trace!(
                    level,
                    register = %format_args!("{:064b}", word.register()),
                    hold_valid = word.hold_valid(),
                    hold = word.hold(),
                    carry = word.carry(),
                    hits = stats.hits,
                    updates = stats.updates,
                    "history level"
                );
            }
        }

        histories
    }

    fn windows(&self) -> impl Iterator<Item = Stats> + '_ {
        self.words.iter().enumerate().scan(
            (0u64, 0u64),
            |(hits, updates), (level, word)| {
                let fidelity = 1u64 << level;

                *updates += (u64::from(word.len())
                    + u64::from(word.hold_valid()))
                    * fidelity;
                *hits += (u64::from(word.running_hits())
                    + u64::from(word.hold())
                    + u64::from(word.carry()))
                    * fidelity;

                // a carry can briefly push the estimate past the window
                Some(Stats::new((*hits).min(*updates), *updates))
            },
        )
    }
}

impl History for CompressedHistoryStore {
    fn update(&mut self, value: bool) { Self::update(self, value); }

    fn totals(&self) -> Stats { Self::totals(self) }
}

impl Extend<bool> for CompressedHistoryStore {
    fn extend<T: IntoIterator<Item = bool>>(&mut self, iter: T) {
        for value in iter {
            self.update(value);
        }
    }
}

/// The smallest number of levels whose coarsest nominal window covers
/// `window` observations.
///
/// # Errors
///
/// [`Error::InvalidArgument`] if `window` exceeds the coarsest window of
/// [`MAX_LEVELS`] levels.
pub fn levels_for_window(window: u64) -> Result<usize> {
    (0..MAX_LEVELS)
        .find(|&level| CompressedHistoryStore::nominal_window(level) >= window)
        .map(|level| level + 1)
        .ok_or(Error::InvalidArgument("window is too large for a store"))
}
