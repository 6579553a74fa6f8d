//! The exact bit history used as ground truth for the compressed store.
//!
//! [`ExactHistoryBuffer`] remembers every observation (or the most recent
//! `limit` of them) and answers windowed queries by counting bits on demand.
//! Memory grows with the retained history, so it is meant for validation and
//! small workloads rather than for tracking millions of streams.
//!
//! Offsets are measured backwards in time: offset 0 is the most recent
//! observation.

use std::{collections::VecDeque, num::NonZeroUsize};

use crate::{
    error::{Error, Result},
    stats::Stats,
    table::History,
};

const WORD_BITS: u64 = u64::BITS as u64;

/// An unbounded (or `limit`-bounded) shift register of observations.
#[derive(Debug, Clone, Default)]
pub struct ExactHistoryBuffer {
    /// Observations in chronological order, oldest first.
    words: VecDeque<u64>,
    /// Chronological index of bit 0 of `words[0]`.
    base: u64,
    updates: u64,
    hits: u64,
    limit: Option<NonZeroUsize>,
}

impl ExactHistoryBuffer {
    /// Creates a buffer that retains every observation.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Creates a buffer that retains only the `limit` most recent
    /// observations. The lifetime totals still count everything.
    #[must_use]
    pub fn with_limit(limit: NonZeroUsize) -> Self {
        Self { limit: Some(limit), ..Self::default() }
    }

    /// The retention limit, if any.
    #[must_use]
    pub const fn limit(&self) -> Option<NonZeroUsize> { self.limit }

    /// Records one observation.
    #[allow(clippy::cast_possible_truncation)]
    pub fn update(&mut self, value: bool) {
        let index = self.updates - self.base;
        let word = (index / WORD_BITS) as usize;

        if word == self.words.len() {
            self.words.push_back(0);
        }
        if value {
            self.words[word] |= 1 << (index % WORD_BITS);
        }

        self.updates += 1;
        self.hits += u64::from(value);

        if let Some(limit) = self.limit {
            let oldest = self.updates.saturating_sub(limit.get() as u64);

            while oldest - self.base >= WORD_BITS {
                self.words.pop_front();
                self.base += WORD_BITS;
            }
        }
    }

    /// Exact lifetime tally of every observation ever recorded.
    #[must_use]
    pub const fn totals(&self) -> Stats { Stats::new(self.hits, self.updates) }

    /// The number of retained observations.
    #[must_use]
    pub fn len(&self) -> usize {
        let updates = usize::try_from(self.updates).unwrap_or(usize::MAX);

        self.limit.map_or(updates, |limit| updates.min(limit.get()))
    }

    /// Returns `true` if no observation is retained.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// The observation `index` steps before the most recent one.
    ///
    /// # Errors
    ///
    /// [`Error::IndexOutOfRange`] if `index` is not below
    /// [`ExactHistoryBuffer::len`].
    pub fn bit_at(&self, index: usize) -> Result<bool> {
        let len = self.len();
        if index >= len {
            return Err(Error::IndexOutOfRange { index, len });
        }

        Ok(self.bit(index))
    }

    /// Iterates the retained observations from the most recent to the
    /// oldest.
    pub fn bits(&self) -> impl DoubleEndedIterator<Item = bool> + '_ {
        (0..self.len()).map(|offset| self.bit(offset))
    }

    /// The exact tally of the `length` observations starting `start` steps
    /// before the most recent one.
    ///
    /// A window reaching past the oldest retained observation is shortened to
    /// fit. A window starting past it is empty.
    #[must_use]
    pub fn window(&self, start: usize, length: usize) -> Stats {
        let length = self.clamp(start, length);
        if length == 0 {
            return Stats::EMPTY;
        }

        let end = self.updates - start as u64;
        let begin = end - length as u64;

        Stats::new(self.count_ones(begin, end), length as u64)
    }

    /// A new unbounded buffer holding exactly the observations of
    /// [`ExactHistoryBuffer::window`]`(start, length)`, in the same order.
    #[must_use]
    pub fn slice(&self, start: usize, length: usize) -> Self {
        let length = self.clamp(start, length);

        (start..start + length).rev().map(|offset| self.bit(offset)).collect()
    }

    fn clamp(&self, start: usize, length: usize) -> usize {
        let available = self.len().saturating_sub(start);

        if length > available {
            tracing::debug!(
                start,
                length,
                available,
                "reducing history length to fit buffer"
            );
        }

        length.min(available)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn bit(&self, offset: usize) -> bool {
        let index = self.updates - 1 - offset as u64 - self.base;

        (self.words[(index / WORD_BITS) as usize] >> (index % WORD_BITS)) & 1
            != 0
    }

    /// Counts the set bits with chronological index in `begin..end`.
    #[allow(clippy::cast_possible_truncation)]
    fn count_ones(&self, begin: u64, end: u64) -> u64 {
        let low = begin - self.base;
        let high = end - self.base;
        let first = low / WORD_BITS;
        let last = (high - 1) / WORD_BITS;

        (first..=last)
            .map(|word| {
                let mut bits = self.words[word as usize];

                if word == first {
                    bits &= u64::MAX << (low % WORD_BITS);
                }
                if word == last {
                    let top = high - last * WORD_BITS;
                    if top < WORD_BITS {
                        bits &= (1 << top) - 1;
                    }
                }

                u64::from(bits.count_ones())
            })
            .sum()
    }
}

impl History for ExactHistoryBuffer {
    fn update(&mut self, value: bool) { Self::update(self, value); }

    fn totals(&self) -> Stats { Self::totals(self) }
}

impl Extend<bool> for ExactHistoryBuffer {
    fn extend<T: IntoIterator<Item = bool>>(&mut self, iter: T) {
        for value in iter {
            self.update(value);
        }
    }
}

/// Builds an unbounded buffer from observations given oldest first.
impl FromIterator<bool> for ExactHistoryBuffer {
    fn from_iter<T: IntoIterator<Item = bool>>(iter: T) -> Self {
        let mut buffer = Self::new();
        buffer.extend(iter);
        buffer
    }
}
