//! Fixed-size tables of independent histories addressed by dense index.

use std::num::NonZeroUsize;

use rayon::iter::{
    IndexedParallelIterator, IntoParallelRefMutIterator, ParallelIterator,
};

use crate::{
    compressed::CompressedHistoryStore,
    error::{Error, Result},
    exact::ExactHistoryBuffer,
    stats::Stats,
};

/// A history of one boolean stream.
///
/// Implemented by [`CompressedHistoryStore`] and [`ExactHistoryBuffer`] so
/// that tables, and code driving them, can swap one for the other.
pub trait History {
    /// Records one observation.
    fn update(&mut self, value: bool);

    /// Exact lifetime tally of every observation ever recorded.
    fn totals(&self) -> Stats;
}

/// `N` histories of the same shape, created together and living as long as
/// the table.
///
/// Entries never move and their storage is disjoint, so batched updates may
/// run across entries in parallel with exactly the results of sequential
/// single-entry updates.
#[derive(Debug, Clone)]
pub struct EntryTable<H> {
    entries: Box<[H]>,
}

impl<H> EntryTable<H> {
    /// Creates a table of `size` entries built by `make_entry(index)`.
    pub fn from_fn(size: usize, make_entry: impl FnMut(usize) -> H) -> Self {
        Self { entries: (0..size).map(make_entry).collect() }
    }

    /// The number of entries.
    #[must_use]
    pub fn len(&self) -> usize { self.entries.len() }

    /// Returns `true` if the table has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// The entry at `entry`.
    ///
    /// # Errors
    ///
    /// [`Error::EntryOutOfRange`] past the end of the table.
    pub fn get(&self, entry: usize) -> Result<&H> {
        let len = self.len();
        self.entries.get(entry).ok_or(Error::EntryOutOfRange { entry, len })
    }

    /// The entry at `entry`, mutably.
    ///
    /// # Errors
    ///
    /// [`Error::EntryOutOfRange`] past the end of the table.
    pub fn get_mut(&mut self, entry: usize) -> Result<&mut H> {
        let len = self.len();
        self.entries
            .get_mut(entry)
            .ok_or(Error::EntryOutOfRange { entry, len })
    }

    /// Iterates the entries in index order.
    pub fn iter(&self) -> std::slice::Iter<'_, H> { self.entries.iter() }
}

impl<H: History> EntryTable<H> {
    /// Records one observation for `entry`.
    ///
    /// # Errors
    ///
    /// [`Error::EntryOutOfRange`] past the end of the table.
    pub fn update(&mut self, entry: usize, value: bool) -> Result<()> {
        self.get_mut(entry)?.update(value);
        Ok(())
    }

    /// The exact lifetime tally of `entry`.
    ///
    /// # Errors
    ///
    /// [`Error::EntryOutOfRange`] past the end of the table.
    pub fn totals(&self, entry: usize) -> Result<Stats> {
        self.get(entry).map(History::totals)
    }

    /// The exact lifetime tallies of every entry.
    #[must_use]
    pub fn totals_all(&self) -> Vec<Stats> {
        self.entries.iter().map(History::totals).collect()
    }

    /// Records `values[i]` for every entry `i`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] unless there is exactly one value per
    /// entry; the table is left untouched.
    pub fn update_batch(&mut self, values: &[bool]) -> Result<()> {
        self.check_batch(values)?;

        for (entry, &value) in self.entries.iter_mut().zip(values) {
            entry.update(value);
        }

        Ok(())
    }

    /// [`EntryTable::update_batch`] spread over the rayon thread pool.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] unless there is exactly one value per
    /// entry; the table is left untouched.
    pub fn par_update_batch(&mut self, values: &[bool]) -> Result<()>
    where
        H: Send,
    {
        self.check_batch(values)?;

        self.entries
            .par_iter_mut()
            .zip(values)
            .for_each(|(entry, &value)| entry.update(value));

        Ok(())
    }

    /// Records a sequence of `(entry, value)` observations in order.
    ///
    /// # Errors
    ///
    /// [`Error::EntryOutOfRange`] if any entry is past the end of the table;
    /// in that case no observation is recorded.
    pub fn update_entries(&mut self, updates: &[(usize, bool)]) -> Result<()> {
        let len = self.len();
        if let Some(&(entry, _)) =
            updates.iter().find(|(entry, _)| *entry >= len)
        {
            return Err(Error::EntryOutOfRange { entry, len });
        }

        for &(entry, value) in updates {
            self.entries[entry].update(value);
        }

        Ok(())
    }

    fn check_batch(&self, values: &[bool]) -> Result<()> {
        if values.len() == self.len() {
            Ok(())
        } else {
            Err(Error::InvalidArgument(
                "batch needs exactly one value per entry",
            ))
        }
    }
}

impl EntryTable<CompressedHistoryStore> {
    /// Creates `size` empty compressed stores of `levels` levels each.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] for an unsupported level count.
    pub fn compressed(size: usize, levels: usize) -> Result<Self> {
        let prototype = CompressedHistoryStore::new(levels)?;

        tracing::debug!(size, levels, "creating compressed history table");

        Ok(Self::from_fn(size, |_| prototype.clone()))
    }

    /// The number of levels shared by every entry.
    #[must_use]
    pub fn levels(&self) -> usize {
        self.entries.first().map_or(0, CompressedHistoryStore::levels)
    }

    /// The approximate windowed tallies of `entry`, finest first.
    ///
    /// # Errors
    ///
    /// [`Error::EntryOutOfRange`] past the end of the table.
    pub fn histories(&self, entry: usize) -> Result<Vec<Stats>> {
        self.get(entry).map(CompressedHistoryStore::histories)
    }

    /// The approximate windowed tallies of every entry.
    #[must_use]
    pub fn histories_all(&self) -> Vec<Vec<Stats>> {
        self.entries.iter().map(CompressedHistoryStore::histories).collect()
    }
}

impl EntryTable<ExactHistoryBuffer> {
    /// Creates `size` empty exact buffers, each retaining at most `limit`
    /// observations when given.
    #[must_use]
    pub fn exact(size: usize, limit: Option<NonZeroUsize>) -> Self {
        tracing::debug!(size, ?limit, "creating exact history table");

        Self::from_fn(size, |_| {
            limit.map_or_else(
                ExactHistoryBuffer::new,
                ExactHistoryBuffer::with_limit,
            )
        })
    }

    /// The exact tally of a window of `entry`. See
    /// [`ExactHistoryBuffer::window`].
    ///
    /// # Errors
    ///
    /// [`Error::EntryOutOfRange`] past the end of the table.
    pub fn window(
        &self,
        entry: usize,
        start: usize,
        length: usize,
    ) -> Result<Stats> {
        self.get(entry).map(|buffer| buffer.window(start, length))
    }
}

impl<'a, H> IntoIterator for &'a EntryTable<H> {
    type IntoIter = std::slice::Iter<'a, H>;
    type Item = &'a H;

    fn into_iter(self) -> Self::IntoIter { self.iter() }
}
