//! An [`EntryTable`] addressed by arbitrary hashable keys.
//!
//! Keys are mapped to dense entry indices on first write. The dense table is
//! sized once at construction and never grows: once every slot has a key,
//! writing a new key fails with [`Error::CapacityExceeded`] while updates to
//! existing keys keep working.

use std::{
    borrow::Borrow,
    collections::HashMap,
    hash::Hash,
    marker::PhantomData,
    num::NonZeroUsize,
};

use crate::{
    compressed::CompressedHistoryStore,
    config::{Config, DefaultConfig},
    error::{Error, Result},
    exact::ExactHistoryBuffer,
    stats::Stats,
    table::{EntryTable, History},
};

/// A fixed-capacity table of histories keyed by `K`.
#[derive(Debug, Clone)]
pub struct KeyedTable<
    K,
    H = CompressedHistoryStore,
    C: Config = DefaultConfig,
> {
    table: EntryTable<H>,
    index: HashMap<K, usize, C::BuildHasher>,
    _config: PhantomData<C>,
}

impl<K: Hash + Eq, H, C: Config> KeyedTable<K, H, C> {
    /// Wraps `table`; every one of its entries becomes a free slot.
    #[must_use]
    pub fn new(table: EntryTable<H>) -> Self {
        let index = HashMap::with_capacity_and_hasher(
            table.len(),
            C::BuildHasher::default(),
        );

        Self { table, index, _config: PhantomData }
    }

    /// The number of slots.
    #[must_use]
    pub fn capacity(&self) -> usize { self.table.len() }

    /// The number of keys written so far.
    #[must_use]
    pub fn len(&self) -> usize { self.index.len() }

    /// Returns `true` if no key was ever written.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.index.is_empty() }

    /// The dense entry index assigned to `key`.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownKey`] if `key` was never written.
    pub fn index_of<Q>(&self, key: &Q) -> Result<usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.get(key).copied().ok_or(Error::UnknownKey)
    }

    /// The history of `key`.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownKey`] if `key` was never written.
    pub fn get<Q>(&self, key: &Q) -> Result<&H>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.get(self.index_of(key)?)
    }

    /// The written keys, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ { self.index.keys() }

    /// Every written key with its history, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &H)> + '_ {
        self.index.iter().filter_map(|(key, &entry)| {
            self.table.get(entry).ok().map(|history| (key, history))
        })
    }

    /// The underlying dense table.
    #[must_use]
    pub const fn table(&self) -> &EntryTable<H> { &self.table }

    fn slot(&mut self, key: K) -> Result<usize> {
        if let Some(&entry) = self.index.get(&key) {
            return Ok(entry);
        }

        let entry = self.index.len();
        let capacity = self.capacity();
        if entry == capacity {
            tracing::warn!(capacity, "keyed history table is full");
            return Err(Error::CapacityExceeded { capacity });
        }

        self.index.insert(key, entry);
        Ok(entry)
    }
}

impl<K: Hash + Eq, H: History, C: Config> KeyedTable<K, H, C> {
    /// Records one observation for `key`, assigning it a slot on first use.
    ///
    /// # Errors
    ///
    /// [`Error::CapacityExceeded`] if `key` is new and every slot is taken.
    /// Nothing is recorded in that case.
    pub fn update(&mut self, key: K, value: bool) -> Result<()> {
        let entry = self.slot(key)?;
        self.table.update(entry, value)
    }

    /// The exact lifetime tally of `key`.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownKey`] if `key` was never written.
    pub fn totals<Q>(&self, key: &Q) -> Result<Stats>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).map(History::totals)
    }
}

impl<K: Hash + Eq, C: Config> KeyedTable<K, CompressedHistoryStore, C> {
    /// Creates a table of `capacity` compressed stores with
    /// [`Config::levels`] levels each.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] if the configured level count is
    /// unsupported.
    pub fn compressed(capacity: usize) -> Result<Self> {
        EntryTable::compressed(capacity, C::levels()).map(Self::new)
    }

    /// The number of levels of every store.
    #[must_use]
    pub fn levels(&self) -> usize {
        if self.table.is_empty() { C::levels() } else { self.table.levels() }
    }

    /// The approximate windowed tallies of `key`, finest first.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownKey`] if `key` was never written.
    pub fn histories<Q>(&self, key: &Q) -> Result<Vec<Stats>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).map(CompressedHistoryStore::histories)
    }
}

impl<K: Hash + Eq, C: Config> KeyedTable<K, ExactHistoryBuffer, C> {
    /// Creates a table of `capacity` exact buffers, each retaining at most
    /// `limit` observations when given.
    #[must_use]
    pub fn exact(capacity: usize, limit: Option<NonZeroUsize>) -> Self {
        Self::new(EntryTable::exact(capacity, limit))
    }

    /// The exact tally of a window of `key`. See
    /// [`ExactHistoryBuffer::window`].
    ///
    /// # Errors
    ///
    /// [`Error::UnknownKey`] if `key` was never written.
    pub fn window<Q>(
        &self,
        key: &Q,
        start: usize,
        length: usize,
    ) -> Result<Stats>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).map(|buffer| buffer.window(start, length))
    }
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    use super::*;

    #[test]
    fn unwritten_key_is_unknown() {
        let mut table = KeyedTable::<&str>::compressed(4).unwrap();
        table.update("a", true).unwrap();

        assert_eq!(table.totals("b"), Err(Error::UnknownKey));
        assert_eq!(table.histories("b"), Err(Error::UnknownKey));
        assert_eq!(table.totals("a"), Ok(Stats::new(1, 1)));
    }

    #[test]
    fn keys_get_stable_dense_slots() {
        let mut table = KeyedTable::<String>::compressed(3).unwrap();

        for key in ["x", "y", "x", "z", "y"] {
            table.update(key.to_owned(), true).unwrap();
        }

        assert_eq!(table.index_of("x"), Ok(0));
        assert_eq!(table.index_of("y"), Ok(1));
        assert_eq!(table.index_of("z"), Ok(2));
        assert_eq!(table.totals("y"), Ok(Stats::new(2, 2)));
        assert_eq!(table.len(), 3);

        let mut keys: Vec<_> = table.keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, ["x", "y", "z"]);
    }

    #[test]
    #[traced_test]
    fn full_table_rejects_new_keys() {
        let mut table = KeyedTable::<u32>::compressed(2).unwrap();
        table.update(10, true).unwrap();
        table.update(20, false).unwrap();

        assert_eq!(
            table.update(30, true),
            Err(Error::CapacityExceeded { capacity: 2 })
        );
        assert!(logs_contain("keyed history table is full"));

        // existing keys keep recording
        table.update(10, true).unwrap();
        assert_eq!(table.totals(&10), Ok(Stats::new(2, 2)));
        assert_eq!(table.index_of(&30), Err(Error::UnknownKey));
        assert_eq!(table.capacity(), 2);
    }

    #[test]
    fn exact_keyed_windows() {
        let mut table = KeyedTable::<char, _>::exact(2, NonZeroUsize::new(8));

        for value in [true, true, false, true] {
            table.update('p', value).unwrap();
        }

        assert_eq!(table.window(&'p', 0, 2), Ok(Stats::new(1, 2)));
        assert_eq!(table.window(&'p', 1, 100), Ok(Stats::new(2, 3)));
        assert_eq!(table.window(&'q', 0, 1), Err(Error::UnknownKey));
    }

    #[test]
    fn configured_level_count() {
        let table = KeyedTable::<u8>::compressed(0).unwrap();

        assert_eq!(table.levels(), DefaultConfig::levels());
        assert!(table.is_empty());
        assert_eq!(table.iter().count(), 0);
    }
}
