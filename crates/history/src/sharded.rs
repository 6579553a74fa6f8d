//! A [`KeyedTable`] that can be shared between threads.
//!
//! Keys are spread over [`Config::shard_amount`] independent keyed tables by
//! hash, each behind its own cache-padded [`RwLock`]. Concurrent writers only
//! contend when their keys land in the same shard, and an update touches a
//! single shard so per-key results are identical to a [`KeyedTable`] fed the
//! same observations.

use std::{
    borrow::Borrow,
    hash::{BuildHasher, Hash},
    num::NonZeroUsize,
};

use crossbeam_utils::CachePadded;
use parking_lot::{RwLock, RwLockReadGuard};

use crate::{
    compressed::CompressedHistoryStore,
    config::{Config, DefaultConfig},
    error::{Error, Result},
    exact::ExactHistoryBuffer,
    keyed::KeyedTable,
    stats::Stats,
    table::History,
};

/// A thread-safe, fixed-capacity table of histories keyed by `K`.
pub struct ShardedTable<
    K,
    H = CompressedHistoryStore,
    C: Config = DefaultConfig,
> {
    shards: Box<[CachePadded<RwLock<KeyedTable<K, H, C>>>]>,
    mask: usize,
    hasher: C::BuildHasher,
}

impl<K: Hash + Eq, H, C: Config> ShardedTable<K, H, C> {
    /// Creates a table whose `capacity` slots are split evenly across the
    /// shards. `make_shard(capacity)` builds each shard with its share.
    ///
    /// A key can only use the slots of its own shard, so a table may report
    /// [`Error::CapacityExceeded`] before every slot is taken.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] if [`Config::shard_amount`] is not a power
    /// of two, or any error of `make_shard`.
    pub fn from_fn(
        capacity: usize,
        mut make_shard: impl FnMut(usize) -> Result<KeyedTable<K, H, C>>,
    ) -> Result<Self> {
        let shard_amount = C::shard_amount();
        if !shard_amount.is_power_of_two() {
            return Err(Error::InvalidArgument(
                "shard amount must be a power of two",
            ));
        }

        let share = capacity / shard_amount;
        let remainder = capacity % shard_amount;

        let mut shards = Vec::with_capacity(shard_amount);
        for i in 0..shard_amount {
            let table = make_shard(share + usize::from(i < remainder))?;
            shards.push(CachePadded::new(RwLock::new(table)));
        }

        tracing::debug!(capacity, shard_amount, "creating sharded table");

        Ok(Self {
            shards: shards.into_boxed_slice(),
            mask: shard_amount - 1,
            hasher: C::BuildHasher::default(),
        })
    }

    /// The number of shards.
    #[must_use]
    pub fn shard_amount(&self) -> usize { self.shards.len() }

    /// The total number of slots over every shard.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.iter_read_shards().map(|shard| shard.capacity()).sum()
    }

    /// The number of keys written so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.iter_read_shards().map(|shard| shard.len()).sum()
    }

    /// Returns `true` if no key was ever written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.iter_read_shards().all(|shard| shard.is_empty())
    }

    /// Runs `f` on the history of `key` while holding its shard's read
    /// lock.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownKey`] if `key` was never written.
    pub fn with_entry<Q, R>(
        &self,
        key: &Q,
        f: impl FnOnce(&H) -> R,
    ) -> Result<R>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.read_shard(key).get(key).map(f)
    }

    fn read_shard<Q: Hash + ?Sized>(
        &self,
        key: &Q,
    ) -> RwLockReadGuard<'_, KeyedTable<K, H, C>> {
        self.shards[self.shard_index(key)].read()
    }

    fn iter_read_shards(
        &self,
    ) -> impl Iterator<Item = RwLockReadGuard<'_, KeyedTable<K, H, C>>> {
        self.shards.iter().map(|shard| shard.read())
    }

    #[allow(clippy::cast_possible_truncation)]
    fn shard_index<Q: Hash + ?Sized>(&self, key: &Q) -> usize {
        (self.hasher.hash_one(key) as usize) & self.mask
    }
}

impl<K: Hash + Eq, H: History, C: Config> ShardedTable<K, H, C> {
    /// Records one observation for `key`, assigning it a slot of its shard
    /// on first use.
    ///
    /// # Errors
    ///
    /// [`Error::CapacityExceeded`] if `key` is new and its shard is full.
    pub fn update(&self, key: K, value: bool) -> Result<()> {
        let index = self.shard_index(&key);
        self.shards[index].write().update(key, value)
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
        self.with_entry(key, History::totals)
    }
}

impl<K: Hash + Eq, C: Config> ShardedTable<K, CompressedHistoryStore, C> {
    /// Creates a table of `capacity` compressed stores with
    /// [`Config::levels`] levels each.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] for an unsupported shard amount or level
    /// count.
    pub fn compressed(capacity: usize) -> Result<Self> {
        Self::from_fn(capacity, KeyedTable::compressed)
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
        self.with_entry(key, CompressedHistoryStore::histories)
    }
}

impl<K: Hash + Eq, C: Config> ShardedTable<K, ExactHistoryBuffer, C> {
    /// Creates a table of `capacity` exact buffers, each retaining at most
    /// `limit` observations when given.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] for an unsupported shard amount.
    pub fn exact(
        capacity: usize,
        limit: Option<NonZeroUsize>,
    ) -> Result<Self> {
        Self::from_fn(capacity, |share| Ok(KeyedTable::exact(share, limit)))
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
        self.with_entry(key, |buffer| buffer.window(start, length))
    }
}

impl<K, H, C: Config> std::fmt::Debug for ShardedTable<K, H, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShardedTable")
            .field("shard_amount", &self.shards.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use fxhash::FxBuildHasher;
    use rayon::iter::{IntoParallelIterator, ParallelIterator};
    use tracing_test::traced_test;

    use super::*;

    #[derive(Debug, Clone, Copy, Default)]
    struct SingleShard;

    impl Config for SingleShard {
        type BuildHasher = FxBuildHasher;

        fn levels() -> usize { 3 }

        fn shard_amount() -> usize { 1 }
    }

    #[derive(Debug, Clone, Copy, Default)]
    struct ThreeShards;

    impl Config for ThreeShards {
        type BuildHasher = FxBuildHasher;

        fn shard_amount() -> usize { 3 }
    }

    #[test]
    fn capacity_is_split_across_shards() {
        let table = ShardedTable::<u64>::compressed(100).unwrap();

        assert_eq!(table.shard_amount(), DefaultConfig::shard_amount());
        assert_eq!(table.capacity(), 100);
        assert!(table.is_empty());
    }

    #[test]
    fn rejects_shard_amount_that_is_not_a_power_of_two() {
        assert!(matches!(
            ShardedTable::<u64, _, ThreeShards>::compressed(9),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn matches_keyed_table() {
        let sharded = ShardedTable::<u32>::compressed(256).unwrap();
        let mut keyed = KeyedTable::<u32>::compressed(64).unwrap();

        for step in 0..2000u32 {
            let key = step % 8;
            let value = (step / 8 + key) % 3 == 0;

            sharded.update(key, value).unwrap();
            keyed.update(key, value).unwrap();
        }

        for key in 0..8 {
            assert_eq!(sharded.totals(&key), keyed.totals(&key));
            assert_eq!(sharded.histories(&key), keyed.histories(&key));
        }
        assert_eq!(sharded.len(), 8);
        assert_eq!(sharded.totals(&8), Err(Error::UnknownKey));
    }

    #[test]
    fn concurrent_writers() {
        let table = ShardedTable::<u64>::compressed(1024).unwrap();

        (0..64u64).into_par_iter().for_each(|key| {
            for step in 0..500u64 {
                table.update(key, step % (key + 1) == 0).unwrap();
            }
        });

        for key in 0..64u64 {
            let expected = (0..500u64).filter(|step| step % (key + 1) == 0);
            assert_eq!(
                table.totals(&key),
                Ok(Stats::new(expected.count() as u64, 500))
            );
        }
    }

    #[test]
    #[traced_test]
    fn full_shard_rejects_new_keys() {
        let table =
            ShardedTable::<&str, _, SingleShard>::compressed(1).unwrap();

        table.update("first", true).unwrap();
        assert_eq!(
            table.update("second", true),
            Err(Error::CapacityExceeded { capacity: 1 })
        );
        assert!(logs_contain("keyed history table is full"));
        assert_eq!(table.histories("first").unwrap().len(), 3);
    }

    #[test]
    fn exact_sharded_windows() {
        let table =
            ShardedTable::<u8, _>::exact(32, NonZeroUsize::new(4)).unwrap();

        for value in [true, false, true, true, true, false] {
            table.update(7, value).unwrap();
        }

        assert_eq!(table.window(&7, 0, 10), Ok(Stats::new(3, 4)));
        assert_eq!(table.totals(&7), Ok(Stats::new(4, 6)));
    }
}
