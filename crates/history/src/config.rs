//! Configuration for keyed and sharded tables.
//!
//! The [`Config`] trait fixes, at the type level, the parts of a table that
//! callers rarely change: the hasher used for key lookup, the default number
//! of levels of a compressed store and the number of shards of a
//! [`ShardedTable`](crate::sharded::ShardedTable). [`DefaultConfig`] is
//! suitable for most uses.
//!
//! # Example
//!
//! ```rust
//! use std::hash::RandomState;
//!
//! use binary_history::{Config, keyed::KeyedTable};
//!
//! #[derive(Debug, Clone, Copy, Default)]
//! struct LongWindows;
//!
//! impl Config for LongWindows {
//!     type BuildHasher = RandomState;
//!
//!     // coarsest window of 64 * (2^13 - 1) observations
//!     fn levels() -> usize { 13 }
//! }
//!
//! let table = KeyedTable::<u64, _, LongWindows>::compressed(1024)?;
//! assert_eq!(table.levels(), 13);
//! # Ok::<(), binary_history::Error>(())
//! ```

use std::{fmt::Debug, hash::BuildHasher};

use fxhash::FxBuildHasher;

/// Type-level configuration of keyed tables.
pub trait Config: Debug + Default + Clone + Copy + Send + Sync + 'static {
    /// The hasher builder mapping keys to dense indices and shards. Does not
    /// need to be stable across runs.
    type BuildHasher: BuildHasher + Default + Clone + Send + Sync + 'static;

    /// The number of levels of each compressed store.
    ///
    /// # Default Value
    ///
    /// 8 levels, a coarsest window of 16,320 observations.
    #[must_use]
    fn levels() -> usize { 8 }

    /// The number of shards of a sharded table. Must be a power of two.
    ///
    /// # Default Value
    ///
    /// 16 shards.
    #[must_use]
    fn shard_amount() -> usize { 16 }
}

/// The default configuration: `FxHash` keyed lookup, 8 levels, 16 shards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct DefaultConfig;

impl Config for DefaultConfig {
    type BuildHasher = FxBuildHasher;
}
