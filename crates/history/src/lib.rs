//! Compressed multi-resolution histories of boolean streams.
//!
//! This crate tracks, for many independent streams of `true`/`false`
//! observations, what fraction of the recent observations were `true` over
//! several exponentially growing windows, in a few bytes per level. It
//! includes:
//!
//! - **Words** ([`word`]): a 64-bit shift register with incremental popcount
//!   that folds every two evicted bits into one bit for a coarser level.
//!
//! - **Compressed stores** ([`compressed`]): a chain of words, level `i`
//!   standing for `64 * 2^i` observations. Queries report cumulative windows
//!   of 64, 192, 448, ... observations with a ratio error of at most `1/64`.
//!
//! - **Exact buffers** ([`exact`]): an uncompressed bit history answering
//!   arbitrary windows exactly. Used as ground truth for the compressed
//!   store.
//!
//! - **Tables** ([`table`], [`keyed`], [`sharded`]): fixed-size collections
//!   of histories addressed by dense index or by key, with batched and
//!   parallel updates.
//!
//! # Example
//!
//! ```rust
//! use binary_history::CompressedHistoryStore;
//!
//! let mut store = CompressedHistoryStore::new(3)?;
//! for n in 0..1000 {
//!     store.update(n % 4 == 0);
//! }
//!
//! let totals = store.totals();
//! assert_eq!((totals.hits, totals.updates), (250, 1000));
//!
//! // windows of roughly 64, 192 and 448 recent observations
//! for stats in store.histories() {
//!     let ratio = stats.ratio().unwrap_or_default();
//!     assert!((ratio - 0.25).abs() <= 1.0 / 64.0);
//! }
//! # Ok::<(), binary_history::Error>(())
//! ```
//!
//! # Concurrency
//!
//! Histories and [`EntryTable`] are plain values mutated through `&mut`.
//! [`EntryTable::par_update_batch`] updates disjoint entries on the rayon
//! pool, and [`ShardedTable`] shards a keyed table behind locks for callers
//! that update from several threads.

pub mod compressed;
pub mod config;
pub mod error;
pub mod exact;
pub mod keyed;
pub mod sharded;
pub mod stats;
pub mod table;
pub mod word;

pub use compressed::{CompressedHistoryStore, MAX_LEVELS, levels_for_window};
pub use config::{Config, DefaultConfig};
pub use error::{Error, Result};
pub use exact::ExactHistoryBuffer;
pub use keyed::KeyedTable;
pub use sharded::ShardedTable;
pub use stats::Stats;
pub use table::{EntryTable, History};
pub use word::Word;
