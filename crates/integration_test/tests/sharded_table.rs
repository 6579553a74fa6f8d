//! Sharded tables updated from many threads.

#![allow(missing_docs)]

use binary_history::{
    CompressedHistoryStore, Config, Error, KeyedTable, ShardedTable, Stats,
};
use binary_history_integration_test::{
    high_frequency_pattern, low_frequency_pattern,
};
use rayon::iter::{
    IntoParallelIterator, IntoParallelRefIterator, ParallelIterator,
};

#[derive(Debug, Clone, Copy, Default)]
struct WideConfig;

impl Config for WideConfig {
    type BuildHasher = std::hash::RandomState;

    fn levels() -> usize { 10 }

    fn shard_amount() -> usize { 64 }
}

#[test]
fn parallel_streams_match_sequential_stores() {
    let inputs: Vec<(u64, Vec<bool>)> = (0..48)
        .map(|seed| {
            let pattern = if seed % 2 == 0 {
                high_frequency_pattern(seed)
            } else {
                low_frequency_pattern(seed)
            };
            (seed, pattern)
        })
        .collect();

    let table = ShardedTable::<u64, _, WideConfig>::compressed(4096).unwrap();

    inputs.par_iter().for_each(|(key, pattern)| {
        for &value in pattern {
            table.update(*key, value).unwrap();
        }
    });

    assert_eq!(table.len(), inputs.len());

    for (key, pattern) in &inputs {
        let mut store = CompressedHistoryStore::new(10).unwrap();
        store.extend(pattern.iter().copied());

        assert_eq!(table.totals(key), Ok(store.totals()));
        assert_eq!(table.histories(key), Ok(store.histories()));
        assert!(table.with_entry(key, |entry| entry == &store).unwrap());
    }
}

#[test]
fn interleaved_writers_on_shared_keys() {
    let table = ShardedTable::<String>::compressed(128).unwrap();
    let keys: Vec<String> = (0..8).map(|n| format!("stream-{n}")).collect();

    (0..8u32).into_par_iter().for_each(|writer| {
        for step in 0..1000u32 {
            let key = &keys[((step + writer) % 8) as usize];
            table.update(key.clone(), step % 2 == 0).unwrap();
        }
    });

    let total: u64 = keys
        .iter()
        .map(|key| table.totals(key.as_str()).unwrap().updates)
        .sum();
    assert_eq!(total, 8000);
    assert_eq!(table.totals("stream-8"), Err(Error::UnknownKey));
}

#[test]
fn sharded_matches_keyed_semantics() {
    let sharded = ShardedTable::<u32>::compressed(32).unwrap();
    let mut keyed = KeyedTable::<u32>::compressed(32).unwrap();

    for step in 0..5000u32 {
        let key = step % 2;
        sharded.update(key, step % 7 < 3).unwrap();
        keyed.update(key, step % 7 < 3).unwrap();
    }

    for key in 0..2 {
        assert_eq!(sharded.histories(&key), keyed.histories(&key));
    }
    assert_eq!(sharded.totals(&0).map(|s| s.updates), Ok(2500));
    assert!(sharded.totals(&5).is_err());
    assert!(!sharded.is_empty());
    assert_eq!(
        sharded.totals(&1),
        Ok(Stats::new(keyed.totals(&1).unwrap().hits, 2500))
    );
}
