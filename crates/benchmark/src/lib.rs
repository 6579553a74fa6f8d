#![allow(missing_docs)]
#![allow(clippy::must_use_candidate)]

use rand::{Rng, SeedableRng, rngs::StdRng};

/// `len` observations that are `true` with probability `density`, flipping
/// to the opposite value of the previous observation with probability
/// `flip` to mimic bursty streams.
pub fn bursty_bits(
    seed: u64,
    len: usize,
    density: f64,
    flip: f64,
) -> Vec<bool> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut previous = false;

    (0..len)
        .map(|_| {
            previous = if rng.gen_bool(flip) {
                !previous
            } else {
                rng.gen_bool(density)
            };
            previous
        })
        .collect()
}

/// `steps` rows of one observation per entry, for batched table updates.
pub fn batches(seed: u64, entries: usize, steps: usize) -> Vec<Vec<bool>> {
    let mut rng = StdRng::seed_from_u64(seed);

    (0..steps)
        .map(|_| (0..entries).map(|_| rng.gen_bool(0.3)).collect())
        .collect()
}
