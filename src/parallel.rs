//! Rayon-parallel link batch construction.

use crate::error::Result;
use crate::graph::{EdgeId, Graph};
use crate::link::{LinkBatch, LinkPredictionSampler};
use crate::loader::batch_seed;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

/// Parallel [`crate::sample_link_batches`].
///
/// Invariant: output is identical to the sequential version for the same
/// `seed`, independent of Rayon thread count.
pub fn sample_link_batches_parallel<G: Graph + Sync>(
    sampler: &LinkPredictionSampler<'_, G>,
    batches: &[Vec<EdgeId>],
    seed: u64,
) -> Result<Vec<LinkBatch>> {
    batches
        .par_iter()
        .enumerate()
        .map(|(i, batch)| {
            let mut rng = ChaCha8Rng::seed_from_u64(batch_seed(seed, i));
            sampler.sample(batch, &mut rng)
        })
        .collect()
}
