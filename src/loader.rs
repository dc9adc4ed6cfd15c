//! Mini-batch iteration over node/edge ids and per-rank sharding.
//!
//! Data-parallel training runs one process per rank. Each rank takes a
//! contiguous slice of the id space ([`shard_range`]), owns its own RNG
//! ([`rank_seed`]), and batches its slice independently ([`minibatches`]).
//! Nothing here synchronizes across ranks.

use crate::error::{Error, Result};
use crate::graph::{EdgeId, Graph, NodeId};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use std::ops::Range;

/// Batching parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LoaderConfig {
    pub batch_size: usize,
    pub shuffle: bool,
    /// Drop a trailing batch shorter than `batch_size`.
    pub drop_last: bool,
    pub seed: u64,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self { batch_size: 1024, shuffle: true, drop_last: false, seed: 42 }
    }
}

/// SplitMix64 finalizer.
pub fn mix64(mut x: u64) -> u64 {
    x ^= x >> 30;
    x = x.wrapping_mul(0xbf58476d1ce4e5b9);
    x ^= x >> 27;
    x = x.wrapping_mul(0x94d049bb133111eb);
    x ^= x >> 31;
    x
}

/// Seed for one epoch's shuffle.
pub fn epoch_seed(seed: u64, epoch: u64) -> u64 {
    mix64(seed ^ epoch)
}

/// Seed for one rank's RNG.
pub fn rank_seed(seed: u64, rank: usize) -> u64 {
    mix64(seed ^ ((rank as u64) << 32))
}

/// Seed for the `index`-th batch of a run.
pub fn batch_seed(seed: u64, index: usize) -> u64 {
    mix64(seed ^ (index as u64))
}

/// Split `ids` into batches, shuffling first if configured.
pub fn minibatches(ids: &[usize], config: LoaderConfig) -> Result<Vec<Vec<usize>>> {
    if config.batch_size == 0 {
        return Err(Error::InvalidParameter("batch_size must be >= 1".into()));
    }

    let mut order = ids.to_vec();
    if config.shuffle {
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        order.shuffle(&mut rng);
    }

    Ok(order
        .chunks(config.batch_size)
        .filter(|c| !config.drop_last || c.len() == config.batch_size)
        .map(<[usize]>::to_vec)
        .collect())
}

/// Batches over every edge id of `graph`.
pub fn edge_minibatches<G: Graph>(graph: &G, config: LoaderConfig) -> Result<Vec<Vec<EdgeId>>> {
    let ids: Vec<EdgeId> = (0..graph.edge_count()).collect();
    minibatches(&ids, config)
}

/// Batches over every node id of `graph`.
pub fn node_minibatches<G: Graph>(graph: &G, config: LoaderConfig) -> Result<Vec<Vec<NodeId>>> {
    let ids: Vec<NodeId> = (0..graph.node_count()).collect();
    minibatches(&ids, config)
}

/// Contiguous slice of `0..len` owned by `rank` out of `world_size`.
///
/// Shards tile `0..len` in rank order and differ in size by at most one.
pub fn shard_range(len: usize, rank: usize, world_size: usize) -> Result<Range<usize>> {
    if world_size == 0 {
        return Err(Error::InvalidParameter("world_size must be >= 1".into()));
    }
    if rank >= world_size {
        return Err(Error::InvalidParameter(format!(
            "rank {rank} out of range for world_size {world_size}"
        )));
    }
    let base = len / world_size;
    let rem = len % world_size;
    let start = rank * base + rank.min(rem);
    let size = base + usize::from(rank < rem);
    Ok(start..start + size)
}
