//! `fanout`: mini-batch sampling for GNN link prediction.
//!
//! Two samplers, plus the glue a training loop needs around them:
//! - [`NegativeSampler`]: `k` corrupted destinations per positive edge, drawn
//!   with replacement from \(\mathrm{indeg}(v)^{0.75}\).
//! - [`BlockSampler`]: backward multi-layer neighbor sampling into an
//!   input-first chain of bipartite [`Block`]s.
//! - [`LinkPredictionSampler`]: both of the above, assembled into one
//!   [`LinkBatch`] with compact local indices.
//!
//! Public invariants (must not drift):
//! - **Node order**: node and edge ids are dense `0..n` / `0..m` as reported
//!   by the [`Graph`] adapter.
//! - **Determinism**: every sampler takes the RNG from the caller; identical
//!   inputs and an identically seeded RNG give identical output.
//! - **Block chain**: `blocks[i - 1].dst_nodes == blocks[i].src_nodes` (a
//!   layer's inputs are the previous layer's outputs), and the last block's
//!   `dst_nodes` are the deduplicated seeds.
//! - **Approximate negatives**: negatives are never checked against the edge
//!   set.

pub mod alias;
pub mod block;
pub mod error;
pub mod graph;
pub mod hetero;
pub mod link;
pub mod loader;
pub mod negative;
#[cfg(feature = "parallel")]
pub mod parallel;

pub use alias::AliasTable;
pub use block::{Block, BlockSampler, Fanout};
pub use error::{Error, Result};
pub use graph::{CsrGraph, EdgeId, Graph, NodeId};
pub use hetero::{EdgeStore, EdgeType, HeteroGraph, HeteroNegativeSampler, NodeType};
pub use link::{sample_link_batches, LinkBatch, LinkPredictionSampler};
pub use loader::{
    batch_seed, edge_minibatches, epoch_seed, minibatches, mix64, node_minibatches, rank_seed,
    shard_range, LoaderConfig,
};
pub use negative::{degree_weights, NegativeBatch, NegativeSampler, NegativeSamplerConfig};

#[cfg(feature = "parallel")]
pub use parallel::sample_link_batches_parallel;
