//! Mini-batch assembly for unsupervised link prediction.
//!
//! One training step scores a batch of positive edges against degree-weighted
//! negatives. Both sides are scored on the output representations of their
//! endpoints, so the batch's seed set is the union of every endpoint, and the
//! blocks are built for that seed set. Pairs are re-expressed as local
//! indices into `seed_nodes` (the rows of the model's output).

use crate::block::{dedup_in_order, Block, BlockSampler, Fanout};
use crate::error::{Error, Result};
use crate::graph::{EdgeId, Graph, NodeId};
use crate::loader::batch_seed;
use crate::negative::{NegativeSampler, NegativeSamplerConfig};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;
use tracing::debug;

/// Everything one link-prediction step consumes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkBatch {
    /// Positive edge ids, in the order given.
    pub pos_edge_ids: Vec<EdgeId>,
    /// Output nodes; equals the last block's `dst_nodes`.
    pub seed_nodes: Vec<NodeId>,
    /// `(src_local, dst_local)` into `seed_nodes`, one per positive edge.
    pub pos_pairs: Vec<(usize, usize)>,
    /// `(src_local, dst_local)` into `seed_nodes`, `k` per positive edge.
    pub neg_pairs: Vec<(usize, usize)>,
    /// Input-first block chain.
    pub blocks: Vec<Block>,
}

impl LinkBatch {
    /// Nodes whose input features the first layer reads: the first block's
    /// sampled predecessors.
    ///
    /// A block's sources exclude its own destinations, so a seed appears here
    /// only if it is also someone's sampled predecessor. Models with a self or
    /// residual term need [`LinkBatch::all_nodes`] instead.
    pub fn input_nodes(&self) -> &[NodeId] {
        self.blocks.first().map(|b| b.src_nodes.as_slice()).unwrap_or(&[])
    }

    /// Every node any layer touches, deduplicated: input nodes first, then
    /// each block's destinations from the input side up to the seeds.
    pub fn all_nodes(&self) -> Vec<NodeId> {
        let touched: Vec<NodeId> = self
            .input_nodes()
            .iter()
            .chain(self.blocks.iter().flat_map(|b| b.dst_nodes.iter()))
            .chain(self.seed_nodes.iter())
            .copied()
            .collect();
        dedup_in_order(&touched)
    }
}

/// Positive edges + negatives + neighbor blocks in one call.
#[derive(Debug, Clone)]
pub struct LinkPredictionSampler<'a, G> {
    blocks: BlockSampler<'a, G>,
    negatives: NegativeSampler<'a, G>,
}

impl<'a, G: Graph> LinkPredictionSampler<'a, G> {
    pub fn new(
        graph: &'a G,
        fanouts: Vec<Fanout>,
        negative: NegativeSamplerConfig,
    ) -> Result<Self> {
        Ok(Self {
            blocks: BlockSampler::new(graph, fanouts)?,
            negatives: NegativeSampler::with_config(graph, negative)?,
        })
    }

    /// Reject batches whose blocks need more than `limit` source nodes; see
    /// [`BlockSampler::with_max_src_nodes`].
    pub fn with_max_input_nodes(mut self, limit: usize) -> Self {
        self.blocks = self.blocks.with_max_src_nodes(limit);
        self
    }

    pub fn block_sampler(&self) -> &BlockSampler<'a, G> {
        &self.blocks
    }

    pub fn negative_sampler(&self) -> &NegativeSampler<'a, G> {
        &self.negatives
    }

    pub fn sample<R: Rng + ?Sized>(&self, pos_edges: &[EdgeId], rng: &mut R) -> Result<LinkBatch> {
        let neg = self.negatives.sample(pos_edges, rng)?;

        let graph = self.blocks.graph();
        let mut pos = Vec::with_capacity(pos_edges.len());
        for &e in pos_edges {
            let endpoints = graph
                .edge_endpoints(e)
                .ok_or(Error::IndexOutOfBounds { index: e, len: graph.edge_count() })?;
            pos.push(endpoints);
        }

        let candidates: Vec<NodeId> = pos
            .iter()
            .map(|&(s, _)| s)
            .chain(pos.iter().map(|&(_, d)| d))
            .chain(neg.dst.iter().copied())
            .collect();
        let seed_nodes = dedup_in_order(&candidates);
        let local: HashMap<NodeId, usize> =
            seed_nodes.iter().enumerate().map(|(i, &v)| (v, i)).collect();

        let pos_pairs = pos.iter().map(|&(s, d)| (local[&s], local[&d])).collect();
        let neg_pairs = neg.pairs().map(|(s, d)| (local[&s], local[&d])).collect();

        let blocks = self.blocks.sample_blocks(&seed_nodes, rng)?;
        debug!(
            positives = pos_edges.len(),
            negatives = neg.len(),
            seeds = seed_nodes.len(),
            inputs = blocks.first().map_or(0, Block::num_src_nodes),
            "assembled link batch"
        );

        Ok(LinkBatch { pos_edge_ids: pos_edges.to_vec(), seed_nodes, pos_pairs, neg_pairs, blocks })
    }
}

/// One [`LinkBatch`] per edge-id batch; batch `i` draws from a ChaCha8 RNG
/// seeded with [`batch_seed`]`(seed, i)`.
pub fn sample_link_batches<G: Graph>(
    sampler: &LinkPredictionSampler<'_, G>,
    batches: &[Vec<EdgeId>],
    seed: u64,
) -> Result<Vec<LinkBatch>> {
    batches
        .iter()
        .enumerate()
        .map(|(i, batch)| {
            let mut rng = ChaCha8Rng::seed_from_u64(batch_seed(seed, i));
            sampler.sample(batch, &mut rng)
        })
        .collect()
}
