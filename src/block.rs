//! Multi-layer neighbor sampling into bipartite message-passing blocks.
//!
//! An `L`-layer model computing outputs at a set of seed nodes needs, at
//! layer `l`, the layer-`l-1` representations of every node that sends a
//! message to a layer-`l` destination. Walking backward from the seeds:
//!
//! ```text
//! frontier_L   = seeds
//! block l      = (src: sampled predecessors of frontier_l, dst: frontier_l)
//! frontier_l-1 = block l src
//! ```
//!
//! The returned blocks are ordered the way the model consumes them: block 1
//! (nearest the input features) first, block `L` (whose destinations are the
//! seeds) last. Consecutive blocks chain exactly, since the sources of block
//! `i` are the nodes block `i - 1` must produce:
//! `blocks[i - 1].dst_nodes == blocks[i].src_nodes`.

use crate::error::{Error, Result};
use crate::graph::{EdgeId, Graph, NodeId};
use rand::prelude::*;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Per-layer neighborhood size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Fanout {
    /// Sample at most this many in-edges per destination, uniformly without replacement.
    Limit(usize),
    /// Take every in-edge (full-neighborhood inference).
    All,
}

impl TryFrom<i64> for Fanout {
    type Error = Error;

    /// `-1` means [`Fanout::All`]; positive values are limits.
    fn try_from(value: i64) -> Result<Self> {
        match value {
            -1 => Ok(Self::All),
            v if v > 0 => Ok(Self::Limit(v as usize)),
            v => Err(Error::InvalidParameter(format!(
                "fanout must be positive or -1 (full neighborhood), got {v}"
            ))),
        }
    }
}

/// One bipartite message-passing layer.
///
/// `edges` hold `(src_local, dst_local)` indices into `src_nodes` /
/// `dst_nodes`; `edge_ids[i]` is the graph edge behind `edges[i]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Block {
    pub src_nodes: Vec<NodeId>,
    pub dst_nodes: Vec<NodeId>,
    pub edges: Vec<(usize, usize)>,
    pub edge_ids: Vec<EdgeId>,
}

impl Block {
    pub fn num_src_nodes(&self) -> usize {
        self.src_nodes.len()
    }

    pub fn num_dst_nodes(&self) -> usize {
        self.dst_nodes.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Sampled in-degree per destination (by local index), e.g. for mean aggregation.
    pub fn in_degrees(&self) -> Vec<usize> {
        let mut deg = vec![0usize; self.dst_nodes.len()];
        for &(_, d) in &self.edges {
            deg[d] += 1;
        }
        deg
    }
}

/// Seeds deduplicated, first occurrence wins.
pub(crate) fn dedup_in_order(nodes: &[NodeId]) -> Vec<NodeId> {
    let mut seen = HashSet::with_capacity(nodes.len());
    let mut out = Vec::with_capacity(nodes.len());
    for &v in nodes {
        if seen.insert(v) {
            out.push(v);
        }
    }
    out
}

/// GraphSAGE-style multi-layer neighbor sampler.
///
/// `fanouts[l - 1]` is the fanout of layer `l`; `fanouts.last()` applies to
/// the seeds themselves.
#[derive(Debug, Clone)]
pub struct BlockSampler<'a, G> {
    graph: &'a G,
    fanouts: Vec<Fanout>,
    max_src_nodes: Option<usize>,
}

impl<'a, G: Graph> BlockSampler<'a, G> {
    pub fn new(graph: &'a G, fanouts: Vec<Fanout>) -> Result<Self> {
        if fanouts.is_empty() {
            return Err(Error::InvalidParameter("at least one layer fanout is required".into()));
        }
        for (i, f) in fanouts.iter().enumerate() {
            if *f == Fanout::Limit(0) {
                return Err(Error::InvalidParameter(format!(
                    "fanout for layer {} must be >= 1 (use Fanout::All for full neighborhoods)",
                    i + 1
                )));
            }
        }
        Ok(Self { graph, fanouts, max_src_nodes: None })
    }

    /// Fail with [`Error::BatchTooLarge`] once any block would need more than
    /// `limit` source nodes. Checked layer by layer, so an oversized
    /// expansion stops before the deeper layers are built.
    pub fn with_max_src_nodes(mut self, limit: usize) -> Self {
        self.max_src_nodes = Some(limit);
        self
    }

    pub fn max_src_nodes(&self) -> Option<usize> {
        self.max_src_nodes
    }

    /// Full-neighborhood sampler with `num_layers` layers (inference).
    pub fn full(graph: &'a G, num_layers: usize) -> Result<Self> {
        Self::new(graph, vec![Fanout::All; num_layers])
    }

    pub fn graph(&self) -> &'a G {
        self.graph
    }

    pub fn num_layers(&self) -> usize {
        self.fanouts.len()
    }

    pub fn fanouts(&self) -> &[Fanout] {
        &self.fanouts
    }

    /// Build the block chain for `seeds`, input-nearest block first.
    pub fn sample_blocks<R: Rng + ?Sized>(
        &self,
        seeds: &[NodeId],
        rng: &mut R,
    ) -> Result<Vec<Block>> {
        if seeds.is_empty() {
            return Err(Error::InvalidParameter("seed node set is empty".into()));
        }
        let n = self.graph.node_count();
        if let Some(&bad) = seeds.iter().find(|&&v| v >= n) {
            return Err(Error::IndexOutOfBounds { index: bad, len: n });
        }

        let mut frontier = dedup_in_order(seeds);
        let mut blocks = Vec::with_capacity(self.fanouts.len());
        for (layer, &fanout) in self.fanouts.iter().enumerate().rev() {
            let block = self.sample_layer(frontier, fanout, rng)?;
            debug!(
                layer = layer + 1,
                dst = block.num_dst_nodes(),
                src = block.num_src_nodes(),
                edges = block.num_edges(),
                "sampled block"
            );
            if let Some(limit) = self.max_src_nodes {
                if block.num_src_nodes() > limit {
                    return Err(Error::BatchTooLarge {
                        layer: layer + 1,
                        nodes: block.num_src_nodes(),
                        limit,
                    });
                }
            }
            frontier = block.src_nodes.clone();
            blocks.push(block);
        }
        blocks.reverse();
        Ok(blocks)
    }

    fn sample_layer<R: Rng + ?Sized>(
        &self,
        frontier: Vec<NodeId>,
        fanout: Fanout,
        rng: &mut R,
    ) -> Result<Block> {
        let mut src_nodes: Vec<NodeId> = Vec::new();
        let mut src_index: HashMap<NodeId, usize> = HashMap::new();
        let mut edges = Vec::new();
        let mut edge_ids = Vec::new();
        let mut picked: Vec<EdgeId> = Vec::new();

        for (dst_local, &v) in frontier.iter().enumerate() {
            let in_edges = self.graph.in_edges_ref(v);
            picked.clear();
            match fanout {
                Fanout::Limit(f) if in_edges.len() > f => {
                    picked.extend(in_edges.choose_multiple(rng, f).copied());
                }
                _ => picked.extend_from_slice(in_edges),
            }

            for &e in &picked {
                let (s, _) = self
                    .graph
                    .edge_endpoints(e)
                    .ok_or(Error::IndexOutOfBounds { index: e, len: self.graph.edge_count() })?;
                let src_local = *src_index.entry(s).or_insert_with(|| {
                    src_nodes.push(s);
                    src_nodes.len() - 1
                });
                edges.push((src_local, dst_local));
                edge_ids.push(e);
            }
        }

        Ok(Block { src_nodes, dst_nodes: frontier, edges, edge_ids })
    }
}
