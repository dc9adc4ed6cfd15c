//! Degree-weighted negative sampling for link prediction.
//!
//! For each positive edge `(u, v)` the sampler emits `k` corrupted pairs
//! `(u, v')`, with `v'` drawn independently (with replacement) from
//!
//! \[
//!   P(v') = \frac{\mathrm{indeg}(v')^{\alpha}}{\sum_x \mathrm{indeg}(x)^{\alpha}}
//! \]
//!
//! with \(\alpha = 0.75\) unless configured otherwise.
//!
//! No adjacency check is made: a sampled `(u, v')` may be a true edge. Callers
//! training a contrastive loss are expected to tolerate these rare false
//! negatives.

use crate::alias::AliasTable;
use crate::error::{Error, Result};
use crate::graph::{EdgeId, Graph, NodeId};
use rand::Rng;
use tracing::{debug, warn};

/// Negative sampler parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NegativeSamplerConfig {
    /// Negatives drawn per positive edge. Must be at least 1.
    pub k: usize,
    /// Power applied to in-degree. `0.0` gives a uniform distribution over nodes.
    pub exponent: f64,
}

impl Default for NegativeSamplerConfig {
    fn default() -> Self {
        Self { k: 5, exponent: 0.75 }
    }
}

/// Negative pairs, aligned by index: `(src[i], dst[i])`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NegativeBatch {
    pub src: Vec<NodeId>,
    pub dst: Vec<NodeId>,
}

impl NegativeBatch {
    pub fn len(&self) -> usize {
        self.src.len()
    }

    pub fn is_empty(&self) -> bool {
        self.src.is_empty()
    }

    pub fn pairs(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.src.iter().copied().zip(self.dst.iter().copied())
    }
}

/// `indeg(v)^exponent` for every node, indexed by node id.
pub fn degree_weights<G: Graph>(graph: &G, exponent: f64) -> Vec<f64> {
    (0..graph.node_count())
        .map(|v| (graph.in_degree(v) as f64).powf(exponent))
        .collect()
}

pub(crate) fn validate_k_and_exponent(k: usize, exponent: f64) -> Result<()> {
    if k < 1 {
        return Err(Error::InvalidParameter(format!("negative fan-out k must be >= 1, got {k}")));
    }
    if !exponent.is_finite() || exponent < 0.0 {
        return Err(Error::InvalidParameter(format!(
            "degree exponent must be finite and >= 0, got {exponent}"
        )));
    }
    Ok(())
}

/// Degree-weighted negative sampler over a fixed graph.
///
/// The distribution is computed once at construction; the graph is only
/// read afterwards.
#[derive(Debug, Clone)]
pub struct NegativeSampler<'a, G> {
    graph: &'a G,
    k: usize,
    weights: Vec<f64>,
    table: Option<AliasTable>,
}

impl<'a, G: Graph> NegativeSampler<'a, G> {
    /// Sampler with `k` negatives per positive and the default `0.75` exponent.
    pub fn new(graph: &'a G, k: usize) -> Result<Self> {
        Self::with_config(graph, NegativeSamplerConfig { k, ..Default::default() })
    }

    pub fn with_config(graph: &'a G, config: NegativeSamplerConfig) -> Result<Self> {
        validate_k_and_exponent(config.k, config.exponent)?;
        if graph.node_count() == 0 {
            return Err(Error::EmptyGraph);
        }

        let weights = degree_weights(graph, config.exponent);
        let table = AliasTable::new(&weights);
        if table.is_none() {
            warn!(
                nodes = graph.node_count(),
                "negative sampling distribution has no mass; negative batches will be empty"
            );
        }

        Ok(Self { graph, k: config.k, weights, table })
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// Unnormalized per-node weights.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Normalized per-node probabilities (all zero if the distribution has no mass).
    pub fn probabilities(&self) -> Vec<f64> {
        let sum: f64 = self.weights.iter().sum();
        if sum > 0.0 {
            self.weights.iter().map(|w| w / sum).collect()
        } else {
            vec![0.0; self.weights.len()]
        }
    }

    fn source_of(&self, edge: EdgeId) -> Result<NodeId> {
        self.graph
            .edge_endpoints(edge)
            .map(|(s, _)| s)
            .ok_or(Error::IndexOutOfBounds { index: edge, len: self.graph.edge_count() })
    }

    /// Draw `k` negatives for each positive edge, preserving batch order.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        pos_edges: &[EdgeId],
        rng: &mut R,
    ) -> Result<NegativeBatch> {
        if pos_edges.is_empty() {
            return Err(Error::InvalidParameter("positive edge batch is empty".into()));
        }

        let Some(table) = &self.table else {
            for &e in pos_edges {
                self.source_of(e)?;
            }
            return Ok(NegativeBatch::default());
        };

        let total = pos_edges.len().checked_mul(self.k).ok_or_else(|| {
            Error::InvalidParameter(format!(
                "{} positive edges times k = {} overflows usize",
                pos_edges.len(),
                self.k
            ))
        })?;
        let mut src = Vec::with_capacity(total);
        let mut dst = Vec::with_capacity(total);
        for &e in pos_edges {
            let s = self.source_of(e)?;
            for _ in 0..self.k {
                src.push(s);
                dst.push(table.draw(rng));
            }
        }

        debug!(positives = pos_edges.len(), negatives = total, "sampled negative batch");
        Ok(NegativeBatch { src, dst })
    }
}
