//! Heterogeneous graphs and per-edge-type negative sampling.
//!
//! Edge types are canonical `(src_type, relation, dst_type)` triples. For a
//! positive edge of type `(A, r, B)` the corrupted destination must be a `B`
//! node, so each edge type gets its own distribution over its destination
//! type, weighted by in-degree *within that edge type*.

use crate::alias::AliasTable;
use crate::error::{Error, Result};
use crate::graph::{EdgeId, NodeId};
use crate::negative::{validate_k_and_exponent, NegativeBatch, NegativeSamplerConfig};
use rand::Rng;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, warn};

/// A node type name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeType(pub String);

impl NodeType {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeType {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Canonical edge type `(src_type, relation, dst_type)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EdgeType {
    pub src_type: NodeType,
    pub relation: String,
    pub dst_type: NodeType,
}

impl EdgeType {
    pub fn new(
        src_type: impl Into<NodeType>,
        relation: impl Into<String>,
        dst_type: impl Into<NodeType>,
    ) -> Self {
        Self { src_type: src_type.into(), relation: relation.into(), dst_type: dst_type.into() }
    }

    /// Reverse edge type, relation prefixed with `rev_`.
    pub fn reverse(&self) -> Self {
        Self {
            src_type: self.dst_type.clone(),
            relation: format!("rev_{}", self.relation),
            dst_type: self.src_type.clone(),
        }
    }
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.src_type.as_str(), self.relation, self.dst_type.as_str())
    }
}

/// COO edges of one edge type; ids are local to that edge type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EdgeStore {
    pub src: Vec<NodeId>,
    pub dst: Vec<NodeId>,
}

impl EdgeStore {
    pub fn num_edges(&self) -> usize {
        self.src.len()
    }

    pub fn endpoints(&self, edge: EdgeId) -> Option<(NodeId, NodeId)> {
        Some((*self.src.get(edge)?, *self.dst.get(edge)?))
    }
}

/// Typed node counts plus per-edge-type edge stores.
///
/// With the `serde` feature the maps are written as `(key, value)` lists
/// (struct keys are not valid map keys in formats like JSON) and every edge is
/// re-validated on the way back in.
#[derive(Debug, Clone, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "HeteroGraphParts", into = "HeteroGraphParts")
)]
pub struct HeteroGraph {
    num_nodes: HashMap<NodeType, usize>,
    edge_stores: HashMap<EdgeType, EdgeStore>,
}

impl HeteroGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `count` nodes of `node_type` (ids `0..count`). Counts never
    /// shrink, so edges already added stay in range.
    pub fn set_num_nodes(&mut self, node_type: impl Into<NodeType>, count: usize) {
        let n = self.num_nodes.entry(node_type.into()).or_insert(0);
        *n = (*n).max(count);
    }

    /// Node count for a type; 0 if undeclared.
    pub fn num_nodes(&self, node_type: &NodeType) -> usize {
        self.num_nodes.get(node_type).copied().unwrap_or(0)
    }

    /// Append edges of `edge_type`. Endpoints are checked against the
    /// declared node counts of the source/destination types.
    pub fn add_edges(&mut self, edge_type: &EdgeType, edges: &[(NodeId, NodeId)]) -> Result<()> {
        let n_src = self.num_nodes(&edge_type.src_type);
        let n_dst = self.num_nodes(&edge_type.dst_type);
        for &(s, d) in edges {
            if s >= n_src {
                return Err(Error::IndexOutOfBounds { index: s, len: n_src });
            }
            if d >= n_dst {
                return Err(Error::IndexOutOfBounds { index: d, len: n_dst });
            }
        }

        let store = self.edge_stores.entry(edge_type.clone()).or_default();
        for &(s, d) in edges {
            store.src.push(s);
            store.dst.push(d);
        }
        Ok(())
    }

    pub fn edge_store(&self, edge_type: &EdgeType) -> Option<&EdgeStore> {
        self.edge_stores.get(edge_type)
    }

    pub fn edge_types(&self) -> impl Iterator<Item = &EdgeType> {
        self.edge_stores.keys()
    }

    pub fn num_edge_types(&self) -> usize {
        self.edge_stores.len()
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct HeteroGraphParts {
    node_counts: Vec<(NodeType, usize)>,
    edge_stores: Vec<(EdgeType, EdgeStore)>,
}

#[cfg(feature = "serde")]
impl From<HeteroGraph> for HeteroGraphParts {
    fn from(graph: HeteroGraph) -> Self {
        let mut node_counts: Vec<_> = graph.num_nodes.into_iter().collect();
        let mut edge_stores: Vec<_> = graph.edge_stores.into_iter().collect();
        node_counts.sort_by(|a, b| a.0.cmp(&b.0));
        edge_stores.sort_by(|a, b| a.0.cmp(&b.0));
        Self { node_counts, edge_stores }
    }
}

#[cfg(feature = "serde")]
impl TryFrom<HeteroGraphParts> for HeteroGraph {
    type Error = Error;

    fn try_from(parts: HeteroGraphParts) -> Result<Self> {
        let mut graph = HeteroGraph::new();
        for (node_type, count) in parts.node_counts {
            graph.set_num_nodes(node_type, count);
        }
        for (edge_type, store) in parts.edge_stores {
            if store.src.len() != store.dst.len() {
                return Err(Error::InvalidParameter(format!(
                    "edge store {edge_type} has {} sources but {} destinations",
                    store.src.len(),
                    store.dst.len()
                )));
            }
            let edges: Vec<(NodeId, NodeId)> = store.src.into_iter().zip(store.dst).collect();
            graph.add_edges(&edge_type, &edges)?;
        }
        Ok(graph)
    }
}

#[derive(Debug, Clone)]
struct RelationTable {
    weights: Vec<f64>,
    table: Option<AliasTable>,
}

/// Degree-weighted negative sampler with one distribution per edge type.
#[derive(Debug, Clone)]
pub struct HeteroNegativeSampler<'a> {
    graph: &'a HeteroGraph,
    k: usize,
    tables: HashMap<EdgeType, RelationTable>,
}

impl<'a> HeteroNegativeSampler<'a> {
    pub fn new(graph: &'a HeteroGraph, k: usize) -> Result<Self> {
        Self::with_config(graph, NegativeSamplerConfig { k, ..Default::default() })
    }

    pub fn with_config(graph: &'a HeteroGraph, config: NegativeSamplerConfig) -> Result<Self> {
        validate_k_and_exponent(config.k, config.exponent)?;

        let mut tables = HashMap::with_capacity(graph.num_edge_types());
        for (etype, store) in &graph.edge_stores {
            let n_dst = graph.num_nodes(&etype.dst_type);
            let mut in_degree = vec![0usize; n_dst];
            for &d in &store.dst {
                *in_degree.get_mut(d).ok_or(Error::IndexOutOfBounds { index: d, len: n_dst })? += 1;
            }
            let weights: Vec<f64> =
                in_degree.iter().map(|&deg| (deg as f64).powf(config.exponent)).collect();
            let table = AliasTable::new(&weights);
            if table.is_none() {
                warn!(edge_type = %etype, "negative sampling distribution has no mass");
            }
            tables.insert(etype.clone(), RelationTable { weights, table });
        }

        Ok(Self { graph, k: config.k, tables })
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// Unnormalized weights over the destination type of `edge_type`.
    pub fn weights(&self, edge_type: &EdgeType) -> Option<&[f64]> {
        self.tables.get(edge_type).map(|t| t.weights.as_slice())
    }

    /// `k` negatives per positive edge of `edge_type`; destinations are
    /// nodes of `edge_type.dst_type`.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        edge_type: &EdgeType,
        pos_edges: &[EdgeId],
        rng: &mut R,
    ) -> Result<NegativeBatch> {
        let rel = self.tables.get(edge_type);
        let store = self.graph.edge_store(edge_type);
        let (Some(rel), Some(store)) = (rel, store) else {
            return Err(Error::UnknownEdgeType(edge_type.to_string()));
        };
        if pos_edges.is_empty() {
            return Err(Error::InvalidParameter("positive edge batch is empty".into()));
        }
        if rel.weights.is_empty() {
            return Err(Error::EmptyGraph);
        }

        let mut sources = Vec::with_capacity(pos_edges.len());
        for &e in pos_edges {
            let (s, _) = store
                .endpoints(e)
                .ok_or(Error::IndexOutOfBounds { index: e, len: store.num_edges() })?;
            sources.push(s);
        }

        let Some(table) = &rel.table else {
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
        for s in sources {
            for _ in 0..self.k {
                src.push(s);
                dst.push(table.draw(rng));
            }
        }

        debug!(edge_type = %edge_type, negatives = total, "sampled typed negative batch");
        Ok(NegativeBatch { src, dst })
    }
}
