//! Graph adapter trait and a compact in-memory store.

use crate::error::{Error, Result};

/// Dense node id in `0..node_count()`.
pub type NodeId = usize;
/// Dense edge id in `0..edge_count()`.
pub type EdgeId = usize;

/// Read-only graph view consumed by the samplers.
///
/// Samplers only ever look *backward* along edges (message passing flows
/// source -> destination), so the one required adjacency query is the list
/// of in-edges of a node.
pub trait Graph {
    fn node_count(&self) -> usize;
    fn edge_count(&self) -> usize;

    /// `(source, destination)` of `edge`, or `None` if the id is out of range.
    fn edge_endpoints(&self, edge: EdgeId) -> Option<(NodeId, NodeId)>;

    /// Ids of the edges whose destination is `node`.
    ///
    /// Requirements:
    /// - Returns an empty slice for out-of-range nodes.
    /// - Parallel edges appear once per edge (multigraph semantics).
    fn in_edges_ref(&self, node: NodeId) -> &[EdgeId];

    fn in_degree(&self, node: NodeId) -> usize {
        self.in_edges_ref(node).len()
    }
}

/// Edge list plus a destination-major (CSC) index.
///
/// Edge ids are positions in the input edge list. Within one destination,
/// in-edges are ordered by edge id.
#[derive(Debug, Clone, Default)]
pub struct CsrGraph {
    num_nodes: usize,
    src: Vec<NodeId>,
    dst: Vec<NodeId>,
    indptr: Vec<usize>,
    in_edge_ids: Vec<EdgeId>,
}

impl CsrGraph {
    /// Build from directed `(source, destination)` pairs.
    pub fn from_edges(num_nodes: usize, edges: &[(NodeId, NodeId)]) -> Result<Self> {
        for &(s, d) in edges {
            for v in [s, d] {
                if v >= num_nodes {
                    return Err(Error::IndexOutOfBounds { index: v, len: num_nodes });
                }
            }
        }
        Ok(Self::build(num_nodes, edges.iter().copied()))
    }

    /// Build a symmetric graph: each input pair `(u, v)` becomes edges
    /// `2i = u -> v` and `2i + 1 = v -> u`.
    pub fn undirected(num_nodes: usize, edges: &[(NodeId, NodeId)]) -> Result<Self> {
        let both: Vec<(NodeId, NodeId)> =
            edges.iter().flat_map(|&(u, v)| [(u, v), (v, u)]).collect();
        Self::from_edges(num_nodes, &both)
    }

    fn build(num_nodes: usize, edges: impl Iterator<Item = (NodeId, NodeId)>) -> Self {
        let (src, dst): (Vec<NodeId>, Vec<NodeId>) = edges.unzip();

        // Counting sort by destination; stable in edge id.
        let mut indptr = vec![0usize; num_nodes + 1];
        for &d in &dst {
            indptr[d + 1] += 1;
        }
        for i in 0..num_nodes {
            indptr[i + 1] += indptr[i];
        }
        let mut cursor = indptr[..num_nodes].to_vec();
        let mut in_edge_ids = vec![0usize; dst.len()];
        for (e, &d) in dst.iter().enumerate() {
            in_edge_ids[cursor[d]] = e;
            cursor[d] += 1;
        }

        Self { num_nodes, src, dst, indptr, in_edge_ids }
    }

    /// Source endpoint per edge id.
    pub fn src(&self) -> &[NodeId] {
        &self.src
    }

    /// Destination endpoint per edge id.
    pub fn dst(&self) -> &[NodeId] {
        &self.dst
    }

    /// Source nodes of the in-edges of `node` (with multiplicity).
    pub fn predecessors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.in_edges_ref(node).iter().map(move |&e| self.src[e])
    }

    /// Convert a petgraph graph. Undirected graphs contribute both directions
    /// per edge, in the same `2i` / `2i + 1` layout as [`CsrGraph::undirected`].
    #[cfg(feature = "petgraph")]
    pub fn from_petgraph<N, E, Ty, Ix>(graph: &petgraph::Graph<N, E, Ty, Ix>) -> Self
    where
        Ty: petgraph::EdgeType,
        Ix: petgraph::graph::IndexType,
    {
        use petgraph::visit::EdgeRef;

        let directed = graph.is_directed();
        let pairs = graph.edge_references().flat_map(|e| {
            let (s, t) = (e.source().index(), e.target().index());
            if directed {
                vec![(s, t)]
            } else {
                vec![(s, t), (t, s)]
            }
        });
        Self::build(graph.node_count(), pairs)
    }
}

impl Graph for CsrGraph {
    fn node_count(&self) -> usize {
        self.num_nodes
    }

    fn edge_count(&self) -> usize {
        self.src.len()
    }

    fn edge_endpoints(&self, edge: EdgeId) -> Option<(NodeId, NodeId)> {
        Some((*self.src.get(edge)?, *self.dst.get(edge)?))
    }

    fn in_edges_ref(&self, node: NodeId) -> &[EdgeId] {
        if node >= self.num_nodes {
            return &[];
        }
        &self.in_edge_ids[self.indptr[node]..self.indptr[node + 1]]
    }
}
