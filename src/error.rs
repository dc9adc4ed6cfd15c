//! Error types for fanout.

use thiserror::Error;

/// Errors surfaced by the samplers and loaders.
///
/// Nothing here is retried; every variant propagates synchronously to the
/// caller.
#[derive(Debug, Error)]
pub enum Error {
    /// A node or edge id was outside the graph.
    #[error("index out of bounds: {index} (len {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    /// Invalid configuration or argument (fanout, k, batch size, ...).
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The graph has zero nodes, so no sampling distribution exists.
    #[error("graph has no nodes")]
    EmptyGraph,

    /// Heterogeneous lookup for an edge type that was never registered.
    #[error("unknown edge type: {0}")]
    UnknownEdgeType(String),

    /// A block needed more source nodes than the configured cap allows
    /// (typically full-neighborhood expansion around a hub).
    #[error("batch too large: layer {layer} needs {nodes} source nodes (limit {limit})")]
    BatchTooLarge { layer: usize, nodes: usize, limit: usize },
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;
