//! Error types for the `delve-world` crate.
//!
//! Queue misuse is reported through [`QueueError`]; every other fallible
//! operation in this crate returns [`WorldError`].

use delve_types::NodeId;

/// Misuse of an [`IndexedPriorityQueue`].
///
/// These are programming errors: they are always surfaced and never retried.
///
/// [`IndexedPriorityQueue`]: crate::queue::IndexedPriorityQueue
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    /// The value is already present in the queue.
    #[error("value is already in the queue")]
    DuplicateKey,

    /// The value is not present in the queue.
    #[error("value is not in the queue")]
    KeyNotFound,

    /// The queue holds no values.
    #[error("queue is empty")]
    EmptyContainer,
}

/// Errors that can occur during cavern-graph operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    /// A node was not found in the cavern.
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    /// A node with the same id was already added.
    #[error("duplicate node id: {0}")]
    DuplicateNode(NodeId),

    /// Two nodes were placed on the same tile.
    #[error("tile ({row}, {col}) already holds a node")]
    TileOccupied {
        /// Grid row.
        row: u32,
        /// Grid column.
        col: u32,
    },

    /// A tile lies outside the cavern's grid.
    #[error("tile ({row}, {col}) lies outside a {rows}x{cols} grid")]
    TileOutOfBounds {
        /// Grid row.
        row: u32,
        /// Grid column.
        col: u32,
        /// Number of rows in the grid.
        rows: u32,
        /// Number of columns in the grid.
        cols: u32,
    },

    /// An edge would connect a node to itself.
    #[error("edge from {0} to itself")]
    SelfLoop(NodeId),

    /// The two nodes are already connected.
    #[error("duplicate edge between {a} and {b}")]
    DuplicateEdge {
        /// One endpoint.
        a: NodeId,
        /// The other endpoint.
        b: NodeId,
    },

    /// Two consecutive path nodes share no edge.
    #[error("no edge from {from} to {to}")]
    NotAdjacent {
        /// Origin node.
        from: NodeId,
        /// Destination node.
        to: NodeId,
    },

    /// A path length was requested for a path with no nodes.
    #[error("path has no nodes")]
    EmptyPath,

    /// The grid dimensions cannot hold a playable cavern.
    #[error("invalid cavern dimensions {rows}x{cols}")]
    InvalidDimensions {
        /// Requested rows.
        rows: u32,
        /// Requested columns.
        cols: u32,
    },

    /// Arithmetic overflow during a checked operation.
    #[error("arithmetic overflow in cavern calculation")]
    ArithmeticOverflow,

    /// The priority queue was misused during a search.
    #[error("queue error: {source}")]
    Queue {
        /// The underlying queue error.
        #[from]
        source: QueueError,
    },
}
