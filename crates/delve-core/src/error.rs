//! Error types for the `delve-core` crate.

use delve_types::NodeId;
use delve_world::WorldError;

/// Why a view operation was refused.
///
/// [`InvalidMove`](Self::InvalidMove) and
/// [`NothingToCollect`](Self::NothingToCollect) leave the phase running.
/// [`BudgetExhausted`](Self::BudgetExhausted) ends the escape phase; every
/// later operation fails with [`PhaseHalted`](Self::PhaseHalted).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    /// The target node is not adjacent to the current node.
    #[error("cannot move from {from} to {to}: not adjacent")]
    InvalidMove {
        /// Current node.
        from: NodeId,
        /// Requested node.
        to: NodeId,
    },

    /// The passage is longer than the steps left.
    #[error("passage of length {needed} exceeds the {remaining} steps left")]
    BudgetExhausted {
        /// Length of the passage that was attempted.
        needed: u32,
        /// Steps that were left.
        remaining: u32,
    },

    /// No reward is left on the current node.
    #[error("nothing to collect at {0}")]
    NothingToCollect(NodeId),

    /// The phase already ended; no further actions are accepted.
    #[error("phase has halted")]
    PhaseHalted,

    /// The phase deadline passed.
    #[error("phase deadline passed")]
    Cancelled,
}

/// Errors that prevent a game from being played at all.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// The locate target cannot be reached from the locate entrance.
    #[error("locate target {target} is unreachable from {entrance}")]
    UnreachableTarget {
        /// Locate entrance.
        entrance: NodeId,
        /// Locate target.
        target: NodeId,
    },

    /// The escape cavern has no open tile where the locate target lies.
    #[error("escape cavern has no node on tile ({row}, {col})")]
    MissingEscapeStart {
        /// Row of the locate target.
        row: u32,
        /// Column of the locate target.
        col: u32,
    },

    /// The escape exit cannot be reached from the escape start.
    #[error("escape exit {exit} is unreachable from {start}")]
    UnreachableExit {
        /// Escape start.
        start: NodeId,
        /// Escape exit.
        exit: NodeId,
    },

    /// A cavern query failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },

    /// The phase worker thread could not be started.
    #[error("failed to spawn phase worker: {source}")]
    Spawn {
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The phase worker stopped without reporting back.
    #[error("phase worker disconnected without a result")]
    WorkerLost,
}
