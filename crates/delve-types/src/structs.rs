//! Core structs for the Delve simulation.
//!
//! Covers tile metadata carried by every cavern node, the neighbour status
//! handed to a policy during the locate phase, and the reports produced when
//! a game ends.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{Phase, PhaseOutcome};
use crate::ids::NodeId;

// ---------------------------------------------------------------------------
// Tile
// ---------------------------------------------------------------------------

/// Map-tile metadata embedded in a cavern node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tile {
    /// Grid row of the tile.
    pub row: u32,
    /// Grid column of the tile.
    pub col: u32,
    /// Reward lying on the tile when the cavern is generated (0 = none).
    pub reward: u32,
}

impl Tile {
    /// A tile at `(row, col)` with no reward.
    pub const fn bare(row: u32, col: u32) -> Self {
        Self {
            row,
            col,
            reward: 0,
        }
    }

    /// Grid distance (rows plus columns) to another tile, ignoring walls and
    /// edge lengths.
    pub const fn grid_distance(&self, other: &Self) -> u32 {
        self.row
            .abs_diff(other.row)
            .saturating_add(self.col.abs_diff(other.col))
    }
}

// ---------------------------------------------------------------------------
// NodeStatus
// ---------------------------------------------------------------------------

/// A neighbour visible from the current node during the locate phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeStatus {
    /// Identifier of the neighbouring node.
    pub id: NodeId,
    /// Grid distance from that neighbour to the hidden target.
    pub distance_to_target: u32,
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Summary of one phase after it has ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseReport {
    /// Which phase this report describes.
    pub phase: Phase,
    /// How the phase ended.
    pub outcome: PhaseOutcome,
    /// Length of the shortest path from the phase start to its goal.
    pub optimal_distance: u32,
    /// Steps spent: moves taken while locating, edge length spent while escaping.
    pub steps: u32,
    /// Step budget granted for the phase (escape only).
    pub step_budget: Option<u32>,
    /// Shortest distance from the final position to the goal, when reachable.
    pub remaining_distance: Option<u32>,
}

/// Summary of a complete game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameReport {
    /// Locate-phase report.
    pub find: PhaseReport,
    /// Escape-phase report; `None` when the locate phase did not succeed.
    pub flee: Option<PhaseReport>,
    /// Reward credited toward the score.
    pub reward_collected: u64,
    /// Bonus multiplier earned in the locate phase.
    pub bonus_factor: f64,
    /// Final score, `floor(bonus_factor * reward_collected)`.
    pub score: u64,
    /// When the game started.
    pub started_at: DateTime<Utc>,
    /// When the game finished.
    pub finished_at: DateTime<Utc>,
}

impl GameReport {
    /// Whether both phases reached their goals.
    pub fn escaped(&self) -> bool {
        self.find.outcome.is_success()
            && self
                .flee
                .as_ref()
                .is_some_and(|flee| flee.outcome.is_success())
    }
}
