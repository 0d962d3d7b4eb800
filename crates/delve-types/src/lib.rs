//! Shared type definitions for the Delve cavern simulation.
//!
//! This crate is the single source of truth for the types that cross crate
//! boundaries: node identifiers, tile metadata, the phase and outcome
//! enumerations, and the reports produced at the end of a game.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe identifier wrappers
//! - [`enums`] -- Phase and phase-outcome enumerations
//! - [`structs`] -- Tiles, neighbour status, and game reports

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{Phase, PhaseOutcome};
pub use ids::NodeId;
pub use structs::{GameReport, NodeStatus, PhaseReport, Tile};
