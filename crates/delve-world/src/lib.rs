//! Cavern graphs and graph algorithms for the Delve simulation.
//!
//! This crate models the space an agent moves through: open tiles as nodes of
//! a weighted undirected graph, a priority queue with in-place priority
//! updates, the shortest-path search built on it, and a seeded generator.
//!
//! # Modules
//!
//! - [`cavern`] -- The cavern graph and its validating builder.
//! - [`dig`] -- Seeded generation of locate and escape caverns.
//! - [`error`] -- Error types for queue misuse and graph operations.
//! - [`path`] -- Shortest paths, path lengths, and single-source distances.
//! - [`queue`] -- [`IndexedPriorityQueue`], a min- or max-ordered binary heap
//!   with O(1) membership lookup.

pub mod cavern;
pub mod dig;
pub mod error;
pub mod path;
pub mod queue;

// Re-export primary types at crate root.
pub use cavern::{Cavern, CavernBuilder, CavernNode, Edge};
pub use dig::{CavernConfig, dig_find_cavern, dig_flee_cavern, pick_dimensions};
pub use error::{QueueError, WorldError};
pub use path::{distance, distances_from, path_length, shortest_path};
pub use queue::{HeapOrder, IndexedPriorityQueue};
