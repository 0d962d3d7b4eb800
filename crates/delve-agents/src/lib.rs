//! Reference agent policies for the Delve simulation.
//!
//! Policies only ever act through the views handed to them by `delve-core`;
//! nothing here can see the locate cavern beyond its neighbours or change
//! the engine's state directly.
//!
//! # Modules
//!
//! - [`prospector`] -- [`Prospector`], a depth-first locator and greedy
//!   reward collector.

pub mod prospector;

pub use prospector::Prospector;
