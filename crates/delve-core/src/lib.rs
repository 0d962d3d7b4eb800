//! Game engine, deadline supervision, and session runner for the Delve
//! simulation.
//!
//! This crate owns the two-phase state machine: locate the hidden target with
//! only local information, then escape a second cavern within a step budget
//! while collecting rewards. Policy code is untrusted and runs on a worker
//! thread under a wall-clock deadline.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `delve-config.yaml` into
//!   strongly-typed structs.
//! - [`error`] -- [`ActionError`] for refused view operations and
//!   [`GameError`] for games that cannot be played.
//! - [`game`] -- [`Game`], the phase state machine and scorer.
//! - [`observer`] -- [`GameObserver`] notifications for presentation layers.
//! - [`policy`] -- The [`AgentPolicy`] trait.
//! - [`runner`] -- Seeded multi-game sessions.
//! - [`score`] -- Bonus, score, and escape-budget arithmetic.
//! - [`view`] -- [`FindView`] and [`FleeView`], the only surface a policy
//!   acts through.
//!
//! [`ActionError`]: error::ActionError
//! [`GameError`]: error::GameError
//! [`Game`]: game::Game
//! [`GameObserver`]: observer::GameObserver
//! [`AgentPolicy`]: policy::AgentPolicy
//! [`FindView`]: view::FindView
//! [`FleeView`]: view::FleeView

pub mod config;
pub mod error;
pub mod game;
pub mod observer;
pub mod policy;
pub mod runner;
pub mod score;
mod supervisor;
pub mod view;

// Re-export primary types at crate root.
pub use config::{ConfigError, GameConfig};
pub use error::{ActionError, GameError};
pub use game::Game;
pub use observer::{GameObserver, NoOpObserver, SharedObserver, TracingObserver};
pub use policy::{AgentPolicy, PolicyFactory};
pub use runner::{RunnerError, SessionSummary, run_session};
pub use view::{FindView, FleeView};
