//! Agent policy trait.
//!
//! A policy is untrusted decision logic supplied from outside the engine.
//! The engine calls [`AgentPolicy::locate`] once for the locate phase and,
//! only if that phase succeeded, [`AgentPolicy::escape`] once for the escape
//! phase. Each call runs on a dedicated worker thread under the phase
//! deadline; returning an error or panicking ends the phase with a runtime
//! fault.

use crate::view::{FindView, FleeView};

/// Decision logic for both phases of a game.
pub trait AgentPolicy: Send {
    /// Walk from the locate entrance to the hidden target, then return.
    ///
    /// # Errors
    ///
    /// Any error ends the locate phase as a runtime fault.
    fn locate(&mut self, view: &mut FindView) -> anyhow::Result<()>;

    /// Walk from the escape start to the exit within the step budget,
    /// optionally collecting rewards, then return.
    ///
    /// # Errors
    ///
    /// Any error ends the escape phase as a runtime fault.
    fn escape(&mut self, view: &mut FleeView) -> anyhow::Result<()>;
}

/// Builds a fresh policy for every game of a session.
pub type PolicyFactory = dyn Fn() -> Box<dyn AgentPolicy> + Send + Sync;
