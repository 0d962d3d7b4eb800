//! Presentation boundary: notifications emitted while a game is played.
//!
//! The engine reports every change a display would care about through
//! [`GameObserver`]. Notifications are fire-and-forget; an observer never
//! influences an outcome.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::info;

use delve_types::{NodeId, Phase, PhaseOutcome, Tile};

/// Receiver of game notifications. Every method defaults to doing nothing.
pub trait GameObserver: Send {
    /// A new phase began.
    fn on_phase(&mut self, _phase: Phase) {}

    /// A phase ended with `outcome`.
    fn on_phase_end(&mut self, _phase: Phase, _outcome: &PhaseOutcome) {}

    /// The agent moved onto `node`.
    fn on_position(&mut self, _phase: Phase, _node: NodeId, _tile: &Tile) {}

    /// The agent picked up `amount`, bringing its haul to `total`.
    fn on_reward(&mut self, _amount: u32, _total: u64) {}

    /// The locate bonus changed.
    fn on_bonus(&mut self, _bonus: f64) {}

    /// The escape step budget changed.
    fn on_steps_left(&mut self, _steps_left: u32) {}
}

/// An observer shared between the engine and the phase worker.
pub type SharedObserver = Arc<Mutex<dyn GameObserver>>;

/// Wrap an observer for sharing with phase workers.
pub fn shared(observer: impl GameObserver + 'static) -> SharedObserver {
    Arc::new(Mutex::new(observer))
}

/// Lock a shared observer, recovering it if a previous holder panicked.
pub(crate) fn lock(observer: &SharedObserver) -> MutexGuard<'_, dyn GameObserver + 'static> {
    observer.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Headless observer.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpObserver;

impl GameObserver for NoOpObserver {}

/// Logs every notification through `tracing`, for interactive sessions.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl GameObserver for TracingObserver {
    fn on_phase(&mut self, phase: Phase) {
        info!(%phase, "Phase started");
    }

    fn on_phase_end(&mut self, phase: Phase, outcome: &PhaseOutcome) {
        info!(%phase, %outcome, "Phase ended");
    }

    fn on_position(&mut self, phase: Phase, node: NodeId, tile: &Tile) {
        info!(%phase, %node, row = tile.row, col = tile.col, "Moved");
    }

    fn on_reward(&mut self, amount: u32, total: u64) {
        info!(amount, total, "Collected reward");
    }

    fn on_bonus(&mut self, bonus: f64) {
        info!(bonus, "Bonus updated");
    }

    fn on_steps_left(&mut self, steps_left: u32) {
        info!(steps_left, "Steps left");
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Recording observer used by engine tests.

    use super::GameObserver;
    use delve_types::{NodeId, Phase, PhaseOutcome, Tile};

    /// Everything an observer was told, in order.
    #[derive(Debug, Clone, PartialEq)]
    pub(crate) enum Note {
        Phase(Phase),
        PhaseEnd(Phase, PhaseOutcome),
        Position(NodeId),
        Reward(u32, u64),
        Bonus(f64),
        StepsLeft(u32),
    }

    #[derive(Debug, Default)]
    pub(crate) struct Recorder {
        pub(crate) notes: Vec<Note>,
    }

    impl GameObserver for Recorder {
        fn on_phase(&mut self, phase: Phase) {
            self.notes.push(Note::Phase(phase));
        }

        fn on_phase_end(&mut self, phase: Phase, outcome: &PhaseOutcome) {
            self.notes.push(Note::PhaseEnd(phase, outcome.clone()));
        }

        fn on_position(&mut self, _phase: Phase, node: NodeId, _tile: &Tile) {
            self.notes.push(Note::Position(node));
        }

        fn on_reward(&mut self, amount: u32, total: u64) {
            self.notes.push(Note::Reward(amount, total));
        }

        fn on_bonus(&mut self, bonus: f64) {
            self.notes.push(Note::Bonus(bonus));
        }

        fn on_steps_left(&mut self, steps_left: u32) {
            self.notes.push(Note::StepsLeft(steps_left));
        }
    }
}
