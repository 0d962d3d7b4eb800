//! Phase views: the only surface a policy can act through.
//!
//! A [`FindView`] exposes the current node, its neighbours with their grid
//! distance to the hidden target, and single-step moves. It never reveals
//! the cavern or a path. A [`FleeView`] exposes the whole escape cavern, the
//! step budget, and the rewards still lying around.
//!
//! Each view shares its phase state with the engine behind a mutex. Every
//! operation takes the lock, checks the cancellation and halt latches
//! before anything else, and only then reads or mutates. Once the engine
//! latches cancellation at the deadline, the state is frozen: every later
//! call fails with [`ActionError::Cancelled`] and changes nothing.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use delve_types::{NodeId, NodeStatus, Phase, Tile};
use delve_world::{Cavern, WorldError, distance};

use crate::config::ScoringConfig;
use crate::error::ActionError;
use crate::observer::{self, SharedObserver};
use crate::score::bonus_factor;

/// Lock a phase state, recovering it if a previous holder panicked.
pub(crate) fn lock<S>(state: &Mutex<S>) -> MutexGuard<'_, S> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Latches shared by both phase states.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Latches {
    /// The deadline passed; the state is frozen.
    pub(crate) cancelled: bool,
    /// The phase ended; no further actions are accepted.
    pub(crate) halted: bool,
}

impl Latches {
    const fn check(self) -> Result<(), ActionError> {
        if self.cancelled {
            Err(ActionError::Cancelled)
        } else if self.halted {
            Err(ActionError::PhaseHalted)
        } else {
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// Locate phase
// ---------------------------------------------------------------------------

/// Mutable locate-phase state.
#[derive(Debug, Clone)]
pub(crate) struct FindState {
    pub(crate) position: NodeId,
    pub(crate) steps: u32,
    pub(crate) latches: Latches,
}

/// Restricted view handed to [`AgentPolicy::locate`].
///
/// [`AgentPolicy::locate`]: crate::policy::AgentPolicy::locate
pub struct FindView {
    cavern: Arc<Cavern>,
    target_tile: Tile,
    state: Arc<Mutex<FindState>>,
    observer: SharedObserver,
    scoring: ScoringConfig,
    optimal: u32,
}

impl FindView {
    /// Open a locate view standing on the cavern's entrance.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::NodeNotFound`] if the entrance or target is
    /// missing from the cavern.
    pub fn new(
        cavern: Arc<Cavern>,
        scoring: ScoringConfig,
        observer: SharedObserver,
    ) -> Result<Self, WorldError> {
        let entrance = cavern.entrance();
        let target_tile = *cavern.require(cavern.target())?.tile();
        let optimal = distance(&cavern, entrance, cavern.target())?.unwrap_or(0);
        let entrance_tile = *cavern.require(entrance)?.tile();

        {
            let mut watcher = observer::lock(&observer);
            watcher.on_position(Phase::Find, entrance, &entrance_tile);
            watcher.on_bonus(bonus_factor(&scoring, 0, optimal));
        }

        Ok(Self {
            cavern,
            target_tile,
            state: Arc::new(Mutex::new(FindState {
                position: entrance,
                steps: 0,
                latches: Latches::default(),
            })),
            observer,
            scoring,
            optimal,
        })
    }

    pub(crate) fn state(&self) -> Arc<Mutex<FindState>> {
        Arc::clone(&self.state)
    }

    /// The node the agent stands on.
    pub fn current(&self) -> Result<NodeId, ActionError> {
        let state = lock(&self.state);
        state.latches.check()?;
        Ok(state.position)
    }

    /// Moves accepted so far.
    pub fn steps_taken(&self) -> Result<u32, ActionError> {
        let state = lock(&self.state);
        state.latches.check()?;
        Ok(state.steps)
    }

    /// Neighbours of the current node, ascending by id, each with its grid
    /// distance to the target.
    pub fn neighbors(&self) -> Result<Vec<NodeStatus>, ActionError> {
        let state = lock(&self.state);
        state.latches.check()?;
        let Some(node) = self.cavern.node(state.position) else {
            return Ok(Vec::new());
        };
        Ok(node
            .neighbors()
            .filter_map(|id| self.cavern.node(id))
            .map(|neighbor| NodeStatus {
                id: neighbor.id(),
                distance_to_target: neighbor.tile().grid_distance(&self.target_tile),
            })
            .collect())
    }

    /// Grid distance from the current node to the target; 0 means the agent
    /// is standing on it.
    pub fn distance_to_target(&self) -> Result<u32, ActionError> {
        let state = lock(&self.state);
        state.latches.check()?;
        Ok(self
            .cavern
            .node(state.position)
            .map_or(0, |node| node.tile().grid_distance(&self.target_tile)))
    }

    /// Step to an adjacent node.
    ///
    /// # Errors
    ///
    /// [`ActionError::InvalidMove`] if `to` is not a neighbour of the current
    /// node; [`ActionError::Cancelled`] after the deadline.
    pub fn move_to(&mut self, to: NodeId) -> Result<(), ActionError> {
        let mut state = lock(&self.state);
        state.latches.check()?;
        let from = state.position;

        let adjacent = self
            .cavern
            .node(from)
            .is_some_and(|node| node.is_adjacent(to));
        let Some(tile) = self.cavern.node(to).map(|node| *node.tile()) else {
            return Err(ActionError::InvalidMove { from, to });
        };
        if !adjacent {
            return Err(ActionError::InvalidMove { from, to });
        }

        state.position = to;
        state.steps = state.steps.saturating_add(1);
        debug!(%from, %to, steps = state.steps, "Locate move");

        let mut watcher = observer::lock(&self.observer);
        watcher.on_position(Phase::Find, to, &tile);
        watcher.on_bonus(bonus_factor(&self.scoring, state.steps, self.optimal));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Escape phase
// ---------------------------------------------------------------------------

/// Mutable escape-phase state.
#[derive(Debug, Clone)]
pub(crate) struct FleeState {
    pub(crate) position: NodeId,
    pub(crate) steps_left: u32,
    pub(crate) collected: BTreeSet<NodeId>,
    pub(crate) reward: u64,
    pub(crate) exhausted: bool,
    pub(crate) latches: Latches,
}

impl FleeState {
    fn available(&self, cavern: &Cavern, id: NodeId) -> u32 {
        if self.collected.contains(&id) {
            return 0;
        }
        cavern.node(id).map_or(0, |node| node.tile().reward)
    }

    /// Pick up whatever lies on the current node; returns the amount.
    fn collect_here(&mut self, cavern: &Cavern, observer: &SharedObserver) -> u32 {
        let here = self.position;
        let amount = self.available(cavern, here);
        if amount > 0 {
            self.collected.insert(here);
            self.reward = self.reward.saturating_add(u64::from(amount));
            observer::lock(observer).on_reward(amount, self.reward);
        }
        amount
    }
}

/// Full-visibility view handed to [`AgentPolicy::escape`].
///
/// [`AgentPolicy::escape`]: crate::policy::AgentPolicy::escape
pub struct FleeView {
    cavern: Arc<Cavern>,
    budget: u32,
    state: Arc<Mutex<FleeState>>,
    observer: SharedObserver,
}

impl FleeView {
    /// Open an escape view on `start` with `budget` steps, collecting any
    /// reward lying there.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::NodeNotFound`] if `start` is not in the cavern.
    pub fn new(
        cavern: Arc<Cavern>,
        start: NodeId,
        budget: u32,
        observer: SharedObserver,
    ) -> Result<Self, WorldError> {
        let start_tile = *cavern.require(start)?.tile();
        let mut state = FleeState {
            position: start,
            steps_left: budget,
            collected: BTreeSet::new(),
            reward: 0,
            exhausted: false,
            latches: Latches::default(),
        };

        {
            let mut watcher = observer::lock(&observer);
            watcher.on_position(Phase::Flee, start, &start_tile);
            watcher.on_steps_left(budget);
        }
        state.collect_here(&cavern, &observer);

        Ok(Self {
            cavern,
            budget,
            state: Arc::new(Mutex::new(state)),
            observer,
        })
    }

    pub(crate) fn state(&self) -> Arc<Mutex<FleeState>> {
        Arc::clone(&self.state)
    }

    /// The whole escape cavern.
    pub fn cavern(&self) -> Result<&Cavern, ActionError> {
        lock(&self.state).latches.check()?;
        Ok(&self.cavern)
    }

    /// The node the agent stands on.
    pub fn current(&self) -> Result<NodeId, ActionError> {
        let state = lock(&self.state);
        state.latches.check()?;
        Ok(state.position)
    }

    /// The exit the agent must end on.
    pub fn exit(&self) -> Result<NodeId, ActionError> {
        lock(&self.state).latches.check()?;
        Ok(self.cavern.target())
    }

    /// Steps granted when the phase began.
    pub fn budget(&self) -> Result<u32, ActionError> {
        lock(&self.state).latches.check()?;
        Ok(self.budget)
    }

    /// Steps still available.
    pub fn steps_left(&self) -> Result<u32, ActionError> {
        let state = lock(&self.state);
        state.latches.check()?;
        Ok(state.steps_left)
    }

    /// Reward still lying on `id`; 0 once collected or for unknown nodes.
    pub fn reward_at(&self, id: NodeId) -> Result<u32, ActionError> {
        let state = lock(&self.state);
        state.latches.check()?;
        Ok(state.available(&self.cavern, id))
    }

    /// Total reward collected so far.
    pub fn reward_collected(&self) -> Result<u64, ActionError> {
        let state = lock(&self.state);
        state.latches.check()?;
        Ok(state.reward)
    }

    /// Walk the passage to an adjacent node, spending its length in steps and
    /// collecting the reward lying there.
    ///
    /// # Errors
    ///
    /// [`ActionError::InvalidMove`] if `to` is not adjacent.
    /// [`ActionError::BudgetExhausted`] if the passage is longer than the
    /// steps left; this ends the phase and the agent stays where it is.
    pub fn move_to(&mut self, to: NodeId) -> Result<(), ActionError> {
        let mut state = lock(&self.state);
        state.latches.check()?;
        let from = state.position;

        let edge = self
            .cavern
            .edge(from, to)
            .ok_or(ActionError::InvalidMove { from, to })?;

        if edge.length > state.steps_left {
            let remaining = state.steps_left;
            state.exhausted = true;
            state.latches.halted = true;
            warn!(%from, %to, needed = edge.length, remaining, "Escape budget exhausted");
            return Err(ActionError::BudgetExhausted {
                needed: edge.length,
                remaining,
            });
        }

        state.steps_left = state.steps_left.saturating_sub(edge.length);
        state.position = to;
        debug!(%from, %to, steps_left = state.steps_left, "Escape move");

        if let Some(node) = self.cavern.node(to) {
            let mut watcher = observer::lock(&self.observer);
            watcher.on_position(Phase::Flee, to, node.tile());
            watcher.on_steps_left(state.steps_left);
        }
        state.collect_here(&self.cavern, &self.observer);
        Ok(())
    }

    /// Collect the reward on the current node.
    ///
    /// # Errors
    ///
    /// [`ActionError::NothingToCollect`] if nothing is left here.
    pub fn grab_reward(&mut self) -> Result<u32, ActionError> {
        let mut state = lock(&self.state);
        state.latches.check()?;
        match state.collect_here(&self.cavern, &self.observer) {
            0 => Err(ActionError::NothingToCollect(state.position)),
            amount => Ok(amount),
        }
    }
}
