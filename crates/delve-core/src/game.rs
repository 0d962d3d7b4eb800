//! The two-phase game engine.
//!
//! A [`Game`] owns the locate and escape caverns of one game together with
//! the configuration it is played under. [`Game::play`] drives the phase
//! state machine:
//!
//! 1. **Locate** -- open a [`FindView`] on the locate entrance and run
//!    [`AgentPolicy::locate`] under the locate deadline. Ending on the target
//!    succeeds; anything else fails and the game ends there.
//! 2. **Escape** -- open a [`FleeView`] on the escape node lying on the
//!    target's tile with a step budget, and run [`AgentPolicy::escape`]
//!    under the escape deadline. Ending on the exit succeeds.
//! 3. **Score** -- the locate bonus times the reward credited in the escape
//!    phase, floored.
//!
//! Every phase ends with exactly one [`PhaseOutcome`]; nothing is retried.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use delve_types::{GameReport, NodeId, Phase, PhaseOutcome, PhaseReport};
use delve_world::{Cavern, distance};

use crate::config::GameConfig;
use crate::error::GameError;
use crate::observer::{self, NoOpObserver, SharedObserver, shared};
use crate::policy::AgentPolicy;
use crate::score::{bonus_factor, escape_budget, score};
use crate::supervisor::{Supervised, supervise};
use crate::view::{FindView, FleeView, Latches, lock};

/// What a phase worker hands back: the policy, for the next phase, and the
/// policy's own verdict.
type PhaseReturn = (Box<dyn AgentPolicy>, anyhow::Result<()>);

/// One game: a validated pair of caverns and the rules to play them by.
pub struct Game {
    config: GameConfig,
    find: Arc<Cavern>,
    flee: Arc<Cavern>,
    observer: SharedObserver,
    find_optimal: u32,
    flee_start: NodeId,
    flee_optimal: u32,
}

impl Game {
    /// Validate a cavern pair and prepare a game on it.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnreachableTarget`] if the locate target cannot be
    /// reached, [`GameError::MissingEscapeStart`] if the escape cavern has no
    /// node on the target's tile, or [`GameError::UnreachableExit`] if the exit
    /// cannot be reached from there.
    pub fn new(config: GameConfig, find: Cavern, flee: Cavern) -> Result<Self, GameError> {
        let entrance = find.entrance();
        let target = find.target();
        let find_optimal = distance(&find, entrance, target)?
            .ok_or(GameError::UnreachableTarget { entrance, target })?;

        let tile = *find.require(target)?.tile();
        let flee_start = flee
            .node_at(tile.row, tile.col)
            .map(delve_world::CavernNode::id)
            .ok_or(GameError::MissingEscapeStart {
                row: tile.row,
                col: tile.col,
            })?;
        let exit = flee.target();
        let flee_optimal = distance(&flee, flee_start, exit)?.ok_or(
            GameError::UnreachableExit {
                start: flee_start,
                exit,
            },
        )?;

        Ok(Self {
            config,
            find: Arc::new(find),
            flee: Arc::new(flee),
            observer: shared(NoOpObserver),
            find_optimal,
            flee_start,
            flee_optimal,
        })
    }

    /// Report progress to `observer` instead of discarding it.
    #[must_use]
    pub fn with_observer(mut self, observer: SharedObserver) -> Self {
        self.observer = observer;
        self
    }

    /// The locate cavern.
    pub fn find_cavern(&self) -> &Cavern {
        &self.find
    }

    /// The escape cavern.
    pub fn flee_cavern(&self) -> &Cavern {
        &self.flee
    }

    /// Shortest locate distance, entrance to target.
    pub const fn find_optimal(&self) -> u32 {
        self.find_optimal
    }

    /// Shortest escape distance, start to exit.
    pub const fn flee_optimal(&self) -> u32 {
        self.flee_optimal
    }

    /// Play both phases with `policy` and score the result.
    ///
    /// # Errors
    ///
    /// Returns [`GameError`] only when the engine itself fails (a worker
    /// cannot be spawned or a cavern query breaks). Policy misbehaviour is
    /// never an error; it is recorded as the phase outcome.
    pub async fn play(self, policy: Box<dyn AgentPolicy>) -> Result<GameReport, GameError> {
        let started_at = Utc::now();

        let (find_report, policy) = self.play_find(policy).await?;
        let bonus = bonus_factor(
            &self.config.scoring,
            find_report.steps,
            find_report.optimal_distance,
        );

        let (flee, reward) = match policy {
            Some(policy) if find_report.outcome.is_success() => {
                let (report, reward) = self.play_flee(policy).await?;
                (Some(report), reward)
            }
            _ => (None, 0),
        };

        let report = GameReport {
            find: find_report,
            flee,
            reward_collected: reward,
            bonus_factor: bonus,
            score: score(bonus, reward),
            started_at,
            finished_at: Utc::now(),
        };

        info!(
            escaped = report.escaped(),
            reward = report.reward_collected,
            bonus = report.bonus_factor,
            score = report.score,
            "Game finished"
        );
        Ok(report)
    }

    async fn play_find(
        &self,
        policy: Box<dyn AgentPolicy>,
    ) -> Result<(PhaseReport, Option<Box<dyn AgentPolicy>>), GameError> {
        let target = self.find.target();
        observer::lock(&self.observer).on_phase(Phase::Find);
        info!(
            entrance = %self.find.entrance(),
            %target,
            optimal = self.find_optimal,
            "Locate phase started"
        );

        let view = FindView::new(
            Arc::clone(&self.find),
            self.config.scoring.clone(),
            Arc::clone(&self.observer),
        )?;
        let handle = view.state();

        let supervised = supervise(
            "locate",
            self.config.deadlines.locate_timeout(),
            move || -> PhaseReturn {
                let mut view = view;
                let mut policy = policy;
                let verdict = policy.locate(&mut view);
                (policy, verdict)
            },
        )
        .await?;

        let (outcome, policy, position, steps) = {
            let mut state = lock(&handle);
            let at_target = state.position == target;
            let (outcome, policy) = settle(supervised, &mut state.latches, at_target);
            (outcome, policy, state.position, state.steps)
        };

        let report = PhaseReport {
            phase: Phase::Find,
            outcome,
            optimal_distance: self.find_optimal,
            steps,
            step_budget: None,
            remaining_distance: distance(&self.find, position, target)?,
        };
        self.finish_phase(&report);
        Ok((report, policy))
    }

    async fn play_flee(&self, policy: Box<dyn AgentPolicy>) -> Result<(PhaseReport, u64), GameError> {
        let exit = self.flee.target();
        let budget = escape_budget(
            &self.config.escape,
            self.config.cavern.max_edge_weight,
            self.flee_optimal,
            self.flee.node_count(),
        );
        observer::lock(&self.observer).on_phase(Phase::Flee);
        info!(
            start = %self.flee_start,
            %exit,
            optimal = self.flee_optimal,
            budget,
            "Escape phase started"
        );

        let view = FleeView::new(
            Arc::clone(&self.flee),
            self.flee_start,
            budget,
            Arc::clone(&self.observer),
        )?;
        let handle = view.state();

        let supervised = supervise(
            "escape",
            self.config.deadlines.escape_timeout(),
            move || -> PhaseReturn {
                let mut view = view;
                let mut policy = policy;
                let verdict = policy.escape(&mut view);
                (policy, verdict)
            },
        )
        .await?;

        let (outcome, position, steps_left, collected) = {
            let mut state = lock(&handle);
            let at_exit = state.position == exit;
            let (mut outcome, _policy) = settle(supervised, &mut state.latches, at_exit);
            if state.exhausted {
                outcome = PhaseOutcome::BudgetExhausted;
            }
            (outcome, state.position, state.steps_left, state.reward)
        };

        let reward = if outcome == PhaseOutcome::TimedOut {
            0
        } else {
            collected
        };

        let report = PhaseReport {
            phase: Phase::Flee,
            outcome,
            optimal_distance: self.flee_optimal,
            steps: budget.saturating_sub(steps_left),
            step_budget: Some(budget),
            remaining_distance: distance(&self.flee, position, exit)?,
        };
        self.finish_phase(&report);
        Ok((report, reward))
    }

    /// Log the end of a phase and tell the observer how it went.
    fn finish_phase(&self, report: &PhaseReport) {
        log_phase_end(report);
        observer::lock(&self.observer).on_phase_end(report.phase, &report.outcome);
    }
}

/// Turn a supervised result into the phase outcome and latch the phase
/// state so that nothing can change it any more.
fn settle(
    supervised: Supervised<PhaseReturn>,
    latches: &mut Latches,
    at_goal: bool,
) -> (PhaseOutcome, Option<Box<dyn AgentPolicy>>) {
    match supervised {
        Supervised::TimedOut => {
            latches.cancelled = true;
            (PhaseOutcome::TimedOut, None)
        }
        Supervised::Panicked(message) => {
            latches.halted = true;
            (PhaseOutcome::RuntimeFault { message }, None)
        }
        Supervised::Finished((policy, Err(error))) => {
            latches.halted = true;
            (
                PhaseOutcome::RuntimeFault {
                    message: format!("{error:#}"),
                },
                Some(policy),
            )
        }
        Supervised::Finished((policy, Ok(()))) => {
            latches.halted = true;
            let outcome = if at_goal {
                PhaseOutcome::Succeeded
            } else {
                PhaseOutcome::WrongEndLocation
            };
            (outcome, Some(policy))
        }
    }
}

fn log_phase_end(report: &PhaseReport) {
    match &report.outcome {
        PhaseOutcome::Succeeded | PhaseOutcome::WrongEndLocation => info!(
            phase = %report.phase,
            outcome = %report.outcome,
            steps = report.steps,
            optimal = report.optimal_distance,
            remaining = report.remaining_distance,
            "Phase ended"
        ),
        PhaseOutcome::RuntimeFault { .. } | PhaseOutcome::TimedOut | PhaseOutcome::BudgetExhausted => {
            warn!(
                phase = %report.phase,
                outcome = %report.outcome,
                steps = report.steps,
                optimal = report.optimal_distance,
                remaining = report.remaining_distance,
                "Phase failed"
            );
        }
    }
}
