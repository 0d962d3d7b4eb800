//! Multi-game session runner.
//!
//! [`run_session`] plays `repeat` games back to back. Each game digs its two
//! caverns from a seed: with a starting seed of 0 every game draws a fresh
//! random seed; otherwise the first game uses the given seed and every
//! following seed is derived from the previous one, so a whole session is
//! reproducible from its first seed.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::info;

use delve_types::GameReport;
use delve_world::{Cavern, CavernConfig, WorldError, dig_find_cavern, dig_flee_cavern, pick_dimensions};

use crate::config::GameConfig;
use crate::error::GameError;
use crate::game::Game;
use crate::observer::SharedObserver;
use crate::policy::PolicyFactory;

/// Errors that can occur during a session.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A game could not be set up or played.
    #[error("game error: {source}")]
    Game {
        /// The underlying game error.
        #[from]
        source: GameError,
    },

    /// Cavern generation failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },
}

/// Builds the observer for every game of a session.
pub type ObserverFactory = dyn Fn() -> SharedObserver + Send + Sync;

/// One played game and the seed it was dug from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunRecord {
    /// Seed both caverns were dug from.
    pub seed: u64,
    /// How the game went.
    pub report: GameReport,
}

/// Result of a whole session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    /// Every game, in the order played.
    pub runs: Vec<RunRecord>,
    /// Sum of all scores.
    pub total_score: u64,
    /// Mean score per game (0 for an empty session).
    pub average_score: f64,
}

impl SessionSummary {
    fn from_runs(runs: Vec<RunRecord>) -> Self {
        let total_score = runs
            .iter()
            .map(|run| run.report.score)
            .fold(0_u64, u64::saturating_add);
        #[allow(clippy::cast_precision_loss)]
        let average_score = if runs.is_empty() {
            0.0
        } else {
            total_score as f64 / runs.len() as f64
        };
        Self {
            runs,
            total_score,
            average_score,
        }
    }

    /// Pretty-printed JSON rendering.
    ///
    /// # Errors
    ///
    /// Returns the serializer error if the summary cannot be encoded.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// A fresh, non-zero seed from the thread-local generator.
pub fn fresh_seed() -> u64 {
    let mut rng = rand::rng();
    loop {
        let seed: u64 = rng.random();
        if seed != 0 {
            return seed;
        }
    }
}

/// The seed that follows `seed` in a reproducible session.
pub fn next_seed(seed: u64) -> u64 {
    StdRng::seed_from_u64(seed).random()
}

/// Dig the locate and escape caverns for `seed`.
///
/// # Errors
///
/// Returns [`WorldError`] if the configured dimensions are unusable.
pub fn dig_caverns(config: &CavernConfig, seed: u64) -> Result<(Cavern, Cavern), WorldError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let (rows, cols) = pick_dimensions(config, &mut rng);
    let find = dig_find_cavern(config, rows, cols, &mut rng)?;
    let tile = *find.require(find.target())?.tile();
    let flee = dig_flee_cavern(config, rows, cols, (tile.row, tile.col), &mut rng)?;
    Ok((find, flee))
}

/// Dig both caverns for `seed` and play one game on them.
///
/// # Errors
///
/// Returns [`RunnerError`] if generation or the engine fails.
pub async fn play_seed(
    config: &GameConfig,
    seed: u64,
    policies: &PolicyFactory,
    observer: SharedObserver,
) -> Result<GameReport, RunnerError> {
    let (find, flee) = dig_caverns(&config.cavern, seed)?;
    let game = Game::new(config.clone(), find, flee)?.with_observer(observer);
    Ok(game.play(policies()).await?)
}

/// Play `repeat` games starting from `seed` (0 = a fresh seed per game).
///
/// # Errors
///
/// Returns [`RunnerError`] on the first game that cannot be played.
pub async fn run_session(
    config: &GameConfig,
    seed: u64,
    repeat: u32,
    policies: &PolicyFactory,
    observers: &ObserverFactory,
) -> Result<SessionSummary, RunnerError> {
    let mut runs = Vec::new();
    let mut next = seed;

    info!(seed, repeat, "Session starting");

    for run in 1..=repeat {
        let game_seed = if seed == 0 { fresh_seed() } else { next };
        let report = play_seed(config, game_seed, policies, observers()).await?;
        info!(
            run,
            seed = game_seed,
            escaped = report.escaped(),
            score = report.score,
            "Run complete"
        );
        runs.push(RunRecord {
            seed: game_seed,
            report,
        });
        if seed != 0 {
            next = next_seed(next);
        }
    }

    let summary = SessionSummary::from_runs(runs);
    info!(
        games = summary.runs.len(),
        total_score = summary.total_score,
        average_score = summary.average_score,
        "Session finished"
    );
    Ok(summary)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use delve_world::distance;

    #[test]
    fn seed_sequence_is_deterministic() {
        assert_eq!(next_seed(42), next_seed(42));
        assert_ne!(next_seed(42), next_seed(43));
        assert_ne!(fresh_seed(), 0);
    }

    #[test]
    fn dug_caverns_form_a_playable_pair() {
        let config = CavernConfig::default();
        for seed in [1_u64, 2, 3, 99, 12_345] {
            let (find, flee) = dig_caverns(&config, seed).unwrap();
            let target = find.node(find.target()).unwrap().tile();
            let start = flee.node_at(target.row, target.col).unwrap();
            assert_eq!(start.id(), flee.entrance());
            assert!(distance(&flee, start.id(), flee.target()).unwrap().is_some());
            assert_eq!((find.rows(), find.cols()), (flee.rows(), flee.cols()));
        }
    }

    #[test]
    fn same_seed_digs_same_pair() {
        let config = CavernConfig::default();
        assert_eq!(
            dig_caverns(&config, 77).unwrap(),
            dig_caverns(&config, 77).unwrap()
        );
    }

    #[test]
    fn empty_session_averages_to_zero() {
        let summary = SessionSummary::from_runs(Vec::new());
        assert_eq!(summary.total_score, 0);
        assert!(summary.average_score.abs() < f64::EPSILON);
    }
}
