//! The prospector played against freshly dug caverns.

#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects, missing_docs)]

use delve_agents::Prospector;
use delve_core::observer::{NoOpObserver, shared};
use delve_core::runner::{next_seed, play_seed};
use delve_core::{AgentPolicy, GameConfig, SharedObserver, run_session};
use delve_types::PhaseOutcome;

fn prospector() -> Box<dyn AgentPolicy> {
    Box::new(Prospector::new())
}

fn direct() -> Box<dyn AgentPolicy> {
    Box::new(Prospector::direct())
}

fn silent() -> SharedObserver {
    shared(NoOpObserver)
}

#[tokio::test]
async fn prospector_escapes_every_dug_cavern() {
    let config = GameConfig::default();
    let mut seed = 2_024_u64;
    for _ in 0..6 {
        let report = play_seed(&config, seed, &prospector, silent()).await.unwrap();

        assert_eq!(report.find.outcome, PhaseOutcome::Succeeded, "seed {seed}");
        assert!(report.find.steps >= report.find.optimal_distance);
        let flee = report.flee.as_ref().unwrap();
        assert_eq!(flee.outcome, PhaseOutcome::Succeeded, "seed {seed}");
        assert!(flee.steps <= flee.step_budget.unwrap());
        assert!(report.bonus_factor >= 1.0);

        seed = next_seed(seed);
    }
}

#[tokio::test]
async fn wasted_locate_moves_cost_bonus() {
    let config = GameConfig::default();
    let max_bonus = config.scoring.max_bonus;
    let mut wasteful = 0_u32;
    for seed in 1_u64..=20 {
        let report = play_seed(&config, seed, &direct, silent()).await.unwrap();
        let find = &report.find;

        assert!(find.steps >= find.optimal_distance, "seed {seed}");
        if find.steps > find.optimal_distance {
            wasteful += 1;
            assert!(report.bonus_factor < max_bonus, "seed {seed}");
        } else {
            assert!((report.bonus_factor - max_bonus).abs() < 1e-9, "seed {seed}");
        }
    }
    assert!(wasteful > 0);
}

#[tokio::test]
async fn detours_never_earn_less_than_the_direct_route() {
    let config = GameConfig::default();
    let (mut greedy_total, mut straight_total) = (0_u64, 0_u64);
    for seed in [5_u64, 17, 301] {
        let greedy = play_seed(&config, seed, &prospector, silent()).await.unwrap();
        let straight = play_seed(&config, seed, &direct, silent()).await.unwrap();

        assert!(straight.escaped());
        assert!(greedy.escaped());
        assert_eq!(greedy.find.steps, straight.find.steps);
        greedy_total += greedy.reward_collected;
        straight_total += straight.reward_collected;
    }
    assert!(greedy_total >= straight_total);
}

#[tokio::test]
async fn seeded_sessions_replay_identically() {
    let config = GameConfig::default();
    let first = run_session(&config, 99, 3, &prospector, &silent).await.unwrap();
    let second = run_session(&config, 99, 3, &prospector, &silent).await.unwrap();

    assert_eq!(first.runs.len(), 3);
    let scores = |summary: &delve_core::SessionSummary| {
        summary
            .runs
            .iter()
            .map(|run| (run.seed, run.report.score))
            .collect::<Vec<_>>()
    };
    assert_eq!(scores(&first), scores(&second));
    assert_eq!(first.runs.first().unwrap().seed, 99);
    assert!(first.total_score > 0);
}
