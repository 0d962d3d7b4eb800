//! Bonus, score, and escape-budget arithmetic.

use crate::config::{EscapeConfig, ScoringConfig};

/// The bonus multiplier earned by a locate walk of `steps` moves when the
/// shortest route was `optimal` long.
///
/// Equals `max_bonus` when `optimal` is 0 or the walk was no longer than
/// optimal, falls linearly with the overshoot, and bottoms out at
/// `min_bonus` once `steps` reaches `no_bonus_multiple * optimal`.
pub fn bonus_factor(scoring: &ScoringConfig, steps: u32, optimal: u32) -> f64 {
    if optimal == 0 || steps <= optimal {
        return scoring.max_bonus;
    }
    let overshoot = f64::from(steps.saturating_sub(optimal)) / f64::from(optimal);
    let span = scoring.no_bonus_multiple - 1.0;
    let drop = overshoot / span * (scoring.max_bonus - scoring.min_bonus);
    (scoring.max_bonus - drop).max(scoring.min_bonus)
}

/// Final score: `floor(bonus * reward)`.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn score(bonus: f64, reward: u64) -> u64 {
    let scaled = (bonus * reward as f64).floor();
    if scaled.is_nan() || scaled <= 0.0 {
        return 0;
    }
    scaled as u64
}

/// Steps granted for the escape phase.
///
/// `optimal + floor(extra_steps_factor * (max_edge_weight + 1) * open_tiles / 2)`,
/// saturating at `u32::MAX`. Never below `optimal`.
pub fn escape_budget(
    escape: &EscapeConfig,
    max_edge_weight: u32,
    optimal: u32,
    open_tiles: usize,
) -> u32 {
    let tiles = u32::try_from(open_tiles).map_or(f64::from(u32::MAX), f64::from);
    let weight = f64::from(max_edge_weight) + 1.0;
    let extra = (escape.extra_steps_factor * weight * tiles / 2.0).floor();
    if extra.is_nan() || extra <= 0.0 {
        return optimal;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let extra = extra as u32;
    optimal.saturating_add(extra)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn bonus_endpoints() {
        let scoring = ScoringConfig::default();
        assert!(close(bonus_factor(&scoring, 10, 10), 1.3));
        assert!(close(bonus_factor(&scoring, 7, 10), 1.3));
        assert!(close(bonus_factor(&scoring, 40, 10), 1.0));
        assert!(close(bonus_factor(&scoring, 400, 10), 1.0));
        assert!(close(bonus_factor(&scoring, 25, 10), 1.15));
    }

    #[test]
    fn zero_optimal_earns_full_bonus() {
        let scoring = ScoringConfig::default();
        assert!(close(bonus_factor(&scoring, 0, 0), 1.3));
        assert!(close(bonus_factor(&scoring, 12, 0), 1.3));
    }

    #[test]
    fn score_floors_the_product() {
        assert_eq!(score(1.3, 999), 1298);
        assert_eq!(score(1.0, 0), 0);
        assert_eq!(score(1.25, 100), 125);
    }

    #[test]
    fn escape_budget_adds_configured_slack() {
        let escape = EscapeConfig::default();
        // 0.3 * 16 * 100 / 2 = 240
        assert_eq!(escape_budget(&escape, 15, 37, 100), 277);

        let none = EscapeConfig {
            extra_steps_factor: 0.0,
        };
        assert_eq!(escape_budget(&none, 15, 37, 100), 37);
    }

    proptest! {
        #[test]
        fn bonus_is_monotonically_non_increasing(
            optimal in 1_u32..500,
            steps in 0_u32..5_000,
            extra in 1_u32..100,
        ) {
            let scoring = ScoringConfig::default();
            let shorter = bonus_factor(&scoring, steps, optimal);
            let longer = bonus_factor(&scoring, steps.saturating_add(extra), optimal);
            prop_assert!(longer <= shorter);
            prop_assert!(longer >= scoring.min_bonus);
            prop_assert!(shorter <= scoring.max_bonus);
        }

        #[test]
        fn budget_never_below_optimal(
            optimal in 0_u32..10_000,
            tiles in 0_usize..2_000,
            weight in 1_u32..50,
        ) {
            let budget = escape_budget(&EscapeConfig::default(), weight, optimal, tiles);
            prop_assert!(budget >= optimal);
        }
    }
}
