//! The reference policy.
//!
//! Locate walks depth first, trying the unvisited neighbour closest to the
//! target on the grid first and backtracking along its own trail when a
//! branch dead-ends. Escape keeps detouring to the uncollected reward with
//! the best reward per step, as long as the detour still leaves enough steps
//! to reach the exit, then takes the shortest path out.

use std::collections::{HashMap, HashSet};

use anyhow::bail;
use tracing::debug;

use delve_core::{AgentPolicy, FindView, FleeView};
use delve_types::NodeId;
use delve_world::{Cavern, distances_from, shortest_path};

/// Depth-first locator and greedy reward collector.
#[derive(Debug, Clone, Copy)]
pub struct Prospector {
    collect_rewards: bool,
}

impl Prospector {
    /// A prospector that detours for every reward it can afford.
    pub const fn new() -> Self {
        Self {
            collect_rewards: true,
        }
    }

    /// A prospector that heads straight for the exit, picking up only what
    /// lies on the way.
    pub const fn direct() -> Self {
        Self {
            collect_rewards: false,
        }
    }
}

impl Default for Prospector {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentPolicy for Prospector {
    fn locate(&mut self, view: &mut FindView) -> anyhow::Result<()> {
        let mut visited: HashSet<NodeId> = HashSet::new();
        let mut trail: Vec<NodeId> = Vec::new();

        loop {
            if view.distance_to_target()? == 0 {
                return Ok(());
            }
            let here = view.current()?;
            visited.insert(here);

            let next = view
                .neighbors()?
                .into_iter()
                .filter(|status| !visited.contains(&status.id))
                .min_by_key(|status| (status.distance_to_target, status.id));

            if let Some(status) = next {
                trail.push(here);
                view.move_to(status.id)?;
            } else if let Some(back) = trail.pop() {
                view.move_to(back)?;
            } else {
                bail!("explored every reachable node without finding the target");
            }
        }
    }

    fn escape(&mut self, view: &mut FleeView) -> anyhow::Result<()> {
        let exit = view.exit()?;
        let to_exit = distances_from(view.cavern()?, exit)?;

        if self.collect_rewards {
            loop {
                let here = view.current()?;
                let steps_left = view.steps_left()?;
                let Some(detour) = best_detour(view, here, &to_exit, steps_left)? else {
                    break;
                };
                debug!(
                    %here,
                    stop = %detour.node,
                    reward = detour.reward,
                    cost = detour.cost,
                    steps_left,
                    "Detouring for reward"
                );
                let route = shortest_path(view.cavern()?, here, detour.node)?;
                walk(view, &route)?;
            }
        }

        let route = shortest_path(view.cavern()?, view.current()?, exit)?;
        if route.is_empty() {
            bail!("no passage leads to the exit");
        }
        walk(view, &route)
    }
}

/// A reward worth walking to.
#[derive(Debug, Clone, Copy)]
struct Detour {
    node: NodeId,
    reward: u32,
    cost: u32,
}

impl Detour {
    /// Higher reward per step wins; equal ratios go to the smaller id.
    fn beats(&self, other: &Self) -> bool {
        let mine = u64::from(self.reward).saturating_mul(u64::from(other.cost.max(1)));
        let theirs = u64::from(other.reward).saturating_mul(u64::from(self.cost.max(1)));
        mine > theirs || (mine == theirs && self.node < other.node)
    }
}

/// The best affordable detour from `here`, if any.
///
/// A detour is affordable when walking to the reward and from there to the
/// exit fits in `steps_left`.
fn best_detour(
    view: &FleeView,
    here: NodeId,
    to_exit: &HashMap<NodeId, u32>,
    steps_left: u32,
) -> anyhow::Result<Option<Detour>> {
    let cavern: &Cavern = view.cavern()?;
    let from_here = distances_from(cavern, here)?;
    let mut best: Option<Detour> = None;

    for node in cavern.nodes() {
        let id = node.id();
        if id == here {
            continue;
        }
        let reward = view.reward_at(id)?;
        if reward == 0 {
            continue;
        }
        let (Some(&cost), Some(&back)) = (from_here.get(&id), to_exit.get(&id)) else {
            continue;
        };
        if cost.checked_add(back).is_none_or(|total| total > steps_left) {
            continue;
        }

        let candidate = Detour {
            node: id,
            reward,
            cost,
        };
        match &best {
            Some(current) if !candidate.beats(current) => {}
            _ => best = Some(candidate),
        }
    }

    Ok(best)
}

/// Follow `route`, whose first node is the current position.
fn walk(view: &mut FleeView, route: &[NodeId]) -> anyhow::Result<()> {
    for &next in route.iter().skip(1) {
        view.move_to(next)?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use delve_core::config::ScoringConfig;
    use delve_core::observer::{NoOpObserver, shared};
    use delve_types::Tile;
    use delve_world::CavernBuilder;

    use super::*;

    /// a(0,0) -1- b(0,1) dead end; a -1- c(1,0) -1- d(1,1) -1- e(1,2) -1- t(0,2).
    fn dead_end_cavern() -> (Arc<Cavern>, NodeId) {
        let mut builder = CavernBuilder::new(2, 3).unwrap();
        let a = builder.add_node(Tile::bare(0, 0)).unwrap();
        let b = builder.add_node(Tile::bare(0, 1)).unwrap();
        let c = builder.add_node(Tile::bare(1, 0)).unwrap();
        let d = builder.add_node(Tile::bare(1, 1)).unwrap();
        let e = builder.add_node(Tile::bare(1, 2)).unwrap();
        let t = builder.add_node(Tile::bare(0, 2)).unwrap();
        builder.connect(a, b, 1).unwrap();
        builder.connect(a, c, 1).unwrap();
        builder.connect(c, d, 1).unwrap();
        builder.connect(d, e, 1).unwrap();
        builder.connect(e, t, 1).unwrap();
        (Arc::new(builder.build(a, t).unwrap()), t)
    }

    /// s(0,0) -1- m(0,1) -1- x(0,2) exit; m -1- r(1,1) holding 50.
    fn side_pocket() -> (Arc<Cavern>, NodeId, NodeId) {
        let mut builder = CavernBuilder::new(2, 3).unwrap();
        let s = builder.add_node(Tile::bare(0, 0)).unwrap();
        let m = builder.add_node(Tile::bare(0, 1)).unwrap();
        let x = builder.add_node(Tile::bare(0, 2)).unwrap();
        let r = builder
            .add_node(Tile {
                row: 1,
                col: 1,
                reward: 50,
            })
            .unwrap();
        builder.connect(s, m, 1).unwrap();
        builder.connect(m, x, 1).unwrap();
        builder.connect(m, r, 1).unwrap();
        (Arc::new(builder.build(s, x).unwrap()), s, x)
    }

    fn escape_with(mut policy: Prospector, budget: u32) -> (FleeView, NodeId) {
        let (cavern, start, exit) = side_pocket();
        let mut view = FleeView::new(cavern, start, budget, shared(NoOpObserver)).unwrap();
        policy.escape(&mut view).unwrap();
        (view, exit)
    }

    #[test]
    fn locate_backtracks_out_of_a_dead_end() {
        let (cavern, target) = dead_end_cavern();
        let mut view =
            FindView::new(cavern, ScoringConfig::default(), shared(NoOpObserver)).unwrap();

        Prospector::new().locate(&mut view).unwrap();

        assert_eq!(view.current().unwrap(), target);
        // Into the dead end and back, then the four-step corridor.
        assert_eq!(view.steps_taken().unwrap(), 6);
    }

    #[test]
    fn locate_gives_up_when_the_target_is_cut_off() {
        let mut builder = CavernBuilder::new(1, 3).unwrap();
        let a = builder.add_node(Tile::bare(0, 0)).unwrap();
        let b = builder.add_node(Tile::bare(0, 1)).unwrap();
        let island = builder.add_node(Tile::bare(0, 2)).unwrap();
        builder.connect(a, b, 1).unwrap();
        let cavern = Arc::new(builder.build(a, island).unwrap());
        let mut view =
            FindView::new(cavern, ScoringConfig::default(), shared(NoOpObserver)).unwrap();

        assert!(Prospector::new().locate(&mut view).is_err());
        assert_eq!(view.current().unwrap(), a);
    }

    #[test]
    fn escape_detours_when_the_budget_allows() {
        let (view, exit) = escape_with(Prospector::new(), 4);
        assert_eq!(view.current().unwrap(), exit);
        assert_eq!(view.reward_collected().unwrap(), 50);
        assert_eq!(view.steps_left().unwrap(), 0);
    }

    #[test]
    fn escape_skips_detours_it_cannot_afford() {
        let (view, exit) = escape_with(Prospector::new(), 3);
        assert_eq!(view.current().unwrap(), exit);
        assert_eq!(view.reward_collected().unwrap(), 0);
        assert_eq!(view.steps_left().unwrap(), 1);
    }

    #[test]
    fn direct_prospector_ignores_side_rewards() {
        let (view, exit) = escape_with(Prospector::direct(), 100);
        assert_eq!(view.current().unwrap(), exit);
        assert_eq!(view.reward_collected().unwrap(), 0);
        assert_eq!(view.steps_left().unwrap(), 98);
    }

    #[test]
    fn better_ratio_beats_bigger_reward() {
        let node = NodeId::new;
        let near = Detour {
            node: node(9),
            reward: 10,
            cost: 1,
        };
        let far = Detour {
            node: node(2),
            reward: 25,
            cost: 5,
        };
        assert!(near.beats(&far));
        assert!(!far.beats(&near));

        let twin = Detour { node: node(1), ..near };
        assert!(twin.beats(&near));
    }
}
