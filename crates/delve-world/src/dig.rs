//! Seeded cavern generation.
//!
//! Both caverns of a game are dug on the same `rows x cols` grid. Digging
//! grows a randomized depth-first spanning tree from a start tile, opening a
//! tile only when it touches exactly one open tile so that walls remain
//! between corridors. A share of the wall tiles that separate two or more
//! open tiles is then knocked through to form loops.
//!
//! Every locate passage is one step long, so the shortest route to the
//! target is measured in the same moves a walk is counted in. Escape
//! passages are uniform in `1..=max_edge_weight` and spend that many steps
//! of the budget.
//!
//! The locate cavern carries no rewards. The escape cavern starts on the
//! locate target's tile and scatters rewards over a configurable share of
//! its tiles.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use delve_types::{NodeId, Tile};

use crate::cavern::{Cavern, CavernBuilder};
use crate::error::WorldError;

/// Tunables for cavern generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CavernConfig {
    /// Smallest grid height.
    #[serde(default = "default_min_rows")]
    pub min_rows: u32,

    /// Largest grid height.
    #[serde(default = "default_max_rows")]
    pub max_rows: u32,

    /// Smallest grid width.
    #[serde(default = "default_min_cols")]
    pub min_cols: u32,

    /// Largest grid width.
    #[serde(default = "default_max_cols")]
    pub max_cols: u32,

    /// Longest escape passage; lengths are drawn from `1..=max_edge_weight`.
    #[serde(default = "default_max_edge_weight")]
    pub max_edge_weight: u32,

    /// Probability that a wall tile touching two or more open tiles is knocked through.
    #[serde(default = "default_loop_density")]
    pub loop_density: f64,

    /// Probability that an escape tile holds a reward.
    #[serde(default = "default_reward_density")]
    pub reward_density: f64,

    /// Largest reward on a single tile.
    #[serde(default = "default_max_reward")]
    pub max_reward: u32,
}

impl Default for CavernConfig {
    fn default() -> Self {
        Self {
            min_rows: default_min_rows(),
            max_rows: default_max_rows(),
            min_cols: default_min_cols(),
            max_cols: default_max_cols(),
            max_edge_weight: default_max_edge_weight(),
            loop_density: default_loop_density(),
            reward_density: default_reward_density(),
            max_reward: default_max_reward(),
        }
    }
}

const fn default_min_rows() -> u32 {
    8
}

const fn default_max_rows() -> u32 {
    25
}

const fn default_min_cols() -> u32 {
    12
}

const fn default_max_cols() -> u32 {
    40
}

const fn default_max_edge_weight() -> u32 {
    15
}

const fn default_loop_density() -> f64 {
    0.1
}

const fn default_reward_density() -> f64 {
    0.3
}

const fn default_max_reward() -> u32 {
    1000
}

/// Draw grid dimensions `(rows, cols)` from the configured ranges.
pub fn pick_dimensions(config: &CavernConfig, rng: &mut impl Rng) -> (u32, u32) {
    let rows = rng.random_range(config.min_rows.min(config.max_rows)..=config.max_rows);
    let cols = rng.random_range(config.min_cols.min(config.max_cols)..=config.max_cols);
    (rows, cols)
}

/// Dig the locate cavern. The entrance is a random tile, the target a
/// different random open tile whenever the cavern has more than one.
///
/// # Errors
///
/// Returns [`WorldError::InvalidDimensions`] for an empty grid.
pub fn dig_find_cavern(
    config: &CavernConfig,
    rows: u32,
    cols: u32,
    rng: &mut impl Rng,
) -> Result<Cavern, WorldError> {
    if rows == 0 || cols == 0 {
        return Err(WorldError::InvalidDimensions { rows, cols });
    }
    let start = (rng.random_range(0..rows), rng.random_range(0..cols));
    let (builder, opened) = carve(config, rows, cols, 1, start, rng)?;
    let entrance = first(&opened)?;
    let target = pick_other(&opened, entrance, rng);

    debug!(
        rows,
        cols,
        open_tiles = opened.len(),
        %entrance,
        %target,
        "Dug locate cavern"
    );
    builder.build(entrance, target)
}

/// Dig the escape cavern, entering on tile `entrance`, with rewards scattered
/// over the open tiles and the exit on a different random tile.
///
/// # Errors
///
/// Returns [`WorldError::InvalidDimensions`] for an empty grid and
/// [`WorldError::TileOutOfBounds`] if `entrance` lies outside it.
pub fn dig_flee_cavern(
    config: &CavernConfig,
    rows: u32,
    cols: u32,
    entrance: (u32, u32),
    rng: &mut impl Rng,
) -> Result<Cavern, WorldError> {
    let max_weight = config.max_edge_weight.max(1);
    let (mut builder, opened) = carve(config, rows, cols, max_weight, entrance, rng)?;
    let start = first(&opened)?;
    let exit = pick_other(&opened, start, rng);

    let density = config.reward_density.clamp(0.0, 1.0);
    let max_reward = config.max_reward.max(1);
    let mut placed: u32 = 0;
    for &id in &opened {
        if rng.random_bool(density) {
            builder.set_reward(id, rng.random_range(1..=max_reward))?;
            placed = placed.saturating_add(1);
        }
    }

    debug!(
        rows,
        cols,
        open_tiles = opened.len(),
        rewards = placed,
        entrance = %start,
        %exit,
        "Dug escape cavern"
    );
    builder.build(start, exit)
}

/// Grow a randomized depth-first spanning tree from `start`, then breach walls.
/// Passage lengths are drawn from `1..=max_weight`.
///
/// Returns the builder and every opened node in digging order; the first one
/// sits on `start`.
fn carve(
    config: &CavernConfig,
    rows: u32,
    cols: u32,
    max_weight: u32,
    start: (u32, u32),
    rng: &mut impl Rng,
) -> Result<(CavernBuilder, Vec<NodeId>), WorldError> {
    let mut builder = CavernBuilder::new(rows, cols)?;
    let max_weight = max_weight.max(1);

    let origin = builder.add_node(Tile::bare(start.0, start.1))?;
    let mut opened = vec![origin];
    let mut stack = vec![(start, origin)];

    while let Some(&((row, col), id)) = stack.last() {
        let options: Vec<(u32, u32)> = grid_neighbors(row, col, rows, cols)
            .into_iter()
            .filter(|&(r, c)| {
                builder.node_at(r, c).is_none() && open_neighbors(&builder, r, c, rows, cols) == 1
            })
            .collect();

        if options.is_empty() {
            stack.pop();
            continue;
        }

        let pick = rng.random_range(0..options.len());
        let Some(&(next_row, next_col)) = options.get(pick) else {
            stack.pop();
            continue;
        };
        let next = builder.add_node(Tile::bare(next_row, next_col))?;
        builder.connect(id, next, rng.random_range(1..=max_weight))?;
        opened.push(next);
        stack.push(((next_row, next_col), next));
    }

    let density = config.loop_density.clamp(0.0, 1.0);
    for row in 0..rows {
        for col in 0..cols {
            if builder.node_at(row, col).is_some() {
                continue;
            }
            let walls_off: Vec<NodeId> = grid_neighbors(row, col, rows, cols)
                .into_iter()
                .filter_map(|(r, c)| builder.node_at(r, c))
                .collect();
            if walls_off.len() < 2 || !rng.random_bool(density) {
                continue;
            }
            let breach = builder.add_node(Tile::bare(row, col))?;
            for neighbor in walls_off {
                builder.connect(breach, neighbor, rng.random_range(1..=max_weight))?;
            }
            opened.push(breach);
        }
    }

    Ok((builder, opened))
}

/// In-bounds orthogonal neighbours of `(row, col)`.
fn grid_neighbors(row: u32, col: u32, rows: u32, cols: u32) -> Vec<(u32, u32)> {
    let candidates = [
        row.checked_sub(1).map(|r| (r, col)),
        row.checked_add(1).filter(|&r| r < rows).map(|r| (r, col)),
        col.checked_sub(1).map(|c| (row, c)),
        col.checked_add(1).filter(|&c| c < cols).map(|c| (row, c)),
    ];
    candidates.into_iter().flatten().collect()
}

/// How many orthogonal neighbours of `(row, col)` are already open.
fn open_neighbors(builder: &CavernBuilder, row: u32, col: u32, rows: u32, cols: u32) -> usize {
    grid_neighbors(row, col, rows, cols)
        .into_iter()
        .filter(|&(r, c)| builder.node_at(r, c).is_some())
        .count()
}

fn first(opened: &[NodeId]) -> Result<NodeId, WorldError> {
    opened.first().copied().ok_or(WorldError::EmptyPath)
}

/// A random node other than `avoid`, or `avoid` itself when it is alone.
fn pick_other(opened: &[NodeId], avoid: NodeId, rng: &mut impl Rng) -> NodeId {
    let others: Vec<NodeId> = opened.iter().copied().filter(|&id| id != avoid).collect();
    if others.is_empty() {
        return avoid;
    }
    let pick = rng.random_range(0..others.len());
    others.get(pick).copied().unwrap_or(avoid)
}
