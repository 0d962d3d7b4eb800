//! Shortest paths over a [`Cavern`].
//!
//! Label-setting search on a min-ordered [`IndexedPriorityQueue`] keyed by
//! tentative distance. One map holds the best known distance and the
//! backpointer of every node seen so far, frontier and settled alike.

use std::collections::HashMap;

use delve_types::NodeId;

use crate::cavern::Cavern;
use crate::error::WorldError;
use crate::queue::IndexedPriorityQueue;

/// Best known distance from the source and the previous node on that path.
#[derive(Debug, Clone, Copy)]
struct SearchRecord {
    distance: u32,
    previous: Option<NodeId>,
}

/// The shortest path from `source` to `target`, both inclusive.
///
/// Returns an empty path when `target` cannot be reached. Equal-length ties
/// resolve in favour of the neighbour with the smaller id.
///
/// # Errors
///
/// Returns [`WorldError::NodeNotFound`] if either endpoint is not in the cavern.
pub fn shortest_path(
    cavern: &Cavern,
    source: NodeId,
    target: NodeId,
) -> Result<Vec<NodeId>, WorldError> {
    cavern.require(source)?;
    cavern.require(target)?;

    let mut frontier = IndexedPriorityQueue::min();
    let mut records: HashMap<NodeId, SearchRecord> = HashMap::new();

    frontier.insert(source, 0_u32)?;
    records.insert(
        source,
        SearchRecord {
            distance: 0,
            previous: None,
        },
    );

    while !frontier.is_empty() {
        let settled = frontier.poll()?;
        if settled == target {
            return Ok(trace_back(&records, target));
        }

        let Some(base) = records.get(&settled).map(|record| record.distance) else {
            continue;
        };
        let node = cavern.require(settled)?;

        for edge in node.exits() {
            let Some(candidate) = base.checked_add(edge.length) else {
                continue;
            };
            match records.get_mut(&edge.to) {
                None => {
                    frontier.insert(edge.to, candidate)?;
                    records.insert(
                        edge.to,
                        SearchRecord {
                            distance: candidate,
                            previous: Some(settled),
                        },
                    );
                }
                Some(record) if candidate < record.distance => {
                    frontier.change_priority(&edge.to, candidate)?;
                    record.distance = candidate;
                    record.previous = Some(settled);
                }
                Some(_) => {}
            }
        }
    }

    Ok(Vec::new())
}

/// Shortest distance from `source` to every node reachable from it.
///
/// # Errors
///
/// Returns [`WorldError::NodeNotFound`] if `source` is not in the cavern.
pub fn distances_from(
    cavern: &Cavern,
    source: NodeId,
) -> Result<HashMap<NodeId, u32>, WorldError> {
    cavern.require(source)?;

    let mut frontier = IndexedPriorityQueue::min();
    let mut best: HashMap<NodeId, u32> = HashMap::new();
    frontier.insert(source, 0_u32)?;
    best.insert(source, 0);

    while !frontier.is_empty() {
        let settled = frontier.poll()?;
        let Some(&base) = best.get(&settled) else {
            continue;
        };
        for edge in cavern.require(settled)?.exits() {
            let Some(candidate) = base.checked_add(edge.length) else {
                continue;
            };
            match best.get_mut(&edge.to) {
                None => {
                    frontier.insert(edge.to, candidate)?;
                    best.insert(edge.to, candidate);
                }
                Some(known) if candidate < *known => {
                    frontier.change_priority(&edge.to, candidate)?;
                    *known = candidate;
                }
                Some(_) => {}
            }
        }
    }

    Ok(best)
}

/// Follow backpointers from `target` to the source and reverse.
fn trace_back(records: &HashMap<NodeId, SearchRecord>, target: NodeId) -> Vec<NodeId> {
    let mut path = Vec::new();
    let mut cursor = Some(target);
    while let Some(node) = cursor {
        path.push(node);
        cursor = records.get(&node).and_then(|record| record.previous);
    }
    path.reverse();
    path
}

/// Sum of the edge lengths along `path`. A single-node path has length 0.
///
/// # Errors
///
/// Returns [`WorldError::EmptyPath`] for an empty path,
/// [`WorldError::NotAdjacent`] when two consecutive nodes share no edge, and
/// [`WorldError::ArithmeticOverflow`] if the sum does not fit in a `u32`.
pub fn path_length(cavern: &Cavern, path: &[NodeId]) -> Result<u32, WorldError> {
    if path.is_empty() {
        return Err(WorldError::EmptyPath);
    }

    let mut total: u32 = 0;
    for pair in path.windows(2) {
        let (Some(&from), Some(&to)) = (pair.first(), pair.get(1)) else {
            continue;
        };
        let edge = cavern
            .edge(from, to)
            .ok_or(WorldError::NotAdjacent { from, to })?;
        total = total
            .checked_add(edge.length)
            .ok_or(WorldError::ArithmeticOverflow)?;
    }
    Ok(total)
}

/// Length of the shortest path from `from` to `to`, or `None` if unreachable.
///
/// # Errors
///
/// Returns [`WorldError::NodeNotFound`] if either node is not in the cavern.
pub fn distance(cavern: &Cavern, from: NodeId, to: NodeId) -> Result<Option<u32>, WorldError> {
    let path = shortest_path(cavern, from, to)?;
    if path.is_empty() {
        return Ok(None);
    }
    path_length(cavern, &path).map(Some)
}
