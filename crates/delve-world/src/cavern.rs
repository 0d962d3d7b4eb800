//! Cavern graph: open tiles as nodes, passages as weighted undirected edges.
//!
//! A [`Cavern`] is the spatial backbone of one phase. It stores every
//! [`CavernNode`] together with its tile metadata and adjacency, an index
//! from grid position to node, and the designated entrance and target.
//!
//! Adjacency is kept as `BTreeMap<NodeId, u32>` (neighbour -> edge length),
//! so a node's exits are always iterated in ascending neighbour id. Searches
//! that break ties by iteration order are therefore deterministic.
//!
//! Caverns are assembled with a [`CavernBuilder`] and are immutable once
//! built; reward collection is tracked by the game engine, not here.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use delve_types::{NodeId, Tile};

use crate::error::WorldError;

/// An undirected weighted edge as seen from one of its endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    /// The endpoint the edge was looked up from.
    pub from: NodeId,
    /// The opposite endpoint.
    pub to: NodeId,
    /// Length of the passage; also its step cost while escaping.
    pub length: u32,
}

impl Edge {
    /// The endpoint opposite `node`, or `None` if `node` is not an endpoint.
    pub fn other(&self, node: NodeId) -> Option<NodeId> {
        if node == self.from {
            Some(self.to)
        } else if node == self.to {
            Some(self.from)
        } else {
            None
        }
    }
}

/// A node of the cavern graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CavernNode {
    id: NodeId,
    tile: Tile,
    exits: BTreeMap<NodeId, u32>,
}

impl CavernNode {
    /// The node's identifier.
    pub const fn id(&self) -> NodeId {
        self.id
    }

    /// The tile this node occupies.
    pub const fn tile(&self) -> &Tile {
        &self.tile
    }

    /// Incident edges, in ascending neighbour id.
    pub fn exits(&self) -> impl Iterator<Item = Edge> + '_ {
        self.exits.iter().map(|(&to, &length)| Edge {
            from: self.id,
            to,
            length,
        })
    }

    /// Neighbour ids, ascending.
    pub fn neighbors(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.exits.keys().copied()
    }

    /// Number of incident edges.
    pub fn degree(&self) -> usize {
        self.exits.len()
    }

    /// Whether an edge connects this node to `other`.
    pub fn is_adjacent(&self, other: NodeId) -> bool {
        self.exits.contains_key(&other)
    }

    /// The edge to `other`, if the two nodes are adjacent.
    pub fn edge_to(&self, other: NodeId) -> Option<Edge> {
        self.exits.get(&other).map(|&length| Edge {
            from: self.id,
            to: other,
            length,
        })
    }
}

/// The cavern graph for one phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cavern {
    rows: u32,
    cols: u32,
    nodes: BTreeMap<NodeId, CavernNode>,
    by_tile: BTreeMap<(u32, u32), NodeId>,
    entrance: NodeId,
    target: NodeId,
}

impl Cavern {
    /// Number of grid rows.
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Number of grid columns.
    pub const fn cols(&self) -> u32 {
        self.cols
    }

    /// Where a phase starts.
    pub const fn entrance(&self) -> NodeId {
        self.entrance
    }

    /// The phase goal: the hidden target while locating, the exit while escaping.
    pub const fn target(&self) -> NodeId {
        self.target
    }

    /// Look up a node by id.
    pub fn node(&self, id: NodeId) -> Option<&CavernNode> {
        self.nodes.get(&id)
    }

    /// Look up a node by id, failing with [`WorldError::NodeNotFound`].
    pub fn require(&self, id: NodeId) -> Result<&CavernNode, WorldError> {
        self.nodes.get(&id).ok_or(WorldError::NodeNotFound(id))
    }

    /// The node on tile `(row, col)`, if that tile is open.
    pub fn node_at(&self, row: u32, col: u32) -> Option<&CavernNode> {
        self.by_tile
            .get(&(row, col))
            .and_then(|id| self.nodes.get(id))
    }

    /// All nodes, in ascending id.
    pub fn nodes(&self) -> impl Iterator<Item = &CavernNode> {
        self.nodes.values()
    }

    /// Number of open tiles.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of undirected edges.
    pub fn edge_count(&self) -> usize {
        self.nodes.values().map(CavernNode::degree).sum::<usize>() / 2
    }

    /// The edge between `a` and `b`, if they are adjacent.
    pub fn edge(&self, a: NodeId, b: NodeId) -> Option<Edge> {
        self.nodes.get(&a).and_then(|node| node.edge_to(b))
    }

    /// Sum of the rewards placed on every tile at generation time.
    pub fn total_reward(&self) -> u64 {
        self.nodes
            .values()
            .map(|node| u64::from(node.tile.reward))
            .fold(0_u64, u64::saturating_add)
    }

    /// Whether every node is reachable from every other node.
    pub fn is_connected(&self) -> bool {
        let Some(&start) = self.nodes.keys().next() else {
            return true;
        };

        let mut visited = BTreeSet::new();
        let mut queue = VecDeque::new();
        visited.insert(start);
        queue.push_back(start);

        while let Some(current) = queue.pop_front() {
            if let Some(node) = self.nodes.get(&current) {
                for neighbor in node.neighbors() {
                    if visited.insert(neighbor) {
                        queue.push_back(neighbor);
                    }
                }
            }
        }

        visited.len() == self.nodes.len()
    }
}

/// Incremental, validating constructor for a [`Cavern`].
#[derive(Debug, Clone)]
pub struct CavernBuilder {
    rows: u32,
    cols: u32,
    nodes: BTreeMap<NodeId, CavernNode>,
    by_tile: BTreeMap<(u32, u32), NodeId>,
    next_id: u64,
}

impl CavernBuilder {
    /// Start a cavern on a `rows` x `cols` grid.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidDimensions`] if either dimension is zero.
    pub fn new(rows: u32, cols: u32) -> Result<Self, WorldError> {
        if rows == 0 || cols == 0 {
            return Err(WorldError::InvalidDimensions { rows, cols });
        }
        Ok(Self {
            rows,
            cols,
            nodes: BTreeMap::new(),
            by_tile: BTreeMap::new(),
            next_id: 1,
        })
    }

    /// Open `tile` as a new node with the next free id.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::TileOutOfBounds`] or [`WorldError::TileOccupied`].
    pub fn add_node(&mut self, tile: Tile) -> Result<NodeId, WorldError> {
        let mut id = NodeId::new(self.next_id);
        while self.nodes.contains_key(&id) {
            let raw = id
                .into_inner()
                .checked_add(1)
                .ok_or(WorldError::ArithmeticOverflow)?;
            id = NodeId::new(raw);
        }
        self.add_node_with_id(id, tile)?;
        Ok(id)
    }

    /// Open `tile` as a node with a caller-chosen id.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::DuplicateNode`], [`WorldError::TileOutOfBounds`],
    /// or [`WorldError::TileOccupied`].
    pub fn add_node_with_id(&mut self, id: NodeId, tile: Tile) -> Result<(), WorldError> {
        if self.nodes.contains_key(&id) {
            return Err(WorldError::DuplicateNode(id));
        }
        if tile.row >= self.rows || tile.col >= self.cols {
            return Err(WorldError::TileOutOfBounds {
                row: tile.row,
                col: tile.col,
                rows: self.rows,
                cols: self.cols,
            });
        }
        if self.by_tile.contains_key(&(tile.row, tile.col)) {
            return Err(WorldError::TileOccupied {
                row: tile.row,
                col: tile.col,
            });
        }
        self.by_tile.insert((tile.row, tile.col), id);
        self.nodes.insert(
            id,
            CavernNode {
                id,
                tile,
                exits: BTreeMap::new(),
            },
        );
        if id.into_inner() >= self.next_id {
            self.next_id = id.into_inner().saturating_add(1);
        }
        Ok(())
    }

    /// Connect `a` and `b` with an undirected passage of `length`.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::NodeNotFound`], [`WorldError::SelfLoop`], or
    /// [`WorldError::DuplicateEdge`].
    pub fn connect(&mut self, a: NodeId, b: NodeId, length: u32) -> Result<(), WorldError> {
        if a == b {
            return Err(WorldError::SelfLoop(a));
        }
        let node_a = self.nodes.get(&a).ok_or(WorldError::NodeNotFound(a))?;
        if !self.nodes.contains_key(&b) {
            return Err(WorldError::NodeNotFound(b));
        }
        if node_a.exits.contains_key(&b) {
            return Err(WorldError::DuplicateEdge { a, b });
        }
        if let Some(node) = self.nodes.get_mut(&a) {
            node.exits.insert(b, length);
        }
        if let Some(node) = self.nodes.get_mut(&b) {
            node.exits.insert(a, length);
        }
        Ok(())
    }

    /// The node already opened on `(row, col)`, if any.
    pub fn node_at(&self, row: u32, col: u32) -> Option<NodeId> {
        self.by_tile.get(&(row, col)).copied()
    }

    /// Number of nodes opened so far.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Replace the reward lying on an already opened node.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::NodeNotFound`] if `id` has not been opened.
    pub fn set_reward(&mut self, id: NodeId, reward: u32) -> Result<(), WorldError> {
        let node = self.nodes.get_mut(&id).ok_or(WorldError::NodeNotFound(id))?;
        node.tile.reward = reward;
        Ok(())
    }

    /// Finish the cavern with its entrance and target.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::NodeNotFound`] if either node was never opened.
    pub fn build(self, entrance: NodeId, target: NodeId) -> Result<Cavern, WorldError> {
        if !self.nodes.contains_key(&entrance) {
            return Err(WorldError::NodeNotFound(entrance));
        }
        if !self.nodes.contains_key(&target) {
            return Err(WorldError::NodeNotFound(target));
        }
        Ok(Cavern {
            rows: self.rows,
            cols: self.cols,
            nodes: self.nodes,
            by_tile: self.by_tile,
            entrance,
            target,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn make_line() -> (Cavern, NodeId, NodeId, NodeId) {
        let mut builder = CavernBuilder::new(1, 3).unwrap();
        let a = builder.add_node(Tile::bare(0, 0)).unwrap();
        let b = builder.add_node(Tile::bare(0, 1)).unwrap();
        let c = builder.add_node(Tile { row: 0, col: 2, reward: 40 }).unwrap();
        builder.connect(a, b, 2).unwrap();
        builder.connect(b, c, 5).unwrap();
        (builder.build(a, c).unwrap(), a, b, c)
    }

    #[test]
    fn edges_are_undirected() {
        let (cavern, a, b, _) = make_line();
        assert_eq!(cavern.edge(a, b).map(|e| e.length), Some(2));
        assert_eq!(cavern.edge(b, a).map(|e| e.length), Some(2));
        assert_eq!(cavern.edge_count(), 2);
    }

    #[test]
    fn exits_iterate_in_ascending_neighbor_order() {
        let (cavern, a, b, c) = make_line();
        let neighbors: Vec<_> = cavern.node(b).unwrap().neighbors().collect();
        assert_eq!(neighbors, vec![a, c]);
    }

    #[test]
    fn edge_other_endpoint() {
        let (cavern, a, b, c) = make_line();
        let edge = cavern.edge(a, b).unwrap();
        assert_eq!(edge.other(a), Some(b));
        assert_eq!(edge.other(b), Some(a));
        assert_eq!(edge.other(c), None);
    }

    #[test]
    fn lookup_by_tile() {
        let (cavern, _, b, _) = make_line();
        assert_eq!(cavern.node_at(0, 1).map(CavernNode::id), Some(b));
        assert!(cavern.node_at(0, 7).is_none());
        assert_eq!(cavern.total_reward(), 40);
    }

    #[test]
    fn builder_rejects_bad_input() {
        assert!(CavernBuilder::new(0, 4).is_err());

        let mut builder = CavernBuilder::new(2, 2).unwrap();
        let a = builder.add_node(Tile::bare(0, 0)).unwrap();
        assert_eq!(
            builder.add_node(Tile::bare(0, 0)),
            Err(WorldError::TileOccupied { row: 0, col: 0 })
        );
        assert!(matches!(
            builder.add_node(Tile::bare(2, 0)),
            Err(WorldError::TileOutOfBounds { .. })
        ));
        assert_eq!(builder.connect(a, a, 1), Err(WorldError::SelfLoop(a)));

        let b = builder.add_node(Tile::bare(1, 1)).unwrap();
        builder.connect(a, b, 1).unwrap();
        assert_eq!(
            builder.connect(b, a, 3),
            Err(WorldError::DuplicateEdge { a: b, b: a })
        );
        assert_eq!(
            builder.add_node_with_id(a, Tile::bare(1, 0)),
            Err(WorldError::DuplicateNode(a))
        );
        assert!(builder.build(a, NodeId::new(99)).is_err());
    }

    #[test]
    fn connectivity_check() {
        let (cavern, ..) = make_line();
        assert!(cavern.is_connected());

        let mut builder = CavernBuilder::new(1, 2).unwrap();
        let a = builder.add_node(Tile::bare(0, 0)).unwrap();
        let b = builder.add_node(Tile::bare(0, 1)).unwrap();
        let split = builder.build(a, b).unwrap();
        assert!(!split.is_connected());
    }
}
