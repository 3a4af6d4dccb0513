use std::cell::OnceCell;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use strum::VariantArray;
use thiserror::Error;

use crate::direction::Direction;
use crate::prototype::{Prototype, PrototypeId};

/// Dense, zero-based cell identifier; cells are numbered in insertion order.
pub type CellId = usize;

/// Reasons a [`ConnectionGraph`] operation may fail.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// The cell id was never added to this graph.
    #[error("cell {0} does not exist")]
    UnknownCell(CellId),
    /// The cell already links to another cell in this direction.
    #[error("cell {cell} already links towards {direction:?}")]
    DirectionOccupied {
        /// The cell whose link is taken.
        cell: CellId,
        /// The taken direction.
        direction: Direction,
    },
    /// The cell's result slot already holds a different prototype.
    #[error("cell {cell} is already resolved to prototype {existing}")]
    AlreadyResolved {
        /// The resolved cell.
        cell: CellId,
        /// The prototype already stored there.
        existing: PrototypeId,
    },
}

/// Cell topology handed to the solver: cells with up to one link per [`Direction`].
///
/// A missing link is a boundary. Links are directed edges labelled with the direction they leave their source cell in;
/// adjacency is expected to be mutual, though the returning link may carry any label (mesh-derived graphs rarely line up).
/// Each cell also owns a write-once result slot filled by [`Solver::write_to_graph`](crate::Solver::write_to_graph).
///
/// Geometry (grid positions, mesh faces) is not stored here;
/// producers keep a parallel mapping from [`CellId`] instead, such as [`GridLayout`](crate::builder::GridLayout).
#[derive(Clone, Debug, Default)]
pub struct ConnectionGraph {
    graph: DiGraph<OnceCell<Prototype>, Direction>,
}

impl ConnectionGraph {
    /// An empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty graph with room for `cells` cells and `links` directed links.
    pub fn with_capacity(cells: usize, links: usize) -> Self {
        Self { graph: DiGraph::with_capacity(cells, links) }
    }

    /// Add an unlinked cell and return its id.
    pub fn add_cell(&mut self) -> CellId {
        self.graph.add_node(OnceCell::new()).index()
    }

    /// Number of cells.
    pub fn cell_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of directed links.
    pub fn link_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Whether the graph has no cells.
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Iterate cell ids in ascending order.
    pub fn cells(&self) -> impl Iterator<Item=CellId> {
        0..self.graph.node_count()
    }

    /// Whether `cell` belongs to this graph.
    pub fn contains(&self, cell: CellId) -> bool {
        cell < self.graph.node_count()
    }

    fn check(&self, cell: CellId) -> Result<NodeIndex, GraphError> {
        match self.contains(cell) {
            true => Ok(NodeIndex::new(cell)),
            false => Err(GraphError::UnknownCell(cell)),
        }
    }

    /// Link `from` to `to` in `direction`, one way only.
    ///
    /// Re-adding an identical link is a no-op.
    pub fn link(&mut self, from: CellId, direction: Direction, to: CellId) -> Result<(), GraphError> {
        let from_index = self.check(from)?;
        let to_index = self.check(to)?;

        match self.neighbor(from, direction) {
            Some(existing) if existing == to => Ok(()),
            Some(_) => Err(GraphError::DirectionOccupied { cell: from, direction }),
            None => {
                self.graph.add_edge(from_index, to_index, direction);
                Ok(())
            }
        }
    }

    /// Link `a` to `b` in `direction` and `b` back to `a` in the inverse direction.
    pub fn connect(&mut self, a: CellId, direction: Direction, b: CellId) -> Result<(), GraphError> {
        for (from, direction, to) in [(a, direction, b), (b, direction.invert(), a)] {
            if self.neighbor(from, direction).is_some_and(|existing| existing != to) {
                return Err(GraphError::DirectionOccupied { cell: from, direction });
            }
        }

        self.link(a, direction, b)?;
        self.link(b, direction.invert(), a)
    }

    /// Mutual link between two fresh cells, for builders that know both directions are free.
    pub(crate) fn connect_unchecked(&mut self, a: CellId, direction: Direction, b: CellId) {
        self.graph.add_edge(NodeIndex::new(a), NodeIndex::new(b), direction);
        self.graph.add_edge(NodeIndex::new(b), NodeIndex::new(a), direction.invert());
    }

    /// The cell linked from `cell` in `direction`, or `None` at a boundary.
    pub fn neighbor(&self, cell: CellId, direction: Direction) -> Option<CellId> {
        if !self.contains(cell) {
            return None;
        }

        self.graph.edges(NodeIndex::new(cell))
            .find(|edge| *edge.weight() == direction)
            .map(|edge| edge.target().index())
    }

    /// All four links of `cell`, indexed by [`Direction`].
    pub fn neighbors(&self, cell: CellId) -> [Option<CellId>; 4] {
        std::array::from_fn(|i| self.neighbor(cell, Direction::VARIANTS[i]))
    }

    /// The direction in which the neighbor across `direction` links back to `cell`.
    ///
    /// `None` if there is no neighbor there or the neighbor has no link back, i.e. adjacency is not mutual.
    pub fn reciprocal_direction(&self, cell: CellId, direction: Direction) -> Option<Direction> {
        let neighbor = self.neighbor(cell, direction)?;
        self.graph.edges(NodeIndex::new(neighbor))
            .find(|edge| edge.target().index() == cell)
            .map(|edge| *edge.weight())
    }

    /// The prototype written into `cell`, if it has been resolved.
    pub fn resolved(&self, cell: CellId) -> Option<&Prototype> {
        self.graph.node_weight(NodeIndex::new(cell)).and_then(OnceCell::get)
    }

    /// Store `prototype` in the result slot of `cell`.
    ///
    /// The slot is write-once: storing the same prototype again succeeds, a different one fails.
    pub fn resolve(&mut self, cell: CellId, prototype: &Prototype) -> Result<(), GraphError> {
        let index = self.check(cell)?;
        let slot = &self.graph[index];

        match slot.get() {
            Some(existing) if existing.id() != prototype.id() => Err(GraphError::AlreadyResolved { cell, existing: existing.id() }),
            Some(_) => Ok(()),
            None => {
                slot.get_or_init(|| prototype.clone());
                Ok(())
            }
        }
    }

    /// Empty every result slot, e.g. before materializing a retried solve.
    pub fn clear_resolved(&mut self) {
        self.graph.node_weights_mut().for_each(|slot| {
            slot.take();
        });
    }
}
