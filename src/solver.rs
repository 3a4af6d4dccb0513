use itertools::Itertools;
use rand::rngs::StdRng;
use rand::SeedableRng;
use strum::VariantArray;
use thiserror::Error;
use tracing::{debug, info, trace, warn};

use crate::collapse::{CollapseStrategy, WeightedRandom};
use crate::direction::Direction;
use crate::domain::{Domain, Wave};
use crate::graph::{CellId, ConnectionGraph, GraphError};
use crate::prototype::{Catalog, Prototype, PrototypeId};

/// Reasons a [`Solver`] cannot be constructed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConstructionError {
    /// The catalog has no prototypes.
    #[error("the prototype catalog is empty")]
    EmptyCatalog,
    /// The graph has no cells.
    #[error("the connection graph has no cells")]
    EmptyGraph,
    /// `cell` links to a neighbor in `direction` which has no link back.
    #[error("cell {cell} links towards {direction:?} but its neighbor does not link back")]
    NonReciprocalLink {
        /// The cell with the one-way link.
        cell: CellId,
        /// Direction of the one-way link.
        direction: Direction,
    },
    /// The boundary socket, or propagating it inwards, left `cell` without candidates.
    #[error("the boundary socket leaves cell {cell} without candidates")]
    BoundaryContradiction {
        /// The emptied cell.
        cell: CellId,
    },
}

/// Reasons a solve, or an operation on a running solve, may fail.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SolverFailure {
    /// Propagation would have left `cell` with no candidates; the current attempt is unsatisfiable.
    ///
    /// This is terminal for the solver. Retrying, e.g. with another seed, is up to the caller.
    #[error("contradiction: cell {cell} has no remaining candidates")]
    Contradiction {
        /// The cell that would have been emptied.
        cell: CellId,
    },
    /// Collapse to a prototype which is not a candidate of the cell.
    #[error("prototype {prototype} is not a candidate of cell {cell}")]
    InvalidCollapse {
        /// The targeted cell.
        cell: CellId,
        /// The rejected prototype.
        prototype: PrototypeId,
    },
    /// None of the offered prototypes is a candidate of the cell.
    #[error("none of the offered prototypes is a candidate of cell {cell}")]
    NoValidCandidate {
        /// The targeted cell.
        cell: CellId,
    },
    /// Random collapse of a cell that is already resolved.
    #[error("cell {cell} is already collapsed")]
    AlreadyCollapsed {
        /// The resolved cell.
        cell: CellId,
    },
    /// Asked for the next cell to collapse when every cell is resolved.
    #[error("every cell is already collapsed")]
    NothingToCollapse,
    /// A [`CollapseStrategy`] did not leave the cell with exactly one of its previous candidates.
    #[error("collapse strategy did not reduce cell {cell} to one of its candidates")]
    BrokenCollapseContract {
        /// The mishandled cell.
        cell: CellId,
    },
    /// The cell id is outside the solved graph.
    #[error("cell {cell} does not exist")]
    UnknownCell {
        /// The unknown id.
        cell: CellId,
    },
}

impl SolverFailure {
    /// The cell the failure concerns, if any.
    pub fn cell(&self) -> Option<CellId> {
        match self {
            Self::Contradiction { cell }
            | Self::InvalidCollapse { cell, .. }
            | Self::NoValidCandidate { cell }
            | Self::AlreadyCollapsed { cell }
            | Self::BrokenCollapseContract { cell }
            | Self::UnknownCell { cell } => Some(*cell),
            Self::NothingToCollapse => None,
        }
    }
}

/// Where a [`Solver`] is in its lifecycle.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SolveState {
    /// Constructed, nothing collapsed by the loop yet.
    Unsolved,
    /// At least one iteration ran and unresolved cells remain.
    Solving,
    /// Every cell has exactly one candidate.
    Solved,
    /// Propagation hit a contradiction at `cell`. Terminal.
    Contradicted {
        /// The cell that would have been emptied.
        cell: CellId,
    },
}

/// Counters describing the work a solve has done.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SolveStats {
    /// Loop iterations, i.e. select-collapse-propagate rounds.
    pub iterations: usize,
    /// Socket comparisons made while resolving compatibility.
    pub compatibility_checks: usize,
}

/// Configuration for a [`Solver`].
///
/// ```
/// # use tilewave::{Catalog, ConnectionGraph, Direction, Prototype, SocketSet, SolverBuilder};
/// let catalog = Catalog::new([Prototype::new("grass", SocketSet::uniform("g"), 1.0)]).unwrap();
/// let mut graph = ConnectionGraph::new();
/// let (a, b) = (graph.add_cell(), graph.add_cell());
/// graph.connect(a, Direction::PositiveX, b).unwrap();
///
/// let mut solver = SolverBuilder::new(&catalog).seed(7).boundary_socket("g").build(&graph).unwrap();
/// solver.solve().unwrap();
/// ```
pub struct SolverBuilder<'a> {
    catalog: &'a Catalog,
    boundary_socket: Option<String>,
    seed: Option<u64>,
    strategy: Box<dyn CollapseStrategy + 'a>,
}

impl<'a> SolverBuilder<'a> {
    /// Start configuring a solve over `catalog`, with no boundary constraint, an entropy-seeded generator and [`WeightedRandom`] collapse.
    pub fn new(catalog: &'a Catalog) -> Self {
        Self {
            catalog,
            boundary_socket: None,
            seed: None,
            strategy: Box::new(WeightedRandom),
        }
    }

    /// Require every side without a neighbor to show `socket`. An empty string disables the constraint.
    pub fn boundary_socket(mut self, socket: impl Into<String>) -> Self {
        self.boundary_socket = Some(socket.into()).filter(|socket: &String| !socket.is_empty());
        self
    }

    /// Seed the random source so the solve is reproducible.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Replace the default weighted random collapse.
    pub fn collapse_strategy(mut self, strategy: impl CollapseStrategy + 'a) -> Self {
        self.strategy = Box::new(strategy);
        self
    }

    /// Create one domain per cell of `graph` and apply the boundary constraint.
    ///
    /// Boundary cells are filtered first, in cell order, and then propagated from in the same order,
    /// so the constraint has rippled inwards before the first collapse.
    /// Cells left with a single candidate are then checked against their neighbors;
    /// if those cannot coexist, the solver starts out [`Contradicted`](SolveState::Contradicted).
    pub fn build(self, graph: &ConnectionGraph) -> Result<Solver<'a>, ConstructionError> {
        if self.catalog.is_empty() {
            return Err(ConstructionError::EmptyCatalog);
        }
        if graph.is_empty() {
            return Err(ConstructionError::EmptyGraph);
        }

        for cell in graph.cells() {
            for &direction in Direction::VARIANTS {
                if graph.neighbor(cell, direction).is_some() && graph.reciprocal_direction(cell, direction).is_none() {
                    return Err(ConstructionError::NonReciprocalLink { cell, direction });
                }
            }
        }

        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut wave = Wave::new(self.catalog, graph, rng);

        if let Some(socket) = &self.boundary_socket {
            let catalog = self.catalog;
            let mut constrained = Vec::new();

            for (cell, domain) in wave.domains.iter_mut().enumerate() {
                let open = Direction::VARIANTS.iter()
                    .filter(|direction| domain.neighbor(**direction).is_none())
                    .collect_vec();
                if open.is_empty() {
                    continue;
                }

                domain.candidates.retain(|id| open.iter().all(|direction| catalog[*id].socket(**direction).value() == socket.as_str()));
                if domain.candidates.is_empty() {
                    return Err(ConstructionError::BoundaryContradiction { cell });
                }
                constrained.push(cell);
            }

            debug!(cells = constrained.len(), socket = socket.as_str(), "constrained boundary cells");

            for cell in constrained {
                wave.propagate(cell).map_err(|failure| ConstructionError::BoundaryContradiction {
                    cell: failure.cell().unwrap_or(cell),
                })?;
            }
        }

        let mut state = SolveState::Unsolved;
        for cell in 0..wave.cell_count() {
            if !wave.domains[cell].is_collapsed() {
                continue;
            }
            if let Err(failure) = wave.propagate(cell) {
                let cell = failure.cell().unwrap_or(cell);
                warn!(cell, "cells resolved from the start cannot sit next to each other");
                state = SolveState::Contradicted { cell };
                break;
            }
        }

        debug!(cells = graph.cell_count(), prototypes = self.catalog.len(), "solver ready");

        Ok(Solver {
            wave,
            strategy: self.strategy,
            state,
            pending: Vec::new(),
        })
    }
}

/// Wave Function Collapse over a [`ConnectionGraph`] and a [`Catalog`].
///
/// Use [`Self::solve`] to run to completion, or [`Self::iterate`] to step (and, say, check a cancellation flag in between).
/// A solve never backtracks: on [`SolverFailure::Contradiction`] the solver stops for good.
pub struct Solver<'a> {
    wave: Wave<'a>,
    strategy: Box<dyn CollapseStrategy + 'a>,
    state: SolveState,
    // cells narrowed by forbid, propagated from before the next collapse
    pending: Vec<CellId>,
}

impl<'a> Solver<'a> {
    /// A solver with default configuration, see [`SolverBuilder::new`].
    pub fn new(catalog: &'a Catalog, graph: &ConnectionGraph) -> Result<Self, ConstructionError> {
        SolverBuilder::new(catalog).build(graph)
    }

    /// Start configuring a solver.
    pub fn builder(catalog: &'a Catalog) -> SolverBuilder<'a> {
        SolverBuilder::new(catalog)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SolveState {
        self.state
    }

    /// Counters gathered so far.
    pub fn stats(&self) -> SolveStats {
        self.wave.stats
    }

    /// Read access to the domains.
    pub fn wave(&self) -> &Wave<'a> {
        &self.wave
    }

    /// Direct access to the domains, e.g. for drawing with the solver's random source.
    ///
    /// Mutating domains here bypasses propagation; prefer the solver's own collapse operations.
    pub fn wave_mut(&mut self) -> &mut Wave<'a> {
        &mut self.wave
    }

    /// The domain of `cell`.
    pub fn domain(&self, cell: CellId) -> Option<&Domain> {
        self.wave.domain(cell)
    }

    /// The prototype `cell` collapsed to, or `None` while it is still undecided.
    pub fn resolved_prototype(&self, cell: CellId) -> Option<&'a Prototype> {
        self.wave.resolved_prototype(cell)
    }

    /// Every prototype id carrying `payload`.
    pub fn prototypes_with_payload(&self, payload: &str) -> Vec<PrototypeId> {
        self.wave.prototypes_with_payload(payload)
    }

    /// Whether every cell has exactly one candidate.
    pub fn is_collapsed(&self) -> bool {
        self.wave.is_collapsed()
    }

    fn ensure_live(&self) -> Result<(), SolverFailure> {
        match self.state {
            SolveState::Contradicted { cell } => Err(SolverFailure::Contradiction { cell }),
            _ => Ok(()),
        }
    }

    fn settle(&mut self) -> Result<(), SolverFailure> {
        self.ensure_live()?;

        for cell in std::mem::take(&mut self.pending) {
            self.propagate_from(cell)?;
        }
        Ok(())
    }

    fn propagate_from(&mut self, cell: CellId) -> Result<(), SolverFailure> {
        if let Err(failure) = self.wave.propagate(cell) {
            if let SolverFailure::Contradiction { cell } = failure {
                self.state = SolveState::Contradicted { cell };
            }
            return Err(failure);
        }

        if self.wave.is_collapsed() {
            self.state = SolveState::Solved;
        }
        Ok(())
    }

    fn collapse(&mut self, cell: CellId) -> Result<(), SolverFailure> {
        let before = self.wave.candidates(cell).to_vec();
        self.strategy.collapse(cell, &mut self.wave)?;

        match self.wave.domains[cell].collapsed() {
            Some(chosen) if before.contains(&chosen) => {
                trace!(cell, prototype = chosen, entropy = before.len(), "collapsed");
                Ok(())
            }
            _ => Err(SolverFailure::BrokenCollapseContract { cell }),
        }
    }

    /// Run one round: pick the lowest-entropy cell, collapse it, propagate from it.
    ///
    /// Returns the state afterwards. Once solved this keeps returning [`SolveState::Solved`];
    /// once contradicted it keeps returning the same [`SolverFailure::Contradiction`].
    pub fn iterate(&mut self) -> Result<SolveState, SolverFailure> {
        self.settle()?;
        if self.state == SolveState::Solved || self.wave.is_collapsed() {
            self.state = SolveState::Solved;
            return Ok(self.state);
        }

        self.state = SolveState::Solving;
        let cell = self.wave.select_next_cell()?;
        self.collapse(cell)?;
        self.wave.stats.iterations += 1;
        self.propagate_from(cell)?;

        Ok(self.state)
    }

    /// Iterate until every cell is resolved or a contradiction stops the solve.
    pub fn solve(&mut self) -> Result<(), SolverFailure> {
        while self.iterate()? != SolveState::Solved {}

        let stats = self.wave.stats;
        info!(iterations = stats.iterations, compatibility_checks = stats.compatibility_checks, "solved");
        Ok(())
    }

    /// Collapse `cell` to `prototype` and propagate.
    ///
    /// A cell already resolved to another prototype is left alone with a warning.
    pub fn collapse_cell(&mut self, cell: CellId, prototype: PrototypeId) -> Result<(), SolverFailure> {
        self.settle()?;
        self.wave.check_cell(cell)?;

        if let Some(existing) = self.wave.domains[cell].collapsed() {
            if existing != prototype {
                warn!(cell, existing, requested = prototype, "cell already collapsed to another prototype");
            }
            return Ok(());
        }

        self.wave.collapse_to(cell, prototype)?;
        self.propagate_from(cell)
    }

    /// Collapse `cell` to a weighted pick among those of `prototypes` it still allows, and propagate.
    pub fn collapse_cell_among(&mut self, cell: CellId, prototypes: &[PrototypeId]) -> Result<(), SolverFailure> {
        self.settle()?;
        self.wave.check_cell(cell)?;

        let allowed = prototypes.iter()
            .copied()
            .filter(|prototype| self.wave.domains[cell].contains(*prototype))
            .collect_vec();

        match self.wave.pick_weighted(&allowed) {
            Some(prototype) => self.collapse_cell(cell, prototype),
            None => Err(SolverFailure::NoValidCandidate { cell }),
        }
    }

    /// [`Self::collapse_cell_among`] for each of `cells`, stopping at the first failure.
    pub fn collapse_cells(&mut self, cells: &[CellId], prototypes: &[PrototypeId]) -> Result<(), SolverFailure> {
        cells.iter().try_for_each(|cell| self.collapse_cell_among(*cell, prototypes))
    }

    /// Remove `prototypes` from the candidates of each of `cells`.
    ///
    /// Neighbors are not updated right away: the narrowed cells are propagated from at the start of the next
    /// [`Self::iterate`], [`Self::collapse_cell`] or [`Self::collapse_cell_among`], which report any contradiction.
    /// A cell that would lose all of its candidates is skipped with a warning.
    pub fn forbid(&mut self, cells: &[CellId], prototypes: &[PrototypeId]) -> Result<(), SolverFailure> {
        self.ensure_live()?;

        for &cell in cells {
            self.wave.check_cell(cell)?;
            let domain = &mut self.wave.domains[cell];

            if domain.candidates.iter().all(|id| prototypes.contains(id)) {
                warn!(cell, "skipped forbidding, it would leave the cell without candidates");
                continue;
            }

            let before = domain.entropy();
            domain.candidates.retain(|id| !prototypes.contains(id));
            if domain.entropy() < before && !self.pending.contains(&cell) {
                self.pending.push(cell);
            }
        }

        Ok(())
    }

    /// Write the prototype of every resolved cell into the matching slot of `graph`. Returns how many cells were written.
    ///
    /// Unresolved cells keep an empty slot.
    pub fn write_to_graph(&self, graph: &mut ConnectionGraph) -> Result<usize, GraphError> {
        let mut written = 0;

        for (cell, domain) in self.wave.domains.iter().enumerate() {
            if let Some(id) = domain.collapsed() {
                graph.resolve(cell, &self.wave.catalog[id])?;
                written += 1;
            }
        }

        Ok(written)
    }
}
