use rand::rngs::StdRng;
use strum::VariantArray;

use crate::compat::{possible_neighbors, NeighborSet};
use crate::direction::Direction;
use crate::graph::{CellId, ConnectionGraph};
use crate::prototype::{Catalog, Prototype, PrototypeId};
use crate::solver::{SolveStats, SolverFailure};

/// The candidate set of one cell, also known as its superposition.
///
/// Neighbor links mirror the [`ConnectionGraph`] as indices into the owning [`Wave`] and never change after construction.
#[derive(Clone, Debug)]
pub struct Domain {
    pub(crate) candidates: Vec<PrototypeId>,
    pub(crate) neighbors: [Option<CellId>; 4],
}

impl Domain {
    fn full(catalog: &Catalog, neighbors: [Option<CellId>; 4]) -> Self {
        Self {
            candidates: (0..catalog.len()).collect(),
            neighbors,
        }
    }

    /// Prototype ids still possible here. Order carries no meaning.
    pub fn candidates(&self) -> &[PrototypeId] {
        &self.candidates
    }

    /// Number of remaining candidates; `1` means resolved.
    #[inline]
    pub fn entropy(&self) -> usize {
        self.candidates.len()
    }

    /// Whether exactly one candidate remains.
    #[inline]
    pub fn is_collapsed(&self) -> bool {
        self.candidates.len() == 1
    }

    /// The sole remaining candidate, if collapsed.
    pub fn collapsed(&self) -> Option<PrototypeId> {
        match self.candidates.as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }

    /// Whether `prototype` is still a candidate.
    pub fn contains(&self, prototype: PrototypeId) -> bool {
        self.candidates.contains(&prototype)
    }

    /// The neighboring cell across `direction`.
    pub fn neighbor(&self, direction: Direction) -> Option<CellId> {
        self.neighbors[direction.index()]
    }
}

/// All domains of one solve, plus the machinery that mutates them.
///
/// The wave is an arena: domain `i` belongs to graph cell `i`.
/// It owns the random source and the scratch buffers reused across compatibility queries.
/// [`CollapseStrategy`](crate::CollapseStrategy) implementations receive it mutably.
pub struct Wave<'a> {
    pub(crate) catalog: &'a Catalog,
    pub(crate) domains: Vec<Domain>,
    pub(crate) rng: StdRng,
    pub(crate) scratch: NeighborSet,
    pub(crate) stack: Vec<CellId>,
    pub(crate) on_stack: Vec<bool>,
    pub(crate) stats: SolveStats,
}

impl<'a> Wave<'a> {
    pub(crate) fn new(catalog: &'a Catalog, graph: &ConnectionGraph, rng: StdRng) -> Self {
        let domains: Vec<Domain> = graph.cells()
            .map(|cell| Domain::full(catalog, graph.neighbors(cell)))
            .collect();

        Self {
            catalog,
            on_stack: vec![false; domains.len()],
            domains,
            rng,
            scratch: NeighborSet::with_capacity(catalog.len()),
            stack: Vec::new(),
            stats: SolveStats::default(),
        }
    }

    #[inline]
    pub(crate) fn check_cell(&self, cell: CellId) -> Result<(), SolverFailure> {
        match cell < self.domains.len() {
            true => Ok(()),
            false => Err(SolverFailure::UnknownCell { cell }),
        }
    }

    /// The catalog this wave draws from.
    pub fn catalog(&self) -> &'a Catalog {
        self.catalog
    }

    /// Number of domains, equal to the graph's cell count.
    pub fn cell_count(&self) -> usize {
        self.domains.len()
    }

    /// The domain of `cell`.
    pub fn domain(&self, cell: CellId) -> Option<&Domain> {
        self.domains.get(cell)
    }

    /// All domains, indexed by cell.
    pub fn domains(&self) -> &[Domain] {
        &self.domains
    }

    /// Candidates of `cell`; empty for unknown cells.
    pub fn candidates(&self, cell: CellId) -> &[PrototypeId] {
        self.domains.get(cell).map(Domain::candidates).unwrap_or_default()
    }

    /// Entropy of `cell`; `0` for unknown cells.
    pub fn entropy(&self, cell: CellId) -> usize {
        self.domains.get(cell).map_or(0, Domain::entropy)
    }

    /// The prototype `cell` collapsed to, or `None` while it is still undecided.
    pub fn resolved_prototype(&self, cell: CellId) -> Option<&'a Prototype> {
        let catalog = self.catalog;
        self.domains.get(cell)?.collapsed().map(|id| &catalog[id])
    }

    /// Every prototype id carrying `payload`.
    pub fn prototypes_with_payload(&self, payload: &str) -> Vec<PrototypeId> {
        self.catalog.prototypes_with_payload(payload)
    }

    /// Whether every domain has exactly one candidate.
    pub fn is_collapsed(&self) -> bool {
        self.domains.iter().all(Domain::is_collapsed)
    }

    /// The random source, for strategies that make their own draws.
    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Counters gathered so far.
    pub fn stats(&self) -> SolveStats {
        self.stats
    }

    /// Every prototype that may sit across `direction` from some candidate of `cell`, in ascending order.
    pub fn possible_neighbors(&mut self, cell: CellId, direction: Direction) -> Result<Vec<PrototypeId>, SolverFailure> {
        self.check_cell(cell)?;
        self.stats.compatibility_checks += possible_neighbors(self.catalog, &self.domains[cell].candidates, direction, &mut self.scratch);

        let mut possible = self.scratch.members().to_vec();
        possible.sort_unstable();
        Ok(possible)
    }

    /// Number of neighbor links a cell has; `4 - n` of its sides are boundaries.
    pub fn linked_sides(&self, cell: CellId) -> usize {
        Direction::VARIANTS.iter()
            .filter(|direction| self.domains.get(cell).and_then(|domain| domain.neighbor(**direction)).is_some())
            .count()
    }
}
