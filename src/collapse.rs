use itertools::Itertools;
use rand::Rng;

use crate::domain::Wave;
use crate::graph::CellId;
use crate::prototype::PrototypeId;
use crate::solver::SolverFailure;

/// Decides which prototype a cell collapses to.
///
/// The solver calls [`collapse`](Self::collapse) with a cell of entropy greater than one.
/// An implementation must leave that cell with exactly one candidate taken from the candidates it had on entry,
/// typically through [`Wave::collapse_to`] or [`Wave::collapse_random`]; the solver checks this afterwards
/// and fails with [`SolverFailure::BrokenCollapseContract`] otherwise.
/// Propagation is the solver's job and must not be started from here.
pub trait CollapseStrategy {
    /// Reduce `cell` to a single candidate.
    fn collapse(&mut self, cell: CellId, wave: &mut Wave<'_>) -> Result<(), SolverFailure>;
}

/// The default strategy: a weighted random draw over the cell's candidates.
#[derive(Clone, Copy, Debug, Default)]
pub struct WeightedRandom;

impl CollapseStrategy for WeightedRandom {
    fn collapse(&mut self, cell: CellId, wave: &mut Wave<'_>) -> Result<(), SolverFailure> {
        wave.collapse_random(cell)
    }
}

/// A strategy backed by a closure, see [`collapse_with`].
pub struct FnCollapse<F>(F);

impl<F> CollapseStrategy for FnCollapse<F>
where
    F: FnMut(CellId, &mut Wave<'_>) -> Result<(), SolverFailure>,
{
    fn collapse(&mut self, cell: CellId, wave: &mut Wave<'_>) -> Result<(), SolverFailure> {
        (self.0)(cell, wave)
    }
}

/// Wrap a closure as a [`CollapseStrategy`], e.g. to script parts of a level while leaving the rest random.
pub fn collapse_with<F>(f: F) -> FnCollapse<F>
where
    F: FnMut(CellId, &mut Wave<'_>) -> Result<(), SolverFailure>,
{
    FnCollapse(f)
}

impl Wave<'_> {
    /// Pick the unresolved cell with the fewest candidates, breaking ties uniformly at random.
    ///
    /// Fails with [`SolverFailure::NothingToCollapse`] once every cell is resolved.
    pub fn select_next_cell(&mut self) -> Result<CellId, SolverFailure> {
        let lowest = self.domains.iter()
            .enumerate()
            .filter(|(_, domain)| domain.entropy() > 1)
            .min_set_by_key(|(_, domain)| domain.entropy());

        if lowest.is_empty() {
            return Err(SolverFailure::NothingToCollapse);
        }

        let (cell, _) = lowest[self.rng.gen_range(0..lowest.len())];
        Ok(cell)
    }

    /// Roulette selection among `candidates`, using prototype weights as unnormalized probability mass.
    ///
    /// Falls back to a uniform draw when the weights sum to zero. Returns `None` for an empty slice.
    /// Weights whose sum overflows are rescaled first, so any catalog [`Catalog::new`](crate::Catalog::new) accepts can be drawn from.
    pub fn pick_weighted(&mut self, candidates: &[PrototypeId]) -> Option<PrototypeId> {
        if candidates.is_empty() {
            return None;
        }

        let catalog = self.catalog;
        let mut scale = 1.0;
        let mut total: f64 = candidates.iter().map(|id| catalog[*id].weight()).sum();
        if total <= 0.0 {
            return Some(candidates[self.rng.gen_range(0..candidates.len())]);
        }
        if !total.is_finite() {
            // each weight is finite, only the sum overflowed; relative to the largest weight it fits again
            scale = candidates.iter().map(|id| catalog[*id].weight()).fold(0.0, f64::max).recip();
            total = candidates.iter().map(|id| catalog[*id].weight() * scale).sum();
        }
        let weight = |id: PrototypeId| catalog[id].weight() * scale;

        let draw = self.rng.gen_range(0.0..total);
        let mut running = 0.0;
        for &id in candidates {
            running += weight(id);
            if draw < running {
                return Some(id);
            }
        }

        // rounding can leave the draw just past the last band
        candidates.iter().rev().find(|id| weight(**id) > 0.0).copied()
    }

    /// Collapse `cell` by [`Self::pick_weighted`] over its candidates. Does not propagate.
    pub fn collapse_random(&mut self, cell: CellId) -> Result<(), SolverFailure> {
        self.check_cell(cell)?;
        if self.domains[cell].entropy() <= 1 {
            return Err(SolverFailure::AlreadyCollapsed { cell });
        }

        let candidates = std::mem::take(&mut self.domains[cell].candidates);
        let chosen = self.pick_weighted(&candidates);
        self.domains[cell].candidates = candidates;

        match chosen {
            Some(prototype) => self.collapse_to(cell, prototype),
            None => Err(SolverFailure::AlreadyCollapsed { cell }),
        }
    }

    /// Force `cell` down to `prototype`, which must still be one of its candidates. Does not propagate.
    pub fn collapse_to(&mut self, cell: CellId, prototype: PrototypeId) -> Result<(), SolverFailure> {
        self.check_cell(cell)?;
        let domain = &mut self.domains[cell];
        if !domain.contains(prototype) {
            return Err(SolverFailure::InvalidCollapse { cell, prototype });
        }

        domain.candidates.clear();
        domain.candidates.push(prototype);
        Ok(())
    }
}
