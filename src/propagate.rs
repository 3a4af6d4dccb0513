use strum::VariantArray;
use tracing::trace;

use crate::compat::possible_neighbors;
use crate::direction::Direction;
use crate::domain::Wave;
use crate::graph::CellId;
use crate::solver::SolverFailure;

impl Wave<'_> {
    /// Restore consistency around `root` after its domain shrank.
    ///
    /// Works through an explicit stack seeded with `root`. For each popped cell and each of its neighbors,
    /// in [`Direction`] declaration order, every neighbor candidate that no remaining candidate here can sit next to is banned,
    /// and a neighbor that lost candidates is pushed unless it is already waiting on the stack.
    ///
    /// Returns [`SolverFailure::Contradiction`] naming the first cell that would be left without candidates.
    /// That cell is checked before it is touched, so no domain is ever observed empty;
    /// domains restricted earlier in the same call stay restricted.
    pub fn propagate(&mut self, root: CellId) -> Result<(), SolverFailure> {
        self.check_cell(root)?;

        for cell in self.stack.drain(..) {
            self.on_stack[cell] = false;
        }
        self.stack.push(root);
        self.on_stack[root] = true;

        while let Some(current) = self.stack.pop() {
            self.on_stack[current] = false;

            for &direction in Direction::VARIANTS {
                let Some(neighbor) = self.domains[current].neighbor(direction) else { continue };

                self.stats.compatibility_checks += possible_neighbors(self.catalog, &self.domains[current].candidates, direction, &mut self.scratch);

                let possible = &self.scratch;
                let target = &mut self.domains[neighbor];

                // already settled on something that still fits
                if target.collapsed().is_some_and(|only| possible.contains(only)) {
                    continue;
                }

                let keep = target.candidates.iter().filter(|id| possible.contains(**id)).count();
                if keep == target.candidates.len() {
                    continue;
                }
                if keep == 0 {
                    trace!(from = current, cell = neighbor, ?direction, "contradiction");
                    return Err(SolverFailure::Contradiction { cell: neighbor });
                }

                target.candidates.retain(|id| possible.contains(*id));

                if !self.on_stack[neighbor] {
                    self.on_stack[neighbor] = true;
                    self.stack.push(neighbor);
                }
            }
        }

        Ok(())
    }
}
