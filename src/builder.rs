use std::collections::HashSet;

use itertools::Itertools;
use ndarray::Array2;
use unordered_pair::UnorderedPair;

use crate::direction::Direction;
use crate::graph::{CellId, ConnectionGraph};
use crate::location::{Dimension, Location};
use crate::prototype::Prototype;

/// Reasons a builder may become invalid while building.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BuilderInvalidReason {
    /// A hole or wall was placed outside the bounds specified by `dims` on the builder.
    FeatureOutOfBounds,
}

/// A builder for rectangular grid graphs, optionally with holes and walls.
///
/// Cells are numbered column by column: `x` is the outer loop and `z` the inner one,
/// so `Location(x, z)` on a full grid gets id `x * height + z`. Dropped locations are skipped and take no id.
///
/// Builders mutate themselves while building but can be [`Clone`]d to save their state at some point.
#[derive(Clone)]
pub struct GridGraphBuilder {
    // width, height
    dims: (Dimension, Dimension),
    invalid_reasons: Vec<BuilderInvalidReason>,
    // walls
    edge_blacklist: HashSet<UnorderedPair<Location>>,
    // holes
    location_blacklist: HashSet<Location>,
}

impl GridGraphBuilder {
    /// Construct a new [`Self`] with the specified dimensions, specified in `(width, height)` order.
    pub fn with_dims(dims: (Dimension, Dimension)) -> Self {
        Self {
            dims,
            invalid_reasons: Default::default(),
            edge_blacklist: Default::default(),
            location_blacklist: Default::default(),
        }
    }

    #[inline]
    fn in_bounds(&self, location: Location) -> bool {
        location.0 < self.dims.0.get() && location.1 < self.dims.1.get()
    }

    /// Drop a location from the grid, leaving a hole with no cell.
    /// Cells around the hole see it as a boundary.
    ///
    /// May cause the builder to enter a [`FeatureOutOfBounds`](BuilderInvalidReason::FeatureOutOfBounds) invalid state if `location` is out of bounds.
    /// If the builder is already in an invalid state, this function does nothing.
    pub fn drop_location(&mut self, location: Location) -> &mut Self {
        if !self.invalid_reasons.is_empty() {
            return self;
        }

        if !self.in_bounds(location) {
            self.invalid_reasons.push(BuilderInvalidReason::FeatureOutOfBounds);
            return self;
        }

        self.location_blacklist.insert(location);
        self
    }

    /// Disconnect the two `locations`, i.e. place a wall between them. Both cells see the wall as a boundary.
    ///
    /// If the two locations are not adjacent, this function does nothing and does not invalidate the builder.
    ///
    /// May cause the builder to enter a [`FeatureOutOfBounds`](BuilderInvalidReason::FeatureOutOfBounds) invalid state if either location is out of bounds.
    /// If the builder is already in an invalid state, this function does nothing.
    pub fn disconnect(&mut self, locations: UnorderedPair<Location>) -> &mut Self {
        if !self.invalid_reasons.is_empty() {
            return self;
        }

        for location in [locations.0, locations.1] {
            if !self.in_bounds(location) {
                self.invalid_reasons.push(BuilderInvalidReason::FeatureOutOfBounds);
                return self;
            }
        }

        if !Direction::FORWARD_VARIANTS.iter()
            .any(|direction| direction.attempt_from(locations.0) == locations.1 || direction.attempt_from(locations.1) == locations.0) {
            return self;
        }

        self.edge_blacklist.insert(locations);
        self
    }

    /// Shorthand for multiple calls to [`Self::disconnect`], with the same conditions.
    ///
    /// Disconnect cells neighboring `location`. Directions pointing off the grid are ignored.
    pub fn disconnect_around(&mut self, location: Location, directions: Vec<Direction>) -> &mut Self {
        for direction in directions.into_iter().unique() {
            let other = direction.attempt_from(location);
            if self.in_bounds(other) {
                self.disconnect(UnorderedPair::from((location, other)));
            }
        }

        self
    }

    /// Check the validity of this builder, ensuring no [`BuilderInvalidReason`] condition has arisen.
    ///
    /// Returns `None` if the builder is valid, `Some(&Vec<BuilderInvalidReason>)` otherwise.
    pub fn is_valid(&self) -> Option<&Vec<BuilderInvalidReason>> {
        if self.invalid_reasons.is_empty() {
            None
        } else {
            Some(&self.invalid_reasons)
        }
    }

    /// Convert the state of this builder into a [`ConnectionGraph`] plus the [`GridLayout`] locating each cell.
    /// If the builder is invalid for any reason, a reference to a [`Vec`] of [`BuilderInvalidReason`] will indicate why.
    pub fn build(&self) -> Result<(ConnectionGraph, GridLayout), &Vec<BuilderInvalidReason>> {
        if !self.invalid_reasons.is_empty() {
            return Err(&self.invalid_reasons);
        }

        let (width, height) = (self.dims.0.get(), self.dims.1.get());
        let mut graph = ConnectionGraph::with_capacity(
            width * height,
            // both directions of every "horizontal" and "vertical" edge
            2 * ((width - 1) * height + (height - 1) * width),
        );

        let mut cells: Array2<Option<CellId>> = Array2::from_elem((height, width), None);
        for x in 0..width {
            for z in 0..height {
                let location = Location(x, z);
                if !self.location_blacklist.contains(&location) {
                    cells[location.as_index()] = Some(graph.add_cell());
                }
            }
        }

        for (index, cell) in cells.indexed_iter() {
            let Some(cell) = *cell else { continue };
            let location = Location::from(index);

            // link forwards only; connect adds the way back
            for direction in Direction::FORWARD_VARIANTS {
                let other_location = direction.attempt_from(location);
                if self.edge_blacklist.contains(&UnorderedPair::from((location, other_location))) {
                    continue;
                }

                if let Some(Some(other)) = cells.get(other_location.as_index()) {
                    graph.connect_unchecked(cell, *direction, *other);
                }
            }
        }

        Ok((graph, GridLayout { cells }))
    }
}

/// The geometry side of a grid graph: which cell sits at which [`Location`].
#[derive(Clone, Debug)]
pub struct GridLayout {
    // indexed (z, x)
    cells: Array2<Option<CellId>>,
}

impl GridLayout {
    /// `(width, height)` of the grid.
    pub fn dims(&self) -> (usize, usize) {
        (self.cells.ncols(), self.cells.nrows())
    }

    /// The cell at `location`, or `None` for holes and out-of-bounds locations.
    pub fn cell_at(&self, location: Location) -> Option<CellId> {
        self.cells.get(location.as_index()).copied().flatten()
    }

    /// Where `cell` sits on the grid.
    pub fn location_of(&self, cell: CellId) -> Option<Location> {
        self.cells.indexed_iter()
            .find(|(_, here)| **here == Some(cell))
            .map(|(index, _)| Location::from(index))
    }

    /// Lay out the resolved prototypes of `graph` as text, one row per `z`.
    ///
    /// Unresolved cells print as `.` and holes as a space.
    pub fn render(&self, graph: &ConnectionGraph, display: impl Fn(&Prototype) -> char) -> String {
        let mut out = String::with_capacity(self.cells.nrows() * (self.cells.ncols() + 1));

        for row in self.cells.rows() {
            for cell in row {
                out.push(match cell {
                    None => ' ',
                    Some(cell) => graph.resolved(*cell).map_or('.', &display),
                });
            }
            out.push('\n');
        }

        out
    }
}
