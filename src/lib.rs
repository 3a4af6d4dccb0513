#![warn(missing_docs)]

//! # `tilewave`
//!
//! A [Wave Function Collapse](https://github.com/mxgmn/WaveFunctionCollapse) solver for tiles with string sockets,
//! working on any cell graph in which every cell has at most four directional neighbors.
//! Build a [`Catalog`] of [`Prototype`]s (optionally with [`rotations`](Catalog::add_rotations)),
//! describe the cells with a [`ConnectionGraph`] (by hand, or with [`GridGraphBuilder`](builder::GridGraphBuilder) for grids),
//! configure a [`Solver`] through a [`SolverBuilder`], then call [`solve()`](Solver::solve)
//! and [`write_to_graph()`](Solver::write_to_graph) to store the chosen prototype in every cell.
//!
//! `tilewave` never looks at geometry. Graphs derived from quad meshes work as well as square grids, as long as adjacency is mutual.
//!
//! # Internals
//! Every cell gets a [`Domain`]: the set of prototype ids it may still become.
//! Two prototypes fit across an edge when the [`Socket`] of one facing the other equals the *reversed* socket of the other facing back,
//! so `"ab"` fits `"ba"` while symmetric sockets like `"0"` fit themselves.
//!
//! A high level overview is as follows:
//!
//! 1. All domains start full. If a boundary socket is configured, cells missing a neighbor keep only prototypes showing that socket outwards,
//! and the restriction is propagated inwards.
//! 2. The unresolved cell with the fewest candidates is picked, ties broken at random,
//! and collapsed to one prototype by a weighted draw or by a custom [`CollapseStrategy`].
//! 3. Propagation walks outwards from that cell with an explicit stack, removing from each neighbor every candidate
//! that no remaining candidate on this side can sit next to, until nothing changes.
//! 4. Repeat until every domain holds one prototype, or until propagation would empty a domain.
//! The latter is a contradiction: there is no backtracking, and retrying with another seed is left to the caller.
//!
//! All randomness comes from a seedable generator owned by the solver, so a seed fully determines the outcome.

pub use collapse::{collapse_with, CollapseStrategy, FnCollapse, WeightedRandom};
pub use direction::Direction;
pub use domain::{Domain, Wave};
pub use graph::{CellId, ConnectionGraph, GraphError};
pub use location::{Dimension, Location};
pub use prototype::{Catalog, CatalogError, Prototype, PrototypeId};
pub use socket::{Socket, SocketSet};
pub use solver::{ConstructionError, SolveState, SolveStats, Solver, SolverBuilder, SolverFailure};

pub mod builder;
pub(crate) mod collapse;
pub(crate) mod compat;
pub(crate) mod direction;
pub(crate) mod domain;
pub(crate) mod graph;
pub(crate) mod location;
pub(crate) mod propagate;
pub(crate) mod prototype;
pub(crate) mod socket;
pub(crate) mod solver;
