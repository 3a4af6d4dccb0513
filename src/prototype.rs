use std::ops::Index;

use itertools::Itertools;
use thiserror::Error;
use tracing::debug;

use crate::direction::Direction;
use crate::socket::{Socket, SocketSet};

/// Dense, zero-based index of a prototype inside its [`Catalog`].
pub type PrototypeId = usize;

/// Reasons a [`Catalog`] may be rejected.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CatalogError {
    /// No prototypes were supplied.
    #[error("a catalog needs at least one prototype")]
    Empty,
    /// A weight was negative, NaN or infinite.
    #[error("prototype {prototype} has invalid weight {weight}")]
    InvalidWeight {
        /// Catalog position of the offending prototype.
        prototype: PrototypeId,
        /// The rejected weight.
        weight: f64,
    },
}

/// One placeable tile variant.
///
/// Prototypes are immutable once they are part of a [`Catalog`]; the catalog assigns their ids.
#[derive(Clone, Debug, PartialEq)]
pub struct Prototype {
    payload: String,
    rotation: u8,
    id: PrototypeId,
    sockets: SocketSet,
    weight: f64,
}

impl Prototype {
    /// A base (unrotated) prototype. `payload` is opaque to the solver and usually names the mesh or asset to place.
    ///
    /// `weight` is the relative probability mass used by weighted collapse.
    pub fn new(payload: impl Into<String>, sockets: SocketSet, weight: f64) -> Self {
        Self {
            payload: payload.into(),
            rotation: 0,
            id: 0,
            sockets,
            weight,
        }
    }

    /// The caller-defined payload identifier.
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Number of quarter turns applied to the base prototype, `0..=3`.
    pub fn rotation(&self) -> u8 {
        self.rotation
    }

    /// Position of this prototype in its catalog.
    pub fn id(&self) -> PrototypeId {
        self.id
    }

    /// All four sockets.
    pub fn sockets(&self) -> &SocketSet {
        &self.sockets
    }

    /// The socket facing `direction`.
    #[inline]
    pub fn socket(&self, direction: Direction) -> &Socket {
        self.sockets.get(direction)
    }

    /// Relative collapse probability.
    pub fn weight(&self) -> f64 {
        self.weight
    }

    fn rotated(&self, id: PrototypeId, rotation: u8) -> Self {
        Self {
            payload: self.payload.clone(),
            rotation,
            id,
            sockets: self.sockets.rotated(),
            weight: self.weight,
        }
    }
}

/// The fixed, read-only set of prototypes a solve draws from.
///
/// Every prototype's id equals its position in the catalog.
#[derive(Clone, Debug)]
pub struct Catalog {
    prototypes: Vec<Prototype>,
}

impl Catalog {
    /// Build a catalog from already-decoded prototypes, assigning ids in iteration order.
    pub fn new(prototypes: impl IntoIterator<Item=Prototype>) -> Result<Self, CatalogError> {
        let mut prototypes = prototypes.into_iter().collect_vec();
        if prototypes.is_empty() {
            return Err(CatalogError::Empty);
        }

        for (id, prototype) in prototypes.iter_mut().enumerate() {
            if !prototype.weight.is_finite() || prototype.weight < 0.0 {
                return Err(CatalogError::InvalidWeight { prototype: id, weight: prototype.weight });
            }
            prototype.id = id;
        }

        Ok(Self { prototypes })
    }

    /// Shorthand for [`Self::new`] followed by [`Self::add_rotations`].
    pub fn with_rotations(prototypes: impl IntoIterator<Item=Prototype>) -> Result<Self, CatalogError> {
        let mut catalog = Self::new(prototypes)?;
        catalog.add_rotations();
        Ok(catalog)
    }

    /// Append three rotated variants of every prototype, quadrupling the catalog.
    ///
    /// Existing ids are untouched. New ids follow the existing ones, grouped per source prototype,
    /// each variant being the previous one turned one more step.
    pub fn add_rotations(&mut self) {
        let base_len = self.prototypes.len();
        let mut rotated = Vec::with_capacity(base_len * 3);

        for base in &self.prototypes {
            let mut previous = base.clone();
            for rotation in 1..=3 {
                previous = previous.rotated(base_len + rotated.len(), rotation);
                rotated.push(previous.clone());
            }
        }

        self.prototypes.extend(rotated);
        debug!(base = base_len, total = self.prototypes.len(), "added prototype rotations");
    }

    /// Number of prototypes.
    pub fn len(&self) -> usize {
        self.prototypes.len()
    }

    /// Always `false` for a successfully constructed catalog.
    pub fn is_empty(&self) -> bool {
        self.prototypes.is_empty()
    }

    /// The prototype with `id`, if any.
    pub fn get(&self, id: PrototypeId) -> Option<&Prototype> {
        self.prototypes.get(id)
    }

    /// Iterate prototypes in id order.
    pub fn iter(&self) -> impl Iterator<Item=&Prototype> {
        self.prototypes.iter()
    }

    /// Every prototype id carrying `payload`, in ascending order.
    pub fn prototypes_with_payload(&self, payload: &str) -> Vec<PrototypeId> {
        self.prototypes.iter()
            .filter(|prototype| prototype.payload == payload)
            .map(Prototype::id)
            .collect_vec()
    }
}

impl Index<PrototypeId> for Catalog {
    type Output = Prototype;

    fn index(&self, id: PrototypeId) -> &Self::Output {
        &self.prototypes[id]
    }
}
