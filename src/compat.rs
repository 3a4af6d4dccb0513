use crate::direction::Direction;
use crate::prototype::{Catalog, PrototypeId};

/// A set of prototype ids backed by a membership mask sized to the catalog.
///
/// Lives for the whole solve and is cleared before each query, so propagation never allocates.
pub(crate) struct NeighborSet {
    mask: Vec<bool>,
    members: Vec<PrototypeId>,
}

impl NeighborSet {
    pub(crate) fn with_capacity(catalog_len: usize) -> Self {
        Self {
            mask: vec![false; catalog_len],
            members: Vec::with_capacity(catalog_len),
        }
    }

    pub(crate) fn clear(&mut self) {
        for id in self.members.drain(..) {
            self.mask[id] = false;
        }
    }

    #[inline]
    pub(crate) fn insert(&mut self, id: PrototypeId) {
        if !self.mask[id] {
            self.mask[id] = true;
            self.members.push(id);
        }
    }

    #[inline]
    pub(crate) fn contains(&self, id: PrototypeId) -> bool {
        self.mask.get(id).copied().unwrap_or(false)
    }

    pub(crate) fn members(&self) -> &[PrototypeId] {
        &self.members
    }
}

/// Collect into `out` every prototype that may sit across `direction` from at least one of `candidates`.
///
/// A prototype `q` qualifies when some candidate's socket facing `direction` equals the reversed socket of `q` facing back.
/// Returns the number of socket comparisons made.
pub(crate) fn possible_neighbors(catalog: &Catalog, candidates: &[PrototypeId], direction: Direction, out: &mut NeighborSet) -> usize {
    out.clear();
    let facing = direction.invert();

    for &candidate in candidates {
        let socket = catalog[candidate].socket(direction);
        for other in catalog.iter() {
            if socket.fits(other.socket(facing)) {
                out.insert(other.id());
            }
        }
    }

    candidates.len() * catalog.len()
}
