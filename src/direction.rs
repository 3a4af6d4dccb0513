use strum::VariantArray;

use crate::location::Location;

/// The four directional links a cell may have.
///
/// The declaration order is significant: propagation visits neighbors in exactly this order,
/// which keeps a seeded solve reproducible.
#[derive(Copy, Clone, VariantArray, Eq, PartialEq, Hash, Debug, Ord, PartialOrd)]
pub enum Direction {
    /// Towards increasing `x`.
    PositiveX,
    /// Towards decreasing `x`.
    NegativeX,
    /// Towards increasing `z`.
    PositiveZ,
    /// Towards decreasing `z`.
    NegativeZ,
}

impl Direction {
    /// The direction pointing back across the same edge.
    ///
    /// Direction labels are intrinsic, so this never consults the graph.
    pub fn invert(&self) -> Self {
        match self {
            Self::PositiveX => Self::NegativeX,
            Self::NegativeX => Self::PositiveX,
            Self::PositiveZ => Self::NegativeZ,
            Self::NegativeZ => Self::PositiveZ,
        }
    }

    /// The direction whose socket ends up facing `self` after one rotation step.
    pub(crate) fn rotation_source(&self) -> Self {
        match self {
            Self::PositiveX => Self::PositiveZ,
            Self::NegativeZ => Self::PositiveX,
            Self::NegativeX => Self::NegativeZ,
            Self::PositiveZ => Self::NegativeX,
        }
    }

    #[inline]
    pub(crate) fn index(&self) -> usize {
        *self as usize
    }

    /// Step from `location` one cell in this direction on a grid.
    ///
    /// Stepping off the low edge wraps to a huge coordinate, which callers treat as out of bounds.
    pub fn attempt_from(&self, location: Location) -> Location {
        match self {
            Self::PositiveX => location.offset_by((1, 0)),
            Self::NegativeX => location.offset_by((-1, 0)),
            Self::PositiveZ => location.offset_by((0, 1)),
            Self::NegativeZ => location.offset_by((0, -1)),
        }
    }

    /// Directions which step towards a higher grid index; every grid edge is built from one of these.
    pub(crate) const FORWARD_VARIANTS: &'static [Self] = &[Self::PositiveX, Self::PositiveZ];
}

#[cfg(test)]
mod tests {
    use strum::VariantArray;

    use super::Direction;

    #[test]
    fn invert_is_involution() {
        for direction in Direction::VARIANTS {
            assert_ne!(direction.invert(), *direction);
            assert_eq!(direction.invert().invert(), *direction);
        }
    }

    #[test]
    fn rotation_source_is_a_four_cycle() {
        let mut direction = Direction::PositiveX;
        let mut seen = Vec::new();
        for _ in 0..4 {
            seen.push(direction);
            direction = direction.rotation_source();
        }
        assert_eq!(direction, Direction::PositiveX);
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 4);
    }
}
