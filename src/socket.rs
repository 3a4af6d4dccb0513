use std::ops::Index;

use strum::VariantArray;

use crate::direction::Direction;

/// A socket identifier on one side of a prototype, stored alongside its reversed form.
///
/// Two tiles fit across an edge when one side's socket equals the *reversed* socket of the other side.
/// Symmetric strings such as `"0"` or `"aba"` therefore fit themselves,
/// while `"ab"` only fits `"ba"`, which lets a socket encode an orientation along the shared edge.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Socket {
    value: String,
    reversed: String,
}

impl Socket {
    /// Build a socket, precomputing its reversed form.
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        let reversed = value.chars().rev().collect();
        Self { value, reversed }
    }

    /// The socket as written.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The socket with its characters in reverse order.
    pub fn reversed(&self) -> &str {
        &self.reversed
    }

    /// Whether a tile showing `self` on an edge accepts a tile showing `other` on the far side of that edge.
    #[inline]
    pub fn fits(&self, other: &Socket) -> bool {
        self.value == other.reversed
    }
}

impl From<&str> for Socket {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// The four sockets of a prototype, indexed by [`Direction`].
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct SocketSet {
    sockets: [Socket; 4],
}

impl SocketSet {
    /// Sockets given in `(positive x, negative x, positive z, negative z)` order.
    pub fn new(pos_x: impl Into<String>, neg_x: impl Into<String>, pos_z: impl Into<String>, neg_z: impl Into<String>) -> Self {
        Self {
            sockets: [Socket::new(pos_x), Socket::new(neg_x), Socket::new(pos_z), Socket::new(neg_z)],
        }
    }

    /// The same socket on all four sides.
    pub fn uniform(socket: impl Into<String>) -> Self {
        let socket = Socket::new(socket);
        Self {
            sockets: [socket.clone(), socket.clone(), socket.clone(), socket],
        }
    }

    /// The socket facing `direction`.
    #[inline]
    pub fn get(&self, direction: Direction) -> &Socket {
        &self.sockets[direction.index()]
    }

    /// Rotate one step: positive x takes the old positive z, negative z the old positive x,
    /// negative x the old negative z and positive z the old negative x.
    ///
    /// Reversed forms are recomputed from the moved values.
    pub fn rotated(&self) -> Self {
        Self {
            sockets: std::array::from_fn(|i| Socket::new(self.get(Direction::VARIANTS[i].rotation_source()).value())),
        }
    }
}

impl Index<Direction> for SocketSet {
    type Output = Socket;

    fn index(&self, direction: Direction) -> &Self::Output {
        self.get(direction)
    }
}

#[cfg(test)]
mod tests {
    use crate::direction::Direction;

    use super::{Socket, SocketSet};

    #[test]
    fn reversing_twice_is_identity() {
        for raw in ["", "0", "ab", "a1b2c3", "路径"] {
            let socket = Socket::new(raw);
            assert_eq!(Socket::new(socket.reversed()).reversed(), raw);
        }
    }

    #[test]
    fn directional_sockets_only_fit_their_mirror() {
        let forward = Socket::new("ab");
        let backward = Socket::new("ba");
        assert!(forward.fits(&backward));
        assert!(backward.fits(&forward));
        assert!(!forward.fits(&forward));
        assert!(Socket::new("aba").fits(&Socket::new("aba")));
    }

    #[test]
    fn rotation_moves_sockets_cyclically() {
        let sockets = SocketSet::new("px", "nx", "pz", "nz");
        let rotated = sockets.rotated();
        assert_eq!(rotated[Direction::PositiveX].value(), "pz");
        assert_eq!(rotated[Direction::NegativeZ].value(), "px");
        assert_eq!(rotated[Direction::NegativeX].value(), "nz");
        assert_eq!(rotated[Direction::PositiveZ].value(), "nx");
        assert_eq!(rotated.rotated().rotated().rotated(), sockets);
    }
}
