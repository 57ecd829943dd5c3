//! The six axis directions and the 6-bit connectivity mask built from them.

use crate::geometry::Vec3;
use serde::{Deserialize, Serialize};

/// One of the six faces of a grid cell.
///
/// The discriminant is the bit index used by [`ConnectionMask`]; it is fixed
/// and shared by every component that encodes sides as bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    /// +y
    Up = 0,
    /// -y
    Down = 1,
    /// -z
    North = 2,
    /// +z
    South = 3,
    /// +x
    East = 4,
    /// -x
    West = 5,
}

impl Side {
    /// All six sides in bit order.
    pub fn all() -> [Side; 6] {
        [
            Side::Up,
            Side::Down,
            Side::North,
            Side::South,
            Side::East,
            Side::West,
        ]
    }

    /// Unit grid offset for this side.
    pub fn direction(&self) -> (i32, i32, i32) {
        match self {
            Side::Up => (0, 1, 0),
            Side::Down => (0, -1, 0),
            Side::North => (0, 0, -1),
            Side::South => (0, 0, 1),
            Side::East => (1, 0, 0),
            Side::West => (-1, 0, 0),
        }
    }

    /// Unit world-space vector for this side.
    pub fn unit(&self) -> Vec3 {
        let (x, y, z) = self.direction();
        Vec3::new(x as f64, y as f64, z as f64)
    }

    /// The opposite side.
    pub fn reverse(&self) -> Side {
        match self {
            Side::Up => Side::Down,
            Side::Down => Side::Up,
            Side::North => Side::South,
            Side::South => Side::North,
            Side::East => Side::West,
            Side::West => Side::East,
        }
    }

    /// Look up the side for a unit grid offset.
    pub fn from_direction(direction: (i32, i32, i32)) -> Option<Side> {
        Side::all().into_iter().find(|s| s.direction() == direction)
    }

    /// Whether two sides lie on the same axis.
    pub fn is_parallel(&self, other: Side) -> bool {
        *self == other || *self == other.reverse()
    }

    /// Bit index in a [`ConnectionMask`].
    pub fn index(&self) -> u8 {
        *self as u8
    }

    /// Single-bit mask value.
    pub fn bit(&self) -> u8 {
        1 << self.index()
    }

    /// Quarter turn about the vertical axis (+90° about +y).
    pub(crate) fn turn_yaw(self) -> Side {
        match self {
            Side::East => Side::North,
            Side::North => Side::West,
            Side::West => Side::South,
            Side::South => Side::East,
            other => other,
        }
    }

    /// Quarter turn about the east-west axis (+90° about +x).
    pub(crate) fn turn_pitch(self) -> Side {
        match self {
            Side::Up => Side::South,
            Side::South => Side::Down,
            Side::Down => Side::North,
            Side::North => Side::Up,
            other => other,
        }
    }

    /// Quarter turn about the north-south axis (+90° about +z).
    pub(crate) fn turn_roll(self) -> Side {
        match self {
            Side::East => Side::Up,
            Side::Up => Side::West,
            Side::West => Side::Down,
            Side::Down => Side::East,
            other => other,
        }
    }
}

/// Which of the six sides of a cell connect to neighboring conduits.
///
/// Stored as a 6-bit value; bit `i` is set when `Side` with index `i` is
/// connected. Always derived from live neighbor state, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct ConnectionMask(u8);

impl ConnectionMask {
    pub const EMPTY: ConnectionMask = ConnectionMask(0);
    pub const ALL: ConnectionMask = ConnectionMask(0b11_1111);
    /// Number of distinct masks.
    pub const COUNT: usize = 64;

    /// Build a mask from raw bits. Returns `None` if any bit above 5 is set.
    pub fn from_bits(bits: u8) -> Option<Self> {
        (bits <= Self::ALL.0).then_some(Self(bits))
    }

    pub fn from_sides<I: IntoIterator<Item = Side>>(sides: I) -> Self {
        sides.into_iter().fold(Self::EMPTY, |mask, side| mask.with(side))
    }

    pub fn bits(&self) -> u8 {
        self.0
    }

    pub fn contains(&self, side: Side) -> bool {
        self.0 & side.bit() != 0
    }

    #[must_use]
    pub fn with(self, side: Side) -> Self {
        Self(self.0 | side.bit())
    }

    pub fn insert(&mut self, side: Side) {
        self.0 |= side.bit();
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Number of connected sides.
    pub fn count(&self) -> u32 {
        self.0.count_ones()
    }

    /// Connected sides in bit order.
    pub fn sides(&self) -> impl Iterator<Item = Side> + '_ {
        Side::all().into_iter().filter(|s| self.contains(*s))
    }

    /// Every possible mask, `0..64`.
    pub fn every() -> impl Iterator<Item = ConnectionMask> {
        (0..Self::COUNT as u8).map(ConnectionMask)
    }
}
