//! Orientation-independent definitions of routable shapes through a cell.

use crate::fixed::Fixed64;
use crate::geometry::Vec3;
use crate::rotation::Rotation;
use crate::side::Side;
use serde::{Deserialize, Serialize};

/// One of the two named endpoints of a path descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum End {
    /// Progress 0.
    First,
    /// Progress `max_distance`.
    Second,
}

impl End {
    pub fn other(self) -> End {
        match self {
            End::First => End::Second,
            End::Second => End::First,
        }
    }

    /// The end an item travelling with velocity of this sign is heading for.
    pub fn ahead(velocity: Fixed64) -> End {
        if velocity < Fixed64::ZERO {
            End::First
        } else {
            End::Second
        }
    }

    /// Travel sign for an item that enters at this end.
    pub fn entry_sign(self) -> i8 {
        match self {
            End::First => 1,
            End::Second => -1,
        }
    }
}

/// A local (pre-rotation) endpoint: the face it sits on plus an offset from
/// that face's center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    pub side: Side,
    #[serde(default)]
    pub offset: Vec3,
}

impl Endpoint {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            offset: Vec3::ZERO,
        }
    }

    /// Local position relative to the cell center.
    pub fn local_point(&self) -> Vec3 {
        self.side.unit() * 0.5 + self.offset
    }
}

/// An immutable routable shape through a node with two named endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathDescriptor {
    pub name: String,
    pub first: Endpoint,
    pub second: Endpoint,
}

impl PathDescriptor {
    pub fn new(name: &str, first: Endpoint, second: Endpoint) -> Self {
        Self {
            name: name.to_string(),
            first,
            second,
        }
    }

    /// A descriptor between the centers of two faces.
    pub fn between(name: &str, first: Side, second: Side) -> Self {
        Self::new(name, Endpoint::new(first), Endpoint::new(second))
    }

    pub fn endpoint(&self, end: End) -> &Endpoint {
        match end {
            End::First => &self.first,
            End::Second => &self.second,
        }
    }

    /// The world side an endpoint faces once the host node's rotation is applied.
    pub fn world_side(&self, end: End, rotation: Rotation) -> Side {
        rotation.rotate(self.endpoint(end).side)
    }

    /// The endpoint whose world side equals `side`, preferring the first.
    pub fn end_facing(&self, side: Side, rotation: Rotation) -> Option<End> {
        [End::First, End::Second]
            .into_iter()
            .find(|end| self.world_side(*end, rotation) == side)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_other() {
        assert_eq!(End::First.other(), End::Second);
        assert_eq!(End::Second.other(), End::First);
    }

    #[test]
    fn end_ahead_follows_sign() {
        assert_eq!(End::ahead(Fixed64::from_num(1)), End::Second);
        assert_eq!(End::ahead(Fixed64::from_num(-1)), End::First);
    }

    #[test]
    fn endpoint_local_point_on_face() {
        let e = Endpoint::new(Side::East);
        assert!(e.local_point().approx_eq(Vec3::new(0.5, 0.0, 0.0), 1e-12));
    }

    #[test]
    fn world_side_applies_rotation() {
        let d = PathDescriptor::between("line", Side::North, Side::South);
        let yaw = Rotation::from_quarters(1, 0, 0);
        assert_eq!(d.world_side(End::First, yaw), yaw.rotate(Side::North));
        assert_eq!(d.world_side(End::Second, Rotation::IDENTITY), Side::South);
    }

    #[test]
    fn end_facing_finds_matching_end() {
        let d = PathDescriptor::between("corner", Side::West, Side::North);
        assert_eq!(d.end_facing(Side::North, Rotation::IDENTITY), Some(End::Second));
        assert_eq!(d.end_facing(Side::Up, Rotation::IDENTITY), None);
    }
}
