//! The 24 proper rotations of a cube.
//!
//! A [`Rotation`] is stored as the images of the three positive axes
//! (east, up, south). That representation is unique, so two rotations built
//! from different yaw/pitch/roll combinations compare equal exactly when they
//! act identically on every side.

use crate::geometry::Vec3;
use crate::side::{ConnectionMask, Side};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rotation {
    /// Image of +x (east).
    x: Side,
    /// Image of +y (up).
    y: Side,
    /// Image of +z (south).
    z: Side,
}

impl Default for Rotation {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Rotation {
    pub const IDENTITY: Rotation = Rotation {
        x: Side::East,
        y: Side::Up,
        z: Side::South,
    };

    /// Build a rotation from quarter turns. Roll is applied first, then
    /// pitch, then yaw. Each count is taken modulo four.
    pub fn from_quarters(yaw: u8, pitch: u8, roll: u8) -> Self {
        let turn = |side: Side| {
            let mut s = side;
            for _ in 0..roll % 4 {
                s = s.turn_roll();
            }
            for _ in 0..pitch % 4 {
                s = s.turn_pitch();
            }
            for _ in 0..yaw % 4 {
                s = s.turn_yaw();
            }
            s
        };
        Self {
            x: turn(Side::East),
            y: turn(Side::Up),
            z: turn(Side::South),
        }
    }

    /// All 24 distinct rotations, identity first.
    pub fn all() -> Vec<Rotation> {
        let mut result: Vec<Rotation> = Vec::with_capacity(24);
        for yaw in 0..4 {
            for pitch in 0..4 {
                for roll in 0..4 {
                    let r = Rotation::from_quarters(yaw, pitch, roll);
                    if !result.contains(&r) {
                        result.push(r);
                    }
                }
            }
        }
        result
    }

    /// Rotate a side.
    pub fn rotate(&self, side: Side) -> Side {
        match side {
            Side::East => self.x,
            Side::West => self.x.reverse(),
            Side::Up => self.y,
            Side::Down => self.y.reverse(),
            Side::South => self.z,
            Side::North => self.z.reverse(),
        }
    }

    /// Rotate every side in a mask.
    pub fn rotate_mask(&self, mask: ConnectionMask) -> ConnectionMask {
        ConnectionMask::from_sides(mask.sides().map(|s| self.rotate(s)))
    }

    /// Rotate a local-space vector about the cell center.
    pub fn rotate_vec(&self, v: Vec3) -> Vec3 {
        self.x.unit() * v.x + self.y.unit() * v.y + self.z.unit() * v.z
    }

    /// The rotation that undoes this one.
    pub fn inverse(&self) -> Rotation {
        // The inverse maps each image back to its axis; find which axis lands on +x/+y/+z.
        let preimage = |target: Side| {
            Side::all()
                .into_iter()
                .find(|s| self.rotate(*s) == target)
                .unwrap_or(target)
        };
        Rotation {
            x: preimage(Side::East),
            y: preimage(Side::Up),
            z: preimage(Side::South),
        }
    }
}
