//! Bridge to the free-body physics world.
//!
//! Items outside the network are owned by physics. The engine only needs to
//! hand items over (spawn a body on drop, destroy it on insertion), move them
//! and push them; [`FreeBodyStore`] is a minimal in-process implementation.

use crate::fixed::Ticks;
use crate::geometry::Vec3;
use crate::id::ItemId;
use serde::{Deserialize, Serialize};
use slotmap::SecondaryMap;

pub trait PhysicsBridge {
    /// Give `item` a free body at `position`, remembering when it was dropped.
    fn spawn_body(&mut self, item: ItemId, position: Vec3, dropped_at: Ticks);
    /// Remove the free body, if any.
    fn destroy_body(&mut self, item: ItemId);
    fn set_world_position(&mut self, item: ItemId, position: Vec3);
    fn apply_impulse(&mut self, item: ItemId, impulse: Vec3);
}

/// A free body as tracked by [`FreeBodyStore`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FreeBody {
    pub position: Vec3,
    pub dropped_at: Ticks,
    /// Sum of impulses applied since the body was spawned.
    pub impulse: Vec3,
}

#[derive(Debug, Default)]
pub struct FreeBodyStore {
    bodies: SecondaryMap<ItemId, FreeBody>,
}

impl FreeBodyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn body(&self, item: ItemId) -> Option<&FreeBody> {
        self.bodies.get(item)
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }
}

impl PhysicsBridge for FreeBodyStore {
    fn spawn_body(&mut self, item: ItemId, position: Vec3, dropped_at: Ticks) {
        self.bodies.insert(
            item,
            FreeBody {
                position,
                dropped_at,
                impulse: Vec3::ZERO,
            },
        );
    }

    fn destroy_body(&mut self, item: ItemId) {
        self.bodies.remove(item);
    }

    fn set_world_position(&mut self, item: ItemId, position: Vec3) {
        if let Some(body) = self.bodies.get_mut(item) {
            body.position = position;
        }
    }

    fn apply_impulse(&mut self, item: ItemId, impulse: Vec3) {
        if let Some(body) = self.bodies.get_mut(item) {
            body.impulse = body.impulse + impulse;
        }
    }
}
