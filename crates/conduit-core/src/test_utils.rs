//! Shared test helpers for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::fixed::Fixed64;
use crate::geometry::{GridPosition, Vec3};
use crate::grid::ConduitSpec;
use crate::id::{ItemId, NodeId};
use crate::item::ItemKind;
use crate::side::Side;

// ===========================================================================
// Fixed-point helper
// ===========================================================================

pub fn fixed(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

// ===========================================================================
// Engine builders
// ===========================================================================

/// An engine with the default config and the given seed.
pub fn engine(seed: u64) -> Engine {
    engine_with(EngineConfig {
        seed,
        ..EngineConfig::default()
    })
}

pub fn engine_with(config: EngineConfig) -> Engine {
    Engine::new(config).unwrap()
}

/// Place `len` conduits in a straight run from `start` toward `direction`.
pub fn place_line(
    engine: &mut Engine,
    start: GridPosition,
    direction: Side,
    len: usize,
) -> Vec<NodeId> {
    let mut nodes = Vec::with_capacity(len);
    let mut position = start;
    for _ in 0..len {
        nodes.push(engine.place_conduit(position).unwrap());
        position = position.offset(direction);
    }
    nodes
}

/// Place a straight run with a uniform friction.
pub fn place_line_with_friction(
    engine: &mut Engine,
    start: GridPosition,
    direction: Side,
    len: usize,
    friction: f64,
) -> Vec<NodeId> {
    let spec = ConduitSpec::with_friction(fixed(friction));
    let mut nodes = Vec::with_capacity(len);
    let mut position = start;
    for _ in 0..len {
        nodes.push(engine.place_conduit_with(position, spec).unwrap());
        position = position.offset(direction);
    }
    nodes
}

// ===========================================================================
// Item helpers
// ===========================================================================

/// Spawn a transportable item at the origin.
pub fn spawn_free(engine: &mut Engine) -> ItemId {
    engine.spawn_item(ItemKind::Transportable, Vec3::ZERO)
}

/// Spawn an item and insert it at `side` of `node` on the first descriptor
/// facing that side.
pub fn insert_new(engine: &mut Engine, node: NodeId, side: Side, speed: f64) -> ItemId {
    let item = spawn_free(engine);
    engine.insert_at(item, node, side, fixed(speed)).unwrap();
    item
}

/// Step until `item` leaves the network. Returns the number of steps run,
/// or `None` if it is still in transit after `max_ticks`.
pub fn run_until_dropped(engine: &mut Engine, item: ItemId, max_ticks: u64) -> Option<u64> {
    for n in 1..=max_ticks {
        engine.step();
        if !engine.item(item)?.in_transit() {
            return Some(n);
        }
    }
    None
}

// ===========================================================================
// Network builders (for benchmarks, stress tests, and proptests)
// ===========================================================================

/// A square loop of `side_len` conduits per edge in the XZ plane. Items
/// inserted into it never reach an end.
pub fn build_loop(engine: &mut Engine, side_len: usize) -> Vec<NodeId> {
    let n = side_len.max(2) as i32;
    let mut nodes = Vec::new();
    for x in 0..n {
        nodes.push(engine.place_conduit(GridPosition::new(x, 0, 0)).unwrap());
    }
    for z in 1..n {
        nodes.push(engine.place_conduit(GridPosition::new(n - 1, 0, z)).unwrap());
    }
    for x in (0..n - 1).rev() {
        nodes.push(engine.place_conduit(GridPosition::new(x, 0, n - 1)).unwrap());
    }
    for z in (1..n - 1).rev() {
        nodes.push(engine.place_conduit(GridPosition::new(0, 0, z)).unwrap());
    }
    nodes
}

/// A flat `size` x `size` mesh of conduits: every interior node is a cross
/// junction.
pub fn build_mesh(engine: &mut Engine, size: usize) -> Vec<NodeId> {
    let n = size as i32;
    let mut nodes = Vec::with_capacity(size * size);
    for x in 0..n {
        for z in 0..n {
            nodes.push(engine.place_conduit(GridPosition::new(x, 0, z)).unwrap());
        }
    }
    nodes
}
