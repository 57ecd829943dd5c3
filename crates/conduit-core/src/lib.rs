//! Conduit Core -- a deterministic pipe-network transport engine.
//!
//! Items travel along continuous segments inside grid-placed conduit blocks.
//! Each block's shape and orientation follow from which neighbors it
//! connects to; each shape carries path descriptors whose endpoints sit on
//! block faces. Items keep their momentum across block boundaries, pick an
//! exit at junctions through a pluggable routing policy, and fall out of the
//! network where it ends.
//!
//! # Tick Pipeline
//!
//! Each call to [`engine::Engine::step`] advances the simulation by one tick:
//!
//! 1. **Transport** -- Plan every in-transit item against a snapshot, then
//!    apply moves, drops and deposits.
//! 2. **Events** -- Record junction, drop and deposit events.
//! 3. **Bookkeeping** -- Increment the tick counter and compute the state hash.
//!
//! # Getting Items Into the Network
//!
//! ```rust,ignore
//! let mut engine = Engine::new(EngineConfig::default())?;
//! let a = engine.place_conduit(GridPosition::new(0, 0, 0))?;
//! engine.place_conduit(GridPosition::new(1, 0, 0))?;
//! let item = engine.spawn_item(ItemKind::Transportable, Vec3::ZERO);
//! engine.insert_at(item, a, Side::West, Fixed64::from_num(1))?;
//! engine.step();
//! ```
//!
//! # Key Types
//!
//! - [`engine::Engine`] -- Owns the grid, items and collaborators.
//! - [`family::ConduitFamily`] -- Resolves a connection mask to a shape and
//!   rotation.
//! - [`segment::SegmentCatalog`] -- Path descriptors and their lazily built
//!   segments.
//! - [`mapper::SegmentMapper`] -- Finds the segment that continues a path.
//! - [`routing::RoutingPolicy`] -- Chooses between candidates at a junction.
//! - [`transport::TransportSimulator`] -- Per-tick motion with friction.
//! - [`gateway`] -- Insertion into and removal from the network.
//! - [`suction::SuctionInlet`] -- Captures free items on contact.
//! - [`fixed::Fixed64`] -- Q32.32 fixed-point type for deterministic math.

pub mod config;
pub mod descriptor;
pub mod engine;
pub mod event;
pub mod family;
pub mod fixed;
pub mod gateway;
pub mod geometry;
pub mod grid;
pub mod id;
pub mod item;
pub mod mapper;
pub mod physics;
pub mod rng;
pub mod rotation;
pub mod routing;
pub mod segment;
pub mod side;
pub mod sim;
pub mod storage;
pub mod suction;
pub mod transport;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
