//! The engine: owns the grid, items and collaborators, and runs the tick.
//!
//! # Architecture
//!
//! The `Engine` owns:
//! - A [`SegmentCatalog`] and the [`ConduitGrid`] built on its family
//! - All entities, in a generational `SlotMap<ItemId, TransportableItem>`
//! - A [`SegmentMapper`] carrying the installed routing policy
//! - Suction inlets keyed by their owning conduit
//! - A [`PhysicsBridge`] and a [`Storage`] for hand-offs outside the network
//! - An [`EventBus`] and the [`SimState`] clock
//!
//! # Tick Pipeline
//!
//! Each `step()` runs:
//! 1. **Transport** -- plan and apply item motion (see [`crate::transport`])
//! 2. **Events** -- record junction, drop and deposit events for the tick
//! 3. **Bookkeeping** -- advance the tick counter and recompute the state hash
//!
//! Placement, insertion, drops and suction contacts happen between steps and
//! take effect immediately; items they put into the network first move on
//! the next step.

use crate::config::{ConfigError, EngineConfig};
use crate::descriptor::End;
use crate::event::{Event, EventBus, EventKind, Listener};
use crate::family::{BlockVariant, ConduitFamily, ResolverError};
use crate::fixed::{Fixed64, Ticks, f64_to_fixed64};
use crate::gateway::{self, DropError, InsertError};
use crate::geometry::{GridPosition, Vec3};
use crate::grid::{ConduitGrid, ConduitSpec, GridError, GridTopology, Node};
use crate::id::{ContainerId, DescriptorId, ItemId, NodeId};
use crate::item::{ItemKind, TransportableItem};
use crate::mapper::SegmentMapper;
use crate::physics::{FreeBodyStore, PhysicsBridge};
use crate::rng::SimRng;
use crate::routing::RoutingPolicy;
use crate::segment::SegmentCatalog;
use crate::side::Side;
use crate::sim::{AdvanceResult, SimState, StateHash};
use crate::storage::{ContainerStore, Storage};
use crate::suction::{self, ContactOutcome, SuctionInlet};
use crate::transport::{DropReason, TickReport, TransportSimulator};
use slotmap::{Key, SecondaryMap, SlotMap};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Resolver(#[from] ResolverError),
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct Engine<P: PhysicsBridge = FreeBodyStore, S: Storage = ContainerStore> {
    config: EngineConfig,
    catalog: SegmentCatalog,
    grid: ConduitGrid,
    items: SlotMap<ItemId, TransportableItem>,
    mapper: SegmentMapper,
    simulator: TransportSimulator,
    inlets: SecondaryMap<NodeId, SuctionInlet>,
    /// Stream for suction target picks. Routing owns its own stream.
    rng: SimRng,
    physics: P,
    storage: S,
    pub event_bus: EventBus,
    pub sim_state: SimState,
    paused: bool,
    last_state_hash: u64,
}

impl Engine {
    /// An engine with the standard pipe family and in-process collaborators.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let mut catalog = SegmentCatalog::new();
        let family = ConduitFamily::standard(&mut catalog)?;
        Self::with_parts(
            config,
            catalog,
            family,
            FreeBodyStore::new(),
            ContainerStore::new(),
        )
    }
}

impl<P: PhysicsBridge, S: Storage> Engine<P, S> {
    /// Assemble an engine from content and collaborators.
    pub fn with_parts(
        config: EngineConfig,
        catalog: SegmentCatalog,
        family: ConduitFamily,
        physics: P,
        storage: S,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let simulator = TransportSimulator::new(
            config.dt(),
            config.min_speed(),
            config.max_transitions_per_tick,
        );
        log::info!(
            "engine ready: {} descriptors, family '{}', {} ticks/s",
            catalog.len(),
            family.name(),
            config.tick_rate
        );
        Ok(Self {
            mapper: SegmentMapper::seeded(config.seed),
            rng: SimRng::new(config.seed ^ 0x5EED_5EED_5EED_5EED),
            event_bus: EventBus::new(config.event_capacity),
            catalog,
            grid: ConduitGrid::new(family),
            items: SlotMap::with_key(),
            simulator,
            inlets: SecondaryMap::new(),
            physics,
            storage,
            sim_state: SimState::new(),
            paused: false,
            last_state_hash: 0,
            config,
        })
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn catalog(&self) -> &SegmentCatalog {
        &self.catalog
    }

    pub fn grid(&self) -> &ConduitGrid {
        &self.grid
    }

    pub fn physics(&self) -> &P {
        &self.physics
    }

    pub fn physics_mut(&mut self) -> &mut P {
        &mut self.physics
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn tick(&self) -> Ticks {
        self.sim_state.tick
    }

    pub fn item(&self, id: ItemId) -> Option<&TransportableItem> {
        self.items.get(id)
    }

    pub fn items(&self) -> impl Iterator<Item = (ItemId, &TransportableItem)> + '_ {
        self.items.iter()
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn in_transit_count(&self) -> usize {
        self.items.values().filter(|i| i.in_transit()).count()
    }

    pub fn inlet(&self, node: NodeId) -> Option<&SuctionInlet> {
        self.inlets.get(node)
    }

    /// Replace the junction routing policy.
    pub fn set_routing_policy(&mut self, policy: Box<dyn RoutingPolicy>) {
        log::debug!("routing policy set to {policy:?}");
        self.mapper.set_policy(policy);
    }

    // -----------------------------------------------------------------------
    // Grid
    // -----------------------------------------------------------------------

    /// Place a plain conduit with the configured default friction.
    pub fn place_conduit(&mut self, position: GridPosition) -> Result<NodeId, GridError> {
        self.place_conduit_with(position, ConduitSpec::with_friction(self.config.base_friction()))
    }

    /// Place a conduit. A suction inlet is attached when `spec.suction` is set.
    pub fn place_conduit_with(
        &mut self,
        position: GridPosition,
        spec: ConduitSpec,
    ) -> Result<NodeId, GridError> {
        let anchors = self.anchors_around(position);
        let node = self.grid.place_conduit(position, spec)?;
        self.reanchor(anchors);
        if spec.suction {
            self.inlets
                .insert(node, SuctionInlet::new(node, &self.config.suction));
        }
        self.event_bus.emit(Event::NodePlaced {
            node,
            tick: self.sim_state.tick,
        });
        Ok(node)
    }

    pub fn place_receptacle(
        &mut self,
        position: GridPosition,
        container: ContainerId,
        sides: Vec<Side>,
    ) -> Result<NodeId, GridError> {
        let anchors = self.anchors_around(position);
        let node = self.grid.place_receptacle(position, container, sides)?;
        self.reanchor(anchors);
        self.event_bus.emit(Event::NodePlaced {
            node,
            tick: self.sim_state.tick,
        });
        Ok(node)
    }

    /// Remove a node. Items still on it are dropped on the next step.
    pub fn remove_node(&mut self, node: NodeId) -> Result<Node, GridError> {
        let anchors = self
            .grid
            .node(node)
            .map(|n| self.anchors_around(n.position))
            .unwrap_or_default();
        let removed = self.grid.remove(node)?;
        self.reanchor(anchors);
        self.inlets.remove(node);
        self.event_bus.emit(Event::NodeRemoved {
            node,
            tick: self.sim_state.tick,
        });
        Ok(removed)
    }

    /// World sides of the segments under in-transit items on `position` and
    /// its neighbors, taken before an edit changes their variants.
    fn anchors_around(&self, position: GridPosition) -> Vec<(ItemId, Side, Side)> {
        let mut around: Vec<NodeId> = Side::all()
            .into_iter()
            .filter_map(|side| self.grid.neighbor(position, side))
            .collect();
        around.extend(self.grid.node_at(position));
        self.items
            .iter()
            .filter_map(|(id, item)| {
                let state = item.path?;
                if !around.contains(&state.node) {
                    return None;
                }
                let rotation = self.grid.node(state.node)?.path()?.orientation();
                let descriptor = self.catalog.descriptor(state.descriptor)?;
                Some((
                    id,
                    descriptor.world_side(End::First, rotation),
                    descriptor.world_side(End::Second, rotation),
                ))
            })
            .collect()
    }

    /// Move items whose conduit changed variant onto the descriptor that
    /// covers the same world path. Items with no such descriptor are dropped.
    fn reanchor(&mut self, anchors: Vec<(ItemId, Side, Side)>) {
        for (id, first, second) in anchors {
            let Some(state) = self.items.get(id).and_then(|i| i.path) else {
                continue;
            };
            // A removed host is handled by the next step.
            let Some(path) = self.grid.node(state.node).and_then(|n| n.path()) else {
                continue;
            };
            let rotation = path.orientation();
            let found = path.descriptors().iter().find_map(|d| {
                let descriptor = self.catalog.descriptor(*d)?;
                let sides = (
                    descriptor.world_side(End::First, rotation),
                    descriptor.world_side(End::Second, rotation),
                );
                if sides == (first, second) {
                    Some((*d, false))
                } else if sides == (second, first) {
                    Some((*d, true))
                } else {
                    None
                }
            });
            let Some((descriptor, flipped)) = found else {
                self.drop_stale(id);
                continue;
            };
            let Some(max) = self.catalog.segment(descriptor).map(|s| s.max_distance) else {
                continue;
            };
            if let Some(item) = self.items.get_mut(id)
                && let Some(state) = item.path.as_mut()
            {
                let progress = state.progress.min(max);
                state.descriptor = descriptor;
                if flipped {
                    state.progress = max - progress;
                    state.sign = -state.sign;
                    item.velocity = -item.velocity;
                } else {
                    state.progress = progress;
                }
            }
        }
    }

    fn drop_stale(&mut self, item: ItemId) {
        let now = self.sim_state.tick;
        if let Ok(true) = gateway::drop_item(&mut self.items, &mut self.physics, item, now) {
            log::warn!("item {item:?} lost its segment to a grid edit; dropped");
            self.event_bus.emit(Event::ItemDropped {
                item,
                reason: DropReason::StaleNode,
                tick: now,
            });
        }
    }

    pub fn find_connected_sides(&self, position: GridPosition) -> Vec<Side> {
        self.grid.find_connected_sides(position)
    }

    pub fn variant_for(&self, position: GridPosition) -> BlockVariant {
        self.grid.variant_for(position)
    }

    /// Descriptors of `node` with an endpoint on `side`.
    pub fn descriptors_facing(
        &self,
        node: NodeId,
        side: Side,
    ) -> Result<Vec<DescriptorId>, InsertError> {
        gateway::descriptors_facing(&self.grid, &self.catalog, node, side)
    }

    /// World position of an in-transit item computed from its path state.
    pub fn path_position(&self, item: ItemId) -> Option<Vec3> {
        let state = self.items.get(item)?.path?;
        let node = self.grid.node(state.node)?;
        let rotation = node.path()?.orientation();
        let segment = self.catalog.segment(state.descriptor)?;
        Some(segment.world_point(node.position, rotation, state.progress))
    }

    // -----------------------------------------------------------------------
    // Items
    // -----------------------------------------------------------------------

    /// Create a free entity with a physics body at `position`.
    pub fn spawn_item(&mut self, kind: ItemKind, position: Vec3) -> ItemId {
        let id = self.items.insert(TransportableItem::new(kind, position));
        self.physics.spawn_body(id, position, self.sim_state.tick);
        self.event_bus.emit(Event::ItemSpawned {
            item: id,
            tick: self.sim_state.tick,
        });
        id
    }

    /// Destroy an entity wherever it is. Returns `false` if it did not exist.
    pub fn despawn_item(&mut self, item: ItemId) -> bool {
        if self.items.remove(item).is_none() {
            return false;
        }
        self.physics.destroy_body(item);
        self.event_bus.emit(Event::ItemDespawned {
            item,
            tick: self.sim_state.tick,
        });
        true
    }

    /// Insert a free item at `side` of `node` on `descriptor`.
    pub fn insert(
        &mut self,
        item: ItemId,
        node: NodeId,
        side: Side,
        descriptor: DescriptorId,
        speed: Fixed64,
    ) -> Result<(), InsertError> {
        gateway::insert(
            &mut self.items,
            &self.grid,
            &self.catalog,
            &mut self.physics,
            item,
            node,
            side,
            descriptor,
            speed,
        )?;
        self.event_bus.emit(Event::ItemInserted {
            item,
            node,
            descriptor,
            tick: self.sim_state.tick,
        });
        Ok(())
    }

    /// Insert on the first descriptor of `node` facing `side`.
    pub fn insert_at(
        &mut self,
        item: ItemId,
        node: NodeId,
        side: Side,
        speed: Fixed64,
    ) -> Result<DescriptorId, InsertError> {
        let descriptor = *self
            .descriptors_facing(node, side)?
            .first()
            .ok_or(InsertError::NoDescriptorFacing { node, side })?;
        self.insert(item, node, side, descriptor, speed)?;
        Ok(descriptor)
    }

    /// Take an item out of the network. A no-op for items not in transit.
    pub fn drop_item(&mut self, item: ItemId) -> Result<(), DropError> {
        let now = self.sim_state.tick;
        if gateway::drop_item(&mut self.items, &mut self.physics, item, now)? {
            self.event_bus.emit(Event::ItemDropped {
                item,
                reason: DropReason::Manual,
                tick: now,
            });
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Suction
    // -----------------------------------------------------------------------

    /// A free item touched the conduit `owner` at world `position`.
    ///
    /// Contacts within range are always pushed away from the inlet. Contacts
    /// within capture distance of an idle inlet are inserted into a random
    /// neighboring conduit; only a successful capture starts the cooldown.
    /// A contact that finds no target, or whose insertion is rejected,
    /// leaves the inlet idle rather than cooling it down.
    pub fn on_contact(&mut self, owner: NodeId, item: ItemId, position: Vec3) -> ContactOutcome {
        let now = self.sim_state.tick;
        let Some((range, capture_distance, idle)) = self
            .inlets
            .get(owner)
            .map(|i| (i.range, i.capture_distance, i.is_idle(now)))
        else {
            return ContactOutcome::Ignored;
        };
        let Some(node_position) = self.grid.node(owner).map(|n| n.position) else {
            self.inlets.remove(owner);
            return ContactOutcome::Ignored;
        };
        let center = node_position.center();
        let distance = center.distance(position);
        if distance > range {
            return ContactOutcome::Ignored;
        }
        let within_capture = distance <= capture_distance;

        if let Some(entity) = self.items.get_mut(item)
            && entity.is_free()
        {
            entity.position = position;
            self.physics.set_world_position(item, position);
        }

        let outcome = if !within_capture {
            ContactOutcome::Pushed
        } else if !idle {
            ContactOutcome::CoolingDown
        } else {
            match suction::pick_target(&self.grid, &self.catalog, node_position, &mut self.rng) {
                None => ContactOutcome::NoTarget,
                Some(target) => {
                    let speed = f64_to_fixed64(self.config.suction.insert_speed);
                    match self.insert(item, target.node, target.side, target.descriptor, speed) {
                        Ok(()) => {
                            if let Some(inlet) = self.inlets.get_mut(owner) {
                                inlet.trigger(now);
                            }
                            self.event_bus.emit(Event::SuctionCaptured {
                                inlet: owner,
                                item,
                                node: target.node,
                                tick: now,
                            });
                            log::debug!("inlet {owner:?} captured {item:?} into {:?}", target.node);
                            ContactOutcome::Captured {
                                node: target.node,
                                side: target.side,
                                descriptor: target.descriptor,
                            }
                        }
                        Err(err) => ContactOutcome::Rejected(err),
                    }
                }
            }
        };

        let push = (position - center).normalize_or_zero() * self.config.suction.impulse;
        self.physics.apply_impulse(item, push);
        outcome
    }

    // -----------------------------------------------------------------------
    // Events
    // -----------------------------------------------------------------------

    pub fn suppress_event(&mut self, kind: EventKind) {
        self.event_bus.suppress(kind);
    }

    pub fn on_event(&mut self, kind: EventKind, listener: Listener) {
        self.event_bus.on(kind, listener);
    }

    /// Hand buffered events to listeners and clear the buffers.
    pub fn deliver_events(&mut self) {
        self.event_bus.deliver();
    }

    // -----------------------------------------------------------------------
    // Advance
    // -----------------------------------------------------------------------

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Run one tick. A no-op while paused.
    pub fn step(&mut self) -> TickReport {
        if self.paused {
            return TickReport::default();
        }
        let now = self.sim_state.tick;

        // Phase 1: transport.
        let report = self.simulator.step(
            &mut self.items,
            &self.grid,
            &self.catalog,
            &mut self.mapper,
            &mut self.physics,
            &mut self.storage,
            now,
        );

        // Phase 2: events.
        for (item, mapping) in report.junctions() {
            self.event_bus.emit(Event::JunctionRouted {
                item: *item,
                node: mapping.node,
                direction: mapping.direction,
                candidates: mapping.candidates as u32,
                tick: now,
            });
        }
        for dropped in &report.dropped {
            self.event_bus.emit(Event::ItemDropped {
                item: dropped.item,
                reason: dropped.reason,
                tick: now,
            });
        }
        for (item, container) in &report.deposited {
            self.event_bus.emit(Event::ItemDeposited {
                item: *item,
                container: *container,
                tick: now,
            });
        }

        // Phase 3: bookkeeping.
        self.sim_state.tick += 1;
        self.last_state_hash = self.compute_state_hash();
        log::trace!(
            "tick {now}: {} moved, {} dropped",
            report.moved,
            report.dropped.len()
        );
        report
    }

    /// Run `ticks` steps.
    pub fn run(&mut self, ticks: u64) -> AdvanceResult {
        let mut result = AdvanceResult::default();
        for _ in 0..ticks {
            if self.paused {
                break;
            }
            let report = self.step();
            result.steps_run += 1;
            result.dropped += report.dropped.len();
            result.deposited += report.deposited.len();
        }
        result
    }

    /// Accumulate `elapsed` seconds and run as many whole ticks as fit.
    pub fn advance(&mut self, elapsed: Fixed64) -> AdvanceResult {
        if self.paused {
            return AdvanceResult::default();
        }
        let steps = self.sim_state.accumulate(elapsed, self.simulator.dt);
        self.run(steps)
    }

    // -----------------------------------------------------------------------
    // State hash
    // -----------------------------------------------------------------------

    /// Hash recorded at the end of the most recent step.
    pub fn state_hash(&self) -> u64 {
        self.last_state_hash
    }

    /// Hash of the current tick, items and inlets.
    pub fn compute_state_hash(&self) -> u64 {
        let mut hash = StateHash::new();
        hash.write_u64(self.sim_state.tick);
        hash.write_u64(self.rng.state());
        for (id, item) in &self.items {
            hash.write_u64(id.data().as_ffi());
            hash.write_fixed64(item.velocity);
            hash.write_vec3(item.position);
            match item.path {
                Some(state) => {
                    hash.write_u64(state.node.data().as_ffi());
                    hash.write_u32(state.descriptor.0);
                    hash.write_fixed64(state.progress);
                    hash.write(&[state.sign as u8]);
                }
                None => hash.write(&[0xff]),
            }
            hash.write_u32(item.stored_in.map_or(u32::MAX, |c| c.0));
        }
        for (node, inlet) in &self.inlets {
            hash.write_u64(node.data().as_ffi());
            hash.write_u64(inlet.last_trigger.unwrap_or(u64::MAX));
        }
        hash.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;
    use crate::routing::FirstCandidate;

    fn engine() -> Engine {
        Engine::new(EngineConfig::default()).unwrap()
    }

    fn line(engine: &mut Engine, xs: std::ops::RangeInclusive<i32>) -> Vec<NodeId> {
        xs.map(|x| engine.place_conduit(GridPosition::new(x, 0, 0)).unwrap())
            .collect()
    }

    // -----------------------------------------------------------------------
    // Test 1: invalid config rejected
    // -----------------------------------------------------------------------
    #[test]
    fn invalid_config_rejected() {
        let config = EngineConfig {
            tick_rate: 0,
            ..EngineConfig::default()
        };
        assert!(matches!(
            Engine::new(config),
            Err(EngineError::Config(ConfigError::ZeroTickRate))
        ));
    }

    // -----------------------------------------------------------------------
    // Test 2: spawn, insert, step, drop emit events
    // -----------------------------------------------------------------------
    #[test]
    fn item_lifecycle_events() {
        let mut e = engine();
        let nodes = line(&mut e, 0..=1);
        let item = e.spawn_item(ItemKind::Transportable, Vec3::new(-0.5, 0.0, 0.0));
        assert!(e.physics().body(item).is_some());

        e.insert_at(item, nodes[0], Side::West, Fixed64::from_num(1))
            .unwrap();
        assert!(e.physics().body(item).is_none());
        assert_eq!(e.in_transit_count(), 1);

        e.step();
        e.drop_item(item).unwrap();
        assert!(e.physics().body(item).is_some());

        assert_eq!(e.event_bus.count(EventKind::ItemSpawned), 1);
        assert_eq!(e.event_bus.count(EventKind::ItemInserted), 1);
        let dropped: Vec<&Event> = e.event_bus.events(EventKind::ItemDropped).collect();
        assert!(matches!(
            dropped[0],
            Event::ItemDropped {
                reason: DropReason::Manual,
                ..
            }
        ));
        assert_eq!(e.event_bus.count(EventKind::NodePlaced), 2);
    }

    // -----------------------------------------------------------------------
    // Test 3: path position matches stored position
    // -----------------------------------------------------------------------
    #[test]
    fn path_position_tracks_item() {
        let mut e = engine();
        let nodes = line(&mut e, 0..=3);
        let item = e.spawn_item(ItemKind::Transportable, Vec3::ZERO);
        e.insert_at(item, nodes[0], Side::West, Fixed64::from_num(2))
            .unwrap();
        for _ in 0..30 {
            e.step();
            let stored = e.item(item).unwrap().position;
            assert!(e.path_position(item).unwrap().approx_eq(stored, 1e-9));
        }
    }

    // -----------------------------------------------------------------------
    // Test 4: removing a node drops its items next tick
    // -----------------------------------------------------------------------
    #[test]
    fn removal_drops_items_as_stale() {
        let mut e = engine();
        let nodes = line(&mut e, 0..=2);
        let item = e.spawn_item(ItemKind::Transportable, Vec3::ZERO);
        e.insert_at(item, nodes[1], Side::West, Fixed64::from_num(0.5))
            .unwrap();
        e.step();
        e.remove_node(nodes[1]).unwrap();
        let report = e.step();
        assert_eq!(report.dropped[0].reason, DropReason::StaleNode);
        assert!(e.item(item).unwrap().is_free());
    }

    // -----------------------------------------------------------------------
    // Test 5: a variant change keeps items on the same world path
    // -----------------------------------------------------------------------
    #[test]
    fn neighbor_edit_reanchors_items() {
        let mut e = engine();
        let nodes = line(&mut e, 0..=2);
        let item = e.spawn_item(ItemKind::Transportable, Vec3::ZERO);
        e.insert_at(item, nodes[1], Side::West, Fixed64::from_num(0.5))
            .unwrap();
        e.run(20);
        let before = e.item(item).unwrap().position;

        // The middle conduit becomes a T junction.
        e.place_conduit(GridPosition::new(1, 0, -1)).unwrap();
        assert!(e.item(item).unwrap().in_transit());
        assert!(e.path_position(item).unwrap().approx_eq(before, 1e-6));

        e.run(600);
        let end = e.item(item).unwrap().position;
        assert!(end.approx_eq(Vec3::new(2.5, 0.0, 0.0), 1e-9), "{end:?}");
    }

    // -----------------------------------------------------------------------
    // Test 6: pause stops time
    // -----------------------------------------------------------------------
    #[test]
    fn pause_and_advance() {
        let mut e = engine();
        e.pause();
        assert_eq!(e.advance(Fixed64::from_num(1)).steps_run, 0);
        assert_eq!(e.tick(), 0);
        e.resume();
        assert_eq!(e.advance(Fixed64::from_num(0.5)).steps_run, 30);
        assert_eq!(e.tick(), 30);
    }

    // -----------------------------------------------------------------------
    // Test 7: identical engines hash identically
    // -----------------------------------------------------------------------
    #[test]
    fn deterministic_hash() {
        let run = || {
            let mut e = engine();
            let nodes = line(&mut e, -2..=2);
            e.place_conduit(GridPosition::new(0, 1, 0)).unwrap();
            for _ in 0..5 {
                let item = e.spawn_item(ItemKind::Transportable, Vec3::ZERO);
                e.insert_at(item, nodes[0], Side::West, Fixed64::from_num(3))
                    .unwrap();
                e.run(7);
            }
            e.state_hash()
        };
        assert_eq!(run(), run());
    }

    // -----------------------------------------------------------------------
    // Test 8: suction inlet follows its node
    // -----------------------------------------------------------------------
    #[test]
    fn inlet_lifecycle() {
        let mut e = engine();
        let spec = ConduitSpec::with_friction(e.config().base_friction()).suction();
        let node = e.place_conduit_with(GridPosition::new(0, 0, 0), spec).unwrap();
        assert!(e.inlet(node).is_some());
        e.remove_node(node).unwrap();
        assert!(e.inlet(node).is_none());
        let item = e.spawn_item(ItemKind::Transportable, Vec3::ZERO);
        assert_eq!(e.on_contact(node, item, Vec3::ZERO), ContactOutcome::Ignored);
    }

    #[test]
    fn contact_without_target_keeps_inlet_idle() {
        let mut e = engine();
        let spec = ConduitSpec::with_friction(e.config().base_friction()).suction();
        let node = e.place_conduit_with(GridPosition::new(0, 0, 0), spec).unwrap();
        let item = e.spawn_item(ItemKind::Transportable, Vec3::ZERO);
        assert_eq!(
            e.on_contact(node, item, Vec3::new(0.2, 0.0, 0.0)),
            ContactOutcome::NoTarget
        );
        assert!(e.inlet(node).unwrap().is_idle(e.tick()));
        assert!(e.item(item).unwrap().is_free());
    }

    // -----------------------------------------------------------------------
    // Test 9: despawn removes everywhere
    // -----------------------------------------------------------------------
    #[test]
    fn despawn_in_transit() {
        let mut e = engine();
        e.set_routing_policy(Box::new(FirstCandidate));
        let nodes = line(&mut e, 0..=1);
        let item = e.spawn_item(ItemKind::Transportable, Vec3::ZERO);
        e.insert_at(item, nodes[0], Side::West, Fixed64::from_num(1))
            .unwrap();
        assert!(e.despawn_item(item));
        assert!(!e.despawn_item(item));
        assert_eq!(e.in_transit_count(), 0);
        assert_eq!(e.step(), TickReport::default());
    }
}
