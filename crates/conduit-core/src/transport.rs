//! The transport simulator: per-tick motion of in-transit items.
//!
//! Each tick runs in two phases. The **plan** phase snapshots the ids of
//! every in-transit item and computes an [`Outcome`] for each from read-only
//! grid and catalog state. The **apply** phase then writes the outcomes back,
//! dropping items that left the network and handing them to receptacles.
//! Items inserted while the apply phase runs are not part of the snapshot, so
//! they first move on the following tick.
//!
//! Motion per item and tick:
//!
//! 1. Speed decays by `friction * dt` and is floored at the minimum speed.
//! 2. Progress advances by `speed * dt` in the travel direction.
//! 3. Distance past a segment end carries into the next segment chosen by
//!    the [`SegmentMapper`], up to a bounded number of transitions per tick.
//! 4. With no next segment the item is dropped at the terminal point.

use crate::fixed::{Fixed64, Ticks};
use crate::gateway;
use crate::geometry::Vec3;
use crate::grid::{GridTopology, Node};
use crate::id::{ContainerId, ItemId, NodeId};
use crate::item::{PathState, TransportableItem};
use crate::mapper::{Mapping, SegmentMapper};
use crate::physics::PhysicsBridge;
use crate::segment::SegmentCatalog;
use crate::side::Side;
use crate::storage::Storage;
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Why an item left the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DropReason {
    /// No segment continues past the endpoint.
    EndOfNetwork,
    /// The node the item was on no longer exists or no longer carries its
    /// segment.
    StaleNode,
    /// Requested through the gateway.
    Manual,
}

/// A receptacle that should receive an item dropped beside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandOff {
    pub node: NodeId,
    pub container: ContainerId,
}

/// The planned result of one tick for one item.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Moved {
        state: PathState,
        velocity: Fixed64,
        position: Vec3,
        transitions: Vec<Mapping>,
    },
    Dropped {
        position: Vec3,
        reason: DropReason,
        hand_off: Option<HandOff>,
        transitions: Vec<Mapping>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DroppedItem {
    pub item: ItemId,
    pub reason: DropReason,
    pub position: Vec3,
}

/// What happened during one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub moved: usize,
    /// Every segment change, in processing order.
    pub transitions: Vec<(ItemId, Mapping)>,
    pub dropped: Vec<DroppedItem>,
    pub deposited: Vec<(ItemId, ContainerId)>,
}

impl TickReport {
    /// Transitions that went through a junction.
    pub fn junctions(&self) -> impl Iterator<Item = &(ItemId, Mapping)> + '_ {
        self.transitions.iter().filter(|(_, m)| m.candidates > 1)
    }
}

// ---------------------------------------------------------------------------
// Simulator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransportSimulator {
    /// Seconds per tick.
    pub dt: Fixed64,
    /// Speed floor for items in transit.
    pub min_speed: Fixed64,
    /// Segment changes allowed per item per tick.
    pub max_transitions: u32,
}

impl TransportSimulator {
    pub fn new(dt: Fixed64, min_speed: Fixed64, max_transitions: u32) -> Self {
        Self {
            dt,
            min_speed: min_speed.max(Fixed64::ZERO),
            max_transitions,
        }
    }

    /// Speed after one tick of friction, floored at the minimum.
    pub fn decayed_speed(&self, velocity: Fixed64, friction: Fixed64) -> Fixed64 {
        velocity
            .saturating_abs()
            .saturating_sub(friction * self.dt)
            .max(self.min_speed)
    }

    /// Plan one tick for an item. `None` if the item is not in transit.
    pub fn plan<T: GridTopology + ?Sized>(
        &self,
        topology: &T,
        catalog: &SegmentCatalog,
        mapper: &mut SegmentMapper,
        item: &TransportableItem,
    ) -> Option<Outcome> {
        let mut state = item.path?;
        let stale = |transitions: Vec<Mapping>| Outcome::Dropped {
            position: item.position,
            reason: DropReason::StaleNode,
            hand_off: None,
            transitions,
        };

        let Some(friction) = topology
            .node(state.node)
            .and_then(|n| n.conduit())
            .filter(|c| c.descriptors.contains(&state.descriptor))
            .map(|c| c.friction)
        else {
            return Some(stale(Vec::new()));
        };
        let speed = self.decayed_speed(item.velocity, friction);
        let mut remaining = speed * self.dt;
        let mut transitions: Vec<Mapping> = Vec::new();

        loop {
            let (Some(host), Some(segment)) =
                (topology.node(state.node), catalog.segment(state.descriptor))
            else {
                return Some(stale(transitions));
            };
            let rotation = host.path().map(|p| p.orientation()).unwrap_or_default();
            let target = state.progress.saturating_add(remaining * state.direction());

            if target >= Fixed64::ZERO && target <= segment.max_distance {
                state.progress = target;
                return Some(Outcome::Moved {
                    position: segment.world_point(host.position, rotation, target),
                    velocity: speed * state.direction(),
                    state,
                    transitions,
                });
            }

            let end = state.heading();
            let end_progress = segment.progress_at(end);
            if transitions.len() as u32 >= self.max_transitions {
                // Park at the endpoint; the crossing happens next tick.
                state.progress = end_progress;
                return Some(Outcome::Moved {
                    position: segment.world_point(host.position, rotation, end_progress),
                    velocity: speed * state.direction(),
                    state,
                    transitions,
                });
            }

            match mapper.next_segment(topology, catalog, &state, end) {
                Some(mapping) => {
                    let Some(next) = catalog.segment(mapping.descriptor) else {
                        return Some(stale(transitions));
                    };
                    remaining = target.saturating_sub(end_progress).saturating_abs();
                    state = PathState::entering(mapping.node, mapping.descriptor, mapping.entry, next);
                    transitions.push(mapping);
                }
                None => {
                    let hand_off = SegmentMapper::exit_side(topology, catalog, &state, end)
                        .and_then(|exit| receptacle_beyond(topology, host, exit));
                    return Some(Outcome::Dropped {
                        position: segment.world_point(host.position, rotation, end_progress),
                        reason: DropReason::EndOfNetwork,
                        hand_off,
                        transitions,
                    });
                }
            }
        }
    }

    /// Advance every in-transit item by one tick.
    #[allow(clippy::too_many_arguments)]
    pub fn step<T, P, S>(
        &self,
        items: &mut SlotMap<ItemId, TransportableItem>,
        topology: &T,
        catalog: &SegmentCatalog,
        mapper: &mut SegmentMapper,
        physics: &mut P,
        storage: &mut S,
        now: Ticks,
    ) -> TickReport
    where
        T: GridTopology + ?Sized,
        P: PhysicsBridge + ?Sized,
        S: Storage + ?Sized,
    {
        // Phase 1: plan against a snapshot of in-transit ids.
        let snapshot: Vec<ItemId> = items
            .iter()
            .filter(|(_, item)| item.in_transit())
            .map(|(id, _)| id)
            .collect();
        let mut pending = Vec::with_capacity(snapshot.len());
        for id in snapshot {
            if let Some(outcome) = items
                .get(id)
                .and_then(|item| self.plan(topology, catalog, mapper, item))
            {
                pending.push((id, outcome));
            }
        }

        // Phase 2: apply.
        let mut report = TickReport::default();
        for (id, outcome) in pending {
            match outcome {
                Outcome::Moved {
                    state,
                    velocity,
                    position,
                    transitions,
                } => {
                    if let Some(item) = items.get_mut(id) {
                        item.path = Some(state);
                        item.velocity = velocity;
                        item.position = position;
                    }
                    report.moved += 1;
                    report
                        .transitions
                        .extend(transitions.into_iter().map(|m| (id, m)));
                }
                Outcome::Dropped {
                    position,
                    reason,
                    hand_off,
                    transitions,
                } => {
                    report
                        .transitions
                        .extend(transitions.into_iter().map(|m| (id, m)));
                    if reason == DropReason::StaleNode {
                        log::warn!("item {id:?} lost its segment; dropping at {position:?}");
                    }
                    if let Some(item) = items.get_mut(id) {
                        item.position = position;
                    }
                    if !matches!(gateway::drop_item(items, physics, id, now), Ok(true)) {
                        continue;
                    }
                    report.dropped.push(DroppedItem {
                        item: id,
                        reason,
                        position,
                    });

                    if let Some(hand_off) = hand_off {
                        if storage.try_deposit(hand_off.container, id) {
                            physics.destroy_body(id);
                            if let Some(item) = items.get_mut(id) {
                                item.stored_in = Some(hand_off.container);
                            }
                            log::debug!("item {id:?} deposited into {:?}", hand_off.container);
                            report.deposited.push((id, hand_off.container));
                        }
                    }
                }
            }
        }
        report
    }
}

/// The receptacle past `exit` of `host`, if it accepts items from that face.
fn receptacle_beyond<T: GridTopology + ?Sized>(
    topology: &T,
    host: &Node,
    exit: Side,
) -> Option<HandOff> {
    let id = topology.neighbor(host.position, exit)?;
    let receptacle = topology.node(id)?.receptacle()?;
    receptacle.accepts(exit.reverse()).then_some(HandOff {
        node: id,
        container: receptacle.container,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
