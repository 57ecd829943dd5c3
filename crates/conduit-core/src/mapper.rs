//! Segment mapping: which descriptor an item continues on after leaving one.
//!
//! Given the current node, descriptor and the endpoint the item leaves
//! through, the mapper finds the adjacent node on that face and every
//! descriptor there with an endpoint facing back. One candidate is taken
//! directly; several are resolved by the installed [`RoutingPolicy`].
//! Candidates are collected as a list, so a descriptor with both endpoints
//! on the shared face contributes two.

use crate::descriptor::End;
use crate::grid::GridTopology;
use crate::id::{DescriptorId, NodeId};
use crate::item::PathState;
use crate::routing::{RoutingCandidate, RoutingPolicy, RoutingQuery, UniformRandom};
use crate::segment::SegmentCatalog;
use crate::side::Side;

/// The segment an item continues on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mapping {
    pub node: NodeId,
    pub descriptor: DescriptorId,
    pub entry: End,
    /// World side the item will be heading toward.
    pub direction: Side,
    /// How many candidates were available; above one means a junction.
    pub candidates: usize,
}

#[derive(Debug)]
pub struct SegmentMapper {
    policy: Box<dyn RoutingPolicy>,
}

impl SegmentMapper {
    pub fn new(policy: Box<dyn RoutingPolicy>) -> Self {
        Self { policy }
    }

    /// Mapper with uniform random routing.
    pub fn seeded(seed: u64) -> Self {
        Self::new(Box::new(UniformRandom::new(seed)))
    }

    pub fn set_policy(&mut self, policy: Box<dyn RoutingPolicy>) {
        self.policy = policy;
    }

    pub fn policy(&self) -> &dyn RoutingPolicy {
        self.policy.as_ref()
    }

    /// World side an item leaves through when exiting `state` at `end`.
    pub fn exit_side<T: GridTopology + ?Sized>(
        topology: &T,
        catalog: &SegmentCatalog,
        state: &PathState,
        end: End,
    ) -> Option<Side> {
        let node = topology.node(state.node)?;
        let path = node.path()?;
        let descriptor = catalog.descriptor(state.descriptor)?;
        Some(descriptor.world_side(end, path.orientation()))
    }

    /// Every way an item leaving `state` through `end` can continue.
    pub fn candidates<T: GridTopology + ?Sized>(
        topology: &T,
        catalog: &SegmentCatalog,
        state: &PathState,
        end: End,
    ) -> Vec<RoutingCandidate> {
        let Some(exit) = Self::exit_side(topology, catalog, state, end) else {
            return Vec::new();
        };
        let Some(position) = topology.node(state.node).map(|n| n.position) else {
            return Vec::new();
        };
        let Some(next_id) = topology.neighbor(position, exit) else {
            return Vec::new();
        };
        let Some(next) = topology.node(next_id).and_then(|n| n.path()) else {
            return Vec::new();
        };

        let rotation = next.orientation();
        let facing = exit.reverse();
        let mut candidates = Vec::new();
        for id in next.descriptors() {
            let Some(descriptor) = catalog.descriptor(*id) else {
                continue;
            };
            for entry in [End::First, End::Second] {
                if descriptor.world_side(entry, rotation) == facing {
                    candidates.push(RoutingCandidate {
                        direction: descriptor.world_side(entry.other(), rotation),
                        descriptor: *id,
                        node: next_id,
                        entry,
                    });
                }
            }
        }
        candidates
    }

    /// Choose the next segment, consulting the policy at junctions.
    /// `None` means the item has reached the end of the network.
    pub fn next_segment<T: GridTopology + ?Sized>(
        &mut self,
        topology: &T,
        catalog: &SegmentCatalog,
        state: &PathState,
        end: End,
    ) -> Option<Mapping> {
        let candidates = Self::candidates(topology, catalog, state, end);
        let count = candidates.len();
        let chosen = match count {
            0 => return None,
            1 => candidates[0],
            _ => {
                let mut query = RoutingQuery::new(candidates)?;
                self.policy.route(&mut query);
                *query.chosen()
            }
        };
        Some(Mapping {
            node: chosen.node,
            descriptor: chosen.descriptor,
            entry: chosen.entry,
            direction: chosen.direction,
            candidates: count,
        })
    }
}

impl Default for SegmentMapper {
    fn default() -> Self {
        Self::seeded(0)
    }
}
