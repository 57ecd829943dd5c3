//! Suction inlets: capture free items that touch a conduit and push them in.
//!
//! An inlet belongs to one conduit node. It is idle until a capture succeeds,
//! then cools down for a fixed number of ticks. Contacts closer than the
//! capture distance pick a neighboring conduit uniformly at random, then a
//! descriptor on that conduit with an endpoint facing the inlet, and insert
//! the item there.

use crate::config::SuctionConfig;
use crate::fixed::Ticks;
use crate::gateway::{InsertError, descriptors_facing};
use crate::geometry::GridPosition;
use crate::grid::GridTopology;
use crate::id::{DescriptorId, NodeId};
use crate::rng::SimRng;
use crate::segment::SegmentCatalog;
use crate::side::Side;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SuctionState {
    Idle,
    CoolingDown { until: Ticks },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuctionInlet {
    pub owner: NodeId,
    /// Contacts farther than this from the inlet center are ignored.
    pub range: f64,
    /// Contacts at or within this distance are captured.
    pub capture_distance: f64,
    pub cooldown_ticks: Ticks,
    pub last_trigger: Option<Ticks>,
}

impl SuctionInlet {
    pub fn new(owner: NodeId, config: &SuctionConfig) -> Self {
        Self {
            owner,
            range: config.range,
            capture_distance: config.capture_distance,
            cooldown_ticks: config.cooldown_ticks,
            last_trigger: None,
        }
    }

    pub fn state(&self, now: Ticks) -> SuctionState {
        match self.last_trigger {
            Some(at) if now < at.saturating_add(self.cooldown_ticks) => SuctionState::CoolingDown {
                until: at.saturating_add(self.cooldown_ticks),
            },
            _ => SuctionState::Idle,
        }
    }

    pub fn is_idle(&self, now: Ticks) -> bool {
        self.state(now) == SuctionState::Idle
    }

    /// Start the cooldown.
    pub fn trigger(&mut self, now: Ticks) {
        self.last_trigger = Some(now);
    }
}

/// Result of a contact with an inlet.
#[derive(Debug, Clone, PartialEq)]
pub enum ContactOutcome {
    /// No inlet on the node, or the contact was beyond range.
    Ignored,
    /// Within range but outside capture distance; only pushed.
    Pushed,
    CoolingDown,
    /// No neighboring conduit offers a descriptor facing the inlet.
    NoTarget,
    Rejected(InsertError),
    Captured {
        node: NodeId,
        side: Side,
        descriptor: DescriptorId,
    },
}

/// Where a captured item goes in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureTarget {
    pub node: NodeId,
    /// The side of `node` that faces the inlet.
    pub side: Side,
    pub descriptor: DescriptorId,
}

/// Pick a neighbor conduit of `inlet`, then a descriptor on it facing back.
pub fn pick_target<T: GridTopology + ?Sized>(
    topology: &T,
    catalog: &SegmentCatalog,
    inlet: GridPosition,
    rng: &mut SimRng,
) -> Option<CaptureTarget> {
    let neighbors = topology.path_neighbors(inlet);
    let (toward, node) = *rng.pick(&neighbors)?;
    let side = toward.reverse();
    let facing = descriptors_facing(topology, catalog, node, side).ok()?;
    let descriptor = *rng.pick(&facing)?;
    Some(CaptureTarget {
        node,
        side,
        descriptor,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::family::ConduitFamily;
    use crate::fixed::Fixed64;
    use crate::grid::{ConduitGrid, ConduitSpec};
    use slotmap::SlotMap;

    fn inlet() -> SuctionInlet {
        let mut nodes: SlotMap<NodeId, ()> = SlotMap::with_key();
        SuctionInlet::new(nodes.insert(()), &SuctionConfig::default())
    }

    #[test]
    fn cooldown_window() {
        let mut s = inlet();
        assert!(s.is_idle(0));
        s.trigger(10);
        assert_eq!(
            s.state(10),
            SuctionState::CoolingDown {
                until: 10 + s.cooldown_ticks
            }
        );
        assert!(!s.is_idle(10 + s.cooldown_ticks - 1));
        assert!(s.is_idle(10 + s.cooldown_ticks));
    }

    #[test]
    fn target_faces_inlet() {
        let mut catalog = SegmentCatalog::new();
        let family = ConduitFamily::standard(&mut catalog).unwrap();
        let mut grid = ConduitGrid::new(family);
        let spec = ConduitSpec::with_friction(Fixed64::from_num(0.1));
        let origin = GridPosition::new(0, 0, 0);
        grid.place_conduit(origin, spec.suction()).unwrap();
        for side in [Side::East, Side::Up, Side::North] {
            grid.place_conduit(origin.offset(side), spec).unwrap();
        }

        let mut rng = SimRng::new(3);
        let mut seen = std::collections::BTreeSet::new();
        for _ in 0..200 {
            let target = pick_target(&grid, &catalog, origin, &mut rng).unwrap();
            let node = grid.node(target.node).unwrap();
            assert_eq!(node.position.offset(target.side), origin);
            let path = node.path().unwrap();
            let d = catalog.descriptor(target.descriptor).unwrap();
            assert!(d.end_facing(target.side, path.orientation()).is_some());
            seen.insert(target.side);
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn no_neighbors_no_target() {
        let mut catalog = SegmentCatalog::new();
        let family = ConduitFamily::standard(&mut catalog).unwrap();
        let mut grid = ConduitGrid::new(family);
        let origin = GridPosition::new(0, 0, 0);
        grid.place_conduit(origin, ConduitSpec::with_friction(Fixed64::ZERO))
            .unwrap();
        assert!(pick_target(&grid, &catalog, origin, &mut SimRng::new(1)).is_none());
    }
}
