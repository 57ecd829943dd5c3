use crate::descriptor::{End, PathDescriptor};
use crate::fixed::{Fixed64, Ticks};
use crate::geometry::Vec3;
use crate::id::{ContainerId, DescriptorId, NodeId};
use crate::segment::Segment;
use serde::{Deserialize, Serialize};

/// Whether an entity may travel through conduits at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    Transportable,
    /// Present in the world but never accepted by a conduit.
    Inert,
}

/// Where an in-transit item sits inside the network.
///
/// `progress` always lies in `[0, max_distance]` of the current descriptor's
/// segment. `sign` is +1 when heading for the second endpoint and -1 when
/// heading for the first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathState {
    pub node: NodeId,
    pub descriptor: DescriptorId,
    pub progress: Fixed64,
    pub sign: i8,
}

impl PathState {
    /// State for an item entering `segment` through `entry`.
    pub fn entering(node: NodeId, descriptor: DescriptorId, entry: End, segment: &Segment) -> Self {
        Self {
            node,
            descriptor,
            progress: segment.progress_at(entry),
            sign: entry.entry_sign(),
        }
    }

    /// The endpoint the item is heading for.
    pub fn heading(&self) -> End {
        if self.sign < 0 { End::First } else { End::Second }
    }

    /// The endpoint the item entered through.
    pub fn entered(&self) -> End {
        self.heading().other()
    }

    /// Signed Fixed64 multiplier for this state's direction.
    pub fn direction(&self) -> Fixed64 {
        if self.sign < 0 {
            Fixed64::from_num(-1)
        } else {
            Fixed64::from_num(1)
        }
    }

    /// Debug label, e.g. `north_south>`.
    pub fn label(&self, descriptor: &PathDescriptor) -> String {
        let arrow = if self.sign < 0 { '<' } else { '>' };
        format!("{}{arrow}", descriptor.name)
    }
}

/// An entity that can be carried by the network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportableItem {
    pub kind: ItemKind,
    /// Following velocity. Its sign matches `path.sign` while in transit.
    pub velocity: Fixed64,
    /// Present exactly while the item is in transit.
    pub path: Option<PathState>,
    /// Last known world position.
    pub position: Vec3,
    /// Container the item was deposited into, if any.
    pub stored_in: Option<ContainerId>,
    /// Tick of the most recent drop out of the network.
    pub dropped_at: Option<Ticks>,
}

impl TransportableItem {
    pub fn new(kind: ItemKind, position: Vec3) -> Self {
        Self {
            kind,
            velocity: Fixed64::ZERO,
            path: None,
            position,
            stored_in: None,
            dropped_at: None,
        }
    }

    pub fn is_transportable(&self) -> bool {
        self.kind == ItemKind::Transportable
    }

    pub fn in_transit(&self) -> bool {
        self.path.is_some()
    }

    /// Free in the world: neither in transit nor stored.
    pub fn is_free(&self) -> bool {
        self.path.is_none() && self.stored_in.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::side::Side;
    use slotmap::SlotMap;

    #[test]
    fn entering_first_end_heads_forward() {
        let mut nodes: SlotMap<NodeId, ()> = SlotMap::with_key();
        let node = nodes.insert(());
        let seg = Segment::from_descriptor(&PathDescriptor::between("l", Side::West, Side::East));
        let state = PathState::entering(node, DescriptorId(0), End::First, &seg);
        assert_eq!(state.progress, Fixed64::ZERO);
        assert_eq!(state.sign, 1);
        assert_eq!(state.heading(), End::Second);

        let back = PathState::entering(node, DescriptorId(0), End::Second, &seg);
        assert_eq!(back.progress, seg.max_distance);
        assert_eq!(back.sign, -1);
        assert_eq!(back.heading(), End::First);
        assert_eq!(back.entered(), End::Second);
        assert_eq!(back.direction(), Fixed64::from_num(-1));
    }

    #[test]
    fn new_item_is_free() {
        let item = TransportableItem::new(ItemKind::Transportable, Vec3::ZERO);
        assert!(item.is_free());
        assert!(!item.in_transit());
        assert!(item.is_transportable());
        assert!(!TransportableItem::new(ItemKind::Inert, Vec3::ZERO).is_transportable());
    }
}
