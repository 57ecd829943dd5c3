//! Moving items between the free world and the network.
//!
//! [`insert`] validates everything before touching any state, so a rejected
//! request leaves the item exactly as it was. [`drop_item`] is the only way
//! an item leaves the network; the simulator, suction and external callers
//! all go through it.

use crate::descriptor::End;
use crate::fixed::{Fixed64, Ticks};
use crate::grid::GridTopology;
use crate::id::{DescriptorId, ItemId, NodeId};
use crate::item::{PathState, TransportableItem};
use crate::physics::PhysicsBridge;
use crate::segment::SegmentCatalog;
use crate::side::Side;
use slotmap::SlotMap;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InsertError {
    #[error("item not found: {0:?}")]
    UnknownItem(ItemId),
    #[error("item {0:?} is not transportable")]
    NotTransportable(ItemId),
    #[error("item {0:?} is already in transit")]
    AlreadyInTransit(ItemId),
    #[error("item {0:?} is held by a container")]
    Stored(ItemId),
    #[error("node not found: {0:?}")]
    UnknownNode(NodeId),
    #[error("node {0:?} cannot carry items")]
    NotPathCapable(NodeId),
    #[error("descriptor not found: {0:?}")]
    UnknownDescriptor(DescriptorId),
    #[error("node {node:?} has no descriptor with an endpoint on side {side:?}")]
    NoDescriptorFacing { node: NodeId, side: Side },
    #[error("descriptor {descriptor:?} has no endpoint on side {side:?} of node {node:?}")]
    SideMismatch {
        node: NodeId,
        descriptor: DescriptorId,
        side: Side,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DropError {
    #[error("item not found: {0:?}")]
    UnknownItem(ItemId),
    #[error("item {0:?} is not transportable")]
    NotTransportable(ItemId),
}

/// A validated insertion, ready to apply.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Insertion {
    pub state: PathState,
    pub entry: End,
    pub velocity: Fixed64,
}

/// Descriptors of `node` with an endpoint on world side `side`, in node order.
pub fn descriptors_facing<T: GridTopology + ?Sized>(
    topology: &T,
    catalog: &SegmentCatalog,
    node: NodeId,
    side: Side,
) -> Result<Vec<DescriptorId>, InsertError> {
    let host = topology.node(node).ok_or(InsertError::UnknownNode(node))?;
    let path = host.path().ok_or(InsertError::NotPathCapable(node))?;
    let rotation = path.orientation();
    Ok(path
        .descriptors()
        .iter()
        .copied()
        .filter(|d| {
            catalog
                .descriptor(*d)
                .is_some_and(|desc| desc.end_facing(side, rotation).is_some())
        })
        .collect())
}

/// Check an insertion without mutating anything.
#[allow(clippy::too_many_arguments)]
pub fn plan_insert<T: GridTopology + ?Sized>(
    items: &SlotMap<ItemId, TransportableItem>,
    topology: &T,
    catalog: &SegmentCatalog,
    item: ItemId,
    node: NodeId,
    side: Side,
    descriptor: DescriptorId,
    speed: Fixed64,
) -> Result<Insertion, InsertError> {
    let entity = items.get(item).ok_or(InsertError::UnknownItem(item))?;
    if !entity.is_transportable() {
        return Err(InsertError::NotTransportable(item));
    }
    if entity.in_transit() {
        return Err(InsertError::AlreadyInTransit(item));
    }
    if entity.stored_in.is_some() {
        return Err(InsertError::Stored(item));
    }
    let host = topology.node(node).ok_or(InsertError::UnknownNode(node))?;
    let path = host.path().ok_or(InsertError::NotPathCapable(node))?;
    let desc = catalog
        .descriptor(descriptor)
        .ok_or(InsertError::UnknownDescriptor(descriptor))?;
    let segment = catalog
        .segment(descriptor)
        .ok_or(InsertError::UnknownDescriptor(descriptor))?;
    let entry = desc
        .end_facing(side, path.orientation())
        .ok_or(InsertError::SideMismatch {
            node,
            descriptor,
            side,
        })?;

    let state = PathState::entering(node, descriptor, entry, segment);
    Ok(Insertion {
        state,
        entry,
        velocity: speed.saturating_abs() * state.direction(),
    })
}

/// Insert a free item into the network at `side` of `node`, on `descriptor`.
#[allow(clippy::too_many_arguments)]
pub fn insert<T: GridTopology + ?Sized, P: PhysicsBridge + ?Sized>(
    items: &mut SlotMap<ItemId, TransportableItem>,
    topology: &T,
    catalog: &SegmentCatalog,
    physics: &mut P,
    item: ItemId,
    node: NodeId,
    side: Side,
    descriptor: DescriptorId,
    speed: Fixed64,
) -> Result<Insertion, InsertError> {
    let plan = plan_insert(items, topology, catalog, item, node, side, descriptor, speed)?;
    let position = match (topology.node(node), catalog.segment(descriptor)) {
        (Some(host), Some(segment)) => {
            let rotation = host.path().map(|p| p.orientation()).unwrap_or_default();
            segment.world_point(host.position, rotation, plan.state.progress)
        }
        _ => return Err(InsertError::UnknownNode(node)),
    };
    let entity = items.get_mut(item).ok_or(InsertError::UnknownItem(item))?;

    physics.destroy_body(item);
    entity.path = Some(plan.state);
    entity.velocity = plan.velocity;
    entity.position = position;
    if let Some(d) = catalog.descriptor(descriptor) {
        log::debug!(
            "item {item:?} inserted at {node:?} via {side:?} on {}",
            plan.state.label(d)
        );
    }
    Ok(plan)
}

/// Take an item out of the network, handing it to physics at its current
/// position. Returns `false` (and changes nothing) if it was not in transit.
pub fn drop_item<P: PhysicsBridge + ?Sized>(
    items: &mut SlotMap<ItemId, TransportableItem>,
    physics: &mut P,
    item: ItemId,
    now: Ticks,
) -> Result<bool, DropError> {
    let entity = items.get_mut(item).ok_or(DropError::UnknownItem(item))?;
    if !entity.is_transportable() {
        return Err(DropError::NotTransportable(item));
    }
    if entity.path.take().is_none() {
        return Ok(false);
    }
    entity.velocity = Fixed64::ZERO;
    entity.dropped_at = Some(now);
    physics.spawn_body(item, entity.position, now);
    log::debug!("item {item:?} dropped at {:?}", entity.position);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::family::ConduitFamily;
    use crate::geometry::{GridPosition, Vec3};
    use crate::grid::{ConduitGrid, ConduitSpec};
    use crate::id::ContainerId;
    use crate::item::ItemKind;
    use crate::physics::FreeBodyStore;

    struct World {
        catalog: SegmentCatalog,
        grid: ConduitGrid,
        items: SlotMap<ItemId, TransportableItem>,
        physics: FreeBodyStore,
    }

    fn world() -> World {
        let mut catalog = SegmentCatalog::new();
        let family = ConduitFamily::standard(&mut catalog).unwrap();
        let mut grid = ConduitGrid::new(family);
        let spec = ConduitSpec::with_friction(Fixed64::from_num(0.1));
        grid.place_conduit(GridPosition::new(0, 0, 0), spec).unwrap();
        grid.place_conduit(GridPosition::new(1, 0, 0), spec).unwrap();
        grid.place_conduit(GridPosition::new(-1, 0, 0), spec).unwrap();
        World {
            catalog,
            grid,
            items: SlotMap::with_key(),
            physics: FreeBodyStore::new(),
        }
    }

    fn free_item(w: &mut World) -> ItemId {
        let id = w
            .items
            .insert(TransportableItem::new(ItemKind::Transportable, Vec3::ZERO));
        w.physics.spawn_body(id, Vec3::ZERO, 0);
        id
    }

    /// The middle conduit's east-west descriptor.
    fn middle(w: &World) -> (NodeId, DescriptorId) {
        let node = w.grid.node_at(GridPosition::new(0, 0, 0)).unwrap();
        let descriptor = w.grid.node(node).unwrap().path().unwrap().descriptors()[0];
        (node, descriptor)
    }

    fn try_insert(w: &mut World, item: ItemId, node: NodeId, side: Side, d: DescriptorId) -> Result<Insertion, InsertError> {
        insert(
            &mut w.items,
            &w.grid,
            &w.catalog,
            &mut w.physics,
            item,
            node,
            side,
            d,
            Fixed64::from_num(1),
        )
    }

    #[test]
    fn insert_sets_progress_and_sign_from_matching_end() {
        let mut w = world();
        let (node, d) = middle(&w);
        let a = free_item(&mut w);
        let b = free_item(&mut w);
        let rotation = w.grid.node(node).unwrap().path().unwrap().orientation();
        let desc = w.catalog.descriptor(d).unwrap().clone();
        let first_side = desc.world_side(End::First, rotation);
        let second_side = desc.world_side(End::Second, rotation);

        let pa = try_insert(&mut w, a, node, first_side, d).unwrap();
        assert_eq!(pa.state.progress, Fixed64::ZERO);
        assert_eq!(pa.state.sign, 1);
        assert!(pa.velocity > Fixed64::ZERO);

        let pb = try_insert(&mut w, b, node, second_side, d).unwrap();
        assert_eq!(pb.state.progress, w.catalog.segment(d).unwrap().max_distance);
        assert_eq!(pb.state.sign, -1);
        assert!(pb.velocity < Fixed64::ZERO);

        // Physics no longer owns either item.
        assert!(w.physics.is_empty());
        assert!(w.items[a].in_transit());
    }

    #[test]
    fn most_negative_speed_saturates() {
        let mut w = world();
        let (node, d) = middle(&w);
        let item = free_item(&mut w);
        let plan = insert(
            &mut w.items,
            &w.grid,
            &w.catalog,
            &mut w.physics,
            item,
            node,
            Side::West,
            d,
            Fixed64::MIN,
        )
        .unwrap();
        assert_eq!(plan.velocity.abs(), Fixed64::MAX);
    }

    #[test]
    fn insert_position_is_entry_face() {
        let mut w = world();
        let (node, d) = middle(&w);
        let item = free_item(&mut w);
        try_insert(&mut w, item, node, Side::East, d).unwrap();
        assert!(w.items[item].position.approx_eq(Vec3::new(0.5, 0.0, 0.0), 1e-6));
    }

    #[test]
    fn rejected_insert_changes_nothing() {
        let mut w = world();
        let (node, d) = middle(&w);
        let item = free_item(&mut w);
        let before = w.items[item].clone();

        let err = try_insert(&mut w, item, node, Side::Up, d).unwrap_err();
        assert!(matches!(err, InsertError::SideMismatch { .. }));
        assert_eq!(w.items[item], before);
        assert!(w.physics.body(item).is_some());

        let err = try_insert(&mut w, item, node, Side::East, DescriptorId(999)).unwrap_err();
        assert_eq!(err, InsertError::UnknownDescriptor(DescriptorId(999)));
        assert_eq!(w.items[item], before);
    }

    #[test]
    fn insert_rejects_inert_and_in_transit() {
        let mut w = world();
        let (node, d) = middle(&w);
        let inert = w
            .items
            .insert(TransportableItem::new(ItemKind::Inert, Vec3::ZERO));
        assert_eq!(
            try_insert(&mut w, inert, node, Side::East, d).unwrap_err(),
            InsertError::NotTransportable(inert)
        );

        let item = free_item(&mut w);
        try_insert(&mut w, item, node, Side::East, d).unwrap();
        assert_eq!(
            try_insert(&mut w, item, node, Side::East, d).unwrap_err(),
            InsertError::AlreadyInTransit(item)
        );
    }

    #[test]
    fn insert_rejects_stored_item() {
        let mut w = world();
        let (node, d) = middle(&w);
        let item = free_item(&mut w);
        w.physics.destroy_body(item);
        w.items[item].stored_in = Some(ContainerId(4));
        let before = w.items[item].clone();

        assert_eq!(
            try_insert(&mut w, item, node, Side::East, d).unwrap_err(),
            InsertError::Stored(item)
        );
        assert_eq!(w.items[item], before);
    }

    #[test]
    fn insert_rejects_receptacle_and_stale_node() {
        let mut w = world();
        let (_, d) = middle(&w);
        let item = free_item(&mut w);
        let receptacle = w
            .grid
            .place_receptacle(GridPosition::new(5, 0, 0), ContainerId(0), vec![])
            .unwrap();
        assert_eq!(
            try_insert(&mut w, item, receptacle, Side::East, d).unwrap_err(),
            InsertError::NotPathCapable(receptacle)
        );
        w.grid.remove(receptacle).unwrap();
        assert_eq!(
            try_insert(&mut w, item, receptacle, Side::East, d).unwrap_err(),
            InsertError::UnknownNode(receptacle)
        );
    }

    #[test]
    fn drop_hands_item_to_physics() {
        let mut w = world();
        let (node, d) = middle(&w);
        let item = free_item(&mut w);
        try_insert(&mut w, item, node, Side::East, d).unwrap();

        assert!(drop_item(&mut w.items, &mut w.physics, item, 42).unwrap());
        let body = w.physics.body(item).unwrap();
        assert_eq!(body.dropped_at, 42);
        assert!(body.position.approx_eq(Vec3::new(0.5, 0.0, 0.0), 1e-6));
        assert!(!w.items[item].in_transit());
        assert_eq!(w.items[item].velocity, Fixed64::ZERO);

        // Second drop is a no-op.
        assert!(!drop_item(&mut w.items, &mut w.physics, item, 43).unwrap());
        assert_eq!(w.physics.body(item).unwrap().dropped_at, 42);
    }

    #[test]
    fn drop_errors() {
        let mut w = world();
        let inert = w
            .items
            .insert(TransportableItem::new(ItemKind::Inert, Vec3::ZERO));
        assert_eq!(
            drop_item(&mut w.items, &mut w.physics, inert, 0).unwrap_err(),
            DropError::NotTransportable(inert)
        );
        w.items.remove(inert);
        assert_eq!(
            drop_item(&mut w.items, &mut w.physics, inert, 0).unwrap_err(),
            DropError::UnknownItem(inert)
        );
    }
}
