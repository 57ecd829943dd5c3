//! The conduit grid: placed nodes, cell lookup and connectivity.
//!
//! Nodes live in a generational [`SlotMap`], so an id held by an in-transit
//! item goes stale instead of aliasing a newer node when its cell is cleared.
//! Cells are indexed by a [`BTreeMap`] for deterministic iteration.
//!
//! Placing or removing a node re-resolves the variant of every adjacent
//! conduit. Variants are a pure function of the current neighbor set, so the
//! refresh is idempotent.

use crate::family::{BlockVariant, ConduitFamily};
use crate::fixed::Fixed64;
use crate::geometry::GridPosition;
use crate::id::{ContainerId, DescriptorId, NodeId};
use crate::rotation::Rotation;
use crate::side::{ConnectionMask, Side};
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum GridError {
    #[error("cell {0:?} is already occupied")]
    Occupied(GridPosition),
    #[error("node not found: {0:?}")]
    NodeNotFound(NodeId),
}

// ---------------------------------------------------------------------------
// Capabilities
// ---------------------------------------------------------------------------

/// A node that items can travel through.
pub trait PathCapable {
    /// Descriptors routable through the node, in local coordinates.
    fn descriptors(&self) -> &[DescriptorId];
    /// Rotation that maps local descriptor sides to world sides.
    fn orientation(&self) -> Rotation;
}

/// Read access to the grid used by the mapper, gateway and simulator.
pub trait GridTopology {
    fn node_at(&self, position: GridPosition) -> Option<NodeId>;

    fn node(&self, id: NodeId) -> Option<&Node>;

    /// The node in the adjacent cell on `side`.
    fn neighbor(&self, position: GridPosition, side: Side) -> Option<NodeId> {
        self.node_at(position.offset(side))
    }

    /// Adjacent nodes that items can travel through, in side order.
    fn path_neighbors(&self, position: GridPosition) -> Vec<(Side, NodeId)> {
        Side::all()
            .into_iter()
            .filter_map(|side| {
                let id = self.neighbor(position, side)?;
                self.node(id)?.path()?;
                Some((side, id))
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Nodes
// ---------------------------------------------------------------------------

/// Placement parameters for a conduit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConduitSpec {
    /// Velocity lost per second of travel.
    pub friction: Fixed64,
    /// Whether the conduit carries a suction inlet.
    #[serde(default)]
    pub suction: bool,
}

impl ConduitSpec {
    pub fn with_friction(friction: Fixed64) -> Self {
        Self {
            friction,
            suction: false,
        }
    }

    pub fn suction(mut self) -> Self {
        self.suction = true;
        self
    }
}

/// A conduit block: the resolved variant plus its travel parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConduitBlock {
    pub variant: BlockVariant,
    pub descriptors: Vec<DescriptorId>,
    pub friction: Fixed64,
    pub suction: bool,
}

impl PathCapable for ConduitBlock {
    fn descriptors(&self) -> &[DescriptorId] {
        &self.descriptors
    }

    fn orientation(&self) -> Rotation {
        self.variant.rotation
    }
}

/// A node that hands items to an external container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receptacle {
    pub container: ContainerId,
    /// Faces that accept conduits. Empty means every face.
    pub sides: Vec<Side>,
}

impl Receptacle {
    /// Whether the receptacle accepts a connection on its own `side`.
    pub fn accepts(&self, side: Side) -> bool {
        self.sides.is_empty() || self.sides.contains(&side)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    Conduit(ConduitBlock),
    Receptacle(Receptacle),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub position: GridPosition,
    pub kind: NodeKind,
}

impl Node {
    /// The path capability, if items can travel through this node.
    pub fn path(&self) -> Option<&dyn PathCapable> {
        match &self.kind {
            NodeKind::Conduit(block) => Some(block),
            NodeKind::Receptacle(_) => None,
        }
    }

    pub fn conduit(&self) -> Option<&ConduitBlock> {
        match &self.kind {
            NodeKind::Conduit(block) => Some(block),
            NodeKind::Receptacle(_) => None,
        }
    }

    pub fn receptacle(&self) -> Option<&Receptacle> {
        match &self.kind {
            NodeKind::Receptacle(r) => Some(r),
            NodeKind::Conduit(_) => None,
        }
    }

    /// Whether a conduit on the far side of this node's `side` face connects to it.
    pub fn accepts_connection(&self, side: Side) -> bool {
        match &self.kind {
            NodeKind::Conduit(_) => true,
            NodeKind::Receptacle(r) => r.accepts(side),
        }
    }
}

// ---------------------------------------------------------------------------
// Grid
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct ConduitGrid {
    family: ConduitFamily,
    nodes: SlotMap<NodeId, Node>,
    cells: BTreeMap<GridPosition, NodeId>,
}

impl ConduitGrid {
    pub fn new(family: ConduitFamily) -> Self {
        Self {
            family,
            nodes: SlotMap::with_key(),
            cells: BTreeMap::new(),
        }
    }

    pub fn family(&self) -> &ConduitFamily {
        &self.family
    }

    /// Whether the cell on `side` of `position` holds something a conduit
    /// at `position` connects to.
    pub fn connection_condition(&self, position: GridPosition, side: Side) -> bool {
        self.neighbor(position, side)
            .and_then(|id| self.nodes.get(id))
            .is_some_and(|node| node.accepts_connection(side.reverse()))
    }

    /// The sides of `position` that connect to a neighbor.
    pub fn connection_mask(&self, position: GridPosition) -> ConnectionMask {
        ConnectionMask::from_sides(
            Side::all()
                .into_iter()
                .filter(|side| self.connection_condition(position, *side)),
        )
    }

    /// Connected sides of `position`, in bit order.
    pub fn find_connected_sides(&self, position: GridPosition) -> Vec<Side> {
        self.connection_mask(position).sides().collect()
    }

    /// The variant a conduit at `position` resolves to under the current
    /// neighbors, whether or not one is placed there.
    pub fn variant_for(&self, position: GridPosition) -> BlockVariant {
        self.family.resolve(self.connection_mask(position))
    }

    /// Place a conduit. Its variant and those of adjacent conduits are
    /// resolved immediately.
    pub fn place_conduit(
        &mut self,
        position: GridPosition,
        spec: ConduitSpec,
    ) -> Result<NodeId, GridError> {
        if self.cells.contains_key(&position) {
            return Err(GridError::Occupied(position));
        }
        let variant = self.variant_for(position);
        let block = ConduitBlock {
            variant,
            descriptors: self.family.descriptors(&variant).to_vec(),
            friction: spec.friction,
            suction: spec.suction,
        };
        let id = self.insert_node(Node {
            position,
            kind: NodeKind::Conduit(block),
        });
        log::trace!("placed conduit {id:?} at {position:?} as {:?}", variant.mask);
        Ok(id)
    }

    /// Place a receptacle feeding `container` through the given faces.
    pub fn place_receptacle(
        &mut self,
        position: GridPosition,
        container: ContainerId,
        sides: Vec<Side>,
    ) -> Result<NodeId, GridError> {
        if self.cells.contains_key(&position) {
            return Err(GridError::Occupied(position));
        }
        let id = self.insert_node(Node {
            position,
            kind: NodeKind::Receptacle(Receptacle { container, sides }),
        });
        log::trace!("placed receptacle {id:?} at {position:?}");
        Ok(id)
    }

    /// Remove a node, returning it. Adjacent conduits are re-resolved.
    pub fn remove(&mut self, id: NodeId) -> Result<Node, GridError> {
        let node = self.nodes.remove(id).ok_or(GridError::NodeNotFound(id))?;
        self.cells.remove(&node.position);
        self.refresh_neighbors(node.position);
        Ok(node)
    }

    fn insert_node(&mut self, node: Node) -> NodeId {
        let position = node.position;
        let id = self.nodes.insert(node);
        self.cells.insert(position, id);
        self.refresh_neighbors(position);
        id
    }

    fn refresh_neighbors(&mut self, position: GridPosition) {
        for side in Side::all() {
            self.refresh(position.offset(side));
        }
    }

    /// Re-resolve the conduit at `position`, if any.
    pub fn refresh(&mut self, position: GridPosition) {
        let Some(id) = self.cells.get(&position).copied() else {
            return;
        };
        let variant = self.variant_for(position);
        let descriptors = self.family.descriptors(&variant).to_vec();
        if let Some(NodeKind::Conduit(block)) = self.nodes.get_mut(id).map(|n| &mut n.kind)
            && block.variant != variant
        {
            log::trace!("conduit {id:?} re-resolved to {:?}", variant.mask);
            block.variant = variant;
            block.descriptors = descriptors;
        }
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in cell order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> + '_ {
        self.cells
            .values()
            .filter_map(|id| self.nodes.get(*id).map(|n| (*id, n)))
    }
}

impl GridTopology for ConduitGrid {
    fn node_at(&self, position: GridPosition) -> Option<NodeId> {
        self.cells.get(&position).copied()
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }
}
