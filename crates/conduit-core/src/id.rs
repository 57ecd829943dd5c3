use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Identifies a placed node (conduit or receptacle) in the grid.
    ///
    /// Generational: a handle to a destroyed node never aliases a newer one.
    pub struct NodeId;

    /// Identifies a transportable item entity.
    pub struct ItemId;
}

/// Identifies a path descriptor in the segment catalog. Cheap to copy and compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DescriptorId(pub u32);

/// Identifies a conduit shape inside a block family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ShapeId(pub u16);

/// Identifies an external container that a receptacle node deposits into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContainerId(pub u32);
