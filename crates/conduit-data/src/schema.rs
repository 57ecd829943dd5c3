//! On-disk structures for conduit content.
//!
//! Descriptors are read directly as [`PathDescriptor`]s. Shapes refer to
//! descriptors by name; the loader resolves those names into catalog ids.

use conduit_core::side::Side;
use serde::Deserialize;

pub use conduit_core::descriptor::PathDescriptor as DescriptorData;

/// A canonical shape: the sides it connects and the descriptors it carries.
#[derive(Debug, Clone, Deserialize)]
pub struct ShapeData {
    pub name: String,
    #[serde(default)]
    pub sides: Vec<Side>,
    pub descriptors: Vec<String>,
}

/// A block family. Every one of the 64 connection masks must be reachable
/// by rotating some shape.
#[derive(Debug, Clone, Deserialize)]
pub struct FamilyData {
    pub name: String,
    pub shapes: Vec<ShapeData>,
}
