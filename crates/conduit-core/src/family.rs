//! Conduit block families: canonical shapes registered under every rotation.
//!
//! A family is built in two phases, following the registry pattern:
//! shapes are registered on a [`ConduitFamilyBuilder`], then [`build`]
//! expands each shape under all 24 rotations and checks that every one of the
//! 64 connection masks resolves to some variant. A missing mask is a content
//! defect and fails the build; it never surfaces mid-simulation.
//!
//! [`build`]: ConduitFamilyBuilder::build

use crate::descriptor::PathDescriptor;
use crate::id::{DescriptorId, ShapeId};
use crate::rotation::Rotation;
use crate::segment::SegmentCatalog;
use crate::side::{ConnectionMask, Side};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised while building a family from content.
#[derive(Debug, thiserror::Error)]
pub enum ResolverError {
    #[error("no registered shape resolves connection mask {0:#08b}")]
    UnresolvedMask(u8),
    #[error("shape '{0}' is registered twice")]
    DuplicateShape(String),
    #[error("shape '{shape}' references unknown descriptor {descriptor:?}")]
    UnknownDescriptor {
        shape: String,
        descriptor: DescriptorId,
    },
}

// ---------------------------------------------------------------------------
// Shapes and variants
// ---------------------------------------------------------------------------

/// A canonical (unrotated) conduit shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ConduitShape {
    pub name: String,
    /// Sides connected in the shape's own orientation.
    pub canonical: ConnectionMask,
    /// Descriptors routable through the shape, in local coordinates.
    pub descriptors: Vec<DescriptorId>,
}

/// A shape placed under one rotation; the result of resolving a mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct BlockVariant {
    pub shape: ShapeId,
    pub rotation: Rotation,
    /// The mask this variant reproduces: `rotation` applied to the shape's
    /// canonical mask.
    pub mask: ConnectionMask,
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct ConduitFamilyBuilder {
    name: String,
    shapes: Vec<ConduitShape>,
}

impl ConduitFamilyBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            shapes: Vec::new(),
        }
    }

    /// Register a shape. Earlier shapes win when two shapes can produce the
    /// same mask.
    pub fn register_shape(
        &mut self,
        name: &str,
        sides: &[Side],
        descriptors: Vec<DescriptorId>,
    ) -> Result<ShapeId, ResolverError> {
        if self.shapes.iter().any(|s| s.name == name) {
            return Err(ResolverError::DuplicateShape(name.to_string()));
        }
        let id = ShapeId(self.shapes.len() as u16);
        self.shapes.push(ConduitShape {
            name: name.to_string(),
            canonical: ConnectionMask::from_sides(sides.iter().copied()),
            descriptors,
        });
        Ok(id)
    }

    /// Expand every shape under every rotation and verify totality.
    pub fn build(self, catalog: &SegmentCatalog) -> Result<ConduitFamily, ResolverError> {
        for shape in &self.shapes {
            if let Some(missing) = shape
                .descriptors
                .iter()
                .find(|d| catalog.descriptor(**d).is_none())
            {
                return Err(ResolverError::UnknownDescriptor {
                    shape: shape.name.clone(),
                    descriptor: *missing,
                });
            }
        }

        let rotations = Rotation::all();
        let mut resolved: BTreeMap<ConnectionMask, BlockVariant> = BTreeMap::new();
        for (index, shape) in self.shapes.iter().enumerate() {
            for rotation in &rotations {
                let mask = rotation.rotate_mask(shape.canonical);
                resolved.entry(mask).or_insert(BlockVariant {
                    shape: ShapeId(index as u16),
                    rotation: *rotation,
                    mask,
                });
            }
        }

        let mut variants = Vec::with_capacity(ConnectionMask::COUNT);
        for mask in ConnectionMask::every() {
            match resolved.get(&mask) {
                Some(variant) => variants.push(*variant),
                None => return Err(ResolverError::UnresolvedMask(mask.bits())),
            }
        }

        log::debug!(
            "built conduit family '{}' with {} shapes",
            self.name,
            self.shapes.len()
        );

        Ok(ConduitFamily {
            name: self.name,
            shapes: self.shapes,
            variants,
        })
    }
}

// ---------------------------------------------------------------------------
// Family
// ---------------------------------------------------------------------------

/// A validated family: every connection mask maps to exactly one variant.
#[derive(Debug, Clone)]
pub struct ConduitFamily {
    name: String,
    shapes: Vec<ConduitShape>,
    /// Indexed by mask bits; always 64 entries.
    variants: Vec<BlockVariant>,
}

/// Canonical shapes of the standard family, in registration order.
const STANDARD_SHAPES: [(&str, &[Side]); 10] = [
    ("no_connections", &[]),
    ("one_connection", &[Side::North]),
    ("line", &[Side::North, Side::South]),
    ("corner_2d", &[Side::West, Side::North]),
    ("corner_3d", &[Side::West, Side::North, Side::Up]),
    ("t_2d", &[Side::West, Side::North, Side::South]),
    ("cross", &[Side::East, Side::West, Side::North, Side::South]),
    ("side_3d", &[Side::West, Side::North, Side::South, Side::Up]),
    (
        "five",
        &[Side::West, Side::North, Side::South, Side::Up, Side::Down],
    ),
    (
        "all",
        &[
            Side::Up,
            Side::Down,
            Side::North,
            Side::South,
            Side::East,
            Side::West,
        ],
    ),
];

fn side_name(side: Side) -> String {
    format!("{side:?}").to_lowercase()
}

impl ConduitFamily {
    /// The standard pipe family: ten shapes covering all 64 masks.
    ///
    /// Shapes with two or more sides route between every pair of their
    /// sides. A single connection passes straight through to the opposite
    /// face, and the unconnected shape carries a north-south line.
    pub fn standard(catalog: &mut SegmentCatalog) -> Result<Self, ResolverError> {
        let mut builder = ConduitFamilyBuilder::new("pipe");
        for (name, sides) in STANDARD_SHAPES {
            let pairs: Vec<(Side, Side)> = match sides.len() {
                0 => vec![(Side::North, Side::South)],
                1 => vec![(sides[0], sides[0].reverse())],
                _ => {
                    let mut pairs = Vec::new();
                    for (i, a) in sides.iter().enumerate() {
                        for b in &sides[i + 1..] {
                            pairs.push((*a, *b));
                        }
                    }
                    pairs
                }
            };
            let descriptors = pairs
                .into_iter()
                .map(|(a, b)| {
                    let name = format!("{}_{}", side_name(a), side_name(b));
                    catalog.register(PathDescriptor::between(&name, a, b))
                })
                .collect();
            builder.register_shape(name, sides, descriptors)?;
        }
        builder.build(catalog)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolve a mask to its variant. Total over all 64 masks.
    pub fn resolve(&self, mask: ConnectionMask) -> BlockVariant {
        self.variants[mask.bits() as usize]
    }

    pub fn shape(&self, id: ShapeId) -> Option<&ConduitShape> {
        self.shapes.get(id.0 as usize)
    }

    pub fn shape_by_name(&self, name: &str) -> Option<ShapeId> {
        self.shapes
            .iter()
            .position(|s| s.name == name)
            .map(|i| ShapeId(i as u16))
    }

    /// Descriptors a variant exposes (local coordinates; apply the variant's
    /// rotation to get world sides).
    pub fn descriptors(&self, variant: &BlockVariant) -> &[DescriptorId] {
        self.shape(variant.shape)
            .map(|s| s.descriptors.as_slice())
            .unwrap_or(&[])
    }

    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standard() -> (SegmentCatalog, ConduitFamily) {
        let mut catalog = SegmentCatalog::new();
        let family = ConduitFamily::standard(&mut catalog).unwrap();
        (catalog, family)
    }

    #[test]
    fn standard_family_is_total() {
        let (_catalog, family) = standard();
        for mask in ConnectionMask::every() {
            let variant = family.resolve(mask);
            assert_eq!(variant.mask, mask);
            let shape = family.shape(variant.shape).unwrap();
            assert_eq!(variant.rotation.rotate_mask(shape.canonical), mask);
        }
    }

    #[test]
    fn degenerate_endpoints() {
        let (_catalog, family) = standard();
        let none = family.resolve(ConnectionMask::EMPTY);
        assert_eq!(family.shape(none.shape).unwrap().name, "no_connections");
        let all = family.resolve(ConnectionMask::ALL);
        assert_eq!(family.shape(all.shape).unwrap().name, "all");
    }

    #[test]
    fn opposite_pair_resolves_to_line_and_adjacent_to_corner() {
        let (_catalog, family) = standard();
        let line = family.resolve(ConnectionMask::from_sides([Side::Up, Side::Down]));
        assert_eq!(family.shape(line.shape).unwrap().name, "line");
        let corner = family.resolve(ConnectionMask::from_sides([Side::Up, Side::East]));
        assert_eq!(family.shape(corner.shape).unwrap().name, "corner_2d");
    }

    #[test]
    fn t_junction_has_three_descriptors() {
        let (_catalog, family) = standard();
        let t = family.resolve(ConnectionMask::from_sides([Side::East, Side::West, Side::Up]));
        assert_eq!(family.shape(t.shape).unwrap().name, "t_2d");
        assert_eq!(family.descriptors(&t).len(), 3);
    }

    #[test]
    fn descriptor_endpoints_land_on_connected_sides() {
        let (catalog, family) = standard();
        for mask in ConnectionMask::every().filter(|m| m.count() >= 2) {
            let variant = family.resolve(mask);
            for id in family.descriptors(&variant) {
                let d = catalog.descriptor(*id).unwrap();
                assert!(mask.contains(variant.rotation.rotate(d.first.side)));
                assert!(mask.contains(variant.rotation.rotate(d.second.side)));
            }
        }
    }

    #[test]
    fn missing_shape_fails_at_build() {
        let catalog = SegmentCatalog::new();
        let mut builder = ConduitFamilyBuilder::new("partial");
        builder.register_shape("none", &[], vec![]).unwrap();
        builder.register_shape("one", &[Side::Up], vec![]).unwrap();
        let err = builder.build(&catalog).unwrap_err();
        assert!(matches!(err, ResolverError::UnresolvedMask(_)));
    }

    #[test]
    fn duplicate_shape_rejected() {
        let mut builder = ConduitFamilyBuilder::new("dup");
        builder.register_shape("a", &[], vec![]).unwrap();
        assert!(matches!(
            builder.register_shape("a", &[Side::Up], vec![]),
            Err(ResolverError::DuplicateShape(_))
        ));
    }

    #[test]
    fn unknown_descriptor_rejected() {
        let catalog = SegmentCatalog::new();
        let mut builder = ConduitFamilyBuilder::new("bad");
        builder
            .register_shape("a", &[], vec![DescriptorId(9)])
            .unwrap();
        assert!(matches!(
            builder.build(&catalog),
            Err(ResolverError::UnknownDescriptor { .. })
        ));
    }
}
