//! Resolved segment geometry and the memoizing segment catalog.
//!
//! A [`Segment`] is computed once per [`PathDescriptor`] the first time it is
//! requested and then shared by every node exposing that descriptor. Entries
//! are never evicted: the catalog is bounded by registered content, not by
//! runtime growth.

use crate::fixed::{Fixed64, f64_to_fixed64, fixed64_to_f64};
use crate::descriptor::{End, PathDescriptor};
use crate::geometry::{GridPosition, Vec3};
use crate::id::DescriptorId;
use crate::rotation::Rotation;
use std::cell::OnceCell;
use std::collections::HashMap;
use std::f64::consts::FRAC_PI_2;

// ---------------------------------------------------------------------------
// Segment shapes
// ---------------------------------------------------------------------------

/// Shape of a segment in local (pre-rotation) cell coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentShape {
    /// Straight line between opposite faces.
    Line { from: Vec3, to: Vec3 },
    /// Quarter circle between two perpendicular faces, bending around the
    /// shared cell edge.
    Arc {
        center: Vec3,
        radius: f64,
        /// Unit vector from `center` to the first endpoint.
        start_axis: Vec3,
        /// Unit vector from `center` to the second endpoint.
        end_axis: Vec3,
    },
    /// Piecewise-linear path; used for U-turns and offset endpoints.
    Polyline { points: Vec<Vec3> },
}

/// Immutable geometry for a path descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub shape: SegmentShape,
    /// Total traversable length.
    pub max_distance: Fixed64,
}

impl Segment {
    /// Compute the geometry for a descriptor.
    pub fn from_descriptor(descriptor: &PathDescriptor) -> Self {
        let a = descriptor.first;
        let b = descriptor.second;
        let p1 = a.local_point();
        let p2 = b.local_point();
        let centered = a.offset == Vec3::ZERO && b.offset == Vec3::ZERO;

        let shape = if a.side == b.side.reverse() {
            SegmentShape::Line { from: p1, to: p2 }
        } else if a.side != b.side && centered {
            // p1 = a/2, p2 = b/2 with a ⟂ b; the arc bends around p1 + p2.
            let center = p1 + p2;
            SegmentShape::Arc {
                center,
                radius: 0.5,
                start_axis: b.side.unit() * -1.0,
                end_axis: a.side.unit() * -1.0,
            }
        } else {
            SegmentShape::Polyline {
                points: vec![p1, Vec3::ZERO, p2],
            }
        };

        let length = match &shape {
            SegmentShape::Line { from, to } => from.distance(*to),
            SegmentShape::Arc { radius, .. } => radius * FRAC_PI_2,
            SegmentShape::Polyline { points } => {
                points.windows(2).map(|w| w[0].distance(w[1])).sum()
            }
        };

        Self {
            shape,
            max_distance: f64_to_fixed64(length),
        }
    }

    /// Local point at the given progress. Progress is clamped to the segment.
    pub fn point_at(&self, progress: Fixed64) -> Vec3 {
        let max = fixed64_to_f64(self.max_distance);
        let d = fixed64_to_f64(progress).clamp(0.0, max);
        match &self.shape {
            SegmentShape::Line { from, to } => {
                if max <= 0.0 {
                    *from
                } else {
                    from.lerp(*to, d / max)
                }
            }
            SegmentShape::Arc {
                center,
                radius,
                start_axis,
                end_axis,
            } => {
                let theta = if *radius > 0.0 { d / radius } else { 0.0 };
                *center + *start_axis * (radius * theta.cos()) + *end_axis * (radius * theta.sin())
            }
            SegmentShape::Polyline { points } => {
                let mut remaining = d;
                for w in points.windows(2) {
                    let len = w[0].distance(w[1]);
                    if remaining <= len {
                        return if len <= 0.0 {
                            w[0]
                        } else {
                            w[0].lerp(w[1], remaining / len)
                        };
                    }
                    remaining -= len;
                }
                points.last().copied().unwrap_or(Vec3::ZERO)
            }
        }
    }

    /// World point at the given progress for a node at `origin` under `rotation`.
    pub fn world_point(&self, origin: GridPosition, rotation: Rotation, progress: Fixed64) -> Vec3 {
        origin.center() + rotation.rotate_vec(self.point_at(progress))
    }

    /// Progress value of an endpoint.
    pub fn progress_at(&self, end: End) -> Fixed64 {
        match end {
            End::First => Fixed64::ZERO,
            End::Second => self.max_distance,
        }
    }
}

// ---------------------------------------------------------------------------
// Segment catalog
// ---------------------------------------------------------------------------

/// Registry of path descriptors with lazily computed, cached segments.
#[derive(Debug, Default)]
pub struct SegmentCatalog {
    descriptors: Vec<PathDescriptor>,
    name_to_id: HashMap<String, DescriptorId>,
    segments: Vec<OnceCell<Segment>>,
}

impl SegmentCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor. Re-registering a name returns the existing id.
    pub fn register(&mut self, descriptor: PathDescriptor) -> DescriptorId {
        if let Some(id) = self.name_to_id.get(&descriptor.name) {
            return *id;
        }
        let id = DescriptorId(self.descriptors.len() as u32);
        self.name_to_id.insert(descriptor.name.clone(), id);
        self.descriptors.push(descriptor);
        self.segments.push(OnceCell::new());
        id
    }

    pub fn descriptor(&self, id: DescriptorId) -> Option<&PathDescriptor> {
        self.descriptors.get(id.0 as usize)
    }

    pub fn id_of(&self, name: &str) -> Option<DescriptorId> {
        self.name_to_id.get(name).copied()
    }

    /// The segment for a descriptor, computing it on first access.
    pub fn segment(&self, id: DescriptorId) -> Option<&Segment> {
        let descriptor = self.descriptors.get(id.0 as usize)?;
        let cell = self.segments.get(id.0 as usize)?;
        Some(cell.get_or_init(|| Segment::from_descriptor(descriptor)))
    }

    /// Number of registered descriptors.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Number of segments computed so far.
    pub fn computed_count(&self) -> usize {
        self.segments.iter().filter(|c| c.get().is_some()).count()
    }
}
