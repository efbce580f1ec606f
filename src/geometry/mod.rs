//! Geometry payloads and per-instance attributes.
//!
//! A [`GeometryInstance`] is an immutable snapshot handed to a batch: the
//! owning entity id, an optional built geometry payload, and the
//! per-instance attributes sampled at build time. Instances are never
//! mutated after creation — a rebuild produces new instances instead.

pub mod ellipse;
pub mod polygon;

use bitflags::bitflags;
use glam::{DVec3, Vec2, Vec3};
use uuid::Uuid;

use crate::core::color::Color;

bitflags! {
    /// Which vertex streams a geometry build produces.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct VertexFormat: u32 {
        const POSITION  = 1 << 0;
        const NORMAL    = 1 << 1;
        const ST        = 1 << 2;
        const TANGENT   = 1 << 3;
        const BITANGENT = 1 << 4;
    }
}

impl VertexFormat {
    /// Streams needed by the per-instance-color appearance.
    pub const POSITION_AND_NORMAL: Self = Self::POSITION.union(Self::NORMAL);
    /// Streams needed by textured material appearances.
    pub const TEXTURED: Self = Self::POSITION.union(Self::NORMAL).union(Self::ST);
    pub const POSITION_ONLY: Self = Self::POSITION;
    pub const ALL: Self = Self::all();
}

/// How built vertices consume the per-instance height offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetMode {
    /// Only the top surface is offset.
    Top,
    /// Every vertex is offset.
    All,
}

/// Display gate by camera distance; `[0, +inf)` shows at every distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceDisplayCondition {
    pub near: f64,
    pub far: f64,
}

impl Default for DistanceDisplayCondition {
    fn default() -> Self {
        Self {
            near: 0.0,
            far: f64::INFINITY,
        }
    }
}

impl DistanceDisplayCondition {
    #[must_use]
    pub const fn new(near: f64, far: f64) -> Self {
        Self { near, far }
    }
}

/// Line or triangle topology of a built geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrimitiveTopology {
    #[default]
    Triangles,
    Lines,
}

/// Built vertex/index data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeometryData {
    pub topology: PrimitiveTopology,
    pub positions: Vec<DVec3>,
    pub normals: Option<Vec<Vec3>>,
    pub sts: Option<Vec<Vec2>>,
    pub tangents: Option<Vec<Vec3>>,
    pub bitangents: Option<Vec<Vec3>>,
    pub indices: Vec<u32>,
}

impl GeometryData {
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }
}

/// The per-instance attributes sampled when an instance is built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstanceAttributeSet {
    /// Whether the instance is visible this frame.
    pub show: bool,
    /// Packed per-instance color; absent for per-fragment materials,
    /// whose color lives in shader state.
    pub color: Option<[u8; 4]>,
    pub distance_display_condition: DistanceDisplayCondition,
    /// Height offset vector; present only for ground-offset builds.
    pub offset: Option<Vec3>,
}

impl Default for InstanceAttributeSet {
    fn default() -> Self {
        Self {
            show: true,
            color: None,
            distance_display_condition: DistanceDisplayCondition::default(),
            offset: None,
        }
    }
}

impl InstanceAttributeSet {
    /// Sets the color attribute from a [`Color`].
    pub fn set_color(&mut self, color: Color) {
        self.color = Some(color.to_bytes());
    }
}

/// An immutable geometry snapshot owned by the batch that requested it.
#[derive(Debug, Clone)]
pub struct GeometryInstance {
    /// Id of the owning entity.
    pub id: Uuid,
    /// Built geometry. `None` when the build options were degenerate; the
    /// instance still contributes attributes so readback stays coherent.
    pub geometry: Option<GeometryData>,
    pub attributes: InstanceAttributeSet,
}

impl GeometryInstance {
    #[must_use]
    pub fn new(id: Uuid, geometry: Option<GeometryData>, attributes: InstanceAttributeSet) -> Self {
        Self {
            id,
            geometry,
            attributes,
        }
    }
}
