//! Ellipse fill and outline tessellation.
//!
//! The ellipse is sampled in the local east/north tangent plane at its
//! center and optionally extruded between a base height and an extruded
//! height along the local up axis. Degenerate inputs (missing or
//! non-positive axes) yield `None` so a frame can simply skip the shape.
//!
//! # Panics
//!
//! Building panics when the semi-major axis is smaller than the
//! semi-minor axis; that is a caller contract violation, not a degenerate
//! input.

use glam::{DVec3, Vec2, Vec3};

use crate::core::terrain::Rectangle;
use crate::updaters::ellipse::EllipseGeometryOptions;

use super::{GeometryData, PrimitiveTopology, VertexFormat};

/// Default angular step between perimeter samples, in radians.
pub const DEFAULT_GRANULARITY: f64 = 0.02;
/// Default count of vertical outline lines on extruded ellipses.
pub const DEFAULT_VERTICAL_LINES: u32 = 16;
const MIN_PERIMETER_POINTS: usize = 8;
const MAX_PERIMETER_POINTS: usize = 1440;
/// Mean globe radius used to convert meters to angular extent.
const GLOBE_RADIUS: f64 = 6_371_000.0;

struct EllipseFrame {
    center: DVec3,
    east: DVec3,
    north: DVec3,
    up: DVec3,
    semi_major: f64,
    semi_minor: f64,
    rotation: f64,
    granularity: f64,
}

impl EllipseFrame {
    /// `None` when the options cannot describe a real ellipse.
    fn from_options(options: &EllipseGeometryOptions) -> Option<Self> {
        let center = options.center?;
        let semi_major = options.semi_major_axis?;
        let semi_minor = options.semi_minor_axis?;
        if !semi_major.is_finite() || !semi_minor.is_finite() || semi_minor <= 0.0 {
            return None;
        }
        assert!(
            semi_major >= semi_minor,
            "semiMajorAxis must be greater than or equal to semiMinorAxis"
        );

        // Local up: radial away from the globe center, or +Z at the origin.
        let up = center.try_normalize().unwrap_or(DVec3::Z);
        let reference = if up.z.abs() < 0.99 { DVec3::Z } else { DVec3::X };
        let east = reference.cross(up).normalize();
        let north = up.cross(east);

        let granularity = options
            .granularity
            .filter(|g| g.is_finite() && *g > 0.0)
            .unwrap_or(DEFAULT_GRANULARITY);

        Some(Self {
            center,
            east,
            north,
            up,
            semi_major,
            semi_minor,
            rotation: options.rotation.unwrap_or(0.0),
            granularity,
        })
    }

    fn perimeter_point_count(&self) -> usize {
        let count = (std::f64::consts::TAU / self.granularity).ceil() as usize;
        count.clamp(MIN_PERIMETER_POINTS, MAX_PERIMETER_POINTS)
    }

    /// Position on the perimeter at parametric angle `theta` and `height`
    /// meters along up.
    fn position(&self, theta: f64, height: f64) -> DVec3 {
        let (sin_rot, cos_rot) = self.rotation.sin_cos();
        let x = self.semi_major * theta.cos();
        let y = self.semi_minor * theta.sin();
        let east_offset = x * cos_rot + y * sin_rot;
        let north_offset = -x * sin_rot + y * cos_rot;
        self.center + self.east * east_offset + self.north * north_offset + self.up * height
    }
}

/// Builds the filled ellipse described by `options`.
///
/// Produces a top disc at the base height, plus a bottom disc and side
/// wall when the options describe an extrusion. Normals/texture
/// coordinates are emitted per `options.vertex_format`.
#[must_use]
pub fn fill_geometry(options: &EllipseGeometryOptions) -> Option<GeometryData> {
    let frame = EllipseFrame::from_options(options)?;
    let point_count = frame.perimeter_point_count();
    let height = options.height.unwrap_or(0.0);
    let extruded = options
        .extruded_height
        .filter(|extruded| (extruded - height).abs() > f64::EPSILON);

    let format = options.vertex_format;
    let mut geometry = GeometryData {
        topology: PrimitiveTopology::Triangles,
        ..Default::default()
    };
    let mut normals = format.contains(VertexFormat::NORMAL).then(Vec::new);
    let mut sts = format.contains(VertexFormat::ST).then(Vec::new);
    let st_rotation = options.st_rotation.unwrap_or(0.0);

    let add_disc = |geometry: &mut GeometryData,
                        normals: &mut Option<Vec<Vec3>>,
                        sts: &mut Option<Vec<Vec2>>,
                        disc_height: f64,
                        facing_up: bool| {
        // Center vertex first, perimeter after.
        let base = geometry.positions.len() as u32;
        geometry.positions.push(frame.center + frame.up * disc_height);

        let normal = if facing_up { frame.up } else { -frame.up };
        if let Some(normals) = normals {
            normals.push(normal.as_vec3());
        }
        if let Some(sts) = sts {
            sts.push(Vec2::new(0.5, 0.5));
        }
        for i in 0..point_count {
            let theta = std::f64::consts::TAU * (i as f64) / (point_count as f64);
            geometry.positions.push(frame.position(theta, disc_height));
            if let Some(normals) = normals {
                normals.push(normal.as_vec3());
            }
            if let Some(sts) = sts {
                let st_theta = theta - st_rotation;
                sts.push(Vec2::new(
                    0.5 + 0.5 * st_theta.cos() as f32,
                    0.5 + 0.5 * st_theta.sin() as f32,
                ));
            }
        }
        for i in 0..point_count {
            let current = base + 1 + i as u32;
            let next = base + 1 + ((i + 1) % point_count) as u32;
            if facing_up {
                geometry.indices.extend_from_slice(&[base, current, next]);
            } else {
                geometry.indices.extend_from_slice(&[base, next, current]);
            }
        }
    };

    add_disc(&mut geometry, &mut normals, &mut sts, height, true);

    if let Some(extruded_height) = extruded {
        add_disc(&mut geometry, &mut normals, &mut sts, extruded_height, false);

        // Side wall between the two rings.
        let wall_base = geometry.positions.len() as u32;
        for i in 0..point_count {
            let theta = std::f64::consts::TAU * (i as f64) / (point_count as f64);
            let top = frame.position(theta, height);
            let bottom = frame.position(theta, extruded_height);
            geometry.positions.push(top);
            geometry.positions.push(bottom);
            if let Some(normals) = &mut normals {
                let outward = (top - frame.center - frame.up * height)
                    .try_normalize()
                    .unwrap_or(frame.up)
                    .as_vec3();
                normals.push(outward);
                normals.push(outward);
            }
            if let Some(sts) = &mut sts {
                let s = (i as f32) / (point_count as f32);
                sts.push(Vec2::new(s, 1.0));
                sts.push(Vec2::new(s, 0.0));
            }
        }
        for i in 0..point_count {
            let next = (i + 1) % point_count;
            let top_current = wall_base + 2 * i as u32;
            let bottom_current = top_current + 1;
            let top_next = wall_base + 2 * next as u32;
            let bottom_next = top_next + 1;
            geometry
                .indices
                .extend_from_slice(&[top_current, bottom_current, top_next]);
            geometry
                .indices
                .extend_from_slice(&[top_next, bottom_current, bottom_next]);
        }
    }

    geometry.normals = normals;
    geometry.sts = sts;
    Some(geometry)
}

/// Builds the ellipse outline: the perimeter ring (two rings when
/// extruded) plus vertical connector lines between them.
#[must_use]
pub fn outline_geometry(options: &EllipseGeometryOptions) -> Option<GeometryData> {
    let frame = EllipseFrame::from_options(options)?;
    let point_count = frame.perimeter_point_count();
    let height = options.height.unwrap_or(0.0);
    let extruded = options
        .extruded_height
        .filter(|extruded| (extruded - height).abs() > f64::EPSILON);

    let mut geometry = GeometryData {
        topology: PrimitiveTopology::Lines,
        ..Default::default()
    };

    let add_ring = |geometry: &mut GeometryData, ring_height: f64| -> u32 {
        let base = geometry.positions.len() as u32;
        for i in 0..point_count {
            let theta = std::f64::consts::TAU * (i as f64) / (point_count as f64);
            geometry.positions.push(frame.position(theta, ring_height));
        }
        for i in 0..point_count {
            let next = (i + 1) % point_count;
            geometry
                .indices
                .extend_from_slice(&[base + i as u32, base + next as u32]);
        }
        base
    };

    let top_base = add_ring(&mut geometry, height);
    if let Some(extruded_height) = extruded {
        let bottom_base = add_ring(&mut geometry, extruded_height);

        let line_count = options
            .number_of_vertical_lines
            .unwrap_or(DEFAULT_VERTICAL_LINES)
            .min(point_count as u32);
        if line_count > 0 {
            let stride = (point_count as u32) / line_count;
            let mut i = 0;
            while i < point_count as u32 {
                geometry
                    .indices
                    .extend_from_slice(&[top_base + i, bottom_base + i]);
                i += stride.max(1);
            }
        }
    }

    Some(geometry)
}

/// The geographic rectangle covered by the ellipse, used to query
/// approximate terrain heights for clamp-to-ground resolution.
#[must_use]
pub fn compute_rectangle(options: &EllipseGeometryOptions) -> Option<Rectangle> {
    let center = options.center?;
    let semi_major = options.semi_major_axis?;

    let longitude = center.y.atan2(center.x);
    let latitude = (center.z / center.length().max(1.0)).clamp(-1.0, 1.0).asin();
    let angular_radius = semi_major / GLOBE_RADIUS;
    Some(Rectangle::new(
        longitude - angular_radius,
        latitude - angular_radius,
        longitude + angular_radius,
        latitude + angular_radius,
    ))
}
