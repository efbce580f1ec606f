//! Planar polygons built from raw positions.
//!
//! Input cleanup collapses consecutive duplicate points (including the
//! closing wraparound). Fewer than three unique points, or points that
//! are collinear, cannot span a plane — those inputs yield `None` rather
//! than an error so the caller can skip the shape for the frame.
//!
//! Triangulation is a fan over the projected outline and assumes a convex
//! outline.

use glam::{DVec2, DVec3, Vec2, Vec3};
use smallvec::SmallVec;

use super::{GeometryData, PrimitiveTopology, VertexFormat};

const DUPLICATE_EPSILON: f64 = 1.0e-10;
const COLLINEAR_EPSILON: f64 = 1.0e-14;

/// A polygon whose vertices all lie in one plane.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanarPolygonGeometry {
    positions: Vec<DVec3>,
    vertex_format: VertexFormat,
}

impl PlanarPolygonGeometry {
    /// # Panics
    ///
    /// Panics when `positions` is empty.
    #[must_use]
    pub fn from_positions(positions: Vec<DVec3>, vertex_format: VertexFormat) -> Self {
        assert!(!positions.is_empty(), "positions is required");
        Self {
            positions,
            vertex_format,
        }
    }

    /// Builds vertex and index data, or `None` for degenerate input.
    #[must_use]
    pub fn create_geometry(&self) -> Option<GeometryData> {
        let unique = remove_duplicates(&self.positions);
        if unique.len() < 3 {
            return None;
        }

        // Newell's method; a vanishing normal means collinear points.
        let mut normal = DVec3::ZERO;
        for i in 0..unique.len() {
            let current = unique[i];
            let next = unique[(i + 1) % unique.len()];
            normal += DVec3::new(
                (current.y - next.y) * (current.z + next.z),
                (current.z - next.z) * (current.x + next.x),
                (current.x - next.x) * (current.y + next.y),
            );
        }
        if normal.length_squared() < COLLINEAR_EPSILON {
            return None;
        }
        let normal = normal.normalize();

        // Plane basis for texture coordinates and tangents.
        let reference = if normal.z.abs() < 0.9 { DVec3::Z } else { DVec3::X };
        let tangent = reference.cross(normal).normalize();
        let bitangent = normal.cross(tangent);

        let projected: SmallVec<[DVec2; 8]> = unique
            .iter()
            .map(|p| DVec2::new(p.dot(tangent), p.dot(bitangent)))
            .collect();
        let mut min = projected[0];
        let mut max = projected[0];
        for p in &projected[1..] {
            min = min.min(*p);
            max = max.max(*p);
        }
        let extent = (max - min).max(DVec2::splat(f64::EPSILON));

        let format = self.vertex_format;
        let vertex_count = unique.len();
        let mut geometry = GeometryData {
            topology: PrimitiveTopology::Triangles,
            positions: unique,
            ..Default::default()
        };
        if format.contains(VertexFormat::NORMAL) {
            geometry.normals = Some(vec![normal.as_vec3(); vertex_count]);
        }
        if format.contains(VertexFormat::ST) {
            geometry.sts = Some(
                projected
                    .iter()
                    .map(|p| {
                        let st = (*p - min) / extent;
                        Vec2::new(st.x as f32, st.y as f32)
                    })
                    .collect(),
            );
        }
        if format.contains(VertexFormat::TANGENT) {
            geometry.tangents = Some(vec![tangent.as_vec3(); vertex_count]);
        }
        if format.contains(VertexFormat::BITANGENT) {
            geometry.bitangents = Some(vec![bitangent.as_vec3(); vertex_count]);
        }

        geometry.indices = Vec::with_capacity((vertex_count - 2) * 3);
        for i in 1..vertex_count - 1 {
            geometry
                .indices
                .extend_from_slice(&[0, i as u32, i as u32 + 1]);
        }
        Some(geometry)
    }
}

fn remove_duplicates(positions: &[DVec3]) -> Vec<DVec3> {
    let mut unique: Vec<DVec3> = Vec::with_capacity(positions.len());
    for position in positions {
        if unique
            .last()
            .is_none_or(|last| last.distance_squared(*position) > DUPLICATE_EPSILON)
        {
            unique.push(*position);
        }
    }
    // Wraparound duplicate
    if unique.len() > 1
        && unique[0].distance_squared(*unique.last().expect("non-empty")) <= DUPLICATE_EPSILON
    {
        unique.pop();
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_unique_positions_build() {
        let polygon = PlanarPolygonGeometry::from_positions(
            vec![
                DVec3::new(0.0, 0.0, 0.0),
                DVec3::new(1.0, 0.0, 0.0),
                DVec3::new(0.0, 1.0, 0.0),
            ],
            VertexFormat::POSITION_ONLY,
        );
        let geometry = polygon.create_geometry().unwrap();
        assert_eq!(geometry.positions.len(), 3);
        assert_eq!(geometry.indices.len(), 3);
    }

    #[test]
    fn duplicate_collapsed_positions_are_degenerate() {
        let polygon = PlanarPolygonGeometry::from_positions(
            vec![
                DVec3::new(1.0, 1.0, 0.0),
                DVec3::new(1.0, 1.0, 0.0),
                DVec3::new(1.0, 1.0, 0.0),
                DVec3::new(1.0, 1.0, 0.0),
            ],
            VertexFormat::POSITION_ONLY,
        );
        assert!(polygon.create_geometry().is_none());
    }

    #[test]
    fn collinear_positions_are_degenerate() {
        let polygon = PlanarPolygonGeometry::from_positions(
            vec![
                DVec3::new(0.0, 0.0, 1.0),
                DVec3::new(0.0, 0.0, 2.0),
                DVec3::new(0.0, 0.0, 3.0),
            ],
            VertexFormat::POSITION_ONLY,
        );
        assert!(polygon.create_geometry().is_none());
    }

    #[test]
    fn quad_builds_all_attributes() {
        let polygon = PlanarPolygonGeometry::from_positions(
            vec![
                DVec3::new(-1.0, -1.0, 0.0),
                DVec3::new(1.0, -1.0, 0.0),
                DVec3::new(1.0, 1.0, 1.0),
                DVec3::new(-1.0, 1.0, 1.0),
            ],
            VertexFormat::ALL,
        );
        let geometry = polygon.create_geometry().unwrap();
        assert_eq!(geometry.positions.len(), 4);
        assert_eq!(geometry.indices.len(), 2 * 3);
        assert_eq!(geometry.normals.as_ref().unwrap().len(), 4);
        assert_eq!(geometry.sts.as_ref().unwrap().len(), 4);
        assert_eq!(geometry.tangents.as_ref().unwrap().len(), 4);
        assert_eq!(geometry.bitangents.as_ref().unwrap().len(), 4);
    }

    #[test]
    #[should_panic(expected = "positions is required")]
    fn empty_positions_panic() {
        let _ = PlanarPolygonGeometry::from_positions(vec![], VertexFormat::POSITION_ONLY);
    }
}
