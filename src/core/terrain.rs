//! Approximate terrain heights.
//!
//! Geometry with a clamp-to-ground extruded height needs a coarse terrain
//! height for its footprint before any terrain tile is streamed in. The
//! table behind this lookup is process-wide, initialized once at program
//! start and immutable afterwards; consumers query it through
//! [`approximate_heights`].

use std::sync::OnceLock;

use crate::errors::{GaiaError, Result};

/// A geographic rectangle in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rectangle {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl Rectangle {
    #[must_use]
    pub const fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    #[must_use]
    pub fn intersects(&self, other: &Rectangle) -> bool {
        self.west <= other.east
            && other.west <= self.east
            && self.south <= other.north
            && other.south <= self.north
    }
}

/// Minimum and maximum terrain height over some region, in meters.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HeightRange {
    pub minimum_terrain_height: f64,
    pub maximum_terrain_height: f64,
}

/// The coarse tile table consulted by [`approximate_heights`].
#[derive(Debug, Default)]
pub struct TerrainHeightTable {
    tiles: Vec<(Rectangle, HeightRange)>,
}

impl TerrainHeightTable {
    #[must_use]
    pub fn new(tiles: Vec<(Rectangle, HeightRange)>) -> Self {
        Self { tiles }
    }

    /// Aggregates the height ranges of every tile intersecting `rectangle`.
    /// An empty intersection yields a flat `[0, 0]` range.
    #[must_use]
    pub fn query(&self, rectangle: &Rectangle) -> HeightRange {
        let mut result: Option<HeightRange> = None;
        for (tile, heights) in &self.tiles {
            if !tile.intersects(rectangle) {
                continue;
            }
            let entry = result.get_or_insert(*heights);
            entry.minimum_terrain_height = entry
                .minimum_terrain_height
                .min(heights.minimum_terrain_height);
            entry.maximum_terrain_height = entry
                .maximum_terrain_height
                .max(heights.maximum_terrain_height);
        }
        result.unwrap_or_default()
    }
}

static TABLE: OnceLock<TerrainHeightTable> = OnceLock::new();

/// Installs the process-wide height table. The first call wins; later calls
/// are ignored so independent subsystems may race to initialize at startup.
pub fn initialize(table: TerrainHeightTable) {
    let _ = TABLE.set(table);
}

/// Queries the approximate height range for `rectangle`.
pub fn approximate_heights(rectangle: &Rectangle) -> Result<HeightRange> {
    TABLE
        .get()
        .map(|table| table.query(rectangle))
        .ok_or(GaiaError::TerrainHeightsUninitialized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_aggregates_intersecting_tiles() {
        let table = TerrainHeightTable::new(vec![
            (
                Rectangle::new(0.0, 0.0, 1.0, 1.0),
                HeightRange {
                    minimum_terrain_height: -10.0,
                    maximum_terrain_height: 50.0,
                },
            ),
            (
                Rectangle::new(1.0, 0.0, 2.0, 1.0),
                HeightRange {
                    minimum_terrain_height: -30.0,
                    maximum_terrain_height: 20.0,
                },
            ),
            (
                Rectangle::new(5.0, 5.0, 6.0, 6.0),
                HeightRange {
                    minimum_terrain_height: 1000.0,
                    maximum_terrain_height: 2000.0,
                },
            ),
        ]);

        let heights = table.query(&Rectangle::new(0.5, 0.2, 1.5, 0.8));
        assert_eq!(heights.minimum_terrain_height, -30.0);
        assert_eq!(heights.maximum_terrain_height, 50.0);
    }

    #[test]
    fn query_outside_all_tiles_is_flat() {
        let table = TerrainHeightTable::new(vec![(
            Rectangle::new(0.0, 0.0, 1.0, 1.0),
            HeightRange {
                minimum_terrain_height: -10.0,
                maximum_terrain_height: 50.0,
            },
        )]);
        assert_eq!(
            table.query(&Rectangle::new(3.0, 3.0, 4.0, 4.0)),
            HeightRange::default()
        );
    }
}
