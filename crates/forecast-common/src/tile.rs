//! Slippy-map (XYZ) tile addressing and Web Mercator conversions.

use crate::BoundingBox;
use serde::{Deserialize, Serialize};

const EARTH_RADIUS_M: f64 = 6378137.0;

/// A tile address (z/x/y) in the standard XYZ Web Mercator pyramid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    /// Zoom level
    pub z: u32,
    /// Column
    pub x: u32,
    /// Row (top-left origin)
    pub y: u32,
}

impl TileCoord {
    pub fn new(z: u32, x: u32, y: u32) -> Self {
        Self { z, x, y }
    }

    /// Whether the column/row fall inside the pyramid at this zoom.
    pub fn is_valid(&self) -> bool {
        self.z <= 30 && self.x < (1u32 << self.z.min(30)) && self.y < (1u32 << self.z.min(30))
    }

    /// Geographic (lat/lon) bounds of this tile.
    pub fn latlon_bounds(&self) -> BoundingBox {
        let n = 2u32.pow(self.z) as f64;

        let lon_min = self.x as f64 / n * 360.0 - 180.0;
        let lon_max = (self.x + 1) as f64 / n * 360.0 - 180.0;

        let lat_max = (std::f64::consts::PI * (1.0 - 2.0 * self.y as f64 / n))
            .sinh()
            .atan()
            .to_degrees();
        let lat_min = (std::f64::consts::PI * (1.0 - 2.0 * (self.y + 1) as f64 / n))
            .sinh()
            .atan()
            .to_degrees();

        BoundingBox::new(lon_min, lat_min, lon_max, lat_max)
    }

    /// Web Mercator bounds of this tile in meters.
    ///
    /// Pixel rows are linear in Mercator Y, not in latitude, so the tile
    /// renderer samples in this space and converts each row back to latitude.
    pub fn mercator_bounds(&self) -> BoundingBox {
        let geo = self.latlon_bounds();
        BoundingBox::new(
            lon_to_mercator_x(geo.min_x),
            lat_to_mercator_y(geo.min_y),
            lon_to_mercator_x(geo.max_x),
            lat_to_mercator_y(geo.max_y),
        )
    }
}

/// Convert longitude to Web Mercator X in meters.
pub fn lon_to_mercator_x(lon: f64) -> f64 {
    lon.to_radians() * EARTH_RADIUS_M
}

/// Convert latitude to Web Mercator Y in meters.
pub fn lat_to_mercator_y(lat: f64) -> f64 {
    let lat_rad = lat.to_radians();
    ((std::f64::consts::PI / 4.0) + (lat_rad / 2.0)).tan().ln() * EARTH_RADIUS_M
}

/// Convert Web Mercator Y in meters back to latitude.
pub fn mercator_y_to_lat(y: f64) -> f64 {
    let y_normalized = y / EARTH_RADIUS_M;
    (2.0 * y_normalized.exp().atan() - std::f64::consts::PI / 2.0).to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zoom_zero_covers_world() {
        let bbox = TileCoord::new(0, 0, 0).latlon_bounds();
        assert!((bbox.min_x - (-180.0)).abs() < 1e-9);
        assert!((bbox.max_x - 180.0).abs() < 1e-9);
        // Web Mercator clips latitude at ~85.05
        assert!((bbox.max_y - 85.0511287798).abs() < 1e-6);
        assert!((bbox.min_y + 85.0511287798).abs() < 1e-6);
    }

    #[test]
    fn test_tile_validity() {
        assert!(TileCoord::new(0, 0, 0).is_valid());
        assert!(TileCoord::new(3, 7, 7).is_valid());
        assert!(!TileCoord::new(3, 8, 0).is_valid());
        assert!(!TileCoord::new(3, 0, 8).is_valid());
    }

    #[test]
    fn test_mercator_roundtrip() {
        for lat in [-80.0, -45.0, 0.0, 33.3, 60.0, 85.0] {
            let y = lat_to_mercator_y(lat);
            assert!((mercator_y_to_lat(y) - lat).abs() < 1e-9);
        }
    }

    #[test]
    fn test_adjacent_tiles_share_edges() {
        let a = TileCoord::new(5, 10, 12).latlon_bounds();
        let b = TileCoord::new(5, 11, 12).latlon_bounds();
        let c = TileCoord::new(5, 10, 13).latlon_bounds();
        assert!((a.max_x - b.min_x).abs() < 1e-12);
        assert!((a.min_y - c.max_y).abs() < 1e-12);
    }
}
