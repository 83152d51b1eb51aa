//! Common types shared across the lhasa-tiles services.

pub mod bbox;
pub mod horizon;
pub mod tile;

pub use bbox::BoundingBox;
pub use horizon::{Horizon, RasterFilename};
pub use tile::{lat_to_mercator_y, mercator_y_to_lat, TileCoord};

/// Reserved value marking "no data" cells in forecast rasters.
pub const NODATA_SENTINEL: f32 = -9999.0;

/// Tile edge length in pixels for all rendered map tiles.
pub const TILE_SIZE: usize = 256;
