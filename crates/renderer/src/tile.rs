//! XYZ tile renderer.
//!
//! Renders a 256x256 slippy-map tile from a forecast raster: sample the
//! raster per pixel, classify through the hazard ramp, encode as an
//! indexed PNG. Pixel rows are spaced linearly in Web Mercator Y and
//! converted back to latitude per row, so tiles line up with standard
//! basemaps.

use thiserror::Error;

use forecast_common::tile::mercator_y_to_lat;
use forecast_common::{TileCoord, TILE_SIZE};
use raster::ForecastRaster;

use crate::png::create_png_indexed;
use crate::ramp::{classify_index, hazard_palette, TRANSPARENT_INDEX};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Invalid tile coordinate {z}/{x}/{y}")]
    InvalidTile { z: u32, x: u32, y: u32 },

    #[error("Tile {z}/{x}/{y} does not intersect the forecast extent")]
    TileOutOfBounds { z: u32, x: u32, y: u32 },

    #[error("PNG encoding failed: {0}")]
    Encoding(String),
}

/// Render one tile of the raster as an indexed PNG.
///
/// Pixels outside the raster extent or holding the nodata sentinel are
/// transparent. A tile whose footprint misses the raster entirely is an
/// error so the caller can answer 404 rather than serve blank tiles.
pub fn render_tile(raster: &ForecastRaster, tile: TileCoord) -> Result<Vec<u8>, RenderError> {
    if !tile.is_valid() {
        return Err(RenderError::InvalidTile {
            z: tile.z,
            x: tile.x,
            y: tile.y,
        });
    }

    let geo = tile.latlon_bounds();
    if !geo.intersects(&raster.bounds()) {
        return Err(RenderError::TileOutOfBounds {
            z: tile.z,
            x: tile.x,
            y: tile.y,
        });
    }

    let merc = tile.mercator_bounds();
    let merc_y_step = merc.height() / TILE_SIZE as f64;
    let lon_step = geo.width() / TILE_SIZE as f64;

    let mut indices = vec![TRANSPARENT_INDEX; TILE_SIZE * TILE_SIZE];
    for row in 0..TILE_SIZE {
        let merc_y = merc.max_y - (row as f64 + 0.5) * merc_y_step;
        let lat = mercator_y_to_lat(merc_y);
        for col in 0..TILE_SIZE {
            let lon = geo.min_x + (col as f64 + 0.5) * lon_step;
            if let Some(value) = raster.sample(lon, lat) {
                if !raster.is_nodata(value) {
                    indices[row * TILE_SIZE + col] = classify_index(value);
                }
            }
        }
    }

    create_png_indexed(TILE_SIZE, TILE_SIZE, &hazard_palette(), &indices)
        .map_err(RenderError::Encoding)
}
