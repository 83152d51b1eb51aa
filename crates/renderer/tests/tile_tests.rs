//! Tile rendering against synthetic forecast rasters.

use forecast_common::TileCoord;
use raster::ForecastRaster;
use renderer::{render_tile, RenderError};
use test_utils::{constant_grid, probability_grid, write_geotiff, GeoTiffOptions};

/// 10x10 raster over (0,40)-(10,50): one cell per degree.
fn open_test_raster(data: &[f32]) -> (tempfile::TempDir, ForecastRaster) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("2025-04-30T04-46-00_today.tif");
    write_geotiff(&path, 10, 10, data, GeoTiffOptions::default()).unwrap();
    let raster = ForecastRaster::open(&path).unwrap();
    (dir, raster)
}

#[test]
fn test_render_overlapping_tile() {
    let (_dir, raster) = open_test_raster(&probability_grid(10, 10));

    // z=5 x=16 y=11 spans roughly lon 0..11.25, lat 41..49.
    let png = render_tile(&raster, TileCoord::new(5, 16, 11)).unwrap();

    assert_eq!(&png[0..8], &[137, 80, 78, 71, 13, 10, 26, 10]);
    assert_eq!(&png[16..20], &256u32.to_be_bytes());
    assert_eq!(&png[20..24], &256u32.to_be_bytes());
    // Indexed color type with a transparency chunk.
    assert_eq!(png[25], 3);
    assert!(png.windows(4).any(|w| w == b"tRNS"));
}

#[test]
fn test_render_is_deterministic() {
    let (_dir, raster) = open_test_raster(&probability_grid(10, 10));

    let tile = TileCoord::new(6, 32, 23);
    let first = render_tile(&raster, tile).unwrap();
    let second = render_tile(&raster, tile).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_render_reflects_values() {
    let low = {
        let (_dir, raster) = open_test_raster(&constant_grid(10, 10, 0.1));
        render_tile(&raster, TileCoord::new(6, 32, 23)).unwrap()
    };
    let high = {
        let (_dir, raster) = open_test_raster(&constant_grid(10, 10, 0.9));
        render_tile(&raster, TileCoord::new(6, 32, 23)).unwrap()
    };
    assert_ne!(low, high);
}

#[test]
fn test_tile_outside_extent() {
    let (_dir, raster) = open_test_raster(&probability_grid(10, 10));

    let err = render_tile(&raster, TileCoord::new(5, 0, 0)).unwrap_err();
    assert!(matches!(err, RenderError::TileOutOfBounds { z: 5, x: 0, y: 0 }));
}

#[test]
fn test_invalid_tile_coordinate() {
    let (_dir, raster) = open_test_raster(&probability_grid(10, 10));

    let err = render_tile(&raster, TileCoord::new(3, 8, 0)).unwrap_err();
    assert!(matches!(err, RenderError::InvalidTile { .. }));
}

#[test]
fn test_sentinel_tile_renders_transparent() {
    // All-sentinel raster still renders, just fully transparent.
    let (_dir, raster) = open_test_raster(&vec![-9999.0f32; 100]);

    let png = render_tile(&raster, TileCoord::new(6, 32, 23)).unwrap();
    assert_eq!(&png[0..8], &[137, 80, 78, 71, 13, 10, 26, 10]);
}
