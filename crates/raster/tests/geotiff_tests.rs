//! Integration tests for GeoTIFF reading, statistics, and region masking
//! against synthetic rasters.

use geo::Geometry;
use raster::{mask_by_region, statistics, ForecastRaster, RasterError};
use test_utils::{
    grid_with_sentinels, probability_grid, square_polygon, write_geotiff, GeoTiffOptions,
};

/// 10x10 raster over (0,40)-(10,50): one cell per degree.
fn open_test_raster(data: &[f32]) -> (tempfile::TempDir, ForecastRaster) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("2025-04-30T04-46-00_tomorrow.tif");
    write_geotiff(&path, 10, 10, data, GeoTiffOptions::default()).unwrap();
    let raster = ForecastRaster::open(&path).unwrap();
    (dir, raster)
}

#[test]
fn test_open_reads_geometry_and_values() {
    let data = probability_grid(10, 10);
    let (_dir, raster) = open_test_raster(&data);

    assert_eq!(raster.width(), 10);
    assert_eq!(raster.height(), 10);
    assert_eq!(raster.nodata(), -9999.0);

    let bounds = raster.bounds();
    assert_eq!(bounds.to_array(), [0.0, 40.0, 10.0, 50.0]);

    // Row 0 is the northern edge: cell (0,0) center is (0.5, 49.5).
    assert_eq!(raster.sample(0.5, 49.5), Some(data[0]));
    // South-east corner cell.
    assert_eq!(raster.sample(9.5, 40.5), Some(data[99]));
    // Outside the extent.
    assert_eq!(raster.sample(-0.5, 45.0), None);
    assert_eq!(raster.sample(5.0, 51.0), None);
}

#[test]
fn test_open_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = ForecastRaster::open(&dir.path().join("absent.tif")).unwrap_err();
    assert!(matches!(err, RasterError::NotFound(_)));
}

#[test]
fn test_open_rejects_wrong_crs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mercator.tif");
    let options = GeoTiffOptions {
        epsg: 3857,
        ..GeoTiffOptions::default()
    };
    write_geotiff(&path, 4, 4, &probability_grid(4, 4), options).unwrap();

    let err = ForecastRaster::open(&path).unwrap_err();
    match err {
        RasterError::Unsupported(msg) => assert!(msg.contains("EPSG:3857"), "{}", msg),
        other => panic!("expected Unsupported, got {:?}", other),
    }
}

#[test]
fn test_statistics_excludes_sentinels() {
    // Every 10th of 100 cells is sentinel: 90% remain valid.
    let data = grid_with_sentinels(10, 10, 10, -9999.0);
    let (_dir, raster) = open_test_raster(&data);

    let stats = statistics(&raster);
    assert_eq!(stats.total_count, 100);
    assert_eq!(stats.valid_count, 90);
    assert!(stats.min >= 0.0 && stats.min <= 1.0);
    assert!(stats.max >= 0.0 && stats.max <= 1.0);
    assert!(stats.mean > 0.0 && stats.mean < 1.0);
    assert!(stats.percentile_2 <= stats.median && stats.median <= stats.percentile_98);
}

#[test]
fn test_statistics_all_sentinel() {
    let data = vec![-9999.0f32; 100];
    let (_dir, raster) = open_test_raster(&data);

    let stats = statistics(&raster);
    assert_eq!(stats.valid_count, 0);
    assert_eq!(stats.total_count, 100);
    assert_eq!(stats.mean, 0.0);
}

#[test]
fn test_mask_by_region_shape_matches_crop() {
    let data = probability_grid(10, 10);
    let (_dir, raster) = open_test_raster(&data);

    // 4x4 degree square, cell-aligned.
    let region = Geometry::Polygon(square_polygon(2.0, 42.0, 6.0, 46.0));
    let masked = mask_by_region(&raster, &region);

    assert_eq!(masked.width, 4);
    assert_eq!(masked.height, 4);
    assert_eq!(masked.values.len(), 16);
    assert_eq!(masked.inside.len(), 16);
    assert_eq!(masked.bounds.to_array(), [2.0, 42.0, 6.0, 46.0]);

    // Every cell center of the cropped window lies inside the square.
    assert!(masked.inside.iter().all(|&m| m == 1));

    // Values come from the cropped window of the source grid:
    // window rows 4..8, cols 2..6.
    assert_eq!(masked.values[0], data[4 * 10 + 2]);
    assert_eq!(masked.values[15], data[7 * 10 + 5]);
}

#[test]
fn test_mask_by_region_unaligned_boundary() {
    let data = probability_grid(10, 10);
    let (_dir, raster) = open_test_raster(&data);

    // Square straddling cell interiors: crop snaps outward to cell edges.
    let region = Geometry::Polygon(square_polygon(2.4, 42.4, 5.6, 45.6));
    let masked = mask_by_region(&raster, &region);

    assert_eq!(masked.width, 4);
    assert_eq!(masked.height, 4);
    // Corner cell centers (2.5, 45.5) etc. are inside; all 16 centers are
    // within the square here.
    assert!(masked.has_inside_cells());
}

#[test]
fn test_mask_by_region_outside_extent() {
    let data = probability_grid(10, 10);
    let (_dir, raster) = open_test_raster(&data);

    let region = Geometry::Polygon(square_polygon(20.0, 20.0, 25.0, 25.0));
    let masked = mask_by_region(&raster, &region);

    assert!(masked.is_empty());
    assert!(!masked.has_inside_cells());
}

#[test]
fn test_mask_by_region_partial_overlap() {
    let data = probability_grid(10, 10);
    let (_dir, raster) = open_test_raster(&data);

    // Square half outside the western edge: crop clips to the raster.
    let region = Geometry::Polygon(square_polygon(-3.0, 44.0, 3.0, 47.0));
    let masked = mask_by_region(&raster, &region);

    assert_eq!(masked.width, 3);
    assert_eq!(masked.height, 3);
    assert!(masked.has_inside_cells());
    assert_eq!(masked.bounds.min_x, 0.0);
}

#[test]
fn test_multipolygon_region() {
    let data = probability_grid(10, 10);
    let (_dir, raster) = open_test_raster(&data);

    let region = Geometry::MultiPolygon(geo::MultiPolygon(vec![
        square_polygon(1.0, 41.0, 3.0, 43.0),
        square_polygon(7.0, 47.0, 9.0, 49.0),
    ]));
    let masked = mask_by_region(&raster, &region);

    // Crop spans both parts; cells between them are outside the geometry.
    assert_eq!(masked.width, 8);
    assert_eq!(masked.height, 8);
    assert!(masked.has_inside_cells());
    assert!(masked.inside.iter().any(|&m| m == 0));
}
