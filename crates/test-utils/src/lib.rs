//! Shared test fixtures: synthetic GeoTIFF writing and data generators.
//!
//! Production code never writes GeoTIFFs (rasters arrive from upstream),
//! so the encoder lives here rather than in the raster crate.

use std::fs::File;
use std::path::Path;

use geo::{polygon, Polygon};
use tiff::encoder::{colortype, TiffEncoder};
use tiff::tags::Tag;

mod tags {
    pub const MODEL_PIXEL_SCALE: u16 = 33550;
    pub const MODEL_TIEPOINT: u16 = 33922;
    pub const GEO_KEY_DIRECTORY: u16 = 34735;
    pub const GDAL_NODATA: u16 = 42113;
}

/// Options for [`write_geotiff`].
#[derive(Debug, Clone, Copy)]
pub struct GeoTiffOptions {
    /// (min_x, min_y, max_x, max_y) in degrees.
    pub bounds: (f64, f64, f64, f64),
    /// EPSG code written into the GeoKeyDirectory (key 2048).
    pub epsg: u16,
    /// Value written as GDAL_NODATA.
    pub nodata: f32,
}

impl Default for GeoTiffOptions {
    fn default() -> Self {
        Self {
            bounds: (0.0, 40.0, 10.0, 50.0),
            epsg: 4326,
            nodata: -9999.0,
        }
    }
}

/// Write a single-band f32 GeoTIFF with geo-referencing tags.
///
/// Data is row-major, north row first, matching what the raster crate reads.
pub fn write_geotiff(
    path: &Path,
    width: u32,
    height: u32,
    data: &[f32],
    options: GeoTiffOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    assert_eq!(
        data.len(),
        (width * height) as usize,
        "data/dimension mismatch"
    );

    let (min_x, min_y, max_x, max_y) = options.bounds;
    let scale_x = (max_x - min_x) / width as f64;
    let scale_y = (max_y - min_y) / height as f64;

    let file = File::create(path)?;
    let mut encoder = TiffEncoder::new(file)?;
    let mut image = encoder.new_image::<colortype::Gray32Float>(width, height)?;

    image.encoder().write_tag(
        Tag::Unknown(tags::MODEL_PIXEL_SCALE),
        &[scale_x, scale_y, 0.0][..],
    )?;
    // Tiepoint anchors pixel (0,0) at the north-west corner.
    image.encoder().write_tag(
        Tag::Unknown(tags::MODEL_TIEPOINT),
        &[0.0, 0.0, 0.0, min_x, max_y, 0.0][..],
    )?;
    // GeoKeyDirectory: version 1.1.0, one key (GeographicTypeGeoKey).
    image.encoder().write_tag(
        Tag::Unknown(tags::GEO_KEY_DIRECTORY),
        &[1u16, 1, 0, 1, 2048, 0, 1, options.epsg][..],
    )?;
    let nodata = format!("{}", options.nodata);
    image
        .encoder()
        .write_tag(Tag::Unknown(tags::GDAL_NODATA), nodata.as_str())?;

    image.write_data(data)?;
    Ok(())
}

/// Probability grid with a predictable pattern: cell index `i` gets
/// `(i % 100) / 99`, cycling through [0, 1].
pub fn probability_grid(width: usize, height: usize) -> Vec<f32> {
    (0..width * height)
        .map(|i| (i % 100) as f32 / 99.0)
        .collect()
}

/// Constant-valued grid.
pub fn constant_grid(width: usize, height: usize, value: f32) -> Vec<f32> {
    vec![value; width * height]
}

/// Probability grid where every `n`-th cell is replaced by `sentinel`.
pub fn grid_with_sentinels(width: usize, height: usize, n: usize, sentinel: f32) -> Vec<f32> {
    let mut data = probability_grid(width, height);
    for (i, v) in data.iter_mut().enumerate() {
        if i % n == 0 {
            *v = sentinel;
        }
    }
    data
}

/// Axis-aligned square polygon, handy as a region boundary stand-in.
pub fn square_polygon(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Polygon<f64> {
    polygon![
        (x: min_x, y: min_y),
        (x: max_x, y: min_y),
        (x: max_x, y: max_y),
        (x: min_x, y: max_y),
        (x: min_x, y: min_y),
    ]
}
