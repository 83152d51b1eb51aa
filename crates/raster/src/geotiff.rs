//! GeoTIFF reader for forecast probability rasters.
//!
//! Rasters must carry exactly one band, an EPSG:4326 GeoKeyDirectory, and
//! ModelPixelScale/ModelTiepoint geo-referencing. Anything else is rejected
//! at open time rather than coerced.

use std::path::Path;

use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::tags::Tag;

use forecast_common::{BoundingBox, NODATA_SENTINEL};

use crate::{RasterError, Result};

/// GeoKeyDirectory key id for the geographic CRS code.
const GEOGRAPHIC_TYPE_GEO_KEY: u16 = 2048;
/// GeoKeyDirectory key id for a projected CRS code.
const PROJECTED_CS_TYPE_GEO_KEY: u16 = 3072;

const EXPECTED_EPSG: u16 = 4326;

/// A forecast raster loaded into memory.
///
/// Data is row-major with row 0 at the northern edge, matching the
/// top-left tiepoint convention the upstream publisher uses.
#[derive(Debug)]
pub struct ForecastRaster {
    data: Vec<f32>,
    width: usize,
    height: usize,
    bounds: BoundingBox,
    pixel_width: f64,
    pixel_height: f64,
    nodata: f32,
}

/// A rectangular pixel window within a raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub col0: usize,
    pub row0: usize,
    pub width: usize,
    pub height: usize,
}

impl ForecastRaster {
    /// Open and fully decode a raster, validating band count and CRS.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(RasterError::NotFound(path.to_path_buf()));
        }

        let file = std::fs::File::open(path)?;
        let mut decoder = Decoder::new(file)?;

        // Daily global rasters run to a few hundred MB decoded.
        let mut limits = Limits::default();
        limits.decoding_buffer_size = 1024 * 1024 * 1024;
        limits.intermediate_buffer_size = 1024 * 1024 * 1024;
        limits.ifd_value_size = 1024 * 1024 * 1024;
        decoder = decoder.with_limits(limits);

        let samples = decoder.get_tag_u32(Tag::SamplesPerPixel).unwrap_or(1);
        if samples != 1 {
            return Err(RasterError::Unsupported(format!(
                "expected 1 band, got {}",
                samples
            )));
        }

        let geo_keys = decoder
            .get_tag_u16_vec(Tag::GeoKeyDirectoryTag)
            .map_err(|_| RasterError::Unsupported("missing GeoKeyDirectory".to_string()))?;
        match epsg_from_geo_keys(&geo_keys) {
            Some(EXPECTED_EPSG) => {}
            Some(code) => {
                return Err(RasterError::Unsupported(format!(
                    "expected EPSG:{}, got EPSG:{}",
                    EXPECTED_EPSG, code
                )));
            }
            None => {
                return Err(RasterError::Unsupported(
                    "no CRS code in GeoKeyDirectory".to_string(),
                ));
            }
        }

        let (width, height) = decoder.dimensions()?;
        let (bounds, pixel_width, pixel_height) =
            read_geotransform(&mut decoder, width, height)?;

        let data = match decoder.read_image()? {
            DecodingResult::F32(data) => data,
            DecodingResult::F64(data) => data.into_iter().map(|v| v as f32).collect(),
            _ => {
                return Err(RasterError::Unsupported(
                    "expected floating-point samples".to_string(),
                ));
            }
        };

        let nodata = decoder
            .get_tag_ascii_string(Tag::GdalNodata)
            .ok()
            .and_then(|s| s.trim_end_matches('\0').trim().parse().ok())
            .unwrap_or(NODATA_SENTINEL);

        Ok(Self {
            data,
            width: width as usize,
            height: height as usize,
            bounds,
            pixel_width,
            pixel_height,
            nodata,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Geographic bounds of the full raster.
    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    pub fn nodata(&self) -> f32 {
        self.nodata
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Whether a value is the nodata sentinel.
    pub fn is_nodata(&self, value: f32) -> bool {
        (value - self.nodata).abs() < 0.001
    }

    /// Value at a pixel coordinate, `None` outside the grid.
    pub fn value_at(&self, col: usize, row: usize) -> Option<f32> {
        if col >= self.width || row >= self.height {
            return None;
        }
        Some(self.data[row * self.width + col])
    }

    /// Nearest-cell sample at a geographic coordinate, `None` outside the
    /// raster extent. Nodata cells are returned as-is; the caller decides
    /// how to treat the sentinel.
    pub fn sample(&self, lon: f64, lat: f64) -> Option<f32> {
        if !self.bounds.contains_point(lon, lat) {
            return None;
        }

        let col = (((lon - self.bounds.min_x) / self.pixel_width) as usize).min(self.width - 1);
        let row = (((self.bounds.max_y - lat) / self.pixel_height) as usize).min(self.height - 1);
        self.value_at(col, row)
    }

    /// Geographic center of a cell.
    pub fn pixel_center(&self, col: usize, row: usize) -> (f64, f64) {
        let lon = self.bounds.min_x + (col as f64 + 0.5) * self.pixel_width;
        let lat = self.bounds.max_y - (row as f64 + 0.5) * self.pixel_height;
        (lon, lat)
    }

    /// Pixel window covering the intersection of `bbox` with the raster
    /// extent, snapped outward to cell edges. `None` when they don't overlap.
    pub fn window_for(&self, bbox: &BoundingBox) -> Option<Window> {
        let clipped = self.bounds.intersection(bbox)?;

        let col0 = ((clipped.min_x - self.bounds.min_x) / self.pixel_width).floor() as usize;
        let col1 = (((clipped.max_x - self.bounds.min_x) / self.pixel_width).ceil() as usize)
            .min(self.width);
        let row0 = ((self.bounds.max_y - clipped.max_y) / self.pixel_height).floor() as usize;
        let row1 = (((self.bounds.max_y - clipped.min_y) / self.pixel_height).ceil() as usize)
            .min(self.height);

        if col1 <= col0 || row1 <= row0 {
            return None;
        }

        Some(Window {
            col0,
            row0,
            width: col1 - col0,
            height: row1 - row0,
        })
    }

    /// Geographic bounds of a pixel window.
    pub fn window_bounds(&self, window: &Window) -> BoundingBox {
        BoundingBox::new(
            self.bounds.min_x + window.col0 as f64 * self.pixel_width,
            self.bounds.max_y - (window.row0 + window.height) as f64 * self.pixel_height,
            self.bounds.min_x + (window.col0 + window.width) as f64 * self.pixel_width,
            self.bounds.max_y - window.row0 as f64 * self.pixel_height,
        )
    }

    /// Copy the values of a pixel window, row-major.
    pub fn read_window(&self, window: &Window) -> Vec<f32> {
        let mut out = Vec::with_capacity(window.width * window.height);
        for row in window.row0..window.row0 + window.height {
            let start = row * self.width + window.col0;
            out.extend_from_slice(&self.data[start..start + window.width]);
        }
        out
    }
}

/// Extract the CRS code from a GeoKeyDirectory tag value.
///
/// Layout: a 4-short header, then 4-short entries [key, location, count,
/// value]; inline values have location 0.
fn epsg_from_geo_keys(keys: &[u16]) -> Option<u16> {
    if keys.len() < 4 {
        return None;
    }
    for entry in keys[4..].chunks_exact(4) {
        let (key, location, value) = (entry[0], entry[1], entry[3]);
        if (key == GEOGRAPHIC_TYPE_GEO_KEY || key == PROJECTED_CS_TYPE_GEO_KEY) && location == 0 {
            return Some(value);
        }
    }
    None
}

/// Read ModelPixelScale + ModelTiepoint into bounds and per-pixel degrees.
fn read_geotransform<R: std::io::Read + std::io::Seek>(
    decoder: &mut Decoder<R>,
    width: u32,
    height: u32,
) -> Result<(BoundingBox, f64, f64)> {
    let scale = decoder
        .get_tag_f64_vec(Tag::ModelPixelScaleTag)
        .map_err(|_| RasterError::Unsupported("missing ModelPixelScale".to_string()))?;
    let tiepoint = decoder
        .get_tag_f64_vec(Tag::ModelTiepointTag)
        .map_err(|_| RasterError::Unsupported("missing ModelTiepoint".to_string()))?;

    if scale.len() < 2 || tiepoint.len() < 6 {
        return Err(RasterError::Unsupported(
            "malformed geo-referencing tags".to_string(),
        ));
    }

    // Tiepoint maps pixel (i, j) to geographic (x, y); the publisher anchors
    // pixel (0, 0) at the north-west corner.
    let pixel_width = scale[0];
    let pixel_height = scale[1];
    let min_x = tiepoint[3] - tiepoint[0] * pixel_width;
    let max_y = tiepoint[4] + tiepoint[1] * pixel_height;

    let bounds = BoundingBox::new(
        min_x,
        max_y - height as f64 * pixel_height,
        min_x + width as f64 * pixel_width,
        max_y,
    );

    Ok((bounds, pixel_width, pixel_height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epsg_from_geo_keys() {
        // header + one geographic key
        let keys = [1u16, 1, 0, 1, 2048, 0, 1, 4326];
        assert_eq!(epsg_from_geo_keys(&keys), Some(4326));

        // projected key
        let keys = [1u16, 1, 0, 1, 3072, 0, 1, 3857];
        assert_eq!(epsg_from_geo_keys(&keys), Some(3857));

        // no CRS key at all
        let keys = [1u16, 1, 0, 1, 1024, 0, 1, 2];
        assert_eq!(epsg_from_geo_keys(&keys), None);

        assert_eq!(epsg_from_geo_keys(&[]), None);
    }
}
