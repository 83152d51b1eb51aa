//! Region mask engine: crop a raster to a boundary geometry and mark the
//! cells whose centers fall inside it.

use geo::{BoundingRect, Contains, Geometry, Point};

use forecast_common::BoundingBox;

use crate::{ForecastRaster, Window};

/// A raster cropped to a region's bounding extent.
///
/// `values` and `inside` share the same row-major shape; `inside[i]` is 1
/// iff the center of cell `i` lies within the region geometry, which lets
/// callers draw the boundary distinctly from the probability surface.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskedRaster {
    pub values: Vec<f32>,
    pub inside: Vec<u8>,
    pub width: usize,
    pub height: usize,
    pub bounds: BoundingBox,
}

impl MaskedRaster {
    /// Empty result for a geometry that doesn't overlap the raster.
    fn empty() -> Self {
        Self {
            values: Vec::new(),
            inside: Vec::new(),
            width: 0,
            height: 0,
            bounds: BoundingBox::new(0.0, 0.0, 0.0, 0.0),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Whether any cell center falls inside the region geometry.
    pub fn has_inside_cells(&self) -> bool {
        self.inside.iter().any(|&m| m != 0)
    }
}

/// Crop `raster` to the bounding extent of `geometry` and compute the
/// inside-region mask.
///
/// The output covers exactly the cropped window; pixels outside it are not
/// represented. A geometry entirely outside the raster yields an empty
/// (zero-sized) result.
pub fn mask_by_region(raster: &ForecastRaster, geometry: &Geometry<f64>) -> MaskedRaster {
    let rect = match geometry.bounding_rect() {
        Some(rect) => rect,
        None => return MaskedRaster::empty(),
    };

    let geom_bbox = BoundingBox::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y);
    let window = match raster.window_for(&geom_bbox) {
        Some(window) => window,
        None => return MaskedRaster::empty(),
    };

    let values = raster.read_window(&window);
    let inside = inside_mask(raster, &window, geometry);

    MaskedRaster {
        values,
        inside,
        width: window.width,
        height: window.height,
        bounds: raster.window_bounds(&window),
    }
}

fn inside_mask(raster: &ForecastRaster, window: &Window, geometry: &Geometry<f64>) -> Vec<u8> {
    let mut mask = Vec::with_capacity(window.width * window.height);
    for row in window.row0..window.row0 + window.height {
        for col in window.col0..window.col0 + window.width {
            let (lon, lat) = raster.pixel_center(col, row);
            mask.push(u8::from(geometry.contains(&Point::new(lon, lat))));
        }
    }
    mask
}
