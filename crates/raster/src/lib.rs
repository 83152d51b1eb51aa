//! Single-band probability raster reading, statistics, and region masking.

pub mod error;
pub mod geotiff;
pub mod mask;
pub mod stats;

pub use error::{RasterError, Result};
pub use geotiff::{ForecastRaster, Window};
pub use mask::{mask_by_region, MaskedRaster};
pub use stats::{statistics, RasterStatistics};
