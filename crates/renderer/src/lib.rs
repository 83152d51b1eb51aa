//! Rendering of forecast rasters as map tiles: a fixed hazard color ramp,
//! an indexed PNG encoder, and the XYZ tile renderer that ties them
//! together.

pub mod png;
pub mod ramp;
pub mod tile;

pub use ramp::{classify, classify_index, hazard_palette, TRANSPARENT_INDEX};
pub use tile::{render_tile, RenderError};
