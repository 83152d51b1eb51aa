//! The hazard color ramp.
//!
//! Probabilities are classified into four fixed bands over [0, 1]. Anything
//! below zero is transparent, which covers the -9999 nodata sentinel;
//! anything above the last band clamps into it, so out-of-range values
//! never render as a fifth color. Palette index 0 is reserved for
//! transparent (nodata or outside the raster).

/// Palette index of the fully transparent entry.
pub const TRANSPARENT_INDEX: u8 = 0;

/// Upper bound (exclusive) and RGBA color of each band, low hazard first.
/// The last band's bound is ignored: anything at or above 0.75 lands there.
const BANDS: [(f32, [u8; 4]); 4] = [
    (0.25, [201, 242, 155, 255]),
    (0.50, [255, 255, 153, 255]),
    (0.75, [255, 140, 0, 255]),
    (f32::INFINITY, [217, 30, 24, 255]),
];

/// The full tile palette: transparent entry followed by the four bands.
pub fn hazard_palette() -> Vec<(u8, u8, u8, u8)> {
    let mut palette = Vec::with_capacity(1 + BANDS.len());
    palette.push((0, 0, 0, 0));
    palette.extend(BANDS.iter().map(|(_, c)| (c[0], c[1], c[2], c[3])));
    palette
}

/// Palette index for a probability value.
///
/// Negative values (the nodata sentinel included) and NaN map to
/// transparent, matching a colormap whose (-9999, 0) range carries no
/// color.
pub fn classify_index(value: f32) -> u8 {
    if value.is_nan() || value < 0.0 {
        return TRANSPARENT_INDEX;
    }
    for (i, (upper, _)) in BANDS.iter().enumerate() {
        if value < *upper {
            return (i + 1) as u8;
        }
    }
    BANDS.len() as u8
}

/// RGBA color for a probability value.
pub fn classify(value: f32) -> [u8; 4] {
    match classify_index(value) {
        0 => [0, 0, 0, 0],
        i => BANDS[(i - 1) as usize].1,
    }
}
