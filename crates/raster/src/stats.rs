//! Summary statistics over the valid (non-sentinel) pixels of a raster.

use serde::Serialize;

use crate::ForecastRaster;

/// Summary statistics for a raster's single band.
///
/// All values are computed over valid pixels only; sentinel-valued cells
/// count toward `total_count` but nothing else.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RasterStatistics {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std: f64,
    pub median: f64,
    pub percentile_2: f64,
    pub percentile_98: f64,
    pub valid_count: u64,
    pub total_count: u64,
}

/// Compute summary statistics for the raster.
///
/// A raster with no valid pixels yields zeroed statistics with
/// `valid_count == 0`, not an error.
pub fn statistics(raster: &ForecastRaster) -> RasterStatistics {
    let total_count = raster.data().len() as u64;

    let mut valid: Vec<f64> = raster
        .data()
        .iter()
        .filter(|&&v| !raster.is_nodata(v))
        .map(|&v| v as f64)
        .collect();

    if valid.is_empty() {
        return RasterStatistics {
            min: 0.0,
            max: 0.0,
            mean: 0.0,
            std: 0.0,
            median: 0.0,
            percentile_2: 0.0,
            percentile_98: 0.0,
            valid_count: 0,
            total_count,
        };
    }

    valid.sort_by(|a, b| a.total_cmp(b));

    let n = valid.len() as f64;
    let mean = valid.iter().sum::<f64>() / n;
    let variance = valid.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

    RasterStatistics {
        min: valid[0],
        max: valid[valid.len() - 1],
        mean,
        std: variance.sqrt(),
        median: percentile(&valid, 50.0),
        percentile_2: percentile(&valid, 2.0),
        percentile_98: percentile(&valid, 98.0),
        valid_count: valid.len() as u64,
        total_count,
    }
}

/// Linear-interpolated percentile of an ascending-sorted slice.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let pos = p / 100.0 * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    if lower == upper {
        return sorted[lower];
    }
    let frac = pos - lower as f64;
    sorted[lower] * (1.0 - frac) + sorted[upper] * frac
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentile_interpolation() {
        let sorted = [0.0, 1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&sorted, 0.0), 0.0);
        assert_eq!(percentile(&sorted, 50.0), 2.0);
        assert_eq!(percentile(&sorted, 100.0), 4.0);
        assert!((percentile(&sorted, 25.0) - 1.0).abs() < 1e-12);
        assert!((percentile(&sorted, 10.0) - 0.4).abs() < 1e-12);
    }
}
