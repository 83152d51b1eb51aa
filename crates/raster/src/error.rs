//! Error types for raster operations.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RasterError>;

#[derive(Debug, Error)]
pub enum RasterError {
    #[error("Raster file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read raster: {0}")]
    ReadFailed(String),

    #[error("Unsupported raster: {0}")]
    Unsupported(String),
}

impl From<std::io::Error> for RasterError {
    fn from(err: std::io::Error) -> Self {
        RasterError::ReadFailed(err.to_string())
    }
}

impl From<tiff::TiffError> for RasterError {
    fn from(err: tiff::TiffError) -> Self {
        RasterError::ReadFailed(err.to_string())
    }
}
