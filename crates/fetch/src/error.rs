use std::path::PathBuf;

use forecast_common::Horizon;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Malformed upstream listing: {0}")]
    MalformedListing(String),

    #[error("No {horizon} asset in the upstream listing")]
    AssetNotListed { horizon: Horizon },

    #[error("Raster already present or being fetched: {0}")]
    AlreadyPresent(PathBuf),

    #[error("Transfer failed: {0}")]
    TransferFailed(String),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),
}
