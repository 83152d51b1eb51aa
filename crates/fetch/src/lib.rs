//! Freshness and fetch management for upstream forecast rasters.
//!
//! The upstream publishes one GeoTIFF per forecast horizon behind an HTML
//! directory index. This crate parses that index into a [`Manifest`],
//! decides whether the local store already holds the listed publication,
//! and downloads missing rasters with an atomic write-then-rename publish
//! so readers never observe a half-written file.

pub mod error;
pub mod manager;
pub mod manifest;

pub use error::FetchError;
pub use manager::{CheckOutcome, FetchConfig, FetchManager};
pub use manifest::{Manifest, ManifestEntry};
