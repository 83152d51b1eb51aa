//! Forecast horizon and local raster filename codec.
//!
//! Fetched rasters are stored under `<prefix>_<horizon>.tif` where the
//! prefix is the upstream publication timestamp with `:` replaced by `-`
//! and the date/time separator replaced by `T`, so the name stays
//! filesystem-safe: `2025-04-30T04-46-00_tomorrow.tif`.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Timestamp format used in local raster filenames.
pub const FILE_PREFIX_FORMAT: &str = "%Y-%m-%dT%H-%M-%S";

/// Which day a forecast raster covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Horizon {
    Today,
    Tomorrow,
}

impl Horizon {
    pub const ALL: [Horizon; 2] = [Horizon::Today, Horizon::Tomorrow];

    /// Asset name in the upstream listing (`today.tif` / `tomorrow.tif`).
    pub fn asset_name(&self) -> &'static str {
        match self {
            Horizon::Today => "today.tif",
            Horizon::Tomorrow => "tomorrow.tif",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Horizon::Today => "today",
            Horizon::Tomorrow => "tomorrow",
        }
    }
}

impl fmt::Display for Horizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Horizon {
    type Err = FilenameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "today" => Ok(Horizon::Today),
            "tomorrow" => Ok(Horizon::Tomorrow),
            other => Err(FilenameError::UnknownHorizon(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FilenameError {
    #[error("Unknown forecast horizon: {0}")]
    UnknownHorizon(String),

    #[error("Invalid raster filename: {0}")]
    InvalidName(String),

    #[error("Invalid timestamp in raster filename: {0}")]
    InvalidTimestamp(String),
}

/// Parsed form of a local raster filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterFilename {
    pub published: NaiveDateTime,
    pub horizon: Horizon,
}

impl RasterFilename {
    pub fn new(published: NaiveDateTime, horizon: Horizon) -> Self {
        Self { published, horizon }
    }

    /// Parse a name like `2025-04-30T04-46-00_tomorrow.tif`.
    pub fn parse(name: &str) -> Result<Self, FilenameError> {
        let stem = name
            .strip_suffix(".tif")
            .ok_or_else(|| FilenameError::InvalidName(name.to_string()))?;
        let (prefix, horizon) = stem
            .split_once('_')
            .ok_or_else(|| FilenameError::InvalidName(name.to_string()))?;

        let published = NaiveDateTime::parse_from_str(prefix, FILE_PREFIX_FORMAT)
            .map_err(|_| FilenameError::InvalidTimestamp(prefix.to_string()))?;

        Ok(Self {
            published,
            horizon: horizon.parse()?,
        })
    }
}

impl fmt::Display for RasterFilename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}",
            self.published.format(FILE_PREFIX_FORMAT),
            self.horizon.asset_name()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_roundtrip() {
        let published = NaiveDate::from_ymd_opt(2025, 4, 30)
            .unwrap()
            .and_hms_opt(4, 46, 0)
            .unwrap();
        let name = RasterFilename::new(published, Horizon::Tomorrow);
        assert_eq!(name.to_string(), "2025-04-30T04-46-00_tomorrow.tif");

        let parsed = RasterFilename::parse("2025-04-30T04-46-00_tomorrow.tif").unwrap();
        assert_eq!(parsed, name);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(RasterFilename::parse("nuts_boundaries.geojson").is_err());
        assert!(RasterFilename::parse("2025-04-30T04-46-00_yesterday.tif").is_err());
        assert!(RasterFilename::parse("2025-04-30 04:46:00_today.tif").is_err());
    }

    #[test]
    fn test_horizon_asset_names() {
        assert_eq!(Horizon::Today.asset_name(), "today.tif");
        assert_eq!(Horizon::Tomorrow.asset_name(), "tomorrow.tif");
        assert_eq!("tomorrow".parse::<Horizon>().unwrap(), Horizon::Tomorrow);
    }
}
