//! Region boundary dataset: named administrative regions with polygon
//! geometry, loaded once from a GeoJSON feature collection and held
//! read-only for the process lifetime.
//!
//! Features follow the NUTS convention: `NUTS_ID` identifier, `NAME_LATN`
//! display label, `LEVL_CODE` level (0 = country).

use std::collections::HashMap;
use std::path::Path;

use geo::Geometry;
use geojson::GeoJson;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegionError {
    #[error("Failed to read boundary dataset: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse boundary dataset: {0}")]
    Parse(String),

    #[error("Boundary feature missing property '{property}'")]
    MissingProperty { property: &'static str },

    #[error("Boundary feature '{code}' has no geometry")]
    MissingGeometry { code: String },
}

/// One administrative region.
#[derive(Debug, Clone)]
pub struct Region {
    pub code: String,
    pub label: String,
    /// NUTS level; 0 is country-level.
    pub level: i64,
    pub geometry: Geometry<f64>,
}

/// Country-level listing entry, the shape the countries endpoint returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountrySummary {
    pub code: String,
    pub label: String,
}

/// All regions of the boundary dataset, keyed by identifier.
#[derive(Debug, Default)]
pub struct RegionSet {
    regions: HashMap<String, Region>,
}

impl RegionSet {
    pub fn from_geojson_file(path: &Path) -> Result<Self, RegionError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_geojson_str(&content)
    }

    pub fn from_geojson_str(content: &str) -> Result<Self, RegionError> {
        let geojson: GeoJson = content
            .parse()
            .map_err(|e: geojson::Error| RegionError::Parse(e.to_string()))?;

        let collection = match geojson {
            GeoJson::FeatureCollection(fc) => fc,
            _ => {
                return Err(RegionError::Parse(
                    "expected a FeatureCollection".to_string(),
                ));
            }
        };

        let mut regions = HashMap::with_capacity(collection.features.len());
        for feature in collection.features {
            let code = string_property(&feature, "NUTS_ID")?;
            let label = string_property(&feature, "NAME_LATN")?;
            let level = feature
                .property("LEVL_CODE")
                .and_then(|v| v.as_i64())
                .ok_or(RegionError::MissingProperty {
                    property: "LEVL_CODE",
                })?;

            let geometry = feature
                .geometry
                .ok_or_else(|| RegionError::MissingGeometry { code: code.clone() })
                .and_then(|g| {
                    Geometry::<f64>::try_from(g.value)
                        .map_err(|e| RegionError::Parse(e.to_string()))
                })?;

            regions.insert(
                code.clone(),
                Region {
                    code,
                    label,
                    level,
                    geometry,
                },
            );
        }

        Ok(Self { regions })
    }

    /// Look up a region by identifier.
    pub fn get(&self, code: &str) -> Option<&Region> {
        self.regions.get(code)
    }

    /// Country-level (level 0) regions, sorted by code.
    pub fn countries(&self) -> Vec<CountrySummary> {
        let mut countries: Vec<CountrySummary> = self
            .regions
            .values()
            .filter(|r| r.level == 0)
            .map(|r| CountrySummary {
                code: r.code.clone(),
                label: r.label.clone(),
            })
            .collect();
        countries.sort_by(|a, b| a.code.cmp(&b.code));
        countries
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

fn string_property(feature: &geojson::Feature, property: &'static str) -> Result<String, RegionError> {
    feature
        .property(property)
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or(RegionError::MissingProperty { property })
}
