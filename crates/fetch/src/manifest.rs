//! Upstream directory-index manifest.
//!
//! The upstream serves an Apache-style HTML index: one table row per file
//! with a link cell and a last-modified cell. The manifest keeps only the
//! rows with a parseable timestamp; everything else (parent links, header
//! rows, column rules) is dropped.

use chrono::NaiveDateTime;
use scraper::{Html, Selector};

use forecast_common::{Horizon, RasterFilename};

use crate::error::FetchError;

/// Timestamp format used in the index's last-modified column.
const LISTING_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// One file row of the upstream listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Name as linked in the listing, e.g. `tomorrow.tif`.
    pub name: String,
    /// Upstream publication time.
    pub last_modified: NaiveDateTime,
}

impl ManifestEntry {
    /// The forecast horizon this entry carries, if it is a forecast asset.
    pub fn horizon(&self) -> Option<Horizon> {
        Horizon::ALL
            .into_iter()
            .find(|h| self.name == h.asset_name())
    }

    /// Local store filename for this publication, e.g.
    /// `2025-04-30T04-46-00_tomorrow.tif`.
    pub fn local_filename(&self) -> Option<String> {
        self.horizon()
            .map(|h| RasterFilename::new(self.last_modified, h).to_string())
    }
}

/// The parsed upstream listing.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    pub entries: Vec<ManifestEntry>,
}

impl Manifest {
    /// Parse an HTML directory index into a manifest.
    pub fn parse(html: &str) -> Result<Self, FetchError> {
        let row_selector = selector("tr")?;
        let link_selector = selector("a")?;
        let cell_selector = selector("td")?;

        let document = Html::parse_document(html);
        let mut entries = Vec::new();

        for row in document.select(&row_selector) {
            let name = match row.select(&link_selector).next() {
                Some(link) => {
                    let href = link.value().attr("href").unwrap_or_default();
                    let name = href.trim_start_matches("./");
                    if name.is_empty() || name.ends_with('/') {
                        continue;
                    }
                    name.to_string()
                }
                None => continue,
            };

            let last_modified = row.select(&cell_selector).find_map(|cell| {
                let text: String = cell.text().collect();
                NaiveDateTime::parse_from_str(text.trim(), LISTING_TIME_FORMAT).ok()
            });

            if let Some(last_modified) = last_modified {
                entries.push(ManifestEntry {
                    name,
                    last_modified,
                });
            }
        }

        Ok(Self { entries })
    }

    /// Most recently published entry for a horizon, if listed.
    pub fn latest(&self, horizon: Horizon) -> Option<&ManifestEntry> {
        self.entries
            .iter()
            .filter(|e| e.horizon() == Some(horizon))
            .max_by_key(|e| e.last_modified)
    }
}

fn selector(css: &str) -> Result<Selector, FetchError> {
    Selector::parse(css).map_err(|e| FetchError::MalformedListing(e.to_string()))
}
