//! Fetch manager: freshness decisions and atomic raster downloads.
//!
//! Freshness is decided by filename alone. The upstream publication time
//! becomes part of the local filename, so "do we already have the latest?"
//! is a single existence check against the store, with no database and no
//! mtime bookkeeping.
//!
//! Downloads stream into `<final>.partial` opened with `create_new`, then
//! rename into place. The exclusive create makes concurrent fetchers of the
//! same publication fail fast instead of interleaving writes; the rename
//! means readers only ever see complete files. Partials left behind by a
//! crashed process are swept when the manager is constructed.

use std::path::PathBuf;
use std::time::Duration;

use futures::StreamExt;
use reqwest::{header, Client};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{info, instrument, warn};

use forecast_common::Horizon;

use crate::error::FetchError;
use crate::manifest::{Manifest, ManifestEntry};

/// Configuration for the fetch manager.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Base URL of the upstream directory index.
    pub base_url: String,
    /// Directory holding fetched rasters.
    pub data_dir: PathBuf,
    /// HTTP request timeout.
    pub request_timeout: Duration,
}

/// Result of a freshness check for one horizon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// The latest upstream publication is already in the local store.
    UpToDate,
    /// A new raster was fetched and published under this filename.
    Fetched(String),
}

/// Downloads upstream rasters and answers freshness questions.
pub struct FetchManager {
    client: Client,
    config: FetchConfig,
}

impl FetchManager {
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| FetchError::UpstreamUnavailable(e.to_string()))?;

        let manager = Self { client, config };
        manager.sweep_partials()?;
        Ok(manager)
    }

    /// Remove leftover `.partial` files from the store.
    ///
    /// A partial file is only meaningful while its writer is alive. One that
    /// survived a crash would hold the exclusive create forever and block
    /// every future fetch of that publication.
    fn sweep_partials(&self) -> Result<(), FetchError> {
        let entries = match std::fs::read_dir(&self.config.data_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        for entry in entries {
            let entry = entry?;
            if let Some(name) = entry.file_name().to_str() {
                if name.ends_with(".partial") {
                    warn!(file = %name, "Removing stale partial download");
                    std::fs::remove_file(entry.path())?;
                }
            }
        }
        Ok(())
    }

    /// Fetch and parse the upstream directory index.
    pub async fn manifest(&self) -> Result<Manifest, FetchError> {
        let response = self
            .client
            .get(&self.config.base_url)
            .send()
            .await
            .map_err(|e| FetchError::UpstreamUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FetchError::UpstreamUnavailable(format!(
                "index request returned {}",
                response.status()
            )));
        }

        let html = response
            .text()
            .await
            .map_err(|e| FetchError::UpstreamUnavailable(e.to_string()))?;

        Manifest::parse(&html)
    }

    /// Latest upstream publication for a horizon.
    pub async fn latest_available(&self, horizon: Horizon) -> Result<ManifestEntry, FetchError> {
        let manifest = self.manifest().await?;
        manifest
            .latest(horizon)
            .cloned()
            .ok_or(FetchError::AssetNotListed { horizon })
    }

    /// Whether the store already holds the named raster.
    pub fn is_locally_present(&self, filename: &str) -> bool {
        self.config.data_dir.join(filename).exists()
    }

    /// Names of all rasters in the local store.
    pub fn local_files(&self) -> Result<Vec<String>, FetchError> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.config.data_dir)? {
            let entry = entry?;
            if let Some(name) = entry.file_name().to_str() {
                if name.ends_with(".tif") {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Download one upstream raster into the local store.
    ///
    /// Returns the final path. Fails with [`FetchError::AlreadyPresent`] if
    /// the raster is already in the store or another fetch of the same
    /// publication is in flight.
    #[instrument(skip(self), fields(name = %entry.name))]
    pub async fn fetch(&self, entry: &ManifestEntry) -> Result<PathBuf, FetchError> {
        let filename = entry.local_filename().ok_or_else(|| {
            FetchError::MalformedListing(format!("'{}' is not a forecast asset", entry.name))
        })?;

        let final_path = self.config.data_dir.join(&filename);
        if final_path.exists() {
            return Err(FetchError::AlreadyPresent(final_path));
        }

        let partial_path = self.config.data_dir.join(format!("{}.partial", filename));

        // Exclusive create: at most one writer per publication.
        let file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&partial_path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(FetchError::AlreadyPresent(final_path));
            }
            Err(e) => return Err(e.into()),
        };

        let url = format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            entry.name
        );

        info!(url = %url, filename = %filename, "Fetching raster");

        match self.transfer(&url, file).await {
            Ok(bytes) => {
                fs::rename(&partial_path, &final_path).await?;
                info!(path = %final_path.display(), bytes, "Raster published");
                Ok(final_path)
            }
            Err(e) => {
                warn!(error = %e, "Fetch failed, removing partial file");
                if let Err(cleanup) = fs::remove_file(&partial_path).await {
                    warn!(error = %cleanup, path = %partial_path.display(), "Failed to remove partial file");
                }
                Err(e)
            }
        }
    }

    /// Stream the response body into the open partial file and verify its
    /// length against Content-Length when the upstream sends one.
    async fn transfer(&self, url: &str, mut file: fs::File) -> Result<u64, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::TransferFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FetchError::TransferFailed(format!(
                "raster request returned {}",
                response.status()
            )));
        }

        let expected = response
            .headers()
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok());

        let mut written = 0u64;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| FetchError::TransferFailed(e.to_string()))?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }

        file.flush().await?;
        file.sync_all().await?;

        if let Some(expected) = expected {
            if written != expected {
                return Err(FetchError::TransferFailed(format!(
                    "size mismatch: expected {} bytes, got {}",
                    expected, written
                )));
            }
        }

        Ok(written)
    }

    /// Run one freshness check for a horizon: consult the upstream listing
    /// and fetch the latest publication unless the store already has it.
    ///
    /// Losing the exclusive-create race counts as up to date: someone else
    /// is fetching the same publication.
    #[instrument(skip(self))]
    pub async fn check(&self, horizon: Horizon) -> Result<CheckOutcome, FetchError> {
        let entry = self.latest_available(horizon).await?;
        let filename = entry.local_filename().ok_or_else(|| {
            FetchError::MalformedListing(format!("'{}' is not a forecast asset", entry.name))
        })?;

        if self.is_locally_present(&filename) {
            return Ok(CheckOutcome::UpToDate);
        }

        match self.fetch(&entry).await {
            Ok(_) => Ok(CheckOutcome::Fetched(filename)),
            Err(FetchError::AlreadyPresent(_)) => Ok(CheckOutcome::UpToDate),
            Err(e) => Err(e),
        }
    }
}
