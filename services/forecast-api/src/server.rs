//! HTTP API: forecast files, region summaries, statistics, bounds, and
//! XYZ tiles.
//!
//! Raster query parameters (`tif`) are store filenames, never paths; they
//! must parse as a local raster filename before being joined to the data
//! directory, which rules out traversal.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::header,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use fetch::{CheckOutcome, FetchManager};
use forecast_common::{Horizon, RasterFilename, TileCoord};
use raster::{mask_by_region, statistics, ForecastRaster, RasterStatistics};
use regions::{CountrySummary, RegionSet};
use renderer::render_tile;

use crate::error::ApiError;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct FileEntry {
    pub file_name: String,
    pub datetime: NaiveDateTime,
    pub time: NaiveTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForecastResponse {
    pub region: String,
    pub title: String,
    pub day: NaiveDate,
    /// `[rows, cols]` of the cropped grids below.
    pub shape: [usize; 2],
    pub bounds: [f64; 4],
    /// Row-major probability grid; nodata cells are null.
    pub predictions: Vec<Vec<Option<f32>>>,
    /// 1 where the cell center lies inside the region.
    pub border: Vec<Vec<u8>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DownloadOutcome {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ============================================================================
// Query Parameters
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct FilesQuery {
    #[serde(default = "default_forecast_type")]
    pub forecast_type: String,
}

fn default_forecast_type() -> String {
    "tomorrow".to_string()
}

#[derive(Debug, Deserialize)]
pub struct ForecastQuery {
    pub region: String,
    pub tif: String,
}

#[derive(Debug, Deserialize)]
pub struct RasterQuery {
    pub tif: String,
}

// ============================================================================
// Shared State
// ============================================================================

pub struct ServerState {
    pub regions: Arc<RegionSet>,
    pub data_dir: PathBuf,
    pub fetcher: Arc<FetchManager>,
}

// ============================================================================
// Router
// ============================================================================

pub fn create_router(state: Arc<ServerState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root_handler))
        .route("/countries", get(countries_handler))
        .route("/files", get(files_handler))
        .route("/forecast", get(forecast_handler))
        .route("/bounds", get(bounds_handler))
        .route("/statistics", get(statistics_handler))
        .route("/tiles/:z/:x/:y", get(tile_handler))
        .route("/download", post(download_handler))
        .layer(cors)
        .layer(Extension(state))
}

// ============================================================================
// Handlers
// ============================================================================

/// GET / - Health check
async fn root_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "Welcome to the landslide forecast API"
    }))
}

/// GET /countries - Country-level regions
async fn countries_handler(
    Extension(state): Extension<Arc<ServerState>>,
) -> Json<Vec<CountrySummary>> {
    Json(state.regions.countries())
}

/// GET /files - Latest stored raster per publication day
async fn files_handler(
    Extension(state): Extension<Arc<ServerState>>,
    Query(params): Query<FilesQuery>,
) -> Result<Json<BTreeMap<NaiveDate, FileEntry>>, ApiError> {
    let horizon: Horizon = params
        .forecast_type
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Unknown forecast type: {}", params.forecast_type)))?;

    let mut latest: BTreeMap<NaiveDate, (NaiveDateTime, String)> = BTreeMap::new();
    for name in state.fetcher.local_files()? {
        let parsed = match RasterFilename::parse(&name) {
            Ok(parsed) => parsed,
            Err(_) => continue,
        };
        if parsed.horizon != horizon {
            continue;
        }
        let day = parsed.published.date();
        match latest.get(&day) {
            Some((existing, _)) if *existing >= parsed.published => {}
            _ => {
                latest.insert(day, (parsed.published, name));
            }
        }
    }

    let files = latest
        .into_iter()
        .map(|(day, (published, file_name))| {
            (
                day,
                FileEntry {
                    file_name,
                    datetime: published,
                    time: published.time(),
                },
            )
        })
        .collect();

    Ok(Json(files))
}

/// GET /forecast - Region-cropped forecast grid
async fn forecast_handler(
    Extension(state): Extension<Arc<ServerState>>,
    Query(params): Query<ForecastQuery>,
) -> Result<Json<ForecastResponse>, ApiError> {
    let filename = parse_tif_name(&params.tif)?;
    let region = state
        .regions
        .get(&params.region)
        .ok_or_else(|| ApiError::NotFound(format!("Region not found: {}", params.region)))?;

    let code = region.code.clone();
    let label = region.label.clone();
    let geometry = region.geometry.clone();
    let path = state.data_dir.join(&params.tif);

    let response = run_blocking(move || {
        let raster = ForecastRaster::open(&path)?;
        let masked = mask_by_region(&raster, &geometry);
        if masked.is_empty() || !masked.has_inside_cells() {
            return Err(ApiError::NotFound(format!(
                "Region {} is outside the forecast extent",
                code
            )));
        }

        let mut predictions = Vec::with_capacity(masked.height);
        let mut border = Vec::with_capacity(masked.height);
        for row in 0..masked.height {
            let start = row * masked.width;
            let end = start + masked.width;
            predictions.push(
                masked.values[start..end]
                    .iter()
                    .map(|&v| if raster.is_nodata(v) { None } else { Some(v) })
                    .collect(),
            );
            border.push(masked.inside[start..end].to_vec());
        }

        let day = filename.published.date();
        Ok(ForecastResponse {
            title: format!("Landslide forecast for {}, created on {}", label, day),
            region: code,
            day,
            shape: [masked.height, masked.width],
            bounds: masked.bounds.to_array(),
            predictions,
            border,
        })
    })
    .await?;

    Ok(Json(response))
}

/// GET /bounds - Geographic bounds of a stored raster
async fn bounds_handler(
    Extension(state): Extension<Arc<ServerState>>,
    Query(params): Query<RasterQuery>,
) -> Result<Json<[f64; 4]>, ApiError> {
    parse_tif_name(&params.tif)?;
    let path = state.data_dir.join(&params.tif);
    let bounds = run_blocking(move || Ok(ForecastRaster::open(&path)?.bounds().to_array())).await?;
    Ok(Json(bounds))
}

/// GET /statistics - Band statistics of a stored raster
async fn statistics_handler(
    Extension(state): Extension<Arc<ServerState>>,
    Query(params): Query<RasterQuery>,
) -> Result<Json<RasterStatistics>, ApiError> {
    parse_tif_name(&params.tif)?;
    let path = state.data_dir.join(&params.tif);
    let stats = run_blocking(move || {
        let raster = ForecastRaster::open(&path)?;
        Ok(statistics(&raster))
    })
    .await?;
    Ok(Json(stats))
}

/// GET /tiles/{z}/{x}/{y}.png - Rendered forecast tile
async fn tile_handler(
    Extension(state): Extension<Arc<ServerState>>,
    Path((z, x, y)): Path<(u32, u32, String)>,
    Query(params): Query<RasterQuery>,
) -> Result<Response, ApiError> {
    let y: u32 = y
        .strip_suffix(".png")
        .and_then(|y| y.parse().ok())
        .ok_or_else(|| ApiError::BadRequest("Tile path must be {z}/{x}/{y}.png".to_string()))?;

    parse_tif_name(&params.tif)?;
    let path = state.data_dir.join(&params.tif);
    let coord = TileCoord::new(z, x, y);
    let png = run_blocking(move || {
        let raster = ForecastRaster::open(&path)?;
        Ok(render_tile(&raster, coord)?)
    })
    .await?;

    Ok(([(header::CONTENT_TYPE, "image/png")], png).into_response())
}

/// POST /download - On-demand freshness check over both horizons
async fn download_handler(
    Extension(state): Extension<Arc<ServerState>>,
) -> Json<BTreeMap<String, DownloadOutcome>> {
    let mut outcomes = BTreeMap::new();
    for horizon in Horizon::ALL {
        let outcome = match state.fetcher.check(horizon).await {
            Ok(CheckOutcome::UpToDate) => DownloadOutcome {
                status: "up_to_date".to_string(),
                file_name: None,
                error: None,
            },
            Ok(CheckOutcome::Fetched(file_name)) => DownloadOutcome {
                status: "fetched".to_string(),
                file_name: Some(file_name),
                error: None,
            },
            Err(e) => DownloadOutcome {
                status: "failed".to_string(),
                file_name: None,
                error: Some(e.to_string()),
            },
        };
        outcomes.insert(horizon.as_str().to_string(), outcome);
    }
    Json(outcomes)
}

// ============================================================================
// Helpers
// ============================================================================

/// Validate a `tif` query value as a store filename.
fn parse_tif_name(tif: &str) -> Result<RasterFilename, ApiError> {
    RasterFilename::parse(tif)
        .map_err(|e| ApiError::BadRequest(format!("Invalid raster name: {}", e)))
}

/// GeoTIFF decoding, masking, and tile rendering are CPU-bound; run them on
/// the blocking pool so they never stall the async workers.
async fn run_blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ApiError::Internal(format!("blocking task failed: {}", e)))?
}

/// Start the HTTP server; shuts down gracefully on the broadcast signal.
pub async fn run_server(
    state: Arc<ServerState>,
    port: u16,
    mut shutdown: broadcast::Receiver<()>,
) -> anyhow::Result<()> {
    let app = create_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    info!(port = port, "Starting forecast API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.recv().await.ok();
        })
        .await?;

    Ok(())
}
