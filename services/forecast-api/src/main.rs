//! Landslide forecast API service.
//!
//! Serves daily landslide hazard probability rasters as:
//! - XYZ map tiles rendered through a fixed hazard color ramp
//! - Region-cropped forecast grids for the plot view
//! - Bounds, statistics, and file listings
//!
//! A background scheduler keeps the local raster store in sync with the
//! upstream publication listing.

mod error;
mod scheduler;
mod server;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::broadcast;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use fetch::{FetchConfig, FetchManager};
use regions::RegionSet;
use server::ServerState;

#[derive(Parser, Debug)]
#[command(name = "forecast-api")]
#[command(about = "Landslide hazard forecast tile and statistics API")]
struct Args {
    /// Port for the HTTP API
    #[arg(long, env = "PORT", default_value = "8000")]
    port: u16,

    /// Directory holding fetched forecast rasters
    #[arg(long, env = "DATA_DIR", default_value = "data")]
    data_dir: PathBuf,

    /// Region boundary GeoJSON (NUTS feature collection)
    #[arg(
        long,
        env = "REGIONS_FILE",
        default_value = "data/NUTS_RG_20M_2024_4326.geojson"
    )]
    regions_file: PathBuf,

    /// Upstream directory index publishing the forecast rasters
    #[arg(
        long,
        env = "UPSTREAM_URL",
        default_value = "https://maps.nccs.nasa.gov/download/landslides/latest/"
    )]
    upstream_url: String,

    /// Minutes between freshness checks
    #[arg(long, env = "CHECK_INTERVAL_MINUTES", default_value = "60")]
    check_interval_minutes: u64,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting landslide forecast API");

    tokio::fs::create_dir_all(&args.data_dir).await?;

    // The boundary dataset is required; fail startup rather than serve a
    // half-working API.
    let regions = RegionSet::from_geojson_file(&args.regions_file).with_context(|| {
        format!(
            "Failed to load region boundaries from {}",
            args.regions_file.display()
        )
    })?;
    info!(count = regions.len(), "Loaded region boundaries");

    let fetcher = Arc::new(FetchManager::new(FetchConfig {
        base_url: args.upstream_url.clone(),
        data_dir: args.data_dir.clone(),
        request_timeout: Duration::from_secs(600),
    })?);

    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    // Handle Ctrl+C
    let shutdown_for_signal = shutdown_tx.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received shutdown signal");
        shutdown_for_signal.send(()).ok();
    });

    // Background freshness checks, first cycle immediately.
    let scheduler_fetcher = fetcher.clone();
    let scheduler_shutdown = shutdown_tx.subscribe();
    let interval = args.check_interval_minutes;
    tokio::spawn(async move {
        scheduler::run(scheduler_fetcher, interval, scheduler_shutdown).await;
    });

    let state = Arc::new(ServerState {
        regions: Arc::new(regions),
        data_dir: args.data_dir.clone(),
        fetcher,
    });

    server::run_server(state, args.port, shutdown_tx.subscribe()).await?;

    info!("Forecast API stopped");
    Ok(())
}
