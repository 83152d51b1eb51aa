//! Recurring freshness checks against the upstream listing.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{error, info};

use fetch::{CheckOutcome, FetchManager};
use forecast_common::Horizon;

/// Run freshness checks on a fixed interval until shutdown.
///
/// The first cycle runs immediately so a fresh deployment has data without
/// waiting an interval. Per-cycle failures are logged and the loop keeps
/// going; a flaky upstream must not kill the service.
pub async fn run(
    fetcher: Arc<FetchManager>,
    interval_minutes: u64,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_minutes * 60));

    loop {
        tokio::select! {
            _ = interval.tick() => {
                run_cycle(&fetcher).await;
            }
            _ = shutdown.recv() => {
                info!("Shutting down freshness scheduler");
                break;
            }
        }
    }
}

/// One check over both forecast horizons.
pub async fn run_cycle(fetcher: &FetchManager) {
    for horizon in Horizon::ALL {
        match fetcher.check(horizon).await {
            Ok(CheckOutcome::UpToDate) => {
                info!(horizon = %horizon, "Forecast is up to date");
            }
            Ok(CheckOutcome::Fetched(filename)) => {
                info!(horizon = %horizon, file = %filename, "Fetched new forecast");
            }
            Err(e) => {
                error!(horizon = %horizon, error = %e, "Freshness check failed");
            }
        }
    }
}
