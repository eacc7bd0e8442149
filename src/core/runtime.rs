//! Runtime tasks
//!
//! Two periodic loops share the `Monitor`:
//! - `cycle_task`: fetch every source, evaluate, deliver (default every 5 s)
//! - `rates_task`: refresh conversion rates (default hourly)
//!
//! Both stop on the shutdown broadcast. A failed cycle is logged and skipped;
//! the next tick simply tries again.

use std::sync::Arc;

use chrono::Utc;
use futures_util::future::try_join_all;
use tokio::sync::broadcast;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::adapters::{AdapterResult, AlertSink, QuoteSource, RateProvider};
use crate::core::composer::compose;
use crate::core::monitor::{Evaluation, Monitor, SharedMonitor};
use crate::core::types::Quote;
use crate::error::Result;

/// Fetch every source concurrently; quotes keep source order.
///
/// Any failing source fails the whole batch.
pub async fn fetch_all(sources: &[Arc<dyn QuoteSource>]) -> AdapterResult<Vec<Quote>> {
    let batches = try_join_all(sources.iter().map(|source| async move {
        source.fetch_quotes().await.map_err(|e| {
            warn!(source = source.name(), error = %e, "Quote fetch failed");
            e
        })
    }))
    .await?;
    Ok(batches.into_iter().flatten().collect())
}

/// One evaluation cycle.
///
/// Source errors abort the cycle before evaluation, leaving the previous
/// snapshot and alert states untouched. Delivery errors are logged only:
/// the alerts already fired and stay armed.
pub async fn run_cycle(
    monitor: &Monitor,
    sources: &[Arc<dyn QuoteSource>],
    sink: &dyn AlertSink,
) -> Result<Evaluation> {
    let quotes = fetch_all(sources).await?;
    let evaluation = monitor.evaluate(&quotes, Utc::now()).await;

    if let Some(message) = compose(&evaluation.alert_lines) {
        if let Err(e) = sink.deliver(&message).await {
            error!(error = %e, lines = evaluation.alert_lines.len(), "Alert delivery failed");
        }
    }

    Ok(evaluation)
}

/// Fetch rates once and merge them into the monitor
pub async fn refresh_rates(monitor: &Monitor, provider: &dyn RateProvider) -> Result<()> {
    let rates = provider.fetch_rates().await?;
    monitor.set_rates(rates).await;
    Ok(())
}

/// Evaluation loop
pub async fn cycle_task(
    monitor: SharedMonitor,
    sources: Vec<Arc<dyn QuoteSource>>,
    sink: Arc<dyn AlertSink>,
    period: Duration,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    let names: Vec<&str> = sources.iter().map(|s| s.name()).collect();
    info!(sources = ?names, period = ?period, "Cycle task started");

    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut cycles: u64 = 0;

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => {
                info!(total_cycles = cycles, "Cycle task shutting down");
                break;
            }
            _ = ticker.tick() => {
                cycles += 1;
                match run_cycle(&monitor, &sources, sink.as_ref()).await {
                    Ok(evaluation) => debug!(
                        cycle = cycles,
                        alerts = evaluation.alert_lines.len(),
                        "Cycle complete"
                    ),
                    Err(e) => warn!(cycle = cycles, error = %e, "Cycle aborted, previous snapshot kept"),
                }
            }
        }
    }
}

/// Rate refresh loop; a failed refresh keeps the previous rates
pub async fn rates_task(
    monitor: SharedMonitor,
    provider: Arc<dyn RateProvider>,
    period: Duration,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    info!(period = ?period, "Rates task started");

    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => {
                info!("Rates task shutting down");
                break;
            }
            _ = ticker.tick() => {
                if let Err(e) = refresh_rates(&monitor, provider.as_ref()).await {
                    warn!(error = %e, "Rate refresh failed, keeping previous rates");
                }
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
