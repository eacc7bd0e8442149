//! Spread alert service entry point
//!
//! 1. Loads configuration (`config.yaml`, or the path given as first argument)
//! 2. Builds the quote sources, rate provider and alert sink
//! 3. Fetches conversion rates once
//! 4. Runs the evaluation and rate refresh loops plus the HTTP server
//! 5. Stops everything on Ctrl+C

use std::path::PathBuf;
use std::sync::Arc;

use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use spread_alert::adapters::{
    AlertSink, HttpQuoteSource, HttpRateProvider, LogSink, PushoverSink, QuoteSource, RateProvider,
};
use spread_alert::config::{self, constants, logging};
use spread_alert::core::{self as engine, Monitor};
use spread_alert::server::{self, ServerState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if it exists)
    dotenvy::dotenv().ok();

    logging::init_logging();
    info!("Spread alert service starting...");

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.yaml"));
    info!(path = %config_path.display(), "Loading configuration");

    let config = match config::load_config(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(error = %e, "Configuration failed");
            std::process::exit(1);
        }
    };
    info!(
        sources = config.sources.len(),
        symbols = ?config.symbols,
        targets = ?config.target_currencies,
        reference = %config.reference_source_name(),
        "Configuration loaded"
    );
    constants::log_configuration();

    let timeout = constants::http_timeout();

    let sources: Vec<Arc<dyn QuoteSource>> = config
        .sources
        .iter()
        .map(|s| Arc::new(HttpQuoteSource::new(s.clone(), timeout)) as Arc<dyn QuoteSource>)
        .collect();

    let rate_provider: Arc<dyn RateProvider> = Arc::new(HttpRateProvider::new(
        config.rates.url.clone(),
        config.reference_currency.clone(),
        config.target_currencies.clone(),
        timeout,
    ));

    let sink: Arc<dyn AlertSink> = match constants::pushover_credentials() {
        Some((user, token)) => Arc::new(PushoverSink::new(config.pushover.url.clone(), user, token, timeout)),
        None => {
            warn!("PUSHOVER_USER/PUSHOVER_TOKEN not set, alerts will only be logged");
            Arc::new(LogSink)
        }
    };

    let monitor = Monitor::new(config.calculator_settings(), config.thresholds).into_shared();

    // Rates first, so the first cycle does not run on zero fallbacks
    if let Err(e) = engine::refresh_rates(&monitor, rate_provider.as_ref()).await {
        warn!(error = %e, "Initial rate fetch failed, retrying on schedule");
    }

    // Create shutdown broadcast channel
    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    let cycle_handle = tokio::spawn(engine::cycle_task(
        monitor.clone(),
        sources,
        sink,
        constants::cycle_interval(),
        shutdown_tx.subscribe(),
    ));

    let rates_handle = {
        let monitor = monitor.clone();
        let shutdown_rx = shutdown_tx.subscribe();
        let period = constants::rate_refresh_interval();
        tokio::spawn(async move {
            // The startup fetch already covered the first period
            tokio::time::sleep(period).await;
            engine::rates_task(monitor, rate_provider, period, shutdown_rx).await;
        })
    };

    let port = constants::port_override().unwrap_or(config.api.port);
    let server_handle = tokio::spawn(server::start_server(
        ServerState { monitor },
        port,
        shutdown_tx.subscribe(),
    ));

    match signal::ctrl_c().await {
        Ok(()) => info!("[SHUTDOWN] Graceful shutdown initiated"),
        Err(err) => error!(error = %err, "Failed to listen for Ctrl+C signal"),
    }
    let _ = shutdown_tx.send(());

    let _ = cycle_handle.await;
    // The delayed rates task may still be sleeping
    rates_handle.abort();
    match server_handle.await {
        Ok(Err(e)) => error!(error = %e, "HTTP server error"),
        Err(e) => error!(error = %e, "HTTP server task failed"),
        Ok(Ok(())) => {}
    }

    info!("[SHUTDOWN] Clean exit");
    Ok(())
}
