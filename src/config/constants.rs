//! Application-wide constants and configuration defaults
//!
//! Intervals and timeouts live here rather than in the YAML file; each can be
//! overridden via an environment variable. Pushover credentials are read from
//! the environment only.

use std::time::Duration;

// =============================================================================
// Cycle Scheduling
// =============================================================================

/// Evaluation cycle interval (default: 5 seconds)
///
/// Environment variable: `CYCLE_INTERVAL_SECS`
pub fn cycle_interval() -> Duration {
    let secs = std::env::var("CYCLE_INTERVAL_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(5);
    Duration::from_secs(secs)
}

/// Conversion rate refresh interval (default: 1 hour)
///
/// Environment variable: `RATE_REFRESH_INTERVAL_SECS`
pub fn rate_refresh_interval() -> Duration {
    let secs = std::env::var("RATE_REFRESH_INTERVAL_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(3600);
    Duration::from_secs(secs)
}

// =============================================================================
// HTTP
// =============================================================================

/// Timeout applied to every outbound HTTP request (default: 10 seconds)
///
/// Environment variable: `HTTP_TIMEOUT_SECS`
pub fn http_timeout() -> Duration {
    let secs = std::env::var("HTTP_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(10);
    Duration::from_secs(secs)
}

/// Server port override
///
/// Environment variable: `PORT`
pub fn port_override() -> Option<u16> {
    std::env::var("PORT").ok().and_then(|s| s.parse().ok())
}

// =============================================================================
// Delivery Credentials
// =============================================================================

/// Pushover user and application token, when both are set
///
/// Environment variables: `PUSHOVER_USER`, `PUSHOVER_TOKEN`
pub fn pushover_credentials() -> Option<(String, String)> {
    let user = std::env::var("PUSHOVER_USER").ok().filter(|s| !s.trim().is_empty())?;
    let token = std::env::var("PUSHOVER_TOKEN").ok().filter(|s| !s.trim().is_empty())?;
    Some((user, token))
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Print all configuration values (for startup logs)
pub fn log_configuration() {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("  - Cycle interval: {:?}", cycle_interval());
    tracing::info!("  - Rate refresh interval: {:?}", rate_refresh_interval());
    tracing::info!("  - HTTP timeout: {:?}", http_timeout());
    tracing::info!(
        "  - Pushover: {}",
        if pushover_credentials().is_some() { "configured" } else { "not configured" }
    );
    tracing::info!("==================================");
}
