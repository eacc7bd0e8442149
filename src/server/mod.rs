//! HTTP status and control surface.
//!
//! Uses `axum` for routing with CORS support.
//! - `GET /` : last cycle snapshot plus thresholds in effect (503 before the first cycle)
//! - `GET /notification?minimum=&maximum=&duration=&pThreshold=&fiatEnable=&pairEnable=`
//!   : partial threshold update, returns the new thresholds (400 on a bad number)
//! - `GET /health`

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::core::{SharedMonitor, Snapshot, ThresholdConfig, ThresholdPatch};

/// Shared application state for the HTTP server.
#[derive(Clone)]
pub struct ServerState {
    pub monitor: SharedMonitor,
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    #[serde(flatten)]
    snapshot: Snapshot,
    thresholds: ThresholdConfig,
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/", get(status_handler))
        .route("/notification", get(notification_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the HTTP server.
///
/// Runs until the shutdown broadcast fires.
pub async fn start_server(
    state: ServerState,
    port: u16,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> anyhow::Result<()> {
    let app = router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(address = %addr, "Starting HTTP server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
        })
        .await?;

    info!("HTTP server stopped");
    Ok(())
}

/// GET /health
async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// GET /: snapshot of the last successful cycle
async fn status_handler(State(state): State<ServerState>) -> Response {
    let Some(snapshot) = state.monitor.snapshot().await else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "error": "No cycle completed yet" })),
        )
            .into_response();
    };

    let thresholds = state.monitor.thresholds().await;
    Json(StatusResponse { snapshot, thresholds }).into_response()
}

/// GET /notification: partial threshold update
async fn notification_handler(
    State(state): State<ServerState>,
    Query(patch): Query<ThresholdPatch>,
) -> Result<Json<ThresholdConfig>, (StatusCode, Json<serde_json::Value>)> {
    match state.monitor.update_thresholds(&patch).await {
        Ok(thresholds) => Ok(Json(thresholds)),
        Err(e) => {
            warn!(error = %e, "Threshold update rejected");
            Err((
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": e.to_string() })),
            ))
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
