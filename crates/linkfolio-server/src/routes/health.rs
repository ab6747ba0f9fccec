use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    /// `"ok"` or `"degraded"`.
    pub status: &'static str,
    pub version: &'static str,
    /// Record commands accepted but not yet written to the store.
    pub pending_events: usize,
}

/// `GET /health`: pings the event store. 503 with `"degraded"` when the ping
/// fails; a growing `pending_events` means flushes are being requeued.
#[tracing::instrument(skip(state))]
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthStatus>) {
    let store_up = match state.store.ping().await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(error = %e, "Event store ping failed");
            false
        }
    };
    let pending_events = state.buffer.lock().await.len();

    let (code, status) = if store_up {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };
    (
        code,
        Json(HealthStatus {
            status,
            version: env!("CARGO_PKG_VERSION"),
            pending_events,
        }),
    )
}
