use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Extension, Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use linkfolio_core::{config::parse_timezone, report::Dashboard, session::Session};

use crate::{error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct AnalyticsQuery {
    /// IANA zone for day buckets; defaults to `LINKFOLIO_TIMEZONE`.
    pub timezone: Option<String>,
}

/// `GET /api/analytics` — the session owner's dashboard report.
///
/// Sections whose fetch failed come back with default values and are named
/// in `data.unavailable`.
#[tracing::instrument(skip(state, session), fields(owner_id = %session.owner_id))]
pub async fn get_analytics(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let tz = match query.timezone.as_deref().filter(|s| !s.trim().is_empty()) {
        Some(raw) => parse_timezone(raw)?,
        None => state.config.timezone,
    };

    let dashboard = Dashboard::new(Arc::clone(&state.store), session);
    let report = dashboard.load(Utc::now(), tz).await?;

    Ok(Json(json!({ "data": report })))
}
