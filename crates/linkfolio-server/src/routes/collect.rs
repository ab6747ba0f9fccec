use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, ConnectInfo, FromRequestParts, State},
    http::{request::Parts, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde_json::json;

use linkfolio_core::{
    event::{ClickEvent, ClickPayload, LinkKind, RecordCommand, ViewEvent, ViewPayload},
    social::SocialPlatform,
};

use crate::{error::AppError, state::AppState};

const MAX_OWNER_ID_BYTES: usize = 100;
const MAX_LABEL_BYTES: usize = 200;
const MAX_REFERRER_BYTES: usize = 2048;
const MAX_USER_AGENT_BYTES: usize = 512;

/// Peer address of the TCP connection, when the server was started with
/// `into_make_service_with_connect_info`. Absent under `oneshot` in tests.
pub struct MaybeConnectInfo(pub Option<SocketAddr>);

impl<S: Send + Sync> FromRequestParts<S> for MaybeConnectInfo {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| *addr),
        ))
    }
}

/// `POST /api/views` — record one load of an owner's public page.
///
/// No auth. The user agent comes from the `User-Agent` header.
/// Responds `202 Accepted` with `{ "ok": true }`; the command is buffered
/// and written on the next flush.
#[tracing::instrument(skip(state, maybe_connect_info, headers, payload))]
pub async fn record_view(
    State(state): State<Arc<AppState>>,
    maybe_connect_info: MaybeConnectInfo,
    headers: HeaderMap,
    payload: Result<Json<ViewPayload>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    enforce_rate_limit(&state, &headers, maybe_connect_info.0).await?;
    let Json(payload) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let owner_id = validate_owner_id(&payload.owner_id)?;
    let referrer = normalize_referrer(payload.referrer)?;
    let user_agent = headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|ua| truncate_utf8(ua.trim(), MAX_USER_AGENT_BYTES).to_string())
        .filter(|ua| !ua.is_empty());

    state
        .push_commands(vec![RecordCommand::View(ViewEvent {
            owner_id,
            occurred_at: Utc::now(),
            referrer,
            user_agent,
        })])
        .await;

    Ok((StatusCode::ACCEPTED, Json(json!({ "ok": true }))))
}

/// `POST /api/clicks` — record one activation of an outbound link.
///
/// Social links must carry one of the known platform labels; the stored
/// label is the canonical spelling. Custom links accept any non-empty label.
#[tracing::instrument(skip(state, maybe_connect_info, headers, payload))]
pub async fn record_click(
    State(state): State<Arc<AppState>>,
    maybe_connect_info: MaybeConnectInfo,
    headers: HeaderMap,
    payload: Result<Json<ClickPayload>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    enforce_rate_limit(&state, &headers, maybe_connect_info.0).await?;
    let Json(payload) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let owner_id = validate_owner_id(&payload.owner_id)?;
    let link_label = validate_link_label(payload.link_kind, &payload.link_label)?;
    let referrer = normalize_referrer(payload.referrer)?;
    let link_id = payload
        .link_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty());

    state
        .push_commands(vec![RecordCommand::Click(ClickEvent {
            owner_id,
            occurred_at: Utc::now(),
            link_kind: payload.link_kind,
            link_id,
            link_label,
            referrer,
        })])
        .await;

    Ok((StatusCode::ACCEPTED, Json(json!({ "ok": true }))))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn enforce_rate_limit(
    state: &AppState,
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
) -> Result<(), AppError> {
    let client_ip = extract_client_ip(headers, peer);
    if state.check_rate_limit(&client_ip).await {
        Ok(())
    } else {
        tracing::warn!(client_ip = %client_ip, "Record rate limit exceeded");
        Err(AppError::RateLimited)
    }
}

/// Client IP for rate limiting: first `X-Forwarded-For` entry, else the TCP
/// peer address, else `"unknown"`.
pub fn extract_client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

fn validate_owner_id(raw: &str) -> Result<String, AppError> {
    let owner_id = raw.trim();
    if owner_id.is_empty() {
        return Err(AppError::InvalidField {
            field: "owner_id",
            message: "owner_id is required".to_string(),
        });
    }
    if owner_id.len() > MAX_OWNER_ID_BYTES {
        return Err(AppError::InvalidField {
            field: "owner_id",
            message: format!("owner_id must be {MAX_OWNER_ID_BYTES} bytes or fewer"),
        });
    }
    Ok(owner_id.to_string())
}

fn validate_link_label(kind: LinkKind, raw: &str) -> Result<String, AppError> {
    let label = raw.trim();
    if label.is_empty() {
        return Err(AppError::InvalidField {
            field: "link_label",
            message: "link_label is required".to_string(),
        });
    }
    if label.len() > MAX_LABEL_BYTES {
        return Err(AppError::InvalidField {
            field: "link_label",
            message: format!("link_label must be {MAX_LABEL_BYTES} bytes or fewer"),
        });
    }
    match kind {
        LinkKind::Social => Ok(label.parse::<SocialPlatform>()?.label().to_string()),
        LinkKind::Custom => Ok(label.to_string()),
    }
}

/// Blank referrers are stored as NULL so they group as direct traffic.
fn normalize_referrer(raw: Option<String>) -> Result<Option<String>, AppError> {
    let Some(referrer) = raw else {
        return Ok(None);
    };
    let referrer = referrer.trim();
    if referrer.len() > MAX_REFERRER_BYTES {
        return Err(AppError::InvalidField {
            field: "referrer",
            message: format!("referrer must be {MAX_REFERRER_BYTES} bytes or fewer"),
        });
    }
    Ok(Some(referrer.to_string()).filter(|r| !r.is_empty()))
}

fn truncate_utf8(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
