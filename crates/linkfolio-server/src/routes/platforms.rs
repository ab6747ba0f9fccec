use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

use linkfolio_core::social::SocialPlatform;

#[derive(Debug, Serialize)]
struct PlatformEntry {
    platform: SocialPlatform,
    label: &'static str,
    icon: &'static str,
}

/// `GET /api/social-platforms` — the closed set of social platforms with the
/// glyph each one renders as. Profile editors offer exactly these, and
/// `POST /api/clicks` only accepts their labels for social links.
pub async fn list_platforms() -> Json<Value> {
    let data: Vec<PlatformEntry> = SocialPlatform::ALL
        .into_iter()
        .map(|platform| PlatformEntry {
            platform,
            label: platform.label(),
            icon: platform.icon_name(),
        })
        .collect();
    Json(json!({ "data": data }))
}
