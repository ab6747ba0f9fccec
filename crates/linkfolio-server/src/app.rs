use std::sync::Arc;

use axum::{
    extract::Request,
    http::HeaderValue,
    middleware::{self, Next},
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{auth::middleware::require_session, routes, state::AppState};

/// Construct the axum [`Router`] with all routes and middleware attached.
///
/// - Public: `/health`, `POST /api/views`, `POST /api/clicks`,
///   `GET /api/social-platforms`. These are
///   called from the public profile page, so CORS is open unless
///   `LINKFOLIO_CORS_ORIGINS` narrows it.
/// - Session-protected: `GET /api/analytics`.
pub fn build_app(state: Arc<AppState>) -> Router {
    let session_state = Arc::clone(&state);
    let dashboard = Router::new()
        .route("/api/analytics", get(routes::analytics::get_analytics))
        .route_layer(middleware::from_fn(move |request: Request, next: Next| {
            require_session(Arc::clone(&session_state), request, next)
        }));

    Router::new()
        .route("/health", get(routes::health::health))
        .route("/api/views", post(routes::collect::record_view))
        .route("/api/clicks", post(routes::collect::record_click))
        .route("/api/social-platforms", get(routes::platforms::list_platforms))
        .merge(dashboard)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .map(|o| o.trim())
        .filter(|o| !o.is_empty())
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if allowed.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(allowed)
    }
}
