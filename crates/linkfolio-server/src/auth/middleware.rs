use std::sync::Arc;

use axum::{
    extract::Request,
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;

use linkfolio_core::session::SessionVerifier;

use crate::{error::AppError, state::AppState};

/// Cookie carrying the dashboard session token.
pub const SESSION_COOKIE: &str = "lf_session";

/// Require an active dashboard session.
///
/// Accepts `Authorization: Bearer <token>` or the `lf_session` cookie. On
/// success the verified [`linkfolio_core::session::Session`] is inserted into
/// the request extensions for handlers to extract.
pub async fn require_session(state: Arc<AppState>, mut request: Request, next: Next) -> Response {
    let Some(token) = session_token(request.headers()) else {
        return AppError::Unauthorized.into_response();
    };

    let session = match state.sessions.verify(&token) {
        Ok(session) => session,
        Err(e) => {
            tracing::debug!(error = %e, "Rejected session token");
            return AppError::Unauthorized.into_response();
        }
    };

    if !session.is_active(Utc::now()) {
        return AppError::Unauthorized.into_response();
    }

    request.extensions_mut().insert(session);
    next.run(request).await
}

fn session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string());
    if bearer.is_some() {
        return bearer;
    }

    headers
        .get(header::COOKIE)
        .and_then(|h| h.to_str().ok())
        .and_then(|cookie_str| {
            cookie_str.split(';').find_map(|c| {
                c.trim()
                    .strip_prefix(SESSION_COOKIE)
                    .and_then(|rest| rest.strip_prefix('='))
            })
        })
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_token_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        headers.insert(header::COOKIE, HeaderValue::from_static("lf_session=xyz"));
        assert_eq!(session_token(&headers).as_deref(), Some("abc"));
    }

    #[test]
    fn cookie_token_is_found_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; lf_session=xyz; lang=es"),
        );
        assert_eq!(session_token(&headers).as_deref(), Some("xyz"));
    }

    #[test]
    fn similarly_named_cookie_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("lf_session_old=xyz"));
        assert_eq!(session_token(&headers), None);
    }
}
