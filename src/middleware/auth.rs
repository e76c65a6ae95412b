//! Bearer-token gate run in front of every forwarded request.
//!
//! Decision order for each request:
//!
//! 1. Paths under [`AUTH_BYPASS_PREFIX`] belong to the auth service itself
//!    (token issuance, the validation endpoint) and pass through untouched.
//! 2. Paths no routing rule covers pass through so the router can answer
//!    `404` without an outbound call.
//! 3. Everything else needs `Authorization: Bearer <token>`; the token is
//!    checked by the [`Verifier`](crate::verifier::Verifier) and, on
//!    success, the identity headers are written before the request moves on.
//!
//! Caller-supplied identity headers are always removed on gated paths, so
//! a backend only ever sees values asserted by the auth service.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::{AUTHORIZATION, WWW_AUTHENTICATE};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::proxy::headers::{self, CORRELATION_ID_HEADER};
use crate::proxy::routing;
use crate::server::AppState;
use crate::verifier::Identity;

/// Routes owned by the auth service; never gated.
pub const AUTH_BYPASS_PREFIX: &str = "/api/auth/";

pub const USER_ID_HEADER: HeaderName = HeaderName::from_static("x-user-id");
pub const USER_ROLE_HEADER: HeaderName = HeaderName::from_static("x-user-role");
pub const USERNAME_HEADER: HeaderName = HeaderName::from_static("x-username");

pub async fn gate(State(state): State<Arc<AppState>>, mut request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    let correlation_id = headers::ensure_correlation_id(request.headers_mut());

    if routing::covers(AUTH_BYPASS_PREFIX, &path) {
        return next.run(request).await;
    }
    if state.routes.match_route(&path).is_none() {
        return next.run(request).await;
    }

    strip_identity(request.headers_mut());

    let Some(header) = request.headers().get(AUTHORIZATION) else {
        tracing::info!(
            correlation_id = %correlation_id,
            path = %path,
            "missing Authorization header"
        );
        return unauthorized(&state, &correlation_id, "missing Authorization header");
    };

    let Some(token) = header.to_str().ok().and_then(bearer_token) else {
        tracing::info!(
            correlation_id = %correlation_id,
            path = %path,
            "invalid Authorization format"
        );
        return unauthorized(&state, &correlation_id, "invalid Authorization format");
    };

    let identity = match state.verifier.verify(token).await {
        Ok(identity) => identity,
        Err(e) => {
            tracing::warn!(
                correlation_id = %correlation_id,
                path = %path,
                reason = e.reason(),
                error = %e,
                "JWT validation failed"
            );
            return unauthorized(&state, &correlation_id, "invalid JWT");
        }
    };

    if let Err(e) = apply_identity(request.headers_mut(), &identity) {
        tracing::warn!(
            correlation_id = %correlation_id,
            path = %path,
            reason = "unencodable_identity",
            error = %e,
            "JWT validation failed"
        );
        return unauthorized(&state, &correlation_id, "invalid JWT");
    }

    tracing::debug!(
        correlation_id = %correlation_id,
        path = %path,
        user_id = %identity.user_id,
        role = %identity.role,
        "identity headers injected"
    );

    next.run(request).await
}

/// Extract the token from `Bearer <token>`. Exactly two space-separated
/// parts, the first literally `Bearer`, the second non-empty.
#[must_use]
pub fn bearer_token(value: &str) -> Option<&str> {
    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Some(token),
        _ => None,
    }
}

pub fn strip_identity(headers: &mut HeaderMap) {
    headers.remove(USER_ID_HEADER);
    headers.remove(USER_ROLE_HEADER);
    headers.remove(USERNAME_HEADER);
}

/// Overwrite the identity headers with the verified values.
pub fn apply_identity(
    headers: &mut HeaderMap,
    identity: &Identity,
) -> Result<(), axum::http::header::InvalidHeaderValue> {
    let user_id = HeaderValue::from_str(&identity.user_id)?;
    let role = HeaderValue::from_str(&identity.role)?;
    let username = HeaderValue::from_str(&identity.username)?;

    headers.insert(USER_ID_HEADER, user_id);
    headers.insert(USER_ROLE_HEADER, role);
    headers.insert(USERNAME_HEADER, username);
    Ok(())
}

fn unauthorized(state: &AppState, correlation_id: &str, message: &'static str) -> Response {
    state.stats.unauthorized.fetch_add(1, Ordering::Relaxed);
    let mut response = (
        StatusCode::UNAUTHORIZED,
        [(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"))],
        message,
    )
        .into_response();
    if let Ok(val) = HeaderValue::from_str(correlation_id) {
        response.headers_mut().insert(CORRELATION_ID_HEADER, val);
    }
    response
}
