//! Core HTTP forwarding handler.
//!
//! [`forward_handler`] is the Axum fallback behind the auth gate. It
//! selects the backend for the request path ([`routing`]), rewrites the
//! headers for the hop ([`headers`]) and relays the request through the
//! backend's [`Forwarder`](forward::Forwarder) ([`forward`]).

pub mod forward;
pub mod headers;
pub mod routing;

use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::server::AppState;

use headers::CORRELATION_ID_HEADER;

pub async fn forward_handler(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    mut request: Request,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let correlation_id = headers::ensure_correlation_id(request.headers_mut());

    let Some(service) = state.routes.service_for(&path) else {
        tracing::warn!(
            correlation_id = %correlation_id,
            method = %method,
            path = %path,
            "no route matched"
        );
        return (
            StatusCode::NOT_FOUND,
            [(CORRELATION_ID_HEADER, correlation_id)],
        )
            .into_response();
    };

    let forwarder = state.forwarders.get(service);
    tracing::info!(
        correlation_id = %correlation_id,
        method = %method,
        path = %path,
        service = %service,
        upstream = %forwarder.base(),
        "forwarding request"
    );

    let start = Instant::now();
    let client_ip = addr.ip().to_string();

    match forwarder.forward(request, &client_ip, &correlation_id).await {
        Ok(response) => {
            state.stats.forwarded.fetch_add(1, Ordering::Relaxed);
            tracing::info!(
                correlation_id = %correlation_id,
                service = %service,
                status = response.status().as_u16(),
                latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
                "backend responded"
            );
            response
        }
        Err(e) => {
            state.stats.failed.fetch_add(1, Ordering::Relaxed);
            tracing::error!(
                correlation_id = %correlation_id,
                service = %service,
                upstream = %forwarder.base(),
                error = %e,
                latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
                "forwarding failed"
            );
            (
                StatusCode::BAD_GATEWAY,
                [(CORRELATION_ID_HEADER, correlation_id)],
            )
                .into_response()
        }
    }
}
