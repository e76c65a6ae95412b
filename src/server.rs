//! Axum server setup, shared application state, and graceful shutdown.
//!
//! Contains [`AppState`] (the `Arc`-shared, read-only state holding the
//! target registry, route table, forwarders, verifier and counters),
//! [`build_router`] for wiring the auth gate, proxy fallback and
//! middleware layers, [`build_http_client`] for the connection-pooled
//! hyper client, and [`shutdown_signal`] for SIGTERM / Ctrl+C handling.

use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderValue;
use axum::routing::get;
use axum::Router;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::sensitive_headers::SetSensitiveRequestHeadersLayer;
use tower_http::trace::TraceLayer;

use crate::config::model::{default_rules, Service, TargetRegistry};
use crate::error::GatewayError;
use crate::health::health_handler;
use crate::middleware::{auth, cors};
use crate::proxy;
use crate::proxy::forward::Forwarders;
use crate::proxy::routing::RouteTable;
use crate::verifier::{HttpVerifier, Verifier};

#[derive(Debug)]
pub struct Stats {
    pub forwarded: AtomicU64,
    pub failed: AtomicU64,
    pub unauthorized: AtomicU64,
}

impl Default for Stats {
    fn default() -> Self {
        Self::new()
    }
}

impl Stats {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            forwarded: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            unauthorized: AtomicU64::new(0),
        }
    }
}

pub type HttpsConnector =
    hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>;
pub type HttpClient = Client<HttpsConnector, Body>;

#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    /// Budget for the whole token-check call to the auth backend.
    pub verify: Duration,
    /// Budget for a backend to send its response head.
    pub upstream: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            verify: Duration::from_secs(5),
            upstream: Duration::from_secs(10),
        }
    }
}

pub struct AppState {
    pub registry: TargetRegistry,
    pub routes: RouteTable,
    pub forwarders: Forwarders,
    pub verifier: Arc<dyn Verifier>,
    pub start_time: Instant,
    pub stats: Stats,
}

impl AppState {
    /// Production state: a shared pooled client and an HTTP verifier
    /// pointed at the registry's auth backend.
    pub fn new(registry: TargetRegistry, timeouts: Timeouts) -> Result<Self, GatewayError> {
        let http_client = build_http_client();
        let verifier = HttpVerifier::new(
            http_client.clone(),
            registry.url(Service::Auth),
            timeouts.verify,
        )?;
        Ok(Self::with_verifier(
            registry,
            &http_client,
            Arc::new(verifier),
            timeouts.upstream,
        ))
    }

    #[must_use]
    pub fn with_verifier(
        registry: TargetRegistry,
        http_client: &HttpClient,
        verifier: Arc<dyn Verifier>,
        upstream_timeout: Duration,
    ) -> Self {
        let forwarders = Forwarders::new(&registry, http_client, upstream_timeout);
        Self {
            registry,
            routes: RouteTable::new(default_rules()),
            forwarders,
            verifier,
            start_time: Instant::now(),
            stats: Stats::new(),
        }
    }
}

#[must_use]
pub fn build_http_client() -> HttpClient {
    // Several rustls crypto providers may be compiled in; pin `ring`.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let https = hyper_rustls::HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_or_http()
        .enable_http1()
        .build();
    Client::builder(TokioExecutor::new())
        .pool_idle_timeout(Duration::from_secs(30))
        .build(https)
}

#[derive(Debug, Clone)]
pub struct RouterOptions {
    pub max_body: usize,
    pub cors_origins: Vec<HeaderValue>,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            max_body: 1_048_576,
            cors_origins: vec![HeaderValue::from_static("http://localhost:4200")],
        }
    }
}

/// `/health` is registered after the gate layer so it is never gated; the
/// proxy fallback always runs behind it.
pub fn build_router(state: Arc<AppState>, options: RouterOptions) -> Router {
    Router::new()
        .fallback(proxy::forward_handler)
        .layer(axum::middleware::from_fn_with_state(
            Arc::clone(&state),
            auth::gate,
        ))
        .route("/health", get(health_handler))
        .layer(
            ServiceBuilder::new()
                .layer(SetSensitiveRequestHeadersLayer::new(std::iter::once(
                    AUTHORIZATION,
                )))
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(options.max_body))
                // Cors needs a `Default` response body, so it sits directly on the routes.
                .layer(cors::layer(options.cors_origins)),
        )
        .with_state(state)
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl+C"),
        () = terminate => tracing::info!("received SIGTERM"),
    }
}
