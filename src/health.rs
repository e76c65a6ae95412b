//! `GET /health` endpoint handler.
//!
//! Returns a [`HealthResponse`] JSON payload with the gateway version,
//! uptime, the configured backends and routing rules, and cumulative
//! request counters. The endpoint sits outside the auth gate.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::server::AppState;

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub commit: String,
    pub uptime_seconds: u64,
    pub targets: Vec<TargetHealth>,
    pub rules: Vec<RuleHealth>,
    pub stats: StatsResponse,
}

#[derive(Serialize, Deserialize)]
pub struct TargetHealth {
    pub service: String,
    pub url: String,
}

#[derive(Serialize, Deserialize)]
pub struct RuleHealth {
    pub prefix: String,
    pub service: String,
}

#[derive(Serialize, Deserialize)]
pub struct StatsResponse {
    pub requests_forwarded: u64,
    pub requests_failed: u64,
    pub requests_unauthorized: u64,
}

pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let targets = state
        .registry
        .iter()
        .map(|(service, url)| TargetHealth {
            service: service.name().to_string(),
            url: url.to_string(),
        })
        .collect();

    let rules = state
        .routes
        .rules()
        .iter()
        .map(|rule| RuleHealth {
            prefix: rule.prefix.clone(),
            service: rule.service.name().to_string(),
        })
        .collect();

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        commit: env!("GATEWAY_GIT_SHORT").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        targets,
        rules,
        stats: StatsResponse {
            requests_forwarded: state.stats.forwarded.load(Ordering::Relaxed),
            requests_failed: state.stats.failed.load(Ordering::Relaxed),
            requests_unauthorized: state.stats.unauthorized.load(Ordering::Relaxed),
        },
    })
}
