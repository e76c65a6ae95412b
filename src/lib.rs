//! An authenticating edge gateway.
//!
//! Every request under `/api/` is matched against an ordered set of prefix
//! rules and relayed to exactly one backend (auth, blog, user or a
//! catch-all service). Except for the auth service's own routes, a request
//! must carry a bearer token that the auth backend confirms before it is
//! forwarded; the confirmed identity travels downstream as `X-User-ID`,
//! `X-User-Role` and `X-Username`.
//!
//! # Architecture
//!
//! - [`cli`] -- Command-line argument parsing with clap derive macros.
//! - [`cmd`] -- Subcommand dispatch and execution (run, validate, health).
//! - [`config`] -- Backend addresses, validation, and the routing rule set.
//! - [`error`] -- Unified error types using `thiserror`.
//! - [`health`] -- `GET /health` endpoint handler returning runtime diagnostics.
//! - [`logging`] -- Structured tracing setup with JSON and pretty-print output.
//! - [`middleware`] -- The bearer-token auth gate and the CORS layer.
//! - [`proxy`] -- Prefix routing, header rewriting, and streaming relay.
//! - [`server`] -- Axum server setup, shared application state, HTTP client, and
//!   graceful shutdown.
//! - [`verifier`] -- Token verification against the auth backend.

// Binary crate: public functions are internal, not consumed by external users.
#![allow(clippy::missing_errors_doc)]

pub mod cli;
pub mod cmd;
pub mod config;
pub mod error;
pub mod health;
pub mod logging;
pub mod middleware;
pub mod proxy;
pub mod server;
pub mod verifier;
