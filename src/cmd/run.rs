//! `edge-gateway run`: start the gateway.
//!
//! Validates the backend registry (refusing to start on any problem),
//! builds the shared state and router, and serves until Ctrl+C / SIGTERM.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::cli::RunArgs;
use crate::config::validation;
use crate::error::GatewayError;
use crate::logging;
use crate::middleware::cors;
use crate::server::{self, AppState, RouterOptions, Timeouts};

pub async fn execute(args: RunArgs, env_file: Option<PathBuf>) -> Result<(), GatewayError> {
    let log_format = logging::resolve_format(args.pretty, args.json);
    logging::init(&args.log_level, log_format);

    if let Some(path) = env_file {
        tracing::info!(path = %path.display(), "loaded environment file");
    }

    let registry = validation::validate(&args.backends.to_urls())
        .map_err(|errors| GatewayError::ConfigValidation { errors })?;
    let cors_origins = cors::parse_origins(&args.cors_origins)
        .map_err(|errors| GatewayError::ConfigValidation { errors })?;

    for (service, url) in registry.iter() {
        tracing::info!(service = %service, url = %url, "backend registered");
    }

    let timeouts = Timeouts {
        verify: Duration::from_millis(args.verify_timeout),
        upstream: Duration::from_millis(args.timeout),
    };
    let state = Arc::new(AppState::new(registry, timeouts)?);
    let rule_count = state.routes.rules().len();

    let router = server::build_router(
        state,
        RouterOptions {
            max_body: args.max_body,
            cors_origins,
        },
    );

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(
        addr = %addr,
        rules = rule_count,
        verify_timeout_ms = args.verify_timeout,
        upstream_timeout_ms = args.timeout,
        "gateway started"
    );

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(server::shutdown_signal())
    .await?;

    tracing::info!("gateway stopped");
    Ok(())
}
