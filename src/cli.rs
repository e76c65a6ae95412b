//! Command-line interface definitions using clap derive macros.
//!
//! Contains the top-level [`Cli`] parser, the [`Commands`] enum for
//! subcommands (run, validate, health), and their argument structs. Every
//! flag has an environment variable equivalent; a `.env` file in the
//! working directory is loaded before parsing.

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::model::BackendUrls;

#[derive(Parser)]
#[command(
    name = "edge-gateway",
    version,
    about = "Authenticating edge gateway for backend services",
    propagate_version = true,
    after_help = "\x1b[1mQuick start:\x1b[0m\n  \
        edge-gateway validate                Check backend addresses from env / .env\n  \
        edge-gateway run                     Start the gateway on :8080\n  \
        edge-gateway health                  Query a running instance"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the gateway
    Run(Box<RunArgs>),

    /// Validate backend configuration without starting
    Validate(ValidateArgs),

    /// Check health of a running instance
    Health(HealthArgs),
}

/// Base addresses of the four backends.
#[derive(Args, Clone, Debug)]
#[command(next_help_heading = "Backends")]
pub struct BackendArgs {
    /// Auth service base URL (token issuance and validation)
    #[arg(long, env = "AUTH_SERVICE_URL")]
    pub auth_url: Option<String>,

    /// Blog service base URL
    #[arg(long, env = "BLOG_SERVICE_URL")]
    pub blog_url: Option<String>,

    /// User service base URL
    #[arg(long, env = "USER_SERVICE_URL")]
    pub user_url: Option<String>,

    /// Catch-all service base URL for every other /api/ path
    #[arg(long, env = "ASP_SERVICE_URL")]
    pub catchall_url: Option<String>,
}

impl BackendArgs {
    #[must_use]
    pub fn to_urls(&self) -> BackendUrls {
        BackendUrls {
            auth: self.auth_url.clone(),
            blog: self.blog_url.clone(),
            user: self.user_url.clone(),
            catchall: self.catchall_url.clone(),
        }
    }
}

#[derive(Args)]
#[command(after_help = "\x1b[1mExamples:\x1b[0m\n  \
        edge-gateway run                                   Addresses from env / .env\n  \
        edge-gateway run -p 80 --json                      Packaged deployment\n  \
        edge-gateway run --auth-url http://auth:8081 ...   Explicit addresses")]
pub struct RunArgs {
    #[command(flatten)]
    pub backends: BackendArgs,

    /// Listen port
    #[arg(short, long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Listen address
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Allowed CORS origins, comma-separated
    #[arg(long, env = "CORS_ALLOWED_ORIGINS", default_value = "http://localhost:4200")]
    pub cors_origins: String,

    // -- Logging --
    /// Log level
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: LogLevel,

    /// Force pretty (human-readable) log output
    #[arg(long)]
    pub pretty: bool,

    /// Force JSON log output (overrides TTY detection)
    #[arg(long, conflicts_with = "pretty")]
    pub json: bool,

    // -- Tuning --
    /// Timeout for the token-check call to the auth service, in milliseconds
    #[arg(
        long,
        env = "VERIFY_TIMEOUT_MS",
        default_value_t = 5000,
        help_heading = "Tuning"
    )]
    pub verify_timeout: u64,

    /// Timeout for a backend's response head, in milliseconds
    #[arg(
        long,
        env = "REQUEST_TIMEOUT_MS",
        default_value_t = 10_000,
        help_heading = "Tuning"
    )]
    pub timeout: u64,

    /// Max request body size in bytes
    #[arg(
        long,
        env = "MAX_BODY_SIZE",
        default_value_t = 10 * 1_048_576,
        help_heading = "Tuning"
    )]
    pub max_body: usize,
}

#[derive(Args)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub backends: BackendArgs,

    /// Output format
    #[arg(long, default_value = "text")]
    pub format: ValidateFormat,
}

#[derive(Args)]
pub struct HealthArgs {
    /// URL of the running instance
    #[arg(default_value = "http://localhost:8080")]
    pub url: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    #[must_use]
    pub const fn to_tracing_level(&self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

#[derive(Clone, Debug, ValueEnum)]
pub enum ValidateFormat {
    Text,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_defaults() {
        let cli = Cli::try_parse_from([
            "edge-gateway",
            "run",
            "--auth-url",
            "http://auth:8081",
        ])
        .unwrap();
        let Some(Commands::Run(args)) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.backends.auth_url.as_deref(), Some("http://auth:8081"));
        assert_eq!(args.verify_timeout, 5000);
        assert_eq!(args.timeout, 10_000);
    }

    #[test]
    fn json_and_pretty_conflict() {
        let result = Cli::try_parse_from(["edge-gateway", "run", "--json", "--pretty"]);
        assert!(result.is_err());
    }

    #[test]
    fn backend_args_map_to_urls() {
        let args = BackendArgs {
            auth_url: Some("http://a".into()),
            blog_url: None,
            user_url: Some("http://u".into()),
            catchall_url: Some("http://c".into()),
        };
        let urls = args.to_urls();
        assert_eq!(urls.auth.as_deref(), Some("http://a"));
        assert!(urls.blog.is_none());
    }
}
