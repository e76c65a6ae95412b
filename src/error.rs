//! Unified error types for the gateway.
//!
//! [`GatewayError`] covers startup and CLI failures, [`ValidationError`]
//! describes a single problem with the target registry. Request-path
//! failures have their own enums next to the code that produces them
//! ([`VerifyError`](crate::verifier::VerifyError) and
//! [`ForwardError`](crate::proxy::forward::ForwardError)) because they never
//! escape a handler.

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub service: String,
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "  {} service: {}: {}", self.service, self.field, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, " ({suggestion})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

fn format_errors(errors: &[ValidationError]) -> String {
    use std::fmt::Write;
    let mut buf = String::new();
    for (i, e) in errors.iter().enumerate() {
        if i > 0 {
            buf.push('\n');
        }
        let _ = write!(buf, "{e}");
    }
    buf
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum GatewayError {
    #[error("Backend configuration is invalid:\n{}", format_errors(.errors))]
    ConfigValidation { errors: Vec<ValidationError> },

    #[error("Invalid address: {0}")]
    AddressParse(#[from] std::net::AddrParseError),

    #[error("Invalid URI: {source}")]
    UriParse {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("HTTP request failed: {source}")]
    HttpRequest {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("Health check failed with status {0}")]
    HealthCheckFailed(hyper::StatusCode),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_render_one_per_line() {
        let err = GatewayError::ConfigValidation {
            errors: vec![
                ValidationError {
                    service: "auth".into(),
                    field: "url".into(),
                    message: "missing".into(),
                    suggestion: Some("set AUTH_SERVICE_URL".into()),
                },
                ValidationError {
                    service: "blog".into(),
                    field: "url".into(),
                    message: "'nope' is not a valid URL".into(),
                    suggestion: None,
                },
            ],
        };
        let rendered = err.to_string();
        assert!(rendered.contains("auth service: url: missing (set AUTH_SERVICE_URL)"));
        assert!(rendered.contains("blog service: url: 'nope' is not a valid URL"));
        assert_eq!(rendered.lines().count(), 3);
    }
}
