//! CORS policy applied to every response, independent of the auth outcome.

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::error::ValidationError;

/// Parse a comma-separated origin list such as
/// `http://localhost:4200,https://app.example.com`.
pub fn parse_origins(raw: &str) -> Result<Vec<HeaderValue>, Vec<ValidationError>> {
    let mut origins = Vec::new();
    let mut errors = Vec::new();

    for origin in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if origin == "*" {
            errors.push(ValidationError {
                service: "cors".into(),
                field: "origin".into(),
                message: "wildcard origin cannot be combined with credentials".into(),
                suggestion: Some("list each allowed origin explicitly".into()),
            });
            continue;
        }
        match HeaderValue::from_str(origin) {
            Ok(value) => origins.push(value),
            Err(_) => errors.push(ValidationError {
                service: "cors".into(),
                field: "origin".into(),
                message: format!("'{origin}' is not a valid header value"),
                suggestion: None,
            }),
        }
    }

    if errors.is_empty() {
        Ok(origins)
    } else {
        Err(errors)
    }
}

#[must_use]
pub fn layer(origins: Vec<HeaderValue>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
}
