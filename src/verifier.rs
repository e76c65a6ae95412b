//! Identity verification against the auth backend.
//!
//! Every gated request costs exactly one `POST <auth>/api/auth/jwt` call
//! carrying the caller's bearer token. Nothing is cached: two requests with
//! the same token produce two upstream calls. The [`Verifier`] trait is the
//! seam the auth gate depends on; [`HttpVerifier`] is the production
//! implementation.

use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use http_body_util::{BodyExt, Limited};
use hyper::header::{HeaderValue, AUTHORIZATION};
use hyper::{Method, StatusCode, Uri};
use serde::Deserialize;
use url::Url;

use crate::error::GatewayError;
use crate::server::HttpClient;

/// Token-check endpoint on the auth backend.
pub const VERIFY_PATH: &str = "/api/auth/jwt";

/// Largest validation response the gateway will read.
const MAX_RESPONSE_BYTES: usize = 64 * 1024;

/// Identity asserted by the auth backend for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub role: String,
    pub username: String,
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum VerifyError {
    #[error("auth service unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("auth service rejected token: {0}")]
    Rejected(String),

    #[error("malformed auth service response: {0}")]
    MalformedResponse(String),

    #[error("invalid auth service response: missing userID or role")]
    IncompleteIdentity,
}

impl VerifyError {
    /// Stable label for the `reason` log field.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::UpstreamUnavailable(_) => "upstream_unavailable",
            Self::Rejected(_) => "rejected",
            Self::MalformedResponse(_) => "malformed_response",
            Self::IncompleteIdentity => "incomplete_identity",
        }
    }
}

// async_trait keeps Verifier object-safe so AppState can hold Arc<dyn Verifier>.
#[async_trait]
pub trait Verifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Identity, VerifyError>;
}

/// Wire shape of the auth backend's answer, on success and failure alike.
/// The aliases cover the casings auth services commonly emit for the same
/// fields.
#[derive(Debug, Default, Deserialize)]
struct ValidateResponse {
    #[serde(
        rename = "userID",
        alias = "userId",
        alias = "UserID",
        alias = "UserId",
        alias = "userid",
        alias = "user_id",
        default
    )]
    user_id: Option<String>,
    #[serde(alias = "Role", default)]
    role: Option<String>,
    #[serde(alias = "Username", alias = "userName", alias = "UserName", default)]
    username: Option<String>,
    #[serde(alias = "Error", default)]
    error: Option<String>,
}

pub struct HttpVerifier {
    client: HttpClient,
    endpoint: Uri,
    timeout: Duration,
}

impl HttpVerifier {
    pub fn new(client: HttpClient, auth_base: &Url, timeout: Duration) -> Result<Self, GatewayError> {
        let endpoint = format!("{}{VERIFY_PATH}", auth_base.as_str().trim_end_matches('/'))
            .parse::<Uri>()
            .map_err(|e| GatewayError::UriParse {
                source: Box::new(e),
            })?;
        Ok(Self {
            client,
            endpoint,
            timeout,
        })
    }

    #[must_use]
    pub const fn endpoint(&self) -> &Uri {
        &self.endpoint
    }

    async fn call(&self, token: &str) -> Result<Identity, VerifyError> {
        let credential = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| VerifyError::Rejected(format!("token is not a valid header value: {e}")))?;

        let req = hyper::Request::builder()
            .method(Method::POST)
            .uri(self.endpoint.clone())
            .header(AUTHORIZATION, credential)
            .body(Body::empty())
            .map_err(|e| VerifyError::UpstreamUnavailable(e.to_string()))?;

        let response = self
            .client
            .request(req)
            .await
            .map_err(|e| VerifyError::UpstreamUnavailable(e.to_string()))?;

        let status = response.status();
        let body = Limited::new(response.into_body(), MAX_RESPONSE_BYTES)
            .collect()
            .await
            .map_err(|e| VerifyError::UpstreamUnavailable(format!("body read error: {e}")))?
            .to_bytes();

        classify(status, &body)
    }
}

#[async_trait]
impl Verifier for HttpVerifier {
    async fn verify(&self, token: &str) -> Result<Identity, VerifyError> {
        tracing::debug!(endpoint = %self.endpoint, "verifying bearer token");
        match tokio::time::timeout(self.timeout, self.call(token)).await {
            Ok(result) => result,
            Err(_) => Err(VerifyError::UpstreamUnavailable(format!(
                "no answer within {}ms",
                self.timeout.as_millis()
            ))),
        }
    }
}

/// Turn the auth backend's status and body into an identity or a
/// classified failure.
fn classify(status: StatusCode, body: &[u8]) -> Result<Identity, VerifyError> {
    if !status.is_success() {
        let message = serde_json::from_slice::<ValidateResponse>(body)
            .ok()
            .and_then(|r| r.error)
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| format!("status {}", status.as_u16()));
        return Err(VerifyError::Rejected(message));
    }

    let parsed: ValidateResponse = serde_json::from_slice(body)
        .map_err(|e| VerifyError::MalformedResponse(e.to_string()))?;

    let user_id = parsed.user_id.unwrap_or_default();
    let role = parsed.role.unwrap_or_default();
    if user_id.is_empty() || role.is_empty() {
        return Err(VerifyError::IncompleteIdentity);
    }

    Ok(Identity {
        user_id,
        role,
        username: parsed.username.unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_yields_identity() {
        let body = br#"{"userID":"u1","role":"admin","username":"alice"}"#;
        let identity = classify(StatusCode::OK, body).unwrap();
        assert_eq!(
            identity,
            Identity {
                user_id: "u1".into(),
                role: "admin".into(),
                username: "alice".into(),
            }
        );
    }

    #[test]
    fn alternate_field_casings_are_accepted() {
        let body = br#"{"UserId":"u7","Role":"guide","UserName":"bob"}"#;
        let identity = classify(StatusCode::OK, body).unwrap();
        assert_eq!(identity.user_id, "u7");
        assert_eq!(identity.role, "guide");
        assert_eq!(identity.username, "bob");

        let body = br#"{"user_id":"u8","role":"admin"}"#;
        assert_eq!(classify(StatusCode::OK, body).unwrap().user_id, "u8");

        let body = br#"{"Error":"revoked"}"#;
        let err = classify(StatusCode::UNAUTHORIZED, body).unwrap_err();
        assert_eq!(err.to_string(), "auth service rejected token: revoked");
    }

    #[test]
    fn empty_username_is_allowed() {
        let body = br#"{"userID":"u1","role":"guide"}"#;
        let identity = classify(StatusCode::OK, body).unwrap();
        assert_eq!(identity.username, "");
    }

    #[test]
    fn empty_user_id_is_incomplete() {
        let body = br#"{"userID":"","role":"admin"}"#;
        let err = classify(StatusCode::OK, body).unwrap_err();
        assert!(matches!(err, VerifyError::IncompleteIdentity));
        assert_eq!(err.reason(), "incomplete_identity");
    }

    #[test]
    fn missing_role_is_incomplete() {
        let body = br#"{"userID":"u1","username":"alice"}"#;
        assert!(matches!(
            classify(StatusCode::OK, body),
            Err(VerifyError::IncompleteIdentity)
        ));
    }

    #[test]
    fn unparsable_success_body_is_malformed() {
        let err = classify(StatusCode::OK, b"<html>oops</html>").unwrap_err();
        assert_eq!(err.reason(), "malformed_response");
    }

    #[test]
    fn rejection_surfaces_error_message() {
        let body = br#"{"error":"token expired"}"#;
        let err = classify(StatusCode::UNAUTHORIZED, body).unwrap_err();
        assert_eq!(err.to_string(), "auth service rejected token: token expired");
    }

    #[test]
    fn rejection_without_payload_surfaces_status() {
        let err = classify(StatusCode::FORBIDDEN, b"").unwrap_err();
        assert_eq!(err.to_string(), "auth service rejected token: status 403");
    }

    #[test]
    fn rejection_with_empty_error_surfaces_status() {
        let body = br#"{"userID":"","role":"","username":"","error":""}"#;
        let err = classify(StatusCode::INTERNAL_SERVER_ERROR, body).unwrap_err();
        assert_eq!(err.to_string(), "auth service rejected token: status 500");
    }

    #[tokio::test]
    async fn endpoint_appends_verify_path() {
        let client = crate::server::build_http_client();
        let base = Url::parse("http://auth:8081").unwrap();
        let verifier = HttpVerifier::new(client, &base, Duration::from_secs(5)).unwrap();
        assert_eq!(verifier.endpoint().to_string(), "http://auth:8081/api/auth/jwt");
    }
}
