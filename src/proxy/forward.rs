//! Streaming relay to a single backend.
//!
//! A [`Forwarder`] owns one backend's base address. It rewrites the
//! request URI onto that address (base path joined with the original path,
//! query preserved), streams the request body up and hands the backend's
//! response back with its body still streaming. Failures are returned once
//! and never retried.
//!
//! Cancellation comes for free: the upstream call lives inside the
//! handler's future, so when the caller disconnects and hyper drops that
//! future the in-flight backend request is dropped with it.

use std::time::Duration;

use axum::body::Body;
use axum::extract::Request;
use axum::http::uri::InvalidUri;
use axum::http::{Response, Uri};
use url::Url;

use crate::config::model::{Service, TargetRegistry};
use crate::server::HttpClient;

use super::headers::{build_upstream_headers, strip_response_hop_by_hop, CORRELATION_ID_HEADER};

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ForwardError {
    #[error("invalid upstream URI: {0}")]
    Uri(#[from] InvalidUri),

    #[error("failed to build upstream request: {0}")]
    Build(#[from] axum::http::Error),

    #[error("upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),

    #[error("upstream did not respond within {}ms", .0.as_millis())]
    Timeout(Duration),
}

pub struct Forwarder {
    service: Service,
    base: Url,
    client: HttpClient,
    timeout: Duration,
}

impl Forwarder {
    #[must_use]
    pub fn new(service: Service, base: Url, client: HttpClient, timeout: Duration) -> Self {
        Self {
            service,
            base,
            client,
            timeout,
        }
    }

    #[must_use]
    pub const fn service(&self) -> Service {
        self.service
    }

    #[must_use]
    pub const fn base(&self) -> &Url {
        &self.base
    }

    pub async fn forward(
        &self,
        request: Request,
        client_ip: &str,
        correlation_id: &str,
    ) -> Result<Response<Body>, ForwardError> {
        let (parts, body) = request.into_parts();
        let upstream = upstream_uri(&self.base, &parts.uri)?;
        let headers = build_upstream_headers(parts.headers, client_ip, &self.base, correlation_id);

        let mut outbound = hyper::Request::builder()
            .method(parts.method)
            .uri(upstream)
            .body(body)?;
        *outbound.headers_mut() = headers;

        let response = tokio::time::timeout(self.timeout, self.client.request(outbound))
            .await
            .map_err(|_| ForwardError::Timeout(self.timeout))??;

        let (mut parts, incoming) = response.into_parts();
        strip_response_hop_by_hop(&mut parts.headers);
        if let Ok(val) = correlation_id.parse() {
            parts.headers.insert(CORRELATION_ID_HEADER, val);
        }
        Ok(Response::from_parts(parts, Body::new(incoming)))
    }
}

/// One forwarder per backend, built once from the registry.
pub struct Forwarders([Forwarder; 4]);

impl Forwarders {
    #[must_use]
    pub fn new(registry: &TargetRegistry, client: &HttpClient, timeout: Duration) -> Self {
        Self(Service::ALL.map(|service| {
            Forwarder::new(service, registry.url(service).clone(), client.clone(), timeout)
        }))
    }

    #[must_use]
    pub const fn get(&self, service: Service) -> &Forwarder {
        let idx = match service {
            Service::Auth => 0,
            Service::Blog => 1,
            Service::User => 2,
            Service::Catchall => 3,
        };
        &self.0[idx]
    }
}

/// Backend scheme and authority, base path joined to the original path with
/// a single slash, original query kept.
pub fn upstream_uri(base: &Url, original: &Uri) -> Result<Uri, InvalidUri> {
    let mut out = format!("{}://", base.scheme());
    out.push_str(base.host_str().unwrap_or_default());
    if let Some(port) = base.port() {
        out.push(':');
        out.push_str(&port.to_string());
    }
    out.push_str(&join_paths(base.path(), original.path()));
    if let Some(query) = original.query() {
        out.push('?');
        out.push_str(query);
    }
    out.parse()
}

fn join_paths(base: &str, path: &str) -> String {
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{base}{}", &path[1..]),
        (false, false) => format!("{base}/{path}"),
        _ => format!("{base}{path}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri(s: &str) -> Uri {
        s.parse().unwrap()
    }

    #[test]
    fn root_base_keeps_original_path() {
        let base = Url::parse("http://blog:8082").unwrap();
        let result = upstream_uri(&base, &uri("/api/blog/posts/5")).unwrap();
        assert_eq!(result.to_string(), "http://blog:8082/api/blog/posts/5");
    }

    #[test]
    fn query_is_preserved() {
        let base = Url::parse("http://user:8083/").unwrap();
        let result = upstream_uri(&base, &uri("/api/user/search?q=ana&page=2")).unwrap();
        assert_eq!(result.to_string(), "http://user:8083/api/user/search?q=ana&page=2");
    }

    #[test]
    fn base_path_is_prefixed_with_single_slash() {
        let base = Url::parse("https://asp.internal/v2/").unwrap();
        let result = upstream_uri(&base, &uri("/api/tours")).unwrap();
        assert_eq!(result.to_string(), "https://asp.internal/v2/api/tours");

        let base = Url::parse("https://asp.internal/v2").unwrap();
        let result = upstream_uri(&base, &uri("/api/tours")).unwrap();
        assert_eq!(result.to_string(), "https://asp.internal/v2/api/tours");
    }

    #[test]
    fn ipv6_host_keeps_brackets() {
        let base = Url::parse("http://[::1]:9000").unwrap();
        let result = upstream_uri(&base, &uri("/api/x")).unwrap();
        assert_eq!(result.to_string(), "http://[::1]:9000/api/x");
    }

    #[test]
    fn join_paths_variants() {
        assert_eq!(join_paths("/", "/a"), "/a");
        assert_eq!(join_paths("/base", "a"), "/base/a");
        assert_eq!(join_paths("/base/", "a"), "/base/a");
        assert_eq!(join_paths("/base", "/a"), "/base/a");
    }

    #[tokio::test]
    async fn forwarders_are_keyed_by_service() {
        let registry = TargetRegistry::new(
            Url::parse("http://auth:1").unwrap(),
            Url::parse("http://blog:2").unwrap(),
            Url::parse("http://user:3").unwrap(),
            Url::parse("http://asp:4").unwrap(),
        );
        let client = crate::server::build_http_client();
        let forwarders = Forwarders::new(&registry, &client, Duration::from_secs(1));
        for service in Service::ALL {
            let forwarder = forwarders.get(service);
            assert_eq!(forwarder.service(), service);
            assert_eq!(forwarder.base(), registry.url(service));
        }
    }
}
