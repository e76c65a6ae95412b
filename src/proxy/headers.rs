//! Header rewriting for relayed requests and responses.
//!
//! [`build_upstream_headers`] takes ownership of the caller's headers,
//! strips hop-by-hop headers, rewrites `Host` for the backend and adds
//! proxy metadata (`X-Forwarded-For`, `X-Forwarded-Host`,
//! `X-Forwarded-Proto`, `Via`, `X-Correlation-Id`). Everything else,
//! including the identity headers written by the auth gate, is relayed
//! as-is.

use std::sync::LazyLock;

use axum::http::header::{CONNECTION, HOST};
use axum::http::{HeaderMap, HeaderName, HeaderValue};

pub const CORRELATION_ID_HEADER: HeaderName = HeaderName::from_static("x-correlation-id");

const VIA: &str = "1.1 edge-gateway";

static HOP_BY_HOP: LazyLock<Vec<HeaderName>> = LazyLock::new(|| {
    [
        "connection",
        "keep-alive",
        "proxy-connection",
        "transfer-encoding",
        "te",
        "trailer",
        "upgrade",
        "proxy-authorization",
        "proxy-authenticate",
    ]
    .iter()
    .filter_map(|name| name.parse::<HeaderName>().ok())
    .collect()
});

/// Reuse the caller's `X-Correlation-Id` or mint a UUID v4. The resolved
/// id is written back so later stages of the same request see it.
pub fn ensure_correlation_id(headers: &mut HeaderMap) -> String {
    if let Some(existing) = headers
        .get(CORRELATION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
    {
        return existing.to_owned();
    }
    let generated = uuid::Uuid::new_v4().to_string();
    if let Ok(val) = HeaderValue::from_str(&generated) {
        headers.insert(CORRELATION_ID_HEADER, val);
    }
    generated
}

/// Remove hop-by-hop headers, including any listed in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| name.trim().parse::<HeaderName>().ok())
        .collect();
    for name in listed {
        headers.remove(name);
    }
    for name in HOP_BY_HOP.iter() {
        headers.remove(name);
    }
}

pub fn build_upstream_headers(
    mut headers: HeaderMap,
    client_ip: &str,
    target_url: &url::Url,
    correlation_id: &str,
) -> HeaderMap {
    let original_host = headers.get(HOST).cloned();

    strip_hop_by_hop(&mut headers);

    if let Some(host) = target_url.host_str() {
        let host_value = target_url
            .port()
            .map_or_else(|| host.to_string(), |port| format!("{host}:{port}"));
        if let Ok(val) = HeaderValue::from_str(&host_value) {
            headers.insert(HOST, val);
        }
    }

    let xff = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .map_or_else(
            || client_ip.to_string(),
            |existing| format!("{existing}, {client_ip}"),
        );
    if let Ok(val) = HeaderValue::from_str(&xff) {
        headers.insert("x-forwarded-for", val);
    }

    if let Some(host) = original_host {
        headers.entry("x-forwarded-host").or_insert(host);
    }

    // The gateway itself only listens on plain HTTP.
    headers
        .entry("x-forwarded-proto")
        .or_insert(HeaderValue::from_static("http"));

    headers.append("via", HeaderValue::from_static(VIA));

    if let Ok(val) = HeaderValue::from_str(correlation_id) {
        headers.insert(CORRELATION_ID_HEADER, val);
    }

    headers
}

/// Strip hop-by-hop headers from a backend response. `Content-Length` is
/// kept since the body is streamed through unchanged.
pub fn strip_response_hop_by_hop(headers: &mut HeaderMap) {
    strip_hop_by_hop(headers);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> url::Url {
        url::Url::parse("http://blog:9090/").unwrap()
    }

    #[test]
    fn inbound_correlation_id_is_kept() {
        let mut headers = HeaderMap::new();
        headers.insert(CORRELATION_ID_HEADER, "trace-1".parse().unwrap());
        assert_eq!(ensure_correlation_id(&mut headers), "trace-1");
        assert_eq!(headers.get(CORRELATION_ID_HEADER).unwrap(), "trace-1");
    }

    #[test]
    fn missing_correlation_id_is_generated_and_stored() {
        let mut headers = HeaderMap::new();
        let id = ensure_correlation_id(&mut headers);
        assert!(uuid::Uuid::parse_str(&id).is_ok());
        assert_eq!(headers.get(CORRELATION_ID_HEADER).unwrap(), id.as_str());
        assert_eq!(ensure_correlation_id(&mut headers), id);
    }

    #[test]
    fn strips_hop_by_hop() {
        let mut original = HeaderMap::new();
        original.insert("connection", "keep-alive, x-session-hint".parse().unwrap());
        original.insert("x-session-hint", "abc".parse().unwrap());
        original.insert("te", "trailers".parse().unwrap());
        original.insert("content-type", "application/json".parse().unwrap());

        let result = build_upstream_headers(original, "10.0.0.1", &target(), "cid");

        assert!(result.get("connection").is_none());
        assert!(result.get("x-session-hint").is_none());
        assert!(result.get("te").is_none());
        assert_eq!(result.get("content-type").unwrap(), "application/json");
    }

    #[test]
    fn rewrites_host_and_records_original() {
        let mut original = HeaderMap::new();
        original.insert("host", "gateway.example.com".parse().unwrap());

        let result = build_upstream_headers(original, "10.0.0.1", &target(), "cid");

        assert_eq!(result.get("host").unwrap(), "blog:9090");
        assert_eq!(result.get("x-forwarded-host").unwrap(), "gateway.example.com");
    }

    #[test]
    fn default_port_is_omitted_from_host() {
        let target = url::Url::parse("https://asp.internal").unwrap();
        let result = build_upstream_headers(HeaderMap::new(), "10.0.0.1", &target, "cid");
        assert_eq!(result.get("host").unwrap(), "asp.internal");
    }

    #[test]
    fn appends_x_forwarded_for() {
        let mut original = HeaderMap::new();
        original.insert("x-forwarded-for", "1.2.3.4".parse().unwrap());

        let result = build_upstream_headers(original, "10.0.0.1", &target(), "cid");

        assert_eq!(result.get("x-forwarded-for").unwrap(), "1.2.3.4, 10.0.0.1");
    }

    #[test]
    fn keeps_existing_forwarded_proto() {
        let mut original = HeaderMap::new();
        original.insert("x-forwarded-proto", "https".parse().unwrap());

        let result = build_upstream_headers(original, "10.0.0.1", &target(), "cid");

        assert_eq!(result.get("x-forwarded-proto").unwrap(), "https");
    }

    #[test]
    fn sets_correlation_id_and_via() {
        let result = build_upstream_headers(HeaderMap::new(), "10.0.0.1", &target(), "my-id");
        assert_eq!(result.get("x-correlation-id").unwrap(), "my-id");
        assert_eq!(result.get("via").unwrap(), "1.1 edge-gateway");
    }

    #[test]
    fn authorization_and_identity_headers_are_relayed() {
        let mut original = HeaderMap::new();
        original.insert("authorization", "Bearer t".parse().unwrap());
        original.insert("x-user-id", "u1".parse().unwrap());

        let result = build_upstream_headers(original, "10.0.0.1", &target(), "cid");

        assert_eq!(result.get("authorization").unwrap(), "Bearer t");
        assert_eq!(result.get("x-user-id").unwrap(), "u1");
    }

    #[test]
    fn response_keeps_content_length() {
        let mut headers = HeaderMap::new();
        headers.insert("content-length", "12".parse().unwrap());
        headers.insert("transfer-encoding", "chunked".parse().unwrap());
        strip_response_hop_by_hop(&mut headers);
        assert_eq!(headers.get("content-length").unwrap(), "12");
        assert!(headers.get("transfer-encoding").is_none());
    }
}
