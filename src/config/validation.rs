//! Backend address validation with detailed error reporting.
//!
//! [`validate`] checks every configured backend address and either builds
//! the immutable [`TargetRegistry`] or returns the full list of
//! [`ValidationError`] values, one per problem, with suggestions.

use url::Url;

use super::model::{BackendUrls, RoutingRule, Service, TargetRegistry};
use crate::error::ValidationError;

/// Validate a single backend base URL. Returns the parsed URL or a
/// human-readable error.
pub fn validate_target_url(raw: &str) -> Result<Url, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("address cannot be empty".into());
    }
    let parsed = Url::parse(trimmed).map_err(|_| format!("'{raw}' is not a valid URL"))?;

    let scheme = parsed.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(format!(
            "unsupported scheme '{scheme}' (expected http or https)"
        ));
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(format!("'{raw}' has no host"));
    }
    if parsed.query().is_some() || parsed.fragment().is_some() {
        return Err("base address must not carry a query or fragment".into());
    }
    Ok(parsed)
}

pub fn validate(urls: &BackendUrls) -> Result<TargetRegistry, Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut parsed = Vec::with_capacity(Service::ALL.len());

    for service in Service::ALL {
        let Some(raw) = urls.get(service) else {
            errors.push(ValidationError {
                service: service.name().into(),
                field: "url".into(),
                message: "address is required".into(),
                suggestion: Some(format!("set {}", service.env_var())),
            });
            continue;
        };

        match validate_target_url(raw) {
            Ok(url) => parsed.push(url),
            Err(message) => {
                let suggestion = (!raw.contains("://") && !raw.trim().is_empty())
                    .then(|| format!("did you mean 'http://{}'?", raw.trim()));
                errors.push(ValidationError {
                    service: service.name().into(),
                    field: "url".into(),
                    message,
                    suggestion,
                });
            }
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    let mut parsed = parsed.into_iter();
    match (parsed.next(), parsed.next(), parsed.next(), parsed.next()) {
        (Some(auth), Some(blog), Some(user), Some(catchall)) => {
            Ok(TargetRegistry::new(auth, blog, user, catchall))
        }
        _ => Err(vec![ValidationError {
            service: "(root)".into(),
            field: "url".into(),
            message: "registry is incomplete".into(),
            suggestion: None,
        }]),
    }
}

#[must_use]
pub fn format_validation_report(registry: &TargetRegistry, rules: &[RoutingRule]) -> String {
    let mut lines = vec![format!(
        "backend configuration is valid\n  {} services, {} routing rules\n",
        Service::ALL.len(),
        rules.len()
    )];

    for rule in rules {
        let gate = if rule.service == Service::Auth {
            "public"
        } else {
            "bearer token"
        };
        lines.push(format!(
            "  {:<12} -> {} ({})",
            rule.prefix,
            registry.url(rule.service),
            gate
        ));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_urls() -> BackendUrls {
        BackendUrls {
            auth: Some("http://auth:8081".into()),
            blog: Some("http://blog:8082".into()),
            user: Some("http://user:8083".into()),
            catchall: Some("https://asp.internal".into()),
        }
    }

    #[test]
    fn valid_urls_build_registry() {
        let registry = validate(&full_urls()).unwrap();
        assert_eq!(registry.url(Service::Auth).as_str(), "http://auth:8081/");
        assert_eq!(registry.url(Service::Catchall).host_str(), Some("asp.internal"));
        assert_eq!(registry.iter().count(), 4);
    }

    #[test]
    fn every_missing_service_is_reported() {
        let urls = BackendUrls {
            blog: None,
            catchall: None,
            ..full_urls()
        };
        let errors = validate(&urls).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].service, "blog");
        assert_eq!(errors[0].suggestion.as_deref(), Some("set BLOG_SERVICE_URL"));
        assert_eq!(errors[1].suggestion.as_deref(), Some("set ASP_SERVICE_URL"));
    }

    #[test]
    fn malformed_url_fails() {
        let urls = BackendUrls {
            user: Some("not a url".into()),
            ..full_urls()
        };
        let errors = validate(&urls).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("not a valid URL"));
    }

    #[test]
    fn bare_host_gets_scheme_suggestion() {
        let urls = BackendUrls {
            auth: Some("auth-service:8080".into()),
            ..full_urls()
        };
        let errors = validate(&urls).unwrap_err();
        assert_eq!(
            errors[0].suggestion.as_deref(),
            Some("did you mean 'http://auth-service:8080'?")
        );
    }

    #[test]
    fn non_http_scheme_fails() {
        let err = validate_target_url("ftp://files.internal").unwrap_err();
        assert!(err.contains("unsupported scheme 'ftp'"));
    }

    #[test]
    fn empty_address_fails() {
        assert_eq!(
            validate_target_url("   ").unwrap_err(),
            "address cannot be empty"
        );
    }

    #[test]
    fn query_in_base_address_fails() {
        assert!(validate_target_url("http://blog:80/?debug=1").is_err());
    }

    #[test]
    fn report_lists_every_rule() {
        let registry = validate(&full_urls()).unwrap();
        let rules = crate::config::model::default_rules();
        let report = format_validation_report(&registry, &rules);
        assert!(report.contains("/api/blog/"));
        assert!(report.contains("http://blog:8082/"));
        assert!(report.contains("public"));
    }
}
