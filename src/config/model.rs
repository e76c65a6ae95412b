//! Data structures for the backend target registry.
//!
//! [`BackendUrls`] holds the raw, unvalidated addresses as they arrive from
//! flags or the environment. [`TargetRegistry`] is the validated, immutable
//! form built once at startup by [`validate`](super::validation::validate).

use serde::Serialize;
use url::Url;

/// A backend service the gateway knows how to reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Service {
    Auth,
    Blog,
    User,
    Catchall,
}

impl Service {
    pub const ALL: [Self; 4] = [Self::Auth, Self::Blog, Self::User, Self::Catchall];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::Blog => "blog",
            Self::User => "user",
            Self::Catchall => "catchall",
        }
    }

    /// Environment variable carrying this service's base address.
    #[must_use]
    pub const fn env_var(self) -> &'static str {
        match self {
            Self::Auth => "AUTH_SERVICE_URL",
            Self::Blog => "BLOG_SERVICE_URL",
            Self::User => "USER_SERVICE_URL",
            Self::Catchall => "ASP_SERVICE_URL",
        }
    }
}

impl std::fmt::Display for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Raw backend addresses, one per [`Service`]. `None` means unset.
#[derive(Debug, Clone, Default)]
pub struct BackendUrls {
    pub auth: Option<String>,
    pub blog: Option<String>,
    pub user: Option<String>,
    pub catchall: Option<String>,
}

impl BackendUrls {
    #[must_use]
    pub fn get(&self, service: Service) -> Option<&str> {
        match service {
            Service::Auth => self.auth.as_deref(),
            Service::Blog => self.blog.as_deref(),
            Service::User => self.user.as_deref(),
            Service::Catchall => self.catchall.as_deref(),
        }
    }
}

/// Validated base address for every backend. Never mutated after startup.
#[derive(Debug, Clone)]
pub struct TargetRegistry {
    auth: Url,
    blog: Url,
    user: Url,
    catchall: Url,
}

impl TargetRegistry {
    #[must_use]
    pub fn new(auth: Url, blog: Url, user: Url, catchall: Url) -> Self {
        Self {
            auth,
            blog,
            user,
            catchall,
        }
    }

    #[must_use]
    pub const fn url(&self, service: Service) -> &Url {
        match service {
            Service::Auth => &self.auth,
            Service::Blog => &self.blog,
            Service::User => &self.user,
            Service::Catchall => &self.catchall,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Service, &Url)> {
        Service::ALL.into_iter().map(move |s| (s, self.url(s)))
    }
}

/// A path prefix and the backend that serves it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutingRule {
    pub prefix: String,
    pub service: Service,
}

impl RoutingRule {
    #[must_use]
    pub fn new(prefix: impl Into<String>, service: Service) -> Self {
        Self {
            prefix: prefix.into(),
            service,
        }
    }
}

/// The gateway's fixed rule set. Order here is irrelevant; the route table
/// sorts rules by specificity.
#[must_use]
pub fn default_rules() -> Vec<RoutingRule> {
    vec![
        RoutingRule::new("/api/", Service::Catchall),
        RoutingRule::new("/api/auth/", Service::Auth),
        RoutingRule::new("/api/blog/", Service::Blog),
        RoutingRule::new("/api/user/", Service::User),
    ]
}
