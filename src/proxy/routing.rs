//! Specificity-ordered prefix routing.
//!
//! [`RouteTable`] sorts its rules once at construction so that deeper,
//! longer prefixes come before broader ones, and a catch-all such as
//! `/api/` is always evaluated last. [`RouteTable::match_route`] then walks
//! the list and returns the first rule whose prefix covers the path.

use crate::config::model::{RoutingRule, Service};

#[derive(Debug, Clone)]
pub struct RouteTable {
    rules: Vec<RoutingRule>,
}

impl RouteTable {
    #[must_use]
    pub fn new(mut rules: Vec<RoutingRule>) -> Self {
        rules.sort_by_key(|r| std::cmp::Reverse(specificity(&r.prefix)));
        Self { rules }
    }

    /// First rule, in specificity order, whose prefix covers `path`.
    #[must_use]
    pub fn match_route(&self, path: &str) -> Option<&RoutingRule> {
        self.rules.iter().find(|r| covers(&r.prefix, path))
    }

    #[must_use]
    pub fn service_for(&self, path: &str) -> Option<Service> {
        self.match_route(path).map(|r| r.service)
    }

    #[must_use]
    pub fn rules(&self) -> &[RoutingRule] {
        &self.rules
    }
}

/// Segment count first, then raw length, so `/api/blog/` outranks `/api/`.
fn specificity(prefix: &str) -> (usize, usize) {
    let segments = prefix.split('/').filter(|s| !s.is_empty()).count();
    (segments, prefix.len())
}

/// Segment-aware prefix test. `/api/blog/` covers `/api/blog` and
/// `/api/blog/posts/5` but not `/api/blogger`.
#[must_use]
pub fn covers(prefix: &str, path: &str) -> bool {
    if path.starts_with(prefix) {
        return true;
    }
    prefix
        .strip_suffix('/')
        .is_some_and(|bare| !bare.is_empty() && path == bare)
}
