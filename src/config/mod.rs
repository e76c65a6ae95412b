//! Backend configuration: the target registry and the routing rule set.
//!
//! Addresses arrive as [`BackendUrls`] (flags or environment), are checked
//! by [`validation::validate`], and end up in an immutable
//! [`TargetRegistry`] that is shared by reference with every request.

pub mod model;
pub mod validation;

pub use model::{default_rules, BackendUrls, RoutingRule, Service, TargetRegistry};
