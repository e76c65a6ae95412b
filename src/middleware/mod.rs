//! Tower middleware layers.
//!
//! [`auth`] holds the bearer-token gate wrapped around the proxy fallback.
//! [`cors`] builds the CORS layer applied to the whole router.
//! Proxy header enrichment is in [`proxy::headers`](crate::proxy::headers).

pub mod auth;
pub mod cors;
