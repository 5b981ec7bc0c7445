//! Hosted-service gateway implementations for mayday.
//!
//! This crate implements the core crate's gateway traits against the
//! hosted deployments: the identity provider, the per-user contact
//! document store, the device location agent, and the AI enhancement
//! endpoint. All of them speak JSON over HTTP via `reqwest`.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod contacts;
pub mod enhance;
pub mod identity;
pub mod locate;

pub use contacts::HostedContactStore;
pub use enhance::HttpEnhancer;
pub use identity::HostedIdentity;
pub use locate::HttpLocator;

/// Join a base URL and a relative path without doubling slashes.
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
