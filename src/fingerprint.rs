//! Actor fingerprinting and per-request context.
//!
//! View counting is keyed by a one-way fingerprint of the client network
//! address, never the address itself. The raw address lives only inside
//! the [`RequestContext`] for the duration of the request and is not
//! logged or persisted.

use sha2::{Digest, Sha256};
use std::fmt;

/// Salted SHA-256 fingerprint of a client address.
///
/// The salt comes from config; rotating it invalidates existing dedup
/// markers, which is acceptable (views re-count at most once per window).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActorFingerprint(String);

impl ActorFingerprint {
    /// Derive a fingerprint from a raw client address.
    pub fn derive(client_addr: &str, salt: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(salt.as_bytes());
        hasher.update(b":");
        hasher.update(client_addr.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    /// Full hex digest, used as the dedup/rate-limit key component.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix safe for log lines.
    #[must_use]
    pub fn short(&self) -> &str {
        &self.0[..8]
    }
}

impl fmt::Display for ActorFingerprint {
    // Display the short form only; full digests stay out of logs too.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}…", self.short())
    }
}

/// Request-scoped inputs to view recording.
///
/// Built by the caller from transport headers (x-forwarded-for,
/// user-agent, CDN geography hint).
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Raw client address. Hashed before any storage; dropped with the request.
    pub client_addr: String,
    /// User-agent header, if present.
    pub user_agent: Option<String>,
    /// Coarse geography hint (ISO country code), if present.
    pub country: Option<String>,
}

impl RequestContext {
    pub fn new(client_addr: impl Into<String>) -> Self {
        Self {
            client_addr: client_addr.into(),
            user_agent: None,
            country: None,
        }
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    #[must_use]
    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    /// Derive the actor fingerprint for this request.
    #[must_use]
    pub fn fingerprint(&self, salt: &str) -> ActorFingerprint {
        ActorFingerprint::derive(&self.client_addr, salt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_stable() {
        let a = ActorFingerprint::derive("203.0.113.7", "salt");
        let b = ActorFingerprint::derive("203.0.113.7", "salt");
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);
    }

    #[test]
    fn test_fingerprint_differs_by_addr_and_salt() {
        let a = ActorFingerprint::derive("203.0.113.7", "salt");
        let b = ActorFingerprint::derive("203.0.113.8", "salt");
        let c = ActorFingerprint::derive("203.0.113.7", "other-salt");
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_fingerprint_does_not_leak_addr() {
        let fp = ActorFingerprint::derive("203.0.113.7", "salt");
        assert!(!fp.as_str().contains("203"));
        assert!(!format!("{}", fp).contains("203.0.113.7"));
    }

    #[test]
    fn test_display_is_truncated() {
        let fp = ActorFingerprint::derive("203.0.113.7", "salt");
        let shown = format!("{}", fp);
        assert!(shown.len() < fp.as_str().len());
    }

    #[test]
    fn test_request_context_builder() {
        let ctx = RequestContext::new("198.51.100.2")
            .with_user_agent("test-agent")
            .with_country("GB");
        assert_eq!(ctx.user_agent.as_deref(), Some("test-agent"));
        assert_eq!(ctx.country.as_deref(), Some("GB"));
        assert_eq!(
            ctx.fingerprint("salt"),
            ActorFingerprint::derive("198.51.100.2", "salt")
        );
    }
}
