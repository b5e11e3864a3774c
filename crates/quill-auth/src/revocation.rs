//! Refresh-token revocation registry.
//!
//! An in-memory TTL set keyed by the refresh token's `jti`. Entries
//! expire together with the token they revoke, so the set stays
//! bounded by the number of logouts within one refresh-token lifetime.
//! Access tokens are not tracked: they stay valid until expiry, which
//! is the documented trade-off of stateless access tokens.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

#[derive(Clone, Default)]
pub struct RevocationRegistry {
    entries: Arc<Mutex<HashMap<String, DateTime<Utc>>>>,
}

impl RevocationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a refresh `jti` as revoked until the token's own expiry.
    pub fn revoke(&self, jti: &str, expires_at: DateTime<Utc>) {
        if let Ok(mut entries) = self.entries.lock() {
            let now = Utc::now();
            entries.retain(|_, exp| *exp > now);
            entries.insert(jti.to_string(), expires_at);
        }
    }

    /// Whether a refresh `jti` has been revoked (and not yet expired).
    pub fn is_revoked(&self, jti: &str) -> bool {
        match self.entries.lock() {
            Ok(entries) => matches!(entries.get(jti), Some(exp) if *exp > Utc::now()),
            // A poisoned registry fails closed.
            Err(_) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn revoked_jti_is_reported() {
        let registry = RevocationRegistry::new();
        registry.revoke("jti-1", Utc::now() + Duration::days(30));
        assert!(registry.is_revoked("jti-1"));
        assert!(!registry.is_revoked("jti-2"));
    }

    #[test]
    fn expired_entries_no_longer_count() {
        let registry = RevocationRegistry::new();
        registry.revoke("stale", Utc::now() - Duration::seconds(1));
        assert!(!registry.is_revoked("stale"));
    }

    #[test]
    fn expired_entries_are_purged_on_next_revoke() {
        let registry = RevocationRegistry::new();
        registry.revoke("stale", Utc::now() - Duration::seconds(1));
        registry.revoke("fresh", Utc::now() + Duration::days(1));
        let entries = registry.entries.lock().unwrap();
        assert!(!entries.contains_key("stale"));
        assert!(entries.contains_key("fresh"));
    }
}
