/// Token revocation registry
///
/// Tracks revoked token identifiers (jti) until the underlying token
/// would have expired anyway. State is process-local memory: a restart
/// silently un-revokes everything. That limitation is deliberate and
/// documented; the short access-token lifetime bounds the exposure.
///
/// The registry is the only shared mutable state in the request path,
/// so it is injected as a handle (`web::Data`) into the gate and the
/// logout handler rather than living in a module-level singleton.

use std::collections::HashMap;
use std::sync::RwLock;

/// Concurrency-safe set of revoked jtis, each keyed with the token's
/// original expiry so stale entries can be pruned.
pub struct RevocationRegistry {
    revoked: RwLock<HashMap<String, i64>>,
}

impl RevocationRegistry {
    pub fn new() -> Self {
        Self {
            revoked: RwLock::new(HashMap::new()),
        }
    }

    /// Mark a jti as revoked. Idempotent: revoking twice is the same
    /// as revoking once.
    pub fn revoke(&self, jti: &str, expires_at: i64) {
        let mut revoked = self.revoked.write().unwrap();
        revoked.insert(jti.to_string(), expires_at);
        tracing::info!(jti = jti, "Token revoked");
    }

    /// Checked on every protected request; a read lock keeps
    /// concurrent validations cheap.
    pub fn is_revoked(&self, jti: &str) -> bool {
        self.revoked.read().unwrap().contains_key(jti)
    }

    /// Drop entries for tokens that have expired naturally; expiry is
    /// enforced independently, so keeping them adds nothing.
    ///
    /// Returns the number of entries removed.
    pub fn prune_expired(&self, now: i64) -> usize {
        let mut revoked = self.revoked.write().unwrap();
        let before = revoked.len();
        revoked.retain(|_, expires_at| *expires_at > now);
        let pruned = before - revoked.len();
        if pruned > 0 {
            tracing::debug!(pruned = pruned, "Pruned expired revocation entries");
        }
        pruned
    }

    pub fn len(&self) -> usize {
        self.revoked.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.revoked.read().unwrap().is_empty()
    }
}

impl Default for RevocationRegistry {
    fn default() -> Self {
        Self::new()
    }
}
