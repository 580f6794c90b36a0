/// JWT claims structure
///
/// Payload of every issued token: identity, role, the standard
/// RFC 7519 fields, a unique jti for revocation lookups, and the
/// token kind (access vs refresh).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::Role;

/// Token kind embedded in the claims. A refresh token presented where
/// an access token is expected (or vice versa) fails validation.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (username)
    pub sub: String,
    /// Role claim, trusted once signature and expiry are validated
    pub role: Role,
    /// User's database id
    pub user_id: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Issuer
    pub iss: String,
    /// Unique token identifier, fresh per issued token
    pub jti: String,
    /// Access or refresh
    pub kind: TokenKind,
}

impl Claims {
    pub fn new(
        username: &str,
        role: Role,
        user_id: i64,
        kind: TokenKind,
        expiry_seconds: i64,
        issuer: String,
    ) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: username.to_string(),
            role,
            user_id,
            exp: now + expiry_seconds,
            iat: now,
            iss: issuer,
            jti: Uuid::new_v4().to_string(),
            kind,
        }
    }

    /// A token is expired at or after its exp timestamp.
    pub fn is_expired(&self) -> bool {
        let now = chrono::Utc::now().timestamp();
        self.exp <= now
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
