/// JWT token issuance and validation
///
/// Tokens are signed with HS256 using the process-wide secret from
/// `JwtSettings`. The signature covers the full claim set, so tampering
/// with any field invalidates the token.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::auth::claims::{Claims, TokenKind};
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError};
use crate::store::User;

/// Issue a short-lived access token for a user.
///
/// Returns the encoded token together with the claims embedded in it;
/// callers need the claims for the jti and expiry.
pub fn issue_access_token(user: &User, config: &JwtSettings) -> Result<(String, Claims), AppError> {
    issue_token(user, TokenKind::Access, config.access_token_expiry, config)
}

/// Issue a long-lived refresh token for a user.
pub fn issue_refresh_token(user: &User, config: &JwtSettings) -> Result<(String, Claims), AppError> {
    issue_token(user, TokenKind::Refresh, config.refresh_token_expiry, config)
}

fn issue_token(
    user: &User,
    kind: TokenKind,
    expiry_seconds: i64,
    config: &JwtSettings,
) -> Result<(String, Claims), AppError> {
    let claims = Claims::new(
        &user.username,
        user.role,
        user.id,
        kind,
        expiry_seconds,
        config.issuer.clone(),
    );

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))?;

    Ok((token, claims))
}

/// Verify signature, issuer, and expiry, and return the claims.
///
/// Expiry is checked with zero leeway, and re-checked against the
/// decoded claims so that a token is rejected from its exp timestamp
/// onward, not a moment later.
fn decode_token(token: &str, config: &JwtSettings) -> Result<Claims, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[&config.issuer]);
    validation.leeway = 0;

    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::warn!("JWT validation error: {}", e);
        match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::TokenInvalid,
        }
    })?;

    if claims.is_expired() {
        return Err(AuthError::TokenExpired);
    }

    Ok(claims)
}

/// Validate an access token. Refresh tokens are rejected here.
pub fn validate_access_token(token: &str, config: &JwtSettings) -> Result<Claims, AuthError> {
    let claims = decode_token(token, config)?;
    if claims.kind != TokenKind::Access {
        tracing::warn!(sub = %claims.sub, "Refresh token presented as access token");
        return Err(AuthError::TokenInvalid);
    }
    Ok(claims)
}

/// Validate a refresh token. Access tokens are rejected here.
pub fn validate_refresh_token(token: &str, config: &JwtSettings) -> Result<Claims, AuthError> {
    let claims = decode_token(token, config)?;
    if claims.kind != TokenKind::Refresh {
        tracing::warn!(sub = %claims.sub, "Access token presented as refresh token");
        return Err(AuthError::TokenInvalid);
    }
    Ok(claims)
}
