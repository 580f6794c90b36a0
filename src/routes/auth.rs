/// Authentication routes
///
/// Registration, login, token refresh (with rotation), and logout
/// (revocation of the presented tokens).

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::time::{Duration, Instant};

use crate::auth::{
    issue_access_token, issue_refresh_token, validate_refresh_token, Claims, RevocationRegistry,
};
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError, ErrorContext};
use crate::store::{self, Role, User};

/// Floor on total login latency. Lookup misses, password mismatches,
/// and successes all leave after at least this much wall time, so the
/// response time does not reveal which occurred.
const MIN_LOGIN_LATENCY: Duration = Duration::from_millis(250);

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Deserialize, Default)]
pub struct LogoutRequest {
    pub refresh_token: Option<String>,
}

#[derive(Serialize)]
pub struct UserInfo {
    pub username: String,
    pub role: Role,
    pub user_id: i64,
}

/// Token pair response for login, registration, and refresh.
#[derive(Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: UserInfo,
}

impl AuthResponse {
    fn new(access_token: String, refresh_token: String, config: &JwtSettings, user: &User) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: "bearer".to_string(),
            expires_in: config.access_token_expiry,
            user: UserInfo {
                username: user.username.clone(),
                role: user.role,
                user_id: user.id,
            },
        }
    }
}

/// POST /auth/register
///
/// Creates an account with the default `user` role and returns a
/// token pair.
///
/// # Errors
/// - 400: malformed username or password
/// - 409: username already taken
pub async fn register(
    form: web::Json<RegisterRequest>,
    pool: web::Data<PgPool>,
    jwt_config: web::Data<JwtSettings>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_registration");

    let user = store::create_user(pool.get_ref(), &form.username, &form.password, Role::User).await?;

    let (access_token, _) = issue_access_token(&user, jwt_config.get_ref())?;
    let (refresh_token, _) = issue_refresh_token(&user, jwt_config.get_ref())?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = user.id,
        "User registered successfully"
    );

    Ok(HttpResponse::Created().json(AuthResponse::new(
        access_token,
        refresh_token,
        jwt_config.get_ref(),
        &user,
    )))
}

/// POST /auth/login
///
/// Authenticates with username and password and returns a token pair.
///
/// # Errors
/// - 400: missing fields (rejected by the JSON extractor)
/// - 401: unknown username or wrong password, indistinguishable in
///   body and timing
pub async fn login(
    form: web::Json<LoginRequest>,
    pool: web::Data<PgPool>,
    jwt_config: web::Data<JwtSettings>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_login");
    let started = Instant::now();

    let outcome = store::authenticate(pool.get_ref(), &form.username, &form.password).await;

    // Latency floor applies to every outcome, including errors.
    if let Some(remaining) = MIN_LOGIN_LATENCY.checked_sub(started.elapsed()) {
        tokio::time::sleep(remaining).await;
    }

    let user = outcome?.ok_or(AppError::Auth(AuthError::InvalidCredentials))?;

    let (access_token, _) = issue_access_token(&user, jwt_config.get_ref())?;
    let (refresh_token, _) = issue_refresh_token(&user, jwt_config.get_ref())?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = user.id,
        "User logged in successfully"
    );

    Ok(HttpResponse::Ok().json(AuthResponse::new(
        access_token,
        refresh_token,
        jwt_config.get_ref(),
        &user,
    )))
}

/// POST /auth/refresh
///
/// Exchanges a refresh token for a new token pair. The old refresh
/// token's jti is revoked first (rotation), so a replayed token is
/// rejected even before its natural expiry.
///
/// # Errors
/// - 401: invalid, expired, revoked, or wrong-kind token; or the
///   account no longer exists
pub async fn refresh(
    form: web::Json<RefreshRequest>,
    pool: web::Data<PgPool>,
    jwt_config: web::Data<JwtSettings>,
    registry: web::Data<RevocationRegistry>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("token_refresh");

    let claims = validate_refresh_token(&form.refresh_token, jwt_config.get_ref())?;

    if registry.is_revoked(&claims.jti) {
        tracing::warn!(sub = %claims.sub, "Attempt to reuse a rotated refresh token");
        return Err(AppError::Auth(AuthError::TokenRevoked));
    }

    let user = store::get_user(pool.get_ref(), &claims.sub)
        .await?
        .ok_or(AppError::Auth(AuthError::TokenInvalid))?;

    // Rotation: the presented token is spent from here on.
    registry.revoke(&claims.jti, claims.exp);
    registry.prune_expired(chrono::Utc::now().timestamp());

    let (access_token, _) = issue_access_token(&user, jwt_config.get_ref())?;
    let (refresh_token, _) = issue_refresh_token(&user, jwt_config.get_ref())?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = user.id,
        "Token refreshed successfully"
    );

    Ok(HttpResponse::Ok().json(AuthResponse::new(
        access_token,
        refresh_token,
        jwt_config.get_ref(),
        &user,
    )))
}

/// POST /auth/logout
///
/// Revokes the access token that authenticated this request, and the
/// refresh token too when the body carries one. Revocation is
/// idempotent, so logging out twice succeeds.
pub async fn logout(
    claims: web::ReqData<Claims>,
    body: Option<web::Json<LogoutRequest>>,
    jwt_config: web::Data<JwtSettings>,
    registry: web::Data<RevocationRegistry>,
) -> Result<HttpResponse, AppError> {
    let claims = claims.into_inner();

    registry.revoke(&claims.jti, claims.exp);

    if let Some(body) = body {
        if let Some(refresh_token) = body.refresh_token.as_deref() {
            // A token that fails validation is already unusable;
            // nothing to revoke.
            if let Ok(refresh_claims) = validate_refresh_token(refresh_token, jwt_config.get_ref())
            {
                registry.revoke(&refresh_claims.jti, refresh_claims.exp);
            }
        }
    }

    registry.prune_expired(chrono::Utc::now().timestamp());

    tracing::info!(sub = %claims.sub, "User logged out");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Logged out successfully"
    })))
}
