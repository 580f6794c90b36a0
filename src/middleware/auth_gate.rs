/// Authentication gate
///
/// Runs before every protected operation: extracts the bearer token,
/// verifies signature and expiry, checks the revocation registry, and
/// injects the claims into request extensions for downstream handlers.
///
/// The decision itself is the pure function `admit`; the actix
/// middleware is a thin shell around it, so every failure path is an
/// explicit value rather than an exception.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::Method,
    web, Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;

use crate::auth::{validate_access_token, Claims, RevocationRegistry};
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError};

/// Decide whether a request carrying this Authorization header value
/// may proceed.
///
/// Checks run in order: header present and well-formed, signature and
/// expiry valid (access kind only), jti not revoked. The first failure
/// wins; on success the verified claims come back for downstream
/// authorization.
pub fn admit(
    auth_header: Option<&str>,
    config: &JwtSettings,
    registry: &RevocationRegistry,
) -> Result<Claims, AuthError> {
    let token = auth_header
        .and_then(|h| h.strip_prefix("Bearer "))
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::MissingToken)?;

    let claims = validate_access_token(token, config)?;

    if registry.is_revoked(&claims.jti) {
        tracing::warn!(sub = %claims.sub, jti = %claims.jti, "Revoked token presented");
        return Err(AuthError::TokenRevoked);
    }

    Ok(claims)
}

/// Gate middleware for protected scopes.
pub struct AuthGate {
    jwt_config: JwtSettings,
    registry: web::Data<RevocationRegistry>,
}

impl AuthGate {
    pub fn new(jwt_config: JwtSettings, registry: web::Data<RevocationRegistry>) -> Self {
        Self {
            jwt_config,
            registry,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthGate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthGateService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(AuthGateService {
            service: Rc::new(service),
            jwt_config: self.jwt_config.clone(),
            registry: self.registry.clone(),
        }))
    }
}

pub struct AuthGateService<S> {
    service: Rc<S>,
    jwt_config: JwtSettings,
    registry: web::Data<RevocationRegistry>,
}

impl<S, B> Service<ServiceRequest> for AuthGateService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // CORS pre-flight carries no credentials; let it through.
        if req.method() == Method::OPTIONS {
            let service = self.service.clone();
            return Box::pin(async move { service.call(req).await });
        }

        let auth_header = req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .map(|h| h.to_string());

        match admit(auth_header.as_deref(), &self.jwt_config, &self.registry) {
            Ok(claims) => {
                tracing::debug!(
                    sub = %claims.sub,
                    role = %claims.role,
                    "Request admitted"
                );
                req.extensions_mut().insert(claims);

                let service = self.service.clone();
                Box::pin(async move { service.call(req).await })
            }
            Err(e) => {
                // Generic rejection body; status and message come from
                // the error type.
                Box::pin(async move { Err(AppError::Auth(e).into()) })
            }
        }
    }
}
