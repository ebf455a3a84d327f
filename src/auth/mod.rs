//! Bearer-token authentication.
//!
//! Tokens are issued by an external identity collaborator; this module
//! only validates them and extracts the acting user for
//! `created_by`/`updated_by`/`deleted_by` stamping and permission
//! checks.

pub mod permissions;

pub use permissions as consts;

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::errors::ErrorResponse;

/// Claim structure of tokens from the identity collaborator
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// User's display name
    pub name: Option<String>,
    /// User's email
    pub email: Option<String>,
    /// Roles granted to the user
    #[serde(default)]
    pub roles: Vec<String>,
    /// Explicit permissions granted to the user
    #[serde(default)]
    pub permissions: Vec<String>,
    /// Token ID
    pub jti: String,
    /// Issued at
    pub iat: i64,
    /// Expiration
    pub exp: i64,
    /// Issuer
    pub iss: String,
    /// Audience
    pub aud: String,
}

/// Authenticated user data extracted from the bearer token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub name: Option<String>,
    pub email: Option<String>,
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
    pub token_id: String,
}

impl AuthUser {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Admins implicitly hold every permission.
    pub fn has_permission(&self, permission: &str) -> bool {
        self.is_admin() || self.permissions.iter().any(|p| p == permission)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role("admin")
    }
}

/// Authentication configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_audience: String,
}

impl AuthConfig {
    pub fn new(jwt_secret: String, jwt_issuer: String, jwt_audience: String) -> Self {
        Self {
            jwt_secret,
            jwt_issuer,
            jwt_audience,
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing authentication token")]
    MissingAuth,
    #[error("Invalid token: {0}")]
    InvalidToken(String),
    #[error("Insufficient permissions")]
    InsufficientPermissions,
    #[error("Internal authentication error: {0}")]
    InternalError(String),
}

impl AuthError {
    fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingAuth | AuthError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            AuthError::InsufficientPermissions => StatusCode::FORBIDDEN,
            AuthError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            AuthError::InternalError(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };

        let body = ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message,
            details: None,
            request_id: crate::tracing::current_request_id().map(|r| r.as_str().to_string()),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (status, Json(body)).into_response()
    }
}

/// Validates bearer tokens against the collaborator's signing secret.
#[derive(Clone)]
pub struct AuthService {
    config: AuthConfig,
    decoding_key: DecodingKey,
}

impl AuthService {
    pub fn new(config: AuthConfig) -> Self {
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
        Self {
            config,
            decoding_key,
        }
    }

    /// Validate a bearer token and return its claims.
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[self.config.jwt_audience.as_str()]);
        validation.set_issuer(&[self.config.jwt_issuer.as_str()]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }

    /// Validate a token and build the acting user from its claims.
    pub fn authenticate(&self, token: &str) -> Result<AuthUser, AuthError> {
        let claims = self.validate_token(token)?;
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AuthError::InvalidToken("subject is not a valid user id".into()))?;

        Ok(AuthUser {
            user_id,
            name: claims.name,
            email: claims.email,
            roles: claims.roles,
            permissions: claims.permissions,
            token_id: claims.jti,
        })
    }
}

fn bearer_token(parts: &http::HeaderMap) -> Option<&str> {
    parts
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
}

/// Authentication middleware: validates the bearer token and stores the
/// acting user in request extensions.
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let auth_service = match request.extensions().get::<Arc<AuthService>>() {
        Some(service) => service.clone(),
        None => {
            warn!("AuthService missing from request extensions");
            return AuthError::InternalError("auth service not configured".into()).into_response();
        }
    };

    let token = match bearer_token(request.headers()) {
        Some(token) if !token.is_empty() => token.to_string(),
        _ => return AuthError::MissingAuth.into_response(),
    };

    match auth_service.authenticate(&token) {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(err) => err.into_response(),
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AuthError::MissingAuth)
    }
}

/// Extension methods for Router to add auth middleware
pub trait AuthRouterExt {
    /// Require a valid bearer token.
    fn with_auth(self) -> Self;
    /// Require a valid bearer token carrying `permission`.
    fn with_permission(self, permission: &str) -> Self;
}

impl<S> AuthRouterExt for axum::Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_auth(self) -> Self {
        self.layer(axum::middleware::from_fn(auth_middleware))
    }

    fn with_permission(self, permission: &str) -> Self {
        let required = permission.to_string();
        // auth_middleware is layered last so it runs first and populates
        // the AuthUser extension the permission check reads.
        self.layer(axum::middleware::from_fn(
            move |request: Request, next: Next| {
                let required = required.clone();
                async move {
                    match request.extensions().get::<AuthUser>() {
                        Some(user) if user.has_permission(&required) => next.run(request).await,
                        Some(_) => AuthError::InsufficientPermissions.into_response(),
                        None => AuthError::MissingAuth.into_response(),
                    }
                }
            },
        ))
        .layer(axum::middleware::from_fn(auth_middleware))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn auth_service() -> AuthService {
        AuthService::new(AuthConfig::new(
            SECRET.into(),
            "fabtrack-auth".into(),
            "fabtrack-api".into(),
        ))
    }

    fn make_token(sub: &str, roles: Vec<String>, permissions: Vec<String>) -> String {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: sub.to_string(),
            name: Some("Test User".into()),
            email: Some("test@example.com".into()),
            roles,
            permissions,
            jti: Uuid::new_v4().to_string(),
            iat: now,
            exp: now + 3600,
            iss: "fabtrack-auth".into(),
            aud: "fabtrack-api".into(),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn valid_token_yields_auth_user() {
        let user_id = Uuid::new_v4();
        let token = make_token(
            &user_id.to_string(),
            vec!["operator".into()],
            vec![consts::PRODUCTS_READ.into()],
        );

        let user = auth_service().authenticate(&token).unwrap();
        assert_eq!(user.user_id, user_id);
        assert!(user.has_permission(consts::PRODUCTS_READ));
        assert!(!user.has_permission(consts::PRODUCTS_MANAGE));
    }

    #[test]
    fn admin_role_implies_every_permission() {
        let token = make_token(&Uuid::new_v4().to_string(), vec!["admin".into()], vec![]);
        let user = auth_service().authenticate(&token).unwrap();
        assert!(user.has_permission(consts::SALES_MANAGE));
    }

    #[test]
    fn non_uuid_subject_is_rejected() {
        let token = make_token("not-a-uuid", vec![], vec![]);
        assert!(matches!(
            auth_service().authenticate(&token),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn garbage_token_is_rejected() {
        assert!(matches!(
            auth_service().authenticate("garbage"),
            Err(AuthError::InvalidToken(_))
        ));
    }
}
