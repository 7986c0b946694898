//! JWT authentication and role gating.
//!
//! `AuthService` owns password hashing and token issuance. The middleware in
//! this module validates bearer tokens, stashes an [`AuthenticatedUser`] in the
//! request extensions, and enforces role requirements per router via
//! [`AuthRouterExt`].

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::entities::user::{self, UserRole};
use crate::errors::ServiceError;

/// JWT claim set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub email: String,
    pub role: String,
    /// Set for vendor-role users only.
    pub vendor_id: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

/// Authenticated principal extracted from a validated token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub email: String,
    pub role: UserRole,
    pub vendor_id: Option<Uuid>,
}

impl AuthenticatedUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Whether this principal may act for the given vendor.
    pub fn can_act_for_vendor(&self, vendor_id: Uuid) -> bool {
        self.is_admin() || self.vendor_id == Some(vendor_id)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| ServiceError::Unauthorized("Authentication required".to_string()))
    }
}

/// Token issuance and password hashing.
#[derive(Clone)]
pub struct AuthService {
    jwt_secret: String,
    expiration_secs: i64,
}

impl AuthService {
    pub fn new(jwt_secret: impl Into<String>, expiration_secs: i64) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            expiration_secs,
        }
    }

    pub fn hash_password(&self, password: &str) -> Result<String, ServiceError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| ServiceError::HashError(e.to_string()))
    }

    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool, ServiceError> {
        let parsed =
            PasswordHash::new(hash).map_err(|e| ServiceError::HashError(e.to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }

    pub fn generate_token(&self, user: &user::Model) -> Result<String, ServiceError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            role: user.role.as_str().to_string(),
            vendor_id: user.vendor_id.map(|id| id.to_string()),
            iat: now,
            exp: now + self.expiration_secs,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| ServiceError::AuthError(format!("Failed to issue token: {}", e)))
    }

    pub fn validate_token(&self, token: &str) -> Result<AuthenticatedUser, ServiceError> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| {
            debug!("token validation failed: {}", e);
            ServiceError::Unauthorized("Invalid or expired token".to_string())
        })?;

        let claims = data.claims;
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| ServiceError::Unauthorized("Malformed token subject".to_string()))?;
        let role = UserRole::parse(&claims.role)
            .ok_or_else(|| ServiceError::Unauthorized("Unknown role in token".to_string()))?;
        let vendor_id = match claims.vendor_id {
            Some(raw) => Some(
                Uuid::parse_str(&raw)
                    .map_err(|_| ServiceError::Unauthorized("Malformed vendor id".to_string()))?,
            ),
            None => None,
        };

        Ok(AuthenticatedUser {
            user_id,
            email: claims.email,
            role,
            vendor_id,
        })
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
}

/// Validates the bearer token and attaches the principal to the request.
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let auth_service = match request.extensions().get::<Arc<AuthService>>() {
        Some(service) => service.clone(),
        None => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Authentication service not available",
            )
                .into_response();
        }
    };

    let token = match bearer_token(request.headers()) {
        Some(token) => token.to_string(),
        None => {
            return ServiceError::Unauthorized("Missing bearer token".to_string()).into_response()
        }
    };

    match auth_service.validate_token(&token) {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

/// Rejects requests whose principal lacks the required role. Admins pass any
/// role gate.
pub async fn role_middleware(
    State(required_role): State<UserRole>,
    request: Request,
    next: Next,
) -> Result<Response, ServiceError> {
    let user = request
        .extensions()
        .get::<AuthenticatedUser>()
        .cloned()
        .ok_or_else(|| ServiceError::Unauthorized("Authentication required".to_string()))?;

    if user.role != required_role && !user.is_admin() {
        return Err(ServiceError::Forbidden(format!(
            "Requires {} role",
            required_role.as_str()
        )));
    }

    Ok(next.run(request).await)
}

/// Extension methods for Router to add auth middleware.
pub trait AuthRouterExt {
    fn with_auth(self) -> Self;
    fn with_role(self, role: UserRole) -> Self;
}

impl<S> AuthRouterExt for axum::Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_auth(self) -> Self {
        self.layer(axum::middleware::from_fn(auth_middleware))
    }

    fn with_role(self, role: UserRole) -> Self {
        self.layer(axum::middleware::from_fn_with_state(role, role_middleware))
            .with_auth()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_user(role: UserRole, vendor_id: Option<Uuid>) -> user::Model {
        user::Model {
            id: Uuid::new_v4(),
            email: "dana@example.com".to_string(),
            password_hash: String::new(),
            display_name: "Dana".to_string(),
            role,
            vendor_id,
            is_active: true,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn password_hash_round_trip() {
        let svc = AuthService::new("test-secret-with-enough-length-123", 3600);
        let hash = svc.hash_password("hunter2hunter2").unwrap();
        assert!(svc.verify_password("hunter2hunter2", &hash).unwrap());
        assert!(!svc.verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn token_round_trip_preserves_identity() {
        let svc = AuthService::new("test-secret-with-enough-length-123", 3600);
        let vendor_id = Uuid::new_v4();
        let user = sample_user(UserRole::Vendor, Some(vendor_id));
        let token = svc.generate_token(&user).unwrap();
        let principal = svc.validate_token(&token).unwrap();
        assert_eq!(principal.user_id, user.id);
        assert_eq!(principal.role, UserRole::Vendor);
        assert_eq!(principal.vendor_id, Some(vendor_id));
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let issuer = AuthService::new("secret-a-secret-a-secret-a-secret", 3600);
        let verifier = AuthService::new("secret-b-secret-b-secret-b-secret", 3600);
        let token = issuer
            .generate_token(&sample_user(UserRole::Customer, None))
            .unwrap();
        assert!(verifier.validate_token(&token).is_err());
    }

    #[test]
    fn vendor_scope_check() {
        let vendor_id = Uuid::new_v4();
        let vendor = AuthenticatedUser {
            user_id: Uuid::new_v4(),
            email: "v@example.com".to_string(),
            role: UserRole::Vendor,
            vendor_id: Some(vendor_id),
        };
        assert!(vendor.can_act_for_vendor(vendor_id));
        assert!(!vendor.can_act_for_vendor(Uuid::new_v4()));

        let admin = AuthenticatedUser {
            user_id: Uuid::new_v4(),
            email: "a@example.com".to_string(),
            role: UserRole::Admin,
            vendor_id: None,
        };
        assert!(admin.can_act_for_vendor(vendor_id));
    }
}
