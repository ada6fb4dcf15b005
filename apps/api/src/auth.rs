//! JWT authentication module.
//!
//! Token generation and validation, password hashing, and the
//! [`AuthUser`] extractor that guards protected routes.
//!
//! ## Request Flow
//! ```text
//! Authorization: Bearer eyJ...
//!       │
//!       ├── header missing / not "Bearer " ──► 401 Missing token
//!       ▼
//! JwtManager::validate_token
//!       │
//!       ├── bad signature / malformed / expired ──► 401 Invalid token
//!       ▼
//! AuthUser { user_id, username, role }
//!       │
//!       └── require_role(Admin) fails ──► 403 Insufficient role
//! ```

use std::sync::Arc;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use stockroom_core::{Role, StaffIdentity, User};
use tracing::debug;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

// =============================================================================
// Tokens
// =============================================================================

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,

    /// Username at time of login
    pub username: String,

    /// Role at time of login
    pub role: Role,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID (unique identifier for this token)
    pub jti: String,
}

/// JWT token manager (HS256).
pub struct JwtManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
    lifetime_secs: i64,
}

impl JwtManager {
    /// Create a new JWT manager.
    pub fn new(secret: &str, lifetime_secs: i64) -> Self {
        JwtManager {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            lifetime_secs,
        }
    }

    /// Token lifetime in seconds.
    pub fn lifetime_secs(&self) -> i64 {
        self.lifetime_secs
    }

    /// Generate a token for a user.
    pub fn generate_token(&self, user: &User) -> ApiResult<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.lifetime_secs);

        let claims = Claims {
            sub: user.id.clone(),
            username: user.username.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| ApiError::internal(format!("Failed to generate token: {e}")))
    }

    /// Validate and decode a token. Expiry is checked with no leeway.
    pub fn validate_token(&self, token: &str) -> ApiResult<Claims> {
        let mut validation = Validation::default();
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!(error = %e, "Token rejected");
                ApiError::invalid_token()
            })
    }
}

/// Extract bearer token from an authorization header value.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

// =============================================================================
// Passwords
// =============================================================================

/// Hash a password for storage (argon2id, random salt, PHC string).
pub fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::internal(format!("Failed to hash password: {e}")))
}

/// Check a password against a stored hash. Unparseable hashes never match.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

// =============================================================================
// Extractor
// =============================================================================

/// The authenticated caller of a protected route.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub username: String,
    pub role: Role,
}

impl AuthUser {
    /// Fails with 403 unless the caller has `role`.
    pub fn require_role(&self, role: Role) -> ApiResult<()> {
        if self.role == role {
            Ok(())
        } else {
            Err(ApiError::forbidden())
        }
    }

    /// Identity recorded on sales.
    pub fn staff_identity(&self) -> StaffIdentity {
        StaffIdentity {
            user_id: self.user_id.clone(),
            username: self.username.clone(),
        }
    }
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        AuthUser {
            user_id: claims.sub,
            username: claims.username,
            role: claims.role,
        }
    }
}

/// Authenticates a request that must carry a token.
pub fn authenticate(headers: &HeaderMap, jwt: &JwtManager) -> ApiResult<AuthUser> {
    optional_auth(headers, jwt)?.ok_or_else(ApiError::missing_token)
}

/// Authenticates a request where a token is optional.
///
/// No `Authorization` header yields `None`; a header that is present but
/// not a valid bearer token is still an error.
pub fn optional_auth(headers: &HeaderMap, jwt: &JwtManager) -> ApiResult<Option<AuthUser>> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    let token = value
        .to_str()
        .ok()
        .and_then(extract_bearer_token)
        .ok_or_else(ApiError::missing_token)?;

    jwt.validate_token(token).map(|claims| Some(claims.into()))
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        authenticate(&parts.headers, &state.jwt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn user(role: Role) -> User {
        User {
            id: "user-1".to_string(),
            username: "alice".to_string(),
            password_hash: String::new(),
            role,
            created_at: Utc::now(),
        }
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        headers
    }

    #[test]
    fn test_jwt_roundtrip() {
        let manager = JwtManager::new("test-secret", 3600);
        let token = manager.generate_token(&user(Role::Admin)).unwrap();

        let claims = manager.validate_token(&token).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issuer = JwtManager::new("secret-a", 3600);
        let verifier = JwtManager::new("secret-b", 3600);
        let token = issuer.generate_token(&user(Role::Staff)).unwrap();

        assert!(verifier.validate_token(&token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let manager = JwtManager::new("test-secret", -60);
        let token = manager.generate_token(&user(Role::Staff)).unwrap();

        let err = manager.validate_token(&token).unwrap_err();
        assert_eq!(err.message, "Invalid token");
    }

    #[test]
    fn test_tampered_token_rejected() {
        let manager = JwtManager::new("test-secret", 3600);
        let token = manager.generate_token(&user(Role::Staff)).unwrap();

        let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
        parts[2] = parts[2].chars().rev().collect();
        let tampered = parts.join(".");

        assert!(manager.validate_token(&tampered).is_err());
        assert!(manager.validate_token("not-a-jwt").is_err());
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(extract_bearer_token("Basic abc"), None);
        assert_eq!(extract_bearer_token("Bearer "), None);
    }

    #[test]
    fn test_password_hash_and_verify() {
        let hash = hash_password("hunter2").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("hunter2", &hash));
        assert!(!verify_password("hunter3", &hash));
        assert!(!verify_password("hunter2", "not-a-hash"));

        // Random salt: same password, different hash.
        assert_ne!(hash, hash_password("hunter2").unwrap());
    }

    #[test]
    fn test_header_authentication() {
        let manager = JwtManager::new("test-secret", 3600);
        let token = manager.generate_token(&user(Role::Staff)).unwrap();

        let caller = authenticate(&bearer(&token), &manager).unwrap();
        assert_eq!(caller.username, "alice");
        assert!(caller.require_role(Role::Admin).is_err());
        assert!(caller.require_role(Role::Staff).is_ok());

        let err = authenticate(&HeaderMap::new(), &manager).unwrap_err();
        assert_eq!(err.message, "Missing token");

        assert!(optional_auth(&HeaderMap::new(), &manager).unwrap().is_none());
        assert!(optional_auth(&bearer("garbage"), &manager).is_err());
    }
}
