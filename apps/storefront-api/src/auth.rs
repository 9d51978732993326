//! JWT authentication module.
//!
//! Handles token generation and validation, and the request extractors that
//! turn an `Authorization: Bearer` header into an [`AuthUser`].

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use foodie_core::{User, UserRole};

use crate::error::ApiError;
use crate::state::SharedState;

const ACCESS: &str = "access";
const REFRESH: &str = "refresh";

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,

    pub email: String,

    pub role: UserRole,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID (unique identifier for this token)
    pub jti: String,

    /// Token type ("access" or "refresh")
    pub token_type: String,
}

/// Access + refresh pair handed out on login, registration and refresh.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

/// JWT token manager.
pub struct JwtManager {
    secret: String,
    access_lifetime_secs: i64,
    refresh_lifetime_secs: i64,
}

impl JwtManager {
    pub fn new(secret: String, access_lifetime_secs: i64, refresh_lifetime_secs: i64) -> Self {
        JwtManager {
            secret,
            access_lifetime_secs,
            refresh_lifetime_secs,
        }
    }

    pub fn generate_access_token(&self, user: &User) -> Result<String, ApiError> {
        self.generate(user, ACCESS, self.access_lifetime_secs)
    }

    pub fn generate_refresh_token(&self, user: &User) -> Result<String, ApiError> {
        self.generate(user, REFRESH, self.refresh_lifetime_secs)
    }

    /// Issues both tokens for a freshly authenticated user.
    pub fn issue_pair(&self, user: &User) -> Result<TokenPair, ApiError> {
        Ok(TokenPair {
            access_token: self.generate_access_token(user)?,
            refresh_token: self.generate_refresh_token(user)?,
            token_type: "Bearer",
            expires_in: self.access_lifetime_secs,
        })
    }

    fn generate(&self, user: &User, token_type: &str, lifetime_secs: i64) -> Result<String, ApiError> {
        let now = Utc::now();
        let exp = now + Duration::seconds(lifetime_secs);

        let claims = Claims {
            sub: user.id.clone(),
            email: user.email.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
            token_type: token_type.to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| ApiError::Internal(format!("Failed to generate {} token: {}", token_type, e)))
    }

    /// Validate and decode a token.
    pub fn validate_token(&self, token: &str) -> Result<Claims, ApiError> {
        let token_data: TokenData<Claims> = decode(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| ApiError::AuthFailed(format!("Invalid token: {}", e)))?;

        Ok(token_data.claims)
    }

    pub fn validate_access_token(&self, token: &str) -> Result<Claims, ApiError> {
        self.validate_typed(token, ACCESS)
    }

    pub fn validate_refresh_token(&self, token: &str) -> Result<Claims, ApiError> {
        self.validate_typed(token, REFRESH)
    }

    fn validate_typed(&self, token: &str, expected: &str) -> Result<Claims, ApiError> {
        let claims = self.validate_token(token)?;

        if claims.token_type != expected {
            return Err(ApiError::AuthFailed(format!("Expected {} token", expected)));
        }

        Ok(claims)
    }
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    let token = auth_header.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

// =============================================================================
// Extractors
// =============================================================================

/// The caller behind a valid access token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub email: String,
    pub role: UserRole,
}

impl AuthUser {
    #[inline]
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        AuthUser {
            user_id: claims.sub,
            email: claims.email,
            role: claims.role,
        }
    }
}

impl FromRequestParts<SharedState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &SharedState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::AuthFailed("Missing bearer token".to_string()))?;

        let token = extract_bearer_token(header)
            .ok_or_else(|| ApiError::AuthFailed("Missing bearer token".to_string()))?;

        let claims = state.jwt.validate_access_token(token)?;
        Ok(AuthUser::from(claims))
    }
}

/// An [`AuthUser`] with the admin role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

impl FromRequestParts<SharedState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &SharedState) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;

        if !user.is_admin() {
            return Err(ApiError::Forbidden("Admin access required".to_string()));
        }

        Ok(AdminUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: UserRole) -> User {
        User {
            id: "user-001".to_string(),
            username: "johndoe".to_string(),
            email: "john@example.com".to_string(),
            first_name: "John".to_string(),
            last_name: "Doe".to_string(),
            phone: None,
            avatar_url: None,
            role,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_jwt_roundtrip() {
        let manager = JwtManager::new("test-secret".to_string(), 3600, 86400);

        let access_token = manager.generate_access_token(&user(UserRole::Admin)).unwrap();
        let claims = manager.validate_access_token(&access_token).unwrap();

        assert_eq!(claims.sub, "user-001");
        assert_eq!(claims.email, "john@example.com");
        assert_eq!(claims.role, UserRole::Admin);
        assert_eq!(claims.token_type, "access");
    }

    #[test]
    fn test_refresh_token() {
        let manager = JwtManager::new("test-secret".to_string(), 3600, 86400);

        let pair = manager.issue_pair(&user(UserRole::User)).unwrap();
        assert_eq!(pair.expires_in, 3600);

        let claims = manager.validate_refresh_token(&pair.refresh_token).unwrap();
        assert_eq!(claims.token_type, "refresh");
    }

    #[test]
    fn test_wrong_token_type() {
        let manager = JwtManager::new("test-secret".to_string(), 3600, 86400);

        let access_token = manager.generate_access_token(&user(UserRole::User)).unwrap();

        // Access token presented where a refresh token is expected
        assert!(manager.validate_refresh_token(&access_token).is_err());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issuer = JwtManager::new("secret-a".to_string(), 3600, 86400);
        let verifier = JwtManager::new("secret-b".to_string(), 3600, 86400);

        let token = issuer.generate_access_token(&user(UserRole::User)).unwrap();
        assert!(matches!(
            verifier.validate_access_token(&token),
            Err(ApiError::AuthFailed(_))
        ));
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(extract_bearer_token("Bearer   "), None);
        assert_eq!(extract_bearer_token("Basic abc"), None);
    }
}
