// ABOUTME: JWT-based user authentication and password hashing
// ABOUTME: Issues and validates HS256 bearer tokens and wraps bcrypt on blocking threads
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Authentication
//!
//! Tokens are HS256 JWTs signed with the configured secret. The claims carry
//! the user's ID, email and role; the middleware still reloads the user from
//! the database so that deactivation and role changes apply immediately.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::constants::service_names;
use crate::errors::{AppError, AppResult};
use crate::models::{User, UserRole};

/// `JWT` claims for user authentication
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User `ID`
    pub sub: String,
    /// User email
    pub email: String,
    /// Role at the time the token was issued
    pub role: UserRole,
    /// Issued at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
    /// Audience (who the token is intended for)
    pub aud: String,
}

impl Claims {
    /// Parse the subject as a user ID
    ///
    /// # Errors
    ///
    /// Returns `AuthInvalid` if the subject is not a UUID
    pub fn user_id(&self) -> AppResult<Uuid> {
        Uuid::parse_str(&self.sub).map_err(|_| AppError::auth_invalid("Invalid token subject"))
    }
}

/// Token returned to clients after register, login and refresh
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuedToken {
    /// Bearer token
    pub token: String,
    /// When the token stops being accepted
    pub expires_at: DateTime<Utc>,
}

/// Authentication manager for `JWT` tokens and password hashes
pub struct AuthManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_expiry_hours: i64,
    bcrypt_cost: u32,
}

impl AuthManager {
    /// Create a new authentication manager
    #[must_use]
    pub fn new(jwt_secret: &[u8], token_expiry_hours: i64, bcrypt_cost: u32) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(jwt_secret),
            decoding_key: DecodingKey::from_secret(jwt_secret),
            token_expiry_hours,
            bcrypt_cost,
        }
    }

    /// Token lifetime in hours
    #[must_use]
    pub const fn token_expiry_hours(&self) -> i64 {
        self.token_expiry_hours
    }

    /// Generate a `JWT` token for a user
    ///
    /// # Errors
    ///
    /// Returns an internal error if JWT encoding fails
    pub fn generate_token(&self, user: &User) -> AppResult<IssuedToken> {
        let now = Utc::now();
        let expires_at = now + Duration::hours(self.token_expiry_hours);
        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            aud: service_names::JWT_AUDIENCE.to_owned(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to sign token: {e}")))?;
        debug!(user_id = %user.id, "Issued JWT");
        Ok(IssuedToken { token, expires_at })
    }

    /// Validate a token and return its claims
    ///
    /// # Errors
    ///
    /// Returns `AuthExpired` for an expired token and `AuthInvalid` for a bad
    /// signature, wrong audience or malformed token
    pub fn validate_token(&self, token: &str) -> AppResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.set_audience(&[service_names::JWT_AUDIENCE]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| Self::convert_jwt_error(&e))
    }

    fn convert_jwt_error(e: &jsonwebtoken::errors::Error) -> AppError {
        use jsonwebtoken::errors::ErrorKind;

        match e.kind() {
            ErrorKind::ExpiredSignature => AppError::auth_expired(),
            ErrorKind::InvalidSignature => {
                warn!("JWT signature verification failed");
                AppError::auth_invalid("Token signature verification failed")
            }
            ErrorKind::InvalidAudience => AppError::auth_invalid("Token audience mismatch"),
            _ => {
                debug!("JWT rejected: {e:?}");
                AppError::auth_invalid("Token is malformed")
            }
        }
    }

    /// Hash a password with bcrypt on the blocking pool
    ///
    /// # Errors
    ///
    /// Returns an internal error if hashing fails or the blocking task panics
    pub async fn hash_password(&self, password: &str) -> AppResult<String> {
        let password = password.to_owned();
        let cost = self.bcrypt_cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| AppError::internal(format!("Password hashing task failed: {e}")))?
            .map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))
    }

    /// Verify a password against a stored hash on the blocking pool
    ///
    /// # Errors
    ///
    /// Returns an internal error if the stored hash is unreadable or the
    /// blocking task panics
    pub async fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool> {
        let password = password.to_owned();
        let hash = hash.to_owned();
        tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| AppError::internal(format!("Password verification task failed: {e}")))?
            .map_err(|e| AppError::internal(format!("Password verification failed: {e}")))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn manager(expiry_hours: i64) -> AuthManager {
        AuthManager::new(b"unit-test-secret-0123456789", expiry_hours, 4)
    }

    fn user() -> User {
        User::new(
            "Coach@Example.com",
            String::new(),
            "Coach".to_owned(),
            UserRole::Coach,
        )
    }

    #[test]
    fn test_token_round_trip_keeps_identity() {
        let auth = manager(1);
        let user = user();
        let issued = auth.generate_token(&user).unwrap();
        let claims = auth.validate_token(&issued.token).unwrap();

        assert_eq!(claims.user_id().unwrap(), user.id);
        assert_eq!(claims.email, "coach@example.com");
        assert_eq!(claims.role, UserRole::Coach);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let auth = manager(-1);
        let issued = auth.generate_token(&user()).unwrap();
        let err = auth.validate_token(&issued.token).unwrap_err();
        assert_eq!(err.code, crate::errors::ErrorCode::AuthExpired);
    }

    #[test]
    fn test_token_from_other_secret_is_rejected() {
        let issued = AuthManager::new(b"another-secret-abcdefghijk", 1, 4)
            .generate_token(&user())
            .unwrap();
        let err = manager(1).validate_token(&issued.token).unwrap_err();
        assert_eq!(err.code, crate::errors::ErrorCode::AuthInvalid);
    }

    #[tokio::test]
    async fn test_password_hash_and_verify() {
        let auth = manager(1);
        let hash = auth.hash_password("correct horse").await.unwrap();
        assert!(auth.verify_password("correct horse", &hash).await.unwrap());
        assert!(!auth.verify_password("wrong horse", &hash).await.unwrap());
    }
}
