// ABOUTME: Bearer-token authentication for REST handlers
// ABOUTME: Validates the JWT, loads the account and rejects deactivated users
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use axum::http::HeaderMap;
use uuid::Uuid;

use crate::auth::AuthManager;
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::models::{User, UserRole};

/// Authenticated caller
#[derive(Debug, Clone)]
pub struct AuthResult {
    /// Caller's account ID
    pub user_id: Uuid,
    /// Caller's current role, read from the database
    pub role: UserRole,
    /// Caller's account
    pub user: User,
}

impl AuthResult {
    /// Require the caller to have exactly `role`
    ///
    /// # Errors
    ///
    /// Returns `PermissionDenied` otherwise
    pub fn require_role(&self, role: UserRole) -> AppResult<()> {
        if self.role == role {
            Ok(())
        } else {
            Err(AppError::forbidden(format!("This action requires the {role} role")))
        }
    }

    /// Require a coach account
    ///
    /// # Errors
    ///
    /// Returns `PermissionDenied` for players and admins
    pub fn require_coach(&self) -> AppResult<()> {
        self.require_role(UserRole::Coach)
    }

    /// Require an admin account
    ///
    /// # Errors
    ///
    /// Returns `PermissionDenied` for everyone else
    pub fn require_admin(&self) -> AppResult<()> {
        self.require_role(UserRole::Admin)
    }

    /// Require the caller to own a resource, admins excepted
    ///
    /// # Errors
    ///
    /// Returns `PermissionDenied` if the caller is neither the owner nor an admin
    pub fn require_owner_or_admin(&self, owner_id: Uuid) -> AppResult<()> {
        if self.user_id == owner_id || self.role.is_admin() {
            Ok(())
        } else {
            Err(AppError::forbidden("You do not own this resource"))
        }
    }
}

/// Resolves `Authorization: Bearer <jwt>` headers to accounts
#[derive(Clone)]
pub struct AuthMiddleware {
    auth_manager: Arc<AuthManager>,
    database: Arc<Database>,
}

impl AuthMiddleware {
    /// Create the middleware
    #[must_use]
    pub fn new(auth_manager: Arc<AuthManager>, database: Arc<Database>) -> Self {
        Self {
            auth_manager,
            database,
        }
    }

    /// Authenticate a request from its headers
    ///
    /// # Errors
    ///
    /// - `AuthRequired` when no bearer token is present
    /// - `AuthInvalid` / `AuthExpired` when the token fails validation or the
    ///   account no longer exists
    /// - `PermissionDenied` when the account is deactivated
    #[tracing::instrument(
        skip(self, headers),
        fields(user_id = tracing::field::Empty, success = tracing::field::Empty)
    )]
    pub async fn authenticate_request(&self, headers: &HeaderMap) -> AppResult<AuthResult> {
        let token = bearer_token(headers).ok_or_else(AppError::auth_required)?;

        let claims = match self.auth_manager.validate_token(token) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::Span::current().record("success", false);
                tracing::debug!(error = %e, "Bearer token rejected");
                return Err(e);
            }
        };
        let user_id = claims.user_id()?;

        let user = self
            .database
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::auth_invalid("Account no longer exists"))?;
        if !user.is_active {
            tracing::Span::current().record("success", false);
            return Err(AppError::forbidden("Account is deactivated"));
        }

        tracing::Span::current()
            .record("user_id", user_id.to_string())
            .record("success", true);
        Ok(AuthResult {
            user_id,
            role: user.role,
            user,
        })
    }
}

/// Token from an `Authorization: Bearer` header
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_none());

        headers.insert("authorization", HeaderValue::from_static("Basic abc"));
        assert!(bearer_token(&headers).is_none());

        headers.insert("authorization", HeaderValue::from_static("Bearer  abc.def "));
        assert_eq!(bearer_token(&headers), Some("abc.def"));
    }
}
