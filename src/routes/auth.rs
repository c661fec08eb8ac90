// ABOUTME: Authentication route handlers for registration, login and token refresh
// ABOUTME: Thin wrappers over the accounts service returning JWT sessions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Authentication routes
//!
//! Registration and login are public; refresh needs a valid bearer token.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};

use crate::errors::AppError;
use crate::resources::ServerResources;
use crate::services::accounts::{self, LoginRequest, RegisterRequest};

/// Authentication routes implementation
pub struct AuthRoutes;

impl AuthRoutes {
    /// Create all authentication routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/auth/register", post(Self::handle_register))
            .route("/api/auth/login", post(Self::handle_login))
            .route("/api/auth/refresh", post(Self::handle_refresh))
            .with_state(resources)
    }

    /// Handle POST /api/auth/register
    async fn handle_register(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<RegisterRequest>,
    ) -> Result<Response, AppError> {
        let session =
            accounts::register(&resources.database, &resources.auth_manager, request).await?;
        Ok((StatusCode::CREATED, Json(session)).into_response())
    }

    /// Handle POST /api/auth/login
    async fn handle_login(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<LoginRequest>,
    ) -> Result<Response, AppError> {
        let session =
            accounts::login(&resources.database, &resources.auth_manager, request).await?;
        Ok((StatusCode::OK, Json(session)).into_response())
    }

    /// Handle POST /api/auth/refresh
    async fn handle_refresh(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_request(&headers).await?;
        let session = accounts::refresh(&resources.auth_manager, auth.user)?;
        Ok((StatusCode::OK, Json(session)).into_response())
    }
}
