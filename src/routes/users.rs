// ABOUTME: Route handlers for the caller's own account
// ABOUTME: Profile read and update
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};

use crate::errors::AppError;
use crate::resources::ServerResources;
use crate::services::accounts::{self, UpdateProfileRequest};

/// Current user routes implementation
pub struct UserRoutes;

impl UserRoutes {
    /// Create all current user routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/users/me",
                get(Self::handle_get_me).put(Self::handle_update_me),
            )
            .with_state(resources)
    }

    /// Handle GET /api/users/me
    async fn handle_get_me(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_request(&headers).await?;
        Ok((StatusCode::OK, Json(auth.user)).into_response())
    }

    /// Handle PUT /api/users/me
    async fn handle_update_me(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<UpdateProfileRequest>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_request(&headers).await?;
        let user = accounts::update_profile(&resources.database, &auth.user, request).await?;
        Ok((StatusCode::OK, Json(user)).into_response())
    }
}
