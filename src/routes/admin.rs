// ABOUTME: Admin route handlers for account management
// ABOUTME: User listing filtered by role and account activation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Admin routes
//!
//! Every handler requires an authenticated admin.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::Deserialize;

use super::parse_id;
use crate::errors::AppError;
use crate::models::UserRole;
use crate::pagination::PageParams;
use crate::resources::ServerResources;
use crate::services::accounts;

/// Query parameters for the user list
#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    /// Only users with this role
    pub role: Option<UserRole>,
    /// Page size
    pub limit: Option<i64>,
    /// Rows to skip
    pub offset: Option<i64>,
}

/// Account status update
#[derive(Debug, Deserialize)]
pub struct UserStatusRequest {
    /// Whether the account may sign in
    pub is_active: bool,
}

/// Admin routes implementation
pub struct AdminRoutes;

impl AdminRoutes {
    /// Create all admin routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/admin/users", get(Self::handle_list_users))
            .route("/api/admin/users/:id/status", put(Self::handle_set_status))
            .with_state(resources)
    }

    /// Handle GET /api/admin/users
    async fn handle_list_users(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(query): Query<ListUsersQuery>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_request(&headers).await?;
        auth.require_admin()?;

        let page = PageParams {
            limit: query.limit,
            offset: query.offset,
        };
        let users = accounts::list_users(&resources.database, query.role, &page).await?;
        Ok((StatusCode::OK, Json(users)).into_response())
    }

    /// Handle PUT /api/admin/users/:id/status
    async fn handle_set_status(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
        Json(request): Json<UserStatusRequest>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_request(&headers).await?;
        auth.require_admin()?;
        let user_id = parse_id(&id, "user")?;

        let user = accounts::set_user_active(
            &resources.database,
            auth.user_id,
            user_id,
            request.is_active,
        )
        .await?;
        Ok((StatusCode::OK, Json(user)).into_response())
    }
}
