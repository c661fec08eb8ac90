// ABOUTME: Route handlers for coach, player and platform dashboards
// ABOUTME: Role-scoped aggregate statistics
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use crate::errors::AppError;
use crate::resources::ServerResources;
use crate::services::analytics;

/// Query parameters for the coach dashboard
#[derive(Debug, Deserialize)]
pub struct CoachAnalyticsQuery {
    /// Months in the revenue series
    pub months: Option<u32>,
}

/// Analytics routes implementation
pub struct AnalyticsRoutes;

impl AnalyticsRoutes {
    /// Create all analytics routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/analytics/coach", get(Self::handle_coach))
            .route("/api/analytics/user", get(Self::handle_user))
            .route("/api/analytics/platform", get(Self::handle_platform))
            .with_state(resources)
    }

    /// Handle GET /api/analytics/coach
    async fn handle_coach(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(query): Query<CoachAnalyticsQuery>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_request(&headers).await?;
        let dashboard =
            analytics::coach_dashboard(&resources.database, &auth, query.months).await?;
        Ok((StatusCode::OK, Json(dashboard)).into_response())
    }

    /// Handle GET /api/analytics/user
    async fn handle_user(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_request(&headers).await?;
        let dashboard = analytics::user_dashboard(&resources.database, &auth).await?;
        Ok((StatusCode::OK, Json(dashboard)).into_response())
    }

    /// Handle GET /api/analytics/platform
    async fn handle_platform(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_request(&headers).await?;
        let dashboard = analytics::platform_dashboard(&resources.database, &auth).await?;
        Ok((StatusCode::OK, Json(dashboard)).into_response())
    }
}
