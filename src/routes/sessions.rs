// ABOUTME: Route handlers for session booking and the session lifecycle
// ABOUTME: Book, list, view, confirm, complete and cancel coaching sessions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Session routes
//!
//! All endpoints require authentication. Which sessions a caller sees depends
//! on their role; see [`crate::services::booking::list_sessions`].

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use super::parse_id;
use crate::errors::AppError;
use crate::models::SessionStatus;
use crate::pagination::PageParams;
use crate::resources::ServerResources;
use crate::services::booking::{self, BookSessionRequest, CancelSessionRequest};

/// Query parameters for the session list
#[derive(Debug, Deserialize)]
pub struct ListSessionsQuery {
    /// Only sessions in this status
    pub status: Option<SessionStatus>,
    /// Page size
    pub limit: Option<i64>,
    /// Rows to skip
    pub offset: Option<i64>,
}

/// Session routes implementation
pub struct SessionRoutes;

impl SessionRoutes {
    /// Create all session routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/sessions",
                post(Self::handle_book).get(Self::handle_list),
            )
            .route("/api/sessions/:id", get(Self::handle_get))
            .route("/api/sessions/:id/confirm", post(Self::handle_confirm))
            .route("/api/sessions/:id/complete", post(Self::handle_complete))
            .route("/api/sessions/:id/cancel", post(Self::handle_cancel))
            .with_state(resources)
    }

    /// Handle POST /api/sessions
    async fn handle_book(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<BookSessionRequest>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_request(&headers).await?;
        let session = booking::book_session(&resources, &auth, request).await?;
        Ok((StatusCode::CREATED, Json(session)).into_response())
    }

    /// Handle GET /api/sessions
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(query): Query<ListSessionsQuery>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_request(&headers).await?;
        let page = PageParams {
            limit: query.limit,
            offset: query.offset,
        };
        let sessions =
            booking::list_sessions(&resources.database, &auth, query.status, &page).await?;
        Ok((StatusCode::OK, Json(sessions)).into_response())
    }

    /// Handle GET /api/sessions/:id
    async fn handle_get(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_request(&headers).await?;
        let id = parse_id(&id, "session")?;
        let session = booking::get_session(&resources.database, &auth, id).await?;
        Ok((StatusCode::OK, Json(session)).into_response())
    }

    /// Handle POST /api/sessions/:id/confirm
    async fn handle_confirm(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_request(&headers).await?;
        let id = parse_id(&id, "session")?;
        let session = booking::confirm_session(&resources, &auth, id).await?;
        Ok((StatusCode::OK, Json(session)).into_response())
    }

    /// Handle POST /api/sessions/:id/complete
    async fn handle_complete(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_request(&headers).await?;
        let id = parse_id(&id, "session")?;
        let session = booking::complete_session(&resources.database, &auth, id).await?;
        Ok((StatusCode::OK, Json(session)).into_response())
    }

    /// Handle POST /api/sessions/:id/cancel
    ///
    /// The body is optional.
    async fn handle_cancel(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
        request: Option<Json<CancelSessionRequest>>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_request(&headers).await?;
        let id = parse_id(&id, "session")?;
        let request = request.map(|Json(r)| r).unwrap_or_default();
        let session = booking::cancel_session(&resources, &auth, id, request).await?;
        Ok((StatusCode::OK, Json(session)).into_response())
    }
}
