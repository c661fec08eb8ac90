// ABOUTME: Route handlers for player and coach conversations
// ABOUTME: Conversation listing and creation, message paging and sending, unread counts
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};

use super::parse_id;
use crate::errors::AppError;
use crate::pagination::PageParams;
use crate::resources::ServerResources;
use crate::services::messaging::{self, SendMessageRequest, StartConversationRequest};

/// Conversation routes implementation
pub struct ConversationRoutes;

impl ConversationRoutes {
    /// Create all conversation routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/conversations",
                get(Self::handle_list).post(Self::handle_create),
            )
            .route(
                "/api/conversations/unread-count",
                get(Self::handle_unread_count),
            )
            .route(
                "/api/conversations/:id/messages",
                get(Self::handle_list_messages).post(Self::handle_send_message),
            )
            .with_state(resources)
    }

    /// Handle GET /api/conversations
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_request(&headers).await?;
        let conversations = messaging::list_conversations(&resources.database, &auth).await?;
        Ok((StatusCode::OK, Json(conversations)).into_response())
    }

    /// Handle POST /api/conversations
    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<StartConversationRequest>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_request(&headers).await?;
        let conversation =
            messaging::start_conversation(&resources.database, &auth, request.participant_id)
                .await?;
        Ok((StatusCode::OK, Json(conversation)).into_response())
    }

    /// Handle GET /api/conversations/unread-count
    async fn handle_unread_count(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_request(&headers).await?;
        let unread = messaging::unread_count(&resources.database, &auth).await?;
        Ok((
            StatusCode::OK,
            Json(serde_json::json!({ "unread_count": unread })),
        )
            .into_response())
    }

    /// Handle GET /api/conversations/:id/messages
    async fn handle_list_messages(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
        Query(page): Query<PageParams>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_request(&headers).await?;
        let id = parse_id(&id, "conversation")?;
        let messages = messaging::list_messages(&resources.database, &auth, id, &page).await?;
        Ok((StatusCode::OK, Json(messages)).into_response())
    }

    /// Handle POST /api/conversations/:id/messages
    async fn handle_send_message(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
        Json(request): Json<SendMessageRequest>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_request(&headers).await?;
        let id = parse_id(&id, "conversation")?;
        let message = messaging::send_message(&resources.database, &auth, id, request).await?;
        Ok((StatusCode::CREATED, Json(message)).into_response())
    }
}
