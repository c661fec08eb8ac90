// ABOUTME: Route handlers for ad-hoc coach offerings
// ABOUTME: Create, list and deactivate custom services; send offers; list offers received
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use super::parse_id;
use crate::errors::AppError;
use crate::resources::ServerResources;
use crate::services::custom_services::{self, CustomServiceRequest};

/// Offer body
#[derive(Debug, Deserialize)]
pub struct SendCustomServiceRequest {
    /// Player receiving the offer
    pub user_id: Uuid,
}

/// Custom service routes implementation
pub struct CustomServiceRoutes;

impl CustomServiceRoutes {
    /// Create all custom service routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/custom-services",
                get(Self::handle_list).post(Self::handle_create),
            )
            .route("/api/custom-services/offers", get(Self::handle_offers))
            .route("/api/custom-services/:id", delete(Self::handle_delete))
            .route("/api/custom-services/:id/send", post(Self::handle_send))
            .with_state(resources)
    }

    /// Handle POST /api/custom-services
    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<CustomServiceRequest>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_request(&headers).await?;
        let service =
            custom_services::create_custom_service(&resources.database, &auth, request).await?;
        Ok((StatusCode::CREATED, Json(service)).into_response())
    }

    /// Handle GET /api/custom-services
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_request(&headers).await?;
        let services = custom_services::list_own_custom_services(&resources.database, &auth).await?;
        Ok((StatusCode::OK, Json(services)).into_response())
    }

    /// Handle GET /api/custom-services/offers
    async fn handle_offers(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_request(&headers).await?;
        let offers = custom_services::list_offers(&resources.database, &auth).await?;
        Ok((StatusCode::OK, Json(offers)).into_response())
    }

    /// Handle DELETE /api/custom-services/:id
    async fn handle_delete(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_request(&headers).await?;
        let id = parse_id(&id, "custom service")?;
        custom_services::deactivate_custom_service(&resources.database, &auth, id).await?;
        Ok(StatusCode::NO_CONTENT.into_response())
    }

    /// Handle POST /api/custom-services/:id/send
    async fn handle_send(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
        Json(request): Json<SendCustomServiceRequest>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_request(&headers).await?;
        let id = parse_id(&id, "custom service")?;
        let sent =
            custom_services::send_custom_service(&resources.database, &auth, id, request.user_id)
                .await?;
        Ok((StatusCode::OK, Json(sent)).into_response())
    }
}
