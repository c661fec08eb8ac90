// ABOUTME: Route handlers for coach booking types
// ABOUTME: Create, read, update and soft-delete of bookable session templates
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};

use super::parse_id;
use crate::errors::AppError;
use crate::resources::ServerResources;
use crate::services::booking_types::{self, BookingTypeRequest, BookingTypeUpdate};

/// Booking type routes implementation
pub struct BookingTypeRoutes;

impl BookingTypeRoutes {
    /// Create all booking type routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/booking-types", post(Self::handle_create))
            .route(
                "/api/booking-types/:id",
                get(Self::handle_get)
                    .put(Self::handle_update)
                    .delete(Self::handle_delete),
            )
            .with_state(resources)
    }

    /// Handle POST /api/booking-types
    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<BookingTypeRequest>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_request(&headers).await?;
        let booking_type =
            booking_types::create_booking_type(&resources.database, &auth, request).await?;
        Ok((StatusCode::CREATED, Json(booking_type)).into_response())
    }

    /// Handle GET /api/booking-types/:id
    async fn handle_get(
        State(resources): State<Arc<ServerResources>>,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let id = parse_id(&id, "booking type")?;
        let booking_type = booking_types::get_booking_type(&resources.database, id).await?;
        Ok((StatusCode::OK, Json(booking_type)).into_response())
    }

    /// Handle PUT /api/booking-types/:id
    async fn handle_update(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
        Json(update): Json<BookingTypeUpdate>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_request(&headers).await?;
        let id = parse_id(&id, "booking type")?;
        let booking_type =
            booking_types::update_booking_type(&resources.database, &auth, id, update).await?;
        Ok((StatusCode::OK, Json(booking_type)).into_response())
    }

    /// Handle DELETE /api/booking-types/:id
    async fn handle_delete(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_request(&headers).await?;
        let id = parse_id(&id, "booking type")?;
        let booking_type =
            booking_types::deactivate_booking_type(&resources.database, &auth, id).await?;
        Ok((StatusCode::OK, Json(booking_type)).into_response())
    }
}
