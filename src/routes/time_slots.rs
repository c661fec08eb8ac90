// ABOUTME: Route handlers for coach availability slots
// ABOUTME: Single and bulk creation, manual availability toggles and deletion
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, post, put};
use axum::{Json, Router};
use serde::Deserialize;

use super::parse_id;
use crate::errors::{AppError, AppResult};
use crate::resources::ServerResources;
use crate::services::time_slots::{self, TimeSlotRequest};

/// Bulk creation body
#[derive(Debug, Deserialize)]
pub struct BulkTimeSlotRequest {
    /// Slots to create together
    pub slots: Vec<TimeSlotRequest>,
}

/// Availability toggle body
#[derive(Debug, Deserialize)]
pub struct AvailabilityRequest {
    /// New availability
    pub is_available: bool,
}

/// Time slot routes implementation
pub struct TimeSlotRoutes;

impl TimeSlotRoutes {
    /// Create all time slot routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/time-slots", post(Self::handle_create))
            .route("/api/time-slots/bulk", post(Self::handle_create_bulk))
            .route(
                "/api/time-slots/:id/availability",
                put(Self::handle_set_availability),
            )
            .route("/api/time-slots/:id", delete(Self::handle_delete))
            .with_state(resources)
    }

    async fn create(
        resources: &ServerResources,
        headers: &HeaderMap,
        requests: &[TimeSlotRequest],
    ) -> AppResult<Vec<crate::models::TimeSlot>> {
        let auth = resources.auth_middleware.authenticate_request(headers).await?;
        time_slots::create_time_slots(
            &resources.database,
            &auth,
            resources.config.booking.min_lead_minutes,
            requests,
        )
        .await
    }

    /// Handle POST /api/time-slots
    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<TimeSlotRequest>,
    ) -> Result<Response, AppError> {
        let mut slots = Self::create(&resources, &headers, &[request]).await?;
        let slot = slots
            .pop()
            .ok_or_else(|| AppError::internal("Time slot was not created"))?;
        Ok((StatusCode::CREATED, Json(slot)).into_response())
    }

    /// Handle POST /api/time-slots/bulk
    async fn handle_create_bulk(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<BulkTimeSlotRequest>,
    ) -> Result<Response, AppError> {
        let slots = Self::create(&resources, &headers, &request.slots).await?;
        Ok((StatusCode::CREATED, Json(slots)).into_response())
    }

    /// Handle PUT /api/time-slots/:id/availability
    async fn handle_set_availability(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
        Json(request): Json<AvailabilityRequest>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_request(&headers).await?;
        let id = parse_id(&id, "time slot")?;
        let slot = time_slots::set_time_slot_availability(
            &resources.database,
            &auth,
            id,
            request.is_available,
        )
        .await?;
        Ok((StatusCode::OK, Json(slot)).into_response())
    }

    /// Handle DELETE /api/time-slots/:id
    async fn handle_delete(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_request(&headers).await?;
        let id = parse_id(&id, "time slot")?;
        time_slots::delete_time_slot(&resources.database, &auth, id).await?;
        Ok(StatusCode::NO_CONTENT.into_response())
    }
}
