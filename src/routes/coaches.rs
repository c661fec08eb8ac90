// ABOUTME: Public coach directory route handlers
// ABOUTME: Coach listing, coach profile with booking types, and coach availability
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Coach directory routes
//!
//! None of these endpoints require authentication.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::parse_id;
use crate::database::SlotQuery;
use crate::errors::AppError;
use crate::pagination::PageParams;
use crate::resources::ServerResources;
use crate::services::{accounts, booking_types, time_slots};

/// Query parameters for a coach's slots
#[derive(Debug, Deserialize)]
pub struct TimeSlotQuery {
    /// Window start; defaults to now
    pub from: Option<DateTime<Utc>>,
    /// Window end
    pub to: Option<DateTime<Utc>>,
    /// Only slots that can still be booked
    #[serde(default)]
    pub available_only: bool,
}

/// Coach directory routes implementation
pub struct CoachRoutes;

impl CoachRoutes {
    /// Create all coach directory routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/coaches", get(Self::handle_list))
            .route("/api/coaches/:id", get(Self::handle_get))
            .route(
                "/api/coaches/:id/booking-types",
                get(Self::handle_booking_types),
            )
            .route("/api/coaches/:id/time-slots", get(Self::handle_time_slots))
            .with_state(resources)
    }

    /// Handle GET /api/coaches
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        Query(page): Query<PageParams>,
    ) -> Result<Response, AppError> {
        let coaches = accounts::list_coaches(&resources.database, &page).await?;
        Ok((StatusCode::OK, Json(coaches)).into_response())
    }

    /// Handle GET /api/coaches/:id
    async fn handle_get(
        State(resources): State<Arc<ServerResources>>,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let coach_id = parse_id(&id, "coach")?;
        let coach = accounts::get_coach(&resources.database, coach_id).await?;
        Ok((StatusCode::OK, Json(coach)).into_response())
    }

    /// Handle GET /api/coaches/:id/booking-types
    async fn handle_booking_types(
        State(resources): State<Arc<ServerResources>>,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let coach_id = parse_id(&id, "coach")?;
        let types = booking_types::list_coach_booking_types(&resources.database, coach_id).await?;
        Ok((StatusCode::OK, Json(types)).into_response())
    }

    /// Handle GET /api/coaches/:id/time-slots
    async fn handle_time_slots(
        State(resources): State<Arc<ServerResources>>,
        Path(id): Path<String>,
        Query(query): Query<TimeSlotQuery>,
    ) -> Result<Response, AppError> {
        let coach_id = parse_id(&id, "coach")?;
        let slots = time_slots::list_coach_time_slots(
            &resources.database,
            coach_id,
            SlotQuery {
                from: query.from,
                to: query.to,
                available_only: query.available_only,
            },
        )
        .await?;
        Ok((StatusCode::OK, Json(slots)).into_response())
    }
}
