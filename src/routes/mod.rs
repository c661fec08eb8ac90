// ABOUTME: Route module organization for the Courtline HTTP API
// ABOUTME: One router per resource, merged into the application router with shared state
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Route module for Courtline
//!
//! Each domain module holds route definitions and thin handlers that
//! authenticate, parse input and delegate to `crate::services`.

/// Account administration routes
pub mod admin;
/// Dashboard routes
pub mod analytics;
/// Registration, login and token refresh
pub mod auth;
/// Booking type management routes
pub mod booking_types;
/// Public coach directory routes
pub mod coaches;
/// Chat routes
pub mod conversations;
/// Custom service routes
pub mod custom_services;
/// Discount code routes
pub mod discounts;
/// Health check and readiness routes
pub mod health;
/// Checkout routes
pub mod payments;
/// Session booking and lifecycle routes
pub mod sessions;
/// Coach availability routes
pub mod time_slots;
/// Current user profile routes
pub mod users;

pub use admin::AdminRoutes;
pub use analytics::AnalyticsRoutes;
pub use auth::AuthRoutes;
pub use booking_types::BookingTypeRoutes;
pub use coaches::CoachRoutes;
pub use conversations::ConversationRoutes;
pub use custom_services::CustomServiceRoutes;
pub use discounts::DiscountRoutes;
pub use health::HealthRoutes;
pub use payments::PaymentRoutes;
pub use sessions::SessionRoutes;
pub use time_slots::TimeSlotRoutes;
pub use users::UserRoutes;

use std::sync::Arc;

use axum::Router;
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::resources::ServerResources;

/// Every API route, without the HTTP middleware stack
pub fn api_router(resources: &Arc<ServerResources>) -> Router {
    Router::new()
        .merge(HealthRoutes::routes(Arc::clone(resources)))
        .merge(AuthRoutes::routes(Arc::clone(resources)))
        .merge(UserRoutes::routes(Arc::clone(resources)))
        .merge(CoachRoutes::routes(Arc::clone(resources)))
        .merge(AdminRoutes::routes(Arc::clone(resources)))
        .merge(BookingTypeRoutes::routes(Arc::clone(resources)))
        .merge(TimeSlotRoutes::routes(Arc::clone(resources)))
        .merge(SessionRoutes::routes(Arc::clone(resources)))
        .merge(DiscountRoutes::routes(Arc::clone(resources)))
        .merge(PaymentRoutes::routes(Arc::clone(resources)))
        .merge(ConversationRoutes::routes(Arc::clone(resources)))
        .merge(CustomServiceRoutes::routes(Arc::clone(resources)))
        .merge(AnalyticsRoutes::routes(Arc::clone(resources)))
}

/// Parse a UUID path segment
///
/// # Errors
///
/// Returns `InvalidInput` naming the resource when `raw` is not a UUID
pub(crate) fn parse_id(raw: &str, resource: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::invalid_input(format!("Invalid {resource} ID: {raw}")))
}
