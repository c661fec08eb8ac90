// ABOUTME: Route handlers for session checkout and payment history
// ABOUTME: Order creation, capture, listing and admin refund retries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use super::parse_id;
use crate::errors::AppError;
use crate::models::{Payment, Session};
use crate::pagination::PageParams;
use crate::resources::ServerResources;
use crate::services::payments::{self, CreateOrderRequest};

/// Order creation response
#[derive(Debug, Serialize)]
pub struct OrderResponse {
    /// The payment record
    pub payment: Payment,
    /// Where the player approves the payment
    pub approval_url: Option<String>,
}

/// Capture response
#[derive(Debug, Serialize)]
pub struct CaptureResponse {
    /// The captured payment
    pub payment: Payment,
    /// The session after capture
    pub session: Session,
}

/// Payment routes implementation
pub struct PaymentRoutes;

impl PaymentRoutes {
    /// Create all payment routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/payments/orders", post(Self::handle_create_order))
            .route(
                "/api/payments/orders/:order_id/capture",
                post(Self::handle_capture),
            )
            .route("/api/payments", get(Self::handle_list))
            .route("/api/payments/:id", get(Self::handle_get))
            .route("/api/payments/:id/refund", post(Self::handle_refund))
            .with_state(resources)
    }

    /// Handle POST /api/payments/orders
    async fn handle_create_order(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<CreateOrderRequest>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_request(&headers).await?;
        let payment = payments::create_order(&resources, &auth, request.session_id).await?;
        let response = OrderResponse {
            approval_url: payment.approval_url.clone(),
            payment,
        };
        Ok((StatusCode::CREATED, Json(response)).into_response())
    }

    /// Handle POST /api/payments/orders/:order_id/capture
    async fn handle_capture(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(order_id): Path<String>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_request(&headers).await?;
        let (payment, session) = payments::capture_order(&resources, &auth, &order_id).await?;
        Ok((StatusCode::OK, Json(CaptureResponse { payment, session })).into_response())
    }

    /// Handle GET /api/payments
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(page): Query<PageParams>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_request(&headers).await?;
        let list = payments::list_payments(&resources.database, &auth, &page).await?;
        Ok((StatusCode::OK, Json(list)).into_response())
    }

    /// Handle GET /api/payments/:id
    async fn handle_get(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_request(&headers).await?;
        let id = parse_id(&id, "payment")?;
        let payment = payments::get_payment(&resources.database, &auth, id).await?;
        Ok((StatusCode::OK, Json(payment)).into_response())
    }

    /// Handle POST /api/payments/:id/refund
    async fn handle_refund(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_request(&headers).await?;
        let id = parse_id(&id, "payment")?;
        let payment = payments::refund_payment(&resources, &auth, id).await?;
        Ok((StatusCode::OK, Json(payment)).into_response())
    }
}
