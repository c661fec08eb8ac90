// ABOUTME: Route handlers for coach discount codes and player price quotes
// ABOUTME: Create, list, deactivate and delete codes; preview discounted prices
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, put};
use axum::{Json, Router};

use super::parse_id;
use crate::errors::AppError;
use crate::resources::ServerResources;
use crate::services::discounts::{self, CreateDiscountRequest, QuoteRequest};

/// Discount routes implementation
pub struct DiscountRoutes;

impl DiscountRoutes {
    /// Create all discount routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/discounts",
                get(Self::handle_list).post(Self::handle_create),
            )
            .route("/api/discounts/quote", get(Self::handle_quote))
            .route(
                "/api/discounts/:id/deactivate",
                put(Self::handle_deactivate),
            )
            .route("/api/discounts/:id", delete(Self::handle_delete))
            .with_state(resources)
    }

    /// Handle POST /api/discounts
    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<CreateDiscountRequest>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_request(&headers).await?;
        let discount = discounts::create_discount(&resources.database, &auth, request).await?;
        Ok((StatusCode::CREATED, Json(discount)).into_response())
    }

    /// Handle GET /api/discounts
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_request(&headers).await?;
        let list = discounts::list_discounts(&resources.database, &auth).await?;
        Ok((StatusCode::OK, Json(list)).into_response())
    }

    /// Handle GET /api/discounts/quote
    async fn handle_quote(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(request): Query<QuoteRequest>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_request(&headers).await?;
        let quote = discounts::quote(&resources.database, &auth, request).await?;
        Ok((StatusCode::OK, Json(quote)).into_response())
    }

    /// Handle PUT /api/discounts/:id/deactivate
    async fn handle_deactivate(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_request(&headers).await?;
        let id = parse_id(&id, "discount")?;
        let discount = discounts::deactivate_discount(&resources.database, &auth, id).await?;
        Ok((StatusCode::OK, Json(discount)).into_response())
    }

    /// Handle DELETE /api/discounts/:id
    async fn handle_delete(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_request(&headers).await?;
        let id = parse_id(&id, "discount")?;
        discounts::delete_discount(&resources.database, &auth, id).await?;
        Ok(StatusCode::NO_CONTENT.into_response())
    }
}
