// ABOUTME: Custom service business logic for ad-hoc coach offerings
// ABOUTME: Creation, deactivation and sending offers to a player through chat
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::middleware::AuthResult;
use crate::models::{CustomService, Message, MessageKind, UserRole};
use crate::services::booking_types::validate_offering;

/// New custom service
#[derive(Debug, Clone, Deserialize)]
pub struct CustomServiceRequest {
    /// Display name
    pub name: String,
    /// Longer description
    #[serde(default)]
    pub description: Option<String>,
    /// Session length
    pub duration_minutes: i64,
    /// Price
    pub price_cents: i64,
}

/// Result of sending an offer
#[derive(Debug, Clone, Serialize)]
pub struct SentOffer {
    /// Conversation the offer was posted to
    pub conversation_id: Uuid,
    /// The offer message
    pub message: Message,
    /// False when the user had already been offered this service
    pub newly_offered: bool,
}

/// Create a custom service for the calling coach
///
/// # Errors
///
/// Returns `PermissionDenied` for non-coaches and validation errors for bad input
pub async fn create_custom_service(
    database: &Database,
    caller: &AuthResult,
    request: CustomServiceRequest,
) -> AppResult<CustomService> {
    caller.require_coach()?;
    let name = validate_offering(&request.name, request.duration_minutes, request.price_cents)?;

    let service = CustomService {
        id: Uuid::new_v4(),
        coach_id: caller.user_id,
        name,
        description: request
            .description
            .map(|d| d.trim().to_owned())
            .filter(|d| !d.is_empty()),
        duration_minutes: request.duration_minutes,
        price_cents: request.price_cents,
        is_active: true,
        created_at: Utc::now(),
    };
    database.create_custom_service(&service).await?;
    info!(custom_service_id = %service.id, coach_id = %caller.user_id, "Custom service created");
    Ok(service)
}

/// The calling coach's custom services, including inactive ones
///
/// # Errors
///
/// Returns `PermissionDenied` for non-coaches
pub async fn list_own_custom_services(
    database: &Database,
    caller: &AuthResult,
) -> AppResult<Vec<CustomService>> {
    caller.require_coach()?;
    database.list_custom_services(caller.user_id, false).await
}

async fn owned_service(database: &Database, caller: &AuthResult, id: Uuid) -> AppResult<CustomService> {
    let service = database
        .get_custom_service(id)
        .await?
        .ok_or_else(|| AppError::not_found("Custom service"))?;
    caller.require_owner_or_admin(service.coach_id)?;
    Ok(service)
}

/// Soft-delete a custom service
///
/// # Errors
///
/// Returns `PermissionDenied` unless the caller owns it or is an admin
pub async fn deactivate_custom_service(
    database: &Database,
    caller: &AuthResult,
    id: Uuid,
) -> AppResult<()> {
    owned_service(database, caller, id).await?;
    database.deactivate_custom_service(id).await
}

fn offer_text(service: &CustomService) -> String {
    format!(
        "{} ({} min, {}.{:02})",
        service.name,
        service.duration_minutes,
        service.price_cents / 100,
        service.price_cents % 100
    )
}

/// Offer a custom service to a player and post it into their conversation
///
/// Re-sending is allowed; the offer record itself is only written once.
///
/// # Errors
///
/// - `PermissionDenied` unless the caller is the owning coach
/// - `ResourceUnavailable` for an inactive service
/// - `ResourceNotFound` / `InvalidInput` when the recipient is not an active player
#[tracing::instrument(skip(database, caller), fields(coach_id = %caller.user_id))]
pub async fn send_custom_service(
    database: &Database,
    caller: &AuthResult,
    id: Uuid,
    user_id: Uuid,
) -> AppResult<SentOffer> {
    let service = owned_service(database, caller, id).await?;
    if service.coach_id != caller.user_id {
        return Err(AppError::forbidden("Only the authoring coach can send this service"));
    }
    if !service.is_active {
        return Err(AppError::unavailable("Custom service is no longer active"));
    }

    let recipient = database
        .get_user(user_id)
        .await?
        .filter(|user| user.is_active)
        .ok_or_else(|| AppError::not_found("User"))?;
    if recipient.role != UserRole::User {
        return Err(AppError::invalid_input("Custom services can only be sent to players"));
    }

    let newly_offered = database.record_custom_service_offer(id, user_id).await?;
    let conversation = database
        .get_or_create_conversation(user_id, caller.user_id)
        .await?;

    let message = Message {
        id: Uuid::new_v4(),
        conversation_id: conversation.id,
        sender_id: caller.user_id,
        kind: MessageKind::CustomServiceOffer,
        content: offer_text(&service),
        custom_service_id: Some(service.id),
        read_at: None,
        created_at: Utc::now(),
    };
    database.add_message(&message).await?;

    info!(custom_service_id = %id, %user_id, newly_offered, "Custom service offered");
    Ok(SentOffer {
        conversation_id: conversation.id,
        message,
        newly_offered,
    })
}

/// Active custom services offered to the calling player
///
/// # Errors
///
/// Returns `PermissionDenied` unless the caller is a player
pub async fn list_offers(database: &Database, caller: &AuthResult) -> AppResult<Vec<CustomService>> {
    caller.require_role(UserRole::User)?;
    database.list_offered_custom_services(caller.user_id).await
}
