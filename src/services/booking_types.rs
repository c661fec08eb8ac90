// ABOUTME: Booking type business logic for coach service offerings
// ABOUTME: Validation, ownership checks and soft deactivation of priced offerings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::constants::booking::{
    MAX_DURATION_MINUTES, MAX_NAME_LENGTH, MAX_PRICE_CENTS, MIN_DURATION_MINUTES,
};
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::middleware::AuthResult;
use crate::models::BookingType;
use crate::services::accounts::require_active_coach;

/// New booking type
#[derive(Debug, Clone, Deserialize)]
pub struct BookingTypeRequest {
    /// Display name
    pub name: String,
    /// Longer description
    #[serde(default)]
    pub description: Option<String>,
    /// Session length
    pub duration_minutes: i64,
    /// Price before discounts
    pub base_price_cents: i64,
}

/// Booking type changes; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookingTypeUpdate {
    /// New name
    pub name: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New session length
    pub duration_minutes: Option<i64>,
    /// New base price
    pub base_price_cents: Option<i64>,
    /// Reactivate or deactivate
    pub is_active: Option<bool>,
}

/// Validate the fields shared by booking types and custom services
///
/// Returns the trimmed name.
///
/// # Errors
///
/// Returns `InvalidInput` for an empty or overlong name and `ValueOutOfRange`
/// for a duration outside 15..=480 minutes or a price outside 0..=`MAX_PRICE_CENTS`
pub fn validate_offering(name: &str, duration_minutes: i64, price_cents: i64) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::invalid_input("Name cannot be empty"));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(AppError::invalid_input(format!(
            "Name cannot exceed {MAX_NAME_LENGTH} characters"
        )));
    }
    if !(MIN_DURATION_MINUTES..=MAX_DURATION_MINUTES).contains(&duration_minutes) {
        return Err(AppError::out_of_range(format!(
            "Duration must be between {MIN_DURATION_MINUTES} and {MAX_DURATION_MINUTES} minutes"
        )));
    }
    if price_cents < 0 {
        return Err(AppError::out_of_range("Price cannot be negative"));
    }
    if price_cents > MAX_PRICE_CENTS {
        return Err(AppError::out_of_range(format!(
            "Price cannot exceed {MAX_PRICE_CENTS} cents"
        )));
    }
    Ok(name.to_owned())
}

fn clean_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_owned())
        .filter(|d| !d.is_empty())
}

/// Create a booking type for the calling coach
///
/// # Errors
///
/// Returns `PermissionDenied` for non-coaches and validation errors for bad input
#[tracing::instrument(skip(database, caller, request), fields(coach_id = %caller.user_id))]
pub async fn create_booking_type(
    database: &Database,
    caller: &AuthResult,
    request: BookingTypeRequest,
) -> AppResult<BookingType> {
    caller.require_coach()?;
    let name = validate_offering(&request.name, request.duration_minutes, request.base_price_cents)?;

    let now = Utc::now();
    let booking_type = BookingType {
        id: Uuid::new_v4(),
        coach_id: caller.user_id,
        name,
        description: clean_description(request.description),
        duration_minutes: request.duration_minutes,
        base_price_cents: request.base_price_cents,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    database.create_booking_type(&booking_type).await?;
    info!(booking_type_id = %booking_type.id, "Booking type created");
    Ok(booking_type)
}

/// Load a booking type
///
/// # Errors
///
/// Returns `ResourceNotFound` if it does not exist
pub async fn get_booking_type(database: &Database, id: Uuid) -> AppResult<BookingType> {
    database
        .get_booking_type(id)
        .await?
        .ok_or_else(|| AppError::not_found("Booking type"))
}

/// Active booking types of a coach
///
/// # Errors
///
/// Returns `ResourceNotFound` unless `coach_id` is an active coach
pub async fn list_coach_booking_types(
    database: &Database,
    coach_id: Uuid,
) -> AppResult<Vec<BookingType>> {
    require_active_coach(database, coach_id).await?;
    database.list_booking_types(coach_id, true).await
}

/// Edit a booking type
///
/// Sessions keep their own price snapshot, so edits never change existing bookings.
///
/// # Errors
///
/// Returns `PermissionDenied` unless the caller owns it or is an admin
#[tracing::instrument(skip(database, caller, update), fields(user_id = %caller.user_id))]
pub async fn update_booking_type(
    database: &Database,
    caller: &AuthResult,
    id: Uuid,
    update: BookingTypeUpdate,
) -> AppResult<BookingType> {
    let mut booking_type = get_booking_type(database, id).await?;
    caller.require_owner_or_admin(booking_type.coach_id)?;

    let name = validate_offering(
        update.name.as_deref().unwrap_or(&booking_type.name),
        update.duration_minutes.unwrap_or(booking_type.duration_minutes),
        update.base_price_cents.unwrap_or(booking_type.base_price_cents),
    )?;
    booking_type.name = name;
    if update.description.is_some() {
        booking_type.description = clean_description(update.description);
    }
    if let Some(duration) = update.duration_minutes {
        booking_type.duration_minutes = duration;
    }
    if let Some(price) = update.base_price_cents {
        booking_type.base_price_cents = price;
    }
    if let Some(is_active) = update.is_active {
        booking_type.is_active = is_active;
    }
    booking_type.updated_at = Utc::now();

    database.update_booking_type(&booking_type).await?;
    Ok(booking_type)
}

/// Soft-delete a booking type so historical sessions keep their reference
///
/// # Errors
///
/// Returns `PermissionDenied` unless the caller owns it or is an admin
pub async fn deactivate_booking_type(
    database: &Database,
    caller: &AuthResult,
    id: Uuid,
) -> AppResult<BookingType> {
    update_booking_type(
        database,
        caller,
        id,
        BookingTypeUpdate {
            is_active: Some(false),
            ..BookingTypeUpdate::default()
        },
    )
    .await
}
