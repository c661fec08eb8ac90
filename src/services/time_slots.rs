// ABOUTME: Time slot business logic for coach availability
// ABOUTME: Interval validation, overlap rejection, manual availability toggles and deletion
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::constants::booking::MAX_BULK_SLOTS;
use crate::database::{Database, SlotQuery};
use crate::errors::{AppError, AppResult};
use crate::middleware::AuthResult;
use crate::models::TimeSlot;
use crate::schedule::{has_internal_overlap, validate_interval};
use crate::services::accounts::require_active_coach;

/// One slot to create
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TimeSlotRequest {
    /// Interval start
    pub starts_at: DateTime<Utc>,
    /// Interval end (exclusive)
    pub ends_at: DateTime<Utc>,
}

/// Create slots for the calling coach, all or none
///
/// # Errors
///
/// - `PermissionDenied` for non-coaches
/// - `InvalidInput` / `ValueOutOfRange` for an empty or oversized request or a bad interval
/// - `ResourceConflict` when slots overlap each other or an existing slot
#[tracing::instrument(skip(database, caller, requests), fields(coach_id = %caller.user_id, count = requests.len()))]
pub async fn create_time_slots(
    database: &Database,
    caller: &AuthResult,
    min_lead_minutes: i64,
    requests: &[TimeSlotRequest],
) -> AppResult<Vec<TimeSlot>> {
    caller.require_coach()?;
    if requests.is_empty() {
        return Err(AppError::invalid_input("At least one time slot is required"));
    }
    if requests.len() > MAX_BULK_SLOTS {
        return Err(AppError::out_of_range(format!(
            "At most {MAX_BULK_SLOTS} time slots can be created at once"
        )));
    }

    let now = Utc::now();
    let min_lead = Duration::minutes(min_lead_minutes);
    for request in requests {
        validate_interval(request.starts_at, request.ends_at, now, min_lead)?;
    }
    let intervals: Vec<_> = requests.iter().map(|r| (r.starts_at, r.ends_at)).collect();
    if has_internal_overlap(&intervals) {
        return Err(AppError::conflict("Requested time slots overlap each other"));
    }

    let slots: Vec<TimeSlot> = requests
        .iter()
        .map(|request| TimeSlot {
            id: Uuid::new_v4(),
            coach_id: caller.user_id,
            starts_at: request.starts_at,
            ends_at: request.ends_at,
            is_available: true,
            created_at: now,
        })
        .collect();
    database.create_time_slots(&slots).await?;
    info!(count = slots.len(), "Time slots created");
    Ok(slots)
}

/// A coach's slots in a window; `from` defaults to now so past slots are hidden
///
/// # Errors
///
/// Returns `ResourceNotFound` unless `coach_id` is an active coach and
/// `InvalidInput` when `to` precedes `from`
pub async fn list_coach_time_slots(
    database: &Database,
    coach_id: Uuid,
    mut query: SlotQuery,
) -> AppResult<Vec<TimeSlot>> {
    require_active_coach(database, coach_id).await?;
    let from = *query.from.get_or_insert_with(Utc::now);
    if query.to.is_some_and(|to| to < from) {
        return Err(AppError::invalid_input("'to' must not be before 'from'"));
    }
    database.list_time_slots(coach_id, query).await
}

async fn owned_slot(database: &Database, caller: &AuthResult, id: Uuid) -> AppResult<TimeSlot> {
    let slot = database
        .get_time_slot(id)
        .await?
        .ok_or_else(|| AppError::not_found("Time slot"))?;
    caller.require_owner_or_admin(slot.coach_id)?;
    Ok(slot)
}

/// Open or block a slot by hand
///
/// # Errors
///
/// Returns `ResourceConflict` when the slot is held by an active session
pub async fn set_time_slot_availability(
    database: &Database,
    caller: &AuthResult,
    id: Uuid,
    is_available: bool,
) -> AppResult<TimeSlot> {
    owned_slot(database, caller, id).await?;
    database.set_time_slot_availability(id, is_available).await
}

/// Delete a slot no active session references
///
/// # Errors
///
/// Returns `ResourceConflict` when the slot is held by an active session
#[tracing::instrument(skip(database, caller), fields(user_id = %caller.user_id))]
pub async fn delete_time_slot(database: &Database, caller: &AuthResult, id: Uuid) -> AppResult<()> {
    owned_slot(database, caller, id).await?;
    database.delete_time_slot(id).await?;
    info!(slot_id = %id, "Time slot deleted");
    Ok(())
}
