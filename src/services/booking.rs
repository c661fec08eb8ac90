// ABOUTME: Session booking business logic and the session lifecycle
// ABOUTME: Booking rules, confirmation, completion and cancellation with refund and notifications
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Booking
//!
//! Rules are checked in a fixed order before anything is written, so the
//! first failing rule decides the error a client sees. The write itself is a
//! single transaction in [`Database::create_booking`]; the checks made here
//! are repeated there under the transaction where a race could slip past them.

use chrono::{Duration, Utc};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::constants::booking::MAX_NOTES_LENGTH;
use crate::database::{Database, NewBooking, SessionFilter};
use crate::errors::{AppError, AppResult};
use crate::logging::AppLogger;
use crate::middleware::AuthResult;
use crate::models::{
    BookingType, CustomService, PaymentStatus, Session, SessionStatus, UserRole,
};
use crate::pagination::{Page, PageParams};
use crate::pricing::{apply_discount, PriceQuote};
use crate::resources::ServerResources;
use crate::services::{discounts, notifications, payments};

/// Booking input
#[derive(Debug, Clone, Deserialize)]
pub struct BookSessionRequest {
    /// Slot to reserve
    pub time_slot_id: Uuid,
    /// Booking type to book (exclusive with `custom_service_id`)
    #[serde(default)]
    pub booking_type_id: Option<Uuid>,
    /// Custom service to book (exclusive with `booking_type_id`)
    #[serde(default)]
    pub custom_service_id: Option<Uuid>,
    /// Optional discount code
    #[serde(default)]
    pub discount_code: Option<String>,
    /// Notes for the coach
    #[serde(default)]
    pub notes: Option<String>,
}

/// Cancellation input
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CancelSessionRequest {
    /// Why the session is cancelled
    #[serde(default)]
    pub reason: Option<String>,
}

/// Which offering a booking or quote refers to
#[derive(Debug, Clone, Copy)]
pub struct OfferingChoice {
    /// Booking type ID
    pub booking_type_id: Option<Uuid>,
    /// Custom service ID
    pub custom_service_id: Option<Uuid>,
}

/// A resolved, bookable offering
#[derive(Debug, Clone)]
pub enum Offering {
    /// A public booking type
    BookingType(BookingType),
    /// A custom service offered to the booker
    CustomService(CustomService),
}

impl Offering {
    /// Coach delivering the offering
    #[must_use]
    pub const fn coach_id(&self) -> Uuid {
        match self {
            Self::BookingType(bt) => bt.coach_id,
            Self::CustomService(cs) => cs.coach_id,
        }
    }

    /// Undiscounted price
    #[must_use]
    pub const fn price_cents(&self) -> i64 {
        match self {
            Self::BookingType(bt) => bt.base_price_cents,
            Self::CustomService(cs) => cs.price_cents,
        }
    }
}

/// Resolve and check the offering a player wants
///
/// # Errors
///
/// - `InvalidInput` unless exactly one ID is given
/// - `ResourceNotFound` for an unknown offering
/// - `ResourceUnavailable` for an inactive offering
/// - `PermissionDenied` for a custom service not offered to `user_id`
pub async fn resolve_offering(
    database: &Database,
    user_id: Uuid,
    choice: OfferingChoice,
) -> AppResult<Offering> {
    match (choice.booking_type_id, choice.custom_service_id) {
        (Some(id), None) => {
            let booking_type = database
                .get_booking_type(id)
                .await?
                .ok_or_else(|| AppError::not_found("Booking type"))?;
            if !booking_type.is_active {
                return Err(AppError::unavailable("Booking type is no longer offered"));
            }
            Ok(Offering::BookingType(booking_type))
        }
        (None, Some(id)) => {
            let service = database
                .get_custom_service(id)
                .await?
                .ok_or_else(|| AppError::not_found("Custom service"))?;
            if !service.is_active {
                return Err(AppError::unavailable("Custom service is no longer offered"));
            }
            if !database.has_custom_service_offer(id, user_id).await? {
                return Err(AppError::forbidden("This custom service was not offered to you"));
            }
            Ok(Offering::CustomService(service))
        }
        _ => Err(AppError::invalid_input(
            "Provide exactly one of booking_type_id or custom_service_id",
        )),
    }
}

fn clean_text(value: Option<String>, field: &str, max_chars: usize) -> AppResult<Option<String>> {
    let value = value.map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());
    if value
        .as_ref()
        .is_some_and(|v| v.chars().count() > max_chars)
    {
        return Err(AppError::invalid_input(format!(
            "{field} cannot exceed {max_chars} characters"
        )));
    }
    Ok(value)
}

/// Book a session for the calling player
///
/// # Errors
///
/// See the module docs for the order of checks. Double booking returns
/// `ResourceConflict`; the pending cap and exhausted codes return `LimitExceeded`.
#[tracing::instrument(skip(resources, caller, request), fields(user_id = %caller.user_id, slot_id = %request.time_slot_id))]
pub async fn book_session(
    resources: &ServerResources,
    caller: &AuthResult,
    request: BookSessionRequest,
) -> AppResult<Session> {
    caller.require_role(UserRole::User)?;
    let database = resources.database.as_ref();
    let booking_config = &resources.config.booking;

    let offering = resolve_offering(
        database,
        caller.user_id,
        OfferingChoice {
            booking_type_id: request.booking_type_id,
            custom_service_id: request.custom_service_id,
        },
    )
    .await?;
    let notes = clean_text(request.notes, "Notes", MAX_NOTES_LENGTH)?;

    let now = Utc::now();
    let earliest_start = now + Duration::minutes(booking_config.min_lead_minutes);
    let slot = database
        .get_time_slot(request.time_slot_id)
        .await?
        .ok_or_else(|| AppError::not_found("Time slot"))?;
    if slot.coach_id != offering.coach_id() {
        return Err(AppError::invalid_input(
            "Time slot does not belong to the offering's coach",
        ));
    }
    if !slot.is_available {
        return Err(AppError::conflict("Time slot is not available"));
    }
    if slot.starts_at < earliest_start {
        return Err(AppError::out_of_range(
            "Time slot starts too soon to be booked",
        ));
    }

    if caller.user_id == offering.coach_id() {
        return Err(AppError::invalid_input("Coaches cannot book their own sessions"));
    }

    let pending = database.count_pending_sessions(caller.user_id).await?;
    if pending >= booking_config.max_pending_bookings {
        return Err(AppError::limit_exceeded(format!(
            "You already have {pending} pending bookings (maximum {})",
            booking_config.max_pending_bookings
        )));
    }

    let (quote, discount_id) = match request
        .discount_code
        .as_deref()
        .map(str::trim)
        .filter(|code| !code.is_empty())
    {
        Some(code) => {
            let discount =
                discounts::redeemable_discount(database, offering.coach_id(), code, now).await?;
            (apply_discount(offering.price_cents(), &discount), Some(discount.id))
        }
        None => (PriceQuote::undiscounted(offering.price_cents()), None),
    };

    let (booking_type_id, custom_service_id) = match &offering {
        Offering::BookingType(bt) => (Some(bt.id), None),
        Offering::CustomService(cs) => (None, Some(cs.id)),
    };
    let session = Session {
        id: Uuid::new_v4(),
        user_id: caller.user_id,
        coach_id: offering.coach_id(),
        booking_type_id,
        custom_service_id,
        time_slot_id: slot.id,
        starts_at: slot.starts_at,
        ends_at: slot.ends_at,
        status: SessionStatus::Pending,
        payment_status: PaymentStatus::Unpaid,
        base_price_cents: quote.base_price_cents,
        discount_id,
        discount_amount_cents: quote.discount_amount_cents,
        price_cents: quote.final_price_cents,
        notes,
        cancelled_by: None,
        cancellation_reason: None,
        created_at: now,
        updated_at: now,
    };

    let session = database
        .create_booking(&NewBooking {
            session,
            max_pending_bookings: booking_config.max_pending_bookings,
            earliest_start,
        })
        .await?;

    AppLogger::log_session_event(&session.id.to_string(), &caller.user_id.to_string(), "booked");
    notifications::session_booked(resources, &session);
    Ok(session)
}

/// Sessions visible to the caller: a player's bookings, a coach's sessions, or everything for admins
///
/// # Errors
///
/// Returns an error if the query fails
pub async fn list_sessions(
    database: &Database,
    caller: &AuthResult,
    status: Option<SessionStatus>,
    page: &PageParams,
) -> AppResult<Page<Session>> {
    let filter = match caller.role {
        UserRole::Admin => SessionFilter {
            status,
            ..SessionFilter::default()
        },
        UserRole::Coach => SessionFilter {
            coach_id: Some(caller.user_id),
            status,
            ..SessionFilter::default()
        },
        UserRole::User => SessionFilter {
            user_id: Some(caller.user_id),
            status,
            ..SessionFilter::default()
        },
    };
    let (sessions, total) = database
        .list_sessions(filter, page.limit(), page.offset())
        .await?;
    Ok(Page::new(sessions, total, page))
}

/// Load a session the caller takes part in
///
/// # Errors
///
/// Returns `ResourceNotFound` for an unknown session and `PermissionDenied`
/// unless the caller is a participant or an admin
pub async fn get_session(database: &Database, caller: &AuthResult, id: Uuid) -> AppResult<Session> {
    let session = database
        .get_session(id)
        .await?
        .ok_or_else(|| AppError::not_found("Session"))?;
    if !session.is_participant(caller.user_id) && !caller.role.is_admin() {
        return Err(AppError::forbidden("You are not part of this session"));
    }
    Ok(session)
}

async fn coach_session(database: &Database, caller: &AuthResult, id: Uuid) -> AppResult<Session> {
    let session = get_session(database, caller, id).await?;
    if session.coach_id != caller.user_id {
        return Err(AppError::forbidden("Only the session's coach can do this"));
    }
    Ok(session)
}

/// Coach accepts a pending session
///
/// # Errors
///
/// Returns `PermissionDenied` unless the caller is the session's coach and
/// `ResourceConflict` unless the session is pending
#[tracing::instrument(skip(resources, caller), fields(coach_id = %caller.user_id))]
pub async fn confirm_session(
    resources: &ServerResources,
    caller: &AuthResult,
    id: Uuid,
) -> AppResult<Session> {
    let session = coach_session(&resources.database, caller, id).await?;
    let session = resources
        .database
        .transition_session(session.id, session.status, SessionStatus::Confirmed)
        .await?;

    AppLogger::log_session_event(&session.id.to_string(), &caller.user_id.to_string(), "confirmed");
    notifications::session_confirmed(resources, &session);
    Ok(session)
}

/// Coach marks a confirmed session as delivered
///
/// # Errors
///
/// Returns `ResourceConflict` before the slot starts or unless the session is confirmed
#[tracing::instrument(skip(database, caller), fields(coach_id = %caller.user_id))]
pub async fn complete_session(
    database: &Database,
    caller: &AuthResult,
    id: Uuid,
) -> AppResult<Session> {
    let session = coach_session(database, caller, id).await?;
    if Utc::now() < session.starts_at {
        return Err(AppError::conflict("Session has not started yet"));
    }
    let session = database
        .transition_session(session.id, session.status, SessionStatus::Completed)
        .await?;
    AppLogger::log_session_event(&session.id.to_string(), &caller.user_id.to_string(), "completed");
    Ok(session)
}

/// Cancel a session, release its slot and refund a captured payment
///
/// Discount usage is not returned. If the refund fails the session stays
/// cancelled, the payment stays captured and the gateway error is returned;
/// an admin can retry the refund from the payments API.
///
/// # Errors
///
/// Returns `PermissionDenied` unless the caller is a participant or admin,
/// `ResourceConflict` unless the session is pending or confirmed, and
/// `ExternalServiceError` when the refund fails
#[tracing::instrument(skip(resources, caller, request), fields(user_id = %caller.user_id))]
pub async fn cancel_session(
    resources: &ServerResources,
    caller: &AuthResult,
    id: Uuid,
    request: CancelSessionRequest,
) -> AppResult<Session> {
    let database = resources.database.as_ref();
    let session = get_session(database, caller, id).await?;
    session.status.ensure_transition(SessionStatus::Cancelled)?;
    let reason = clean_text(request.reason, "Cancellation reason", MAX_NOTES_LENGTH)?;

    let mut cancelled = database
        .cancel_session(&session, caller.user_id, reason.as_deref())
        .await?;
    AppLogger::log_session_event(&cancelled.id.to_string(), &caller.user_id.to_string(), "cancelled");
    notifications::session_cancelled(resources, &cancelled, caller.user_id);

    if cancelled.payment_status == PaymentStatus::Paid {
        match payments::refund_session_payment(resources, &cancelled).await {
            Ok(_) => {
                cancelled = database
                    .get_session(cancelled.id)
                    .await?
                    .ok_or_else(|| AppError::not_found("Session"))?;
            }
            Err(e) => {
                warn!(session_id = %cancelled.id, error = %e, "Refund after cancellation failed");
                return Err(e);
            }
        }
    }

    info!(session_id = %cancelled.id, "Session cancelled");
    Ok(cancelled)
}
