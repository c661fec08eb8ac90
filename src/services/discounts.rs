// ABOUTME: Discount code business logic for coaches and price quotes for players
// ABOUTME: Code normalisation, definition rules, redemption checks and deletion guards
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::middleware::AuthResult;
use crate::models::{Discount, DiscountKind, UserRole};
use crate::pricing::{
    apply_discount, normalize_code, validate_discount, validate_discount_definition, PriceQuote,
};
use crate::services::booking::{resolve_offering, OfferingChoice};

/// New discount code
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDiscountRequest {
    /// Code typed by players; stored uppercase
    pub code: String,
    /// Reduction kind
    pub kind: DiscountKind,
    /// Percentage or cents depending on `kind`
    pub value: i64,
    /// Redemption cap
    #[serde(default)]
    pub max_uses: Option<i64>,
    /// Expiry instant
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Price preview input
#[derive(Debug, Clone, Deserialize)]
pub struct QuoteRequest {
    /// Discount code to try
    #[serde(default)]
    pub code: Option<String>,
    /// Booking type to price
    #[serde(default)]
    pub booking_type_id: Option<Uuid>,
    /// Custom service to price
    #[serde(default)]
    pub custom_service_id: Option<Uuid>,
}

/// Price preview
#[derive(Debug, Clone, Serialize)]
pub struct QuoteResponse {
    /// Normalised code that was applied
    pub code: Option<String>,
    /// Price breakdown
    #[serde(flatten)]
    pub quote: PriceQuote,
}

/// Create a discount code for the calling coach
///
/// # Errors
///
/// - `PermissionDenied` for non-coaches
/// - `InvalidInput` / `ValueOutOfRange` for a bad code, value, limit or expiry
/// - `ResourceAlreadyExists` when the coach already has the code
#[tracing::instrument(skip(database, caller, request), fields(coach_id = %caller.user_id))]
pub async fn create_discount(
    database: &Database,
    caller: &AuthResult,
    request: CreateDiscountRequest,
) -> AppResult<Discount> {
    caller.require_coach()?;
    let code = normalize_code(&request.code)?;
    validate_discount_definition(request.kind, request.value, request.max_uses)?;

    let now = Utc::now();
    if request.expires_at.is_some_and(|expires| expires <= now) {
        return Err(AppError::out_of_range("Expiry must be in the future"));
    }

    let discount = Discount {
        id: Uuid::new_v4(),
        coach_id: caller.user_id,
        code,
        kind: request.kind,
        value: request.value,
        max_uses: request.max_uses,
        times_used: 0,
        expires_at: request.expires_at,
        is_active: true,
        created_at: now,
    };
    database.create_discount(&discount).await?;
    info!(discount_id = %discount.id, code = %discount.code, "Discount created");
    Ok(discount)
}

/// The calling coach's discounts
///
/// # Errors
///
/// Returns `PermissionDenied` for non-coaches
pub async fn list_discounts(database: &Database, caller: &AuthResult) -> AppResult<Vec<Discount>> {
    caller.require_coach()?;
    database.list_discounts(caller.user_id).await
}

async fn owned_discount(database: &Database, caller: &AuthResult, id: Uuid) -> AppResult<Discount> {
    let discount = database
        .get_discount(id)
        .await?
        .ok_or_else(|| AppError::not_found("Discount"))?;
    caller.require_owner_or_admin(discount.coach_id)?;
    Ok(discount)
}

/// Stop a code from being redeemed
///
/// # Errors
///
/// Returns `PermissionDenied` unless the caller owns it or is an admin
pub async fn deactivate_discount(
    database: &Database,
    caller: &AuthResult,
    id: Uuid,
) -> AppResult<Discount> {
    owned_discount(database, caller, id).await?;
    database.deactivate_discount(id).await
}

/// Delete a code that was never redeemed
///
/// # Errors
///
/// Returns `ResourceConflict` once the code has been used
pub async fn delete_discount(database: &Database, caller: &AuthResult, id: Uuid) -> AppResult<()> {
    owned_discount(database, caller, id).await?;
    database.delete_unused_discount(id).await?;
    info!(discount_id = %id, "Discount deleted");
    Ok(())
}

/// Look up a code for a coach and check it can be redeemed now
///
/// # Errors
///
/// Returns `ResourceNotFound` for an unknown code and the redemption errors of
/// [`validate_discount`]
pub async fn redeemable_discount(
    database: &Database,
    coach_id: Uuid,
    code: &str,
    now: DateTime<Utc>,
) -> AppResult<Discount> {
    let code = normalize_code(code)?;
    let discount = database
        .get_discount_by_code(coach_id, &code)
        .await?
        .ok_or_else(|| AppError::not_found("Discount code"))?;
    validate_discount(&discount, coach_id, now)?;
    Ok(discount)
}

/// Preview the price of an offering with an optional code
///
/// # Errors
///
/// Returns `PermissionDenied` for non-players, offering lookup errors and
/// discount redemption errors
pub async fn quote(
    database: &Database,
    caller: &AuthResult,
    request: QuoteRequest,
) -> AppResult<QuoteResponse> {
    caller.require_role(UserRole::User)?;
    let offering = resolve_offering(
        database,
        caller.user_id,
        OfferingChoice {
            booking_type_id: request.booking_type_id,
            custom_service_id: request.custom_service_id,
        },
    )
    .await?;

    let base = offering.price_cents();
    match request.code.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        None => Ok(QuoteResponse {
            code: None,
            quote: PriceQuote::undiscounted(base),
        }),
        Some(code) => {
            let discount =
                redeemable_discount(database, offering.coach_id(), code, Utc::now()).await?;
            Ok(QuoteResponse {
                quote: apply_discount(base, &discount),
                code: Some(discount.code),
            })
        }
    }
}
