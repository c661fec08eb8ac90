// ABOUTME: Discount validation and session price calculation
// ABOUTME: Pure functions so booking, quoting and tests share one source of pricing truth
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Price calculation.
//!
//! Percentage discounts round half up to the nearest cent. No discount can
//! take a price below zero.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::booking::MAX_PRICE_CENTS;
use crate::constants::discounts::{MAX_CODE_LENGTH, MAX_PERCENTAGE, MIN_CODE_LENGTH};
use crate::errors::{AppError, AppResult};
use crate::models::{Discount, DiscountKind};

/// Result of pricing an offering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    /// Price before discount
    pub base_price_cents: i64,
    /// Amount removed by the discount
    pub discount_amount_cents: i64,
    /// Amount due
    pub final_price_cents: i64,
}

impl PriceQuote {
    /// Quote without any discount
    #[must_use]
    pub const fn undiscounted(base_price_cents: i64) -> Self {
        Self {
            base_price_cents,
            discount_amount_cents: 0,
            final_price_cents: base_price_cents,
        }
    }
}

/// Amount a discount removes from `base_price_cents`
#[must_use]
pub fn discount_amount(base_price_cents: i64, kind: DiscountKind, value: i64) -> i64 {
    if base_price_cents <= 0 {
        return 0;
    }
    let amount = match kind {
        DiscountKind::Percentage => {
            let pct = i128::from(value.clamp(0, MAX_PERCENTAGE));
            // base * pct / 100, rounded half up; widened so large bases cannot overflow
            let rounded = (i128::from(base_price_cents) * pct + 50) / 100;
            i64::try_from(rounded).unwrap_or(base_price_cents)
        }
        DiscountKind::FixedAmount => value.max(0),
    };
    amount.min(base_price_cents)
}

/// Apply a discount to a base price
#[must_use]
pub fn apply_discount(base_price_cents: i64, discount: &Discount) -> PriceQuote {
    let amount = discount_amount(base_price_cents, discount.kind, discount.value);
    PriceQuote {
        base_price_cents,
        discount_amount_cents: amount,
        final_price_cents: base_price_cents - amount,
    }
}

/// Check that a discount can be redeemed for `coach_id` at `now`
///
/// # Errors
///
/// - `InvalidInput` when the code belongs to another coach
/// - `ResourceUnavailable` when the code is inactive or expired
/// - `LimitExceeded` when the code has no redemptions left
pub fn validate_discount(discount: &Discount, coach_id: Uuid, now: DateTime<Utc>) -> AppResult<()> {
    if discount.coach_id != coach_id {
        return Err(AppError::invalid_input(
            "Discount code does not apply to this coach",
        ));
    }
    if !discount.is_active {
        return Err(AppError::unavailable("Discount code is no longer active"));
    }
    if discount.expires_at.is_some_and(|expires| expires <= now) {
        return Err(AppError::unavailable("Discount code has expired"));
    }
    if discount
        .max_uses
        .is_some_and(|max| discount.times_used >= max)
    {
        return Err(AppError::limit_exceeded(
            "Discount code has reached its usage limit",
        ));
    }
    Ok(())
}

/// Validate the definition of a new discount
///
/// # Errors
///
/// Returns `ValueOutOfRange` for a percentage outside 1..=100, a fixed amount
/// that is not positive or exceeds the price cap, or a non-positive usage limit
pub fn validate_discount_definition(
    kind: DiscountKind,
    value: i64,
    max_uses: Option<i64>,
) -> AppResult<()> {
    match kind {
        DiscountKind::Percentage if !(1..=MAX_PERCENTAGE).contains(&value) => {
            return Err(AppError::out_of_range(
                "Percentage discount must be between 1 and 100",
            ));
        }
        DiscountKind::FixedAmount if value <= 0 => {
            return Err(AppError::out_of_range(
                "Fixed discount amount must be positive",
            ));
        }
        DiscountKind::FixedAmount if value > MAX_PRICE_CENTS => {
            return Err(AppError::out_of_range(format!(
                "Fixed discount amount cannot exceed {MAX_PRICE_CENTS} cents"
            )));
        }
        _ => {}
    }
    if max_uses.is_some_and(|max| max <= 0) {
        return Err(AppError::out_of_range("max_uses must be positive"));
    }
    Ok(())
}

/// Normalize a discount code to its stored form
///
/// # Errors
///
/// Returns `InvalidInput` when the code has the wrong length or characters
/// other than ASCII letters, digits, `-` and `_`
pub fn normalize_code(code: &str) -> AppResult<String> {
    let normalized = code.trim().to_ascii_uppercase();
    if !(MIN_CODE_LENGTH..=MAX_CODE_LENGTH).contains(&normalized.len()) {
        return Err(AppError::invalid_input(format!(
            "Discount code must be {MIN_CODE_LENGTH}-{MAX_CODE_LENGTH} characters"
        )));
    }
    if !normalized
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(AppError::invalid_input(
            "Discount code may only contain letters, digits, '-' and '_'",
        ));
    }
    Ok(normalized)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn discount(kind: DiscountKind, value: i64) -> Discount {
        Discount {
            id: Uuid::new_v4(),
            coach_id: Uuid::nil(),
            code: "SPRING".to_owned(),
            kind,
            value,
            max_uses: None,
            times_used: 0,
            expires_at: None,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_percentage_rounds_half_up() {
        // 15% of 3333 = 499.95
        let quote = apply_discount(3333, &discount(DiscountKind::Percentage, 15));
        assert_eq!(quote.discount_amount_cents, 500);
        assert_eq!(quote.final_price_cents, 2833);

        // 10% of 1005 = 100.5
        assert_eq!(discount_amount(1005, DiscountKind::Percentage, 10), 101);
    }

    #[test]
    fn test_fixed_amount_never_goes_negative() {
        let quote = apply_discount(2000, &discount(DiscountKind::FixedAmount, 2500));
        assert_eq!(quote.discount_amount_cents, 2000);
        assert_eq!(quote.final_price_cents, 0);
    }

    #[test]
    fn test_full_percentage_makes_session_free() {
        let quote = apply_discount(4500, &discount(DiscountKind::Percentage, 100));
        assert_eq!(quote.final_price_cents, 0);
    }

    #[test]
    fn test_free_offering_stays_free() {
        assert_eq!(discount_amount(0, DiscountKind::FixedAmount, 500), 0);
    }

    #[test]
    fn test_percentage_of_huge_price_does_not_overflow() {
        let quote = apply_discount(i64::MAX, &discount(DiscountKind::Percentage, 50));
        assert_eq!(quote.discount_amount_cents, i64::MAX / 2 + 1);
        assert_eq!(quote.final_price_cents, i64::MAX / 2);

        let full = apply_discount(i64::MAX, &discount(DiscountKind::Percentage, 100));
        assert_eq!(full.final_price_cents, 0);
    }

    #[test]
    fn test_validate_rejects_other_coach() {
        let d = discount(DiscountKind::Percentage, 10);
        let err = validate_discount(&d, Uuid::new_v4(), Utc::now()).unwrap_err();
        assert_eq!(err.http_status(), 400);
    }

    #[test]
    fn test_validate_rejects_expired_and_inactive() {
        let now = Utc::now();
        let mut d = discount(DiscountKind::Percentage, 10);
        d.expires_at = Some(now - Duration::minutes(1));
        assert_eq!(
            validate_discount(&d, Uuid::nil(), now).unwrap_err().http_status(),
            409
        );

        let mut d = discount(DiscountKind::Percentage, 10);
        d.is_active = false;
        assert!(validate_discount(&d, Uuid::nil(), now).is_err());
    }

    #[test]
    fn test_validate_rejects_exhausted_code() {
        let mut d = discount(DiscountKind::FixedAmount, 500);
        d.max_uses = Some(2);
        d.times_used = 2;
        let err = validate_discount(&d, Uuid::nil(), Utc::now()).unwrap_err();
        assert_eq!(err.http_status(), 422);

        d.times_used = 1;
        assert!(validate_discount(&d, Uuid::nil(), Utc::now()).is_ok());
    }

    #[test]
    fn test_definition_bounds() {
        assert!(validate_discount_definition(DiscountKind::Percentage, 0, None).is_err());
        assert!(validate_discount_definition(DiscountKind::Percentage, 101, None).is_err());
        assert!(validate_discount_definition(DiscountKind::Percentage, 100, Some(1)).is_ok());
        assert!(validate_discount_definition(DiscountKind::FixedAmount, 0, None).is_err());
        assert!(validate_discount_definition(DiscountKind::FixedAmount, 1, Some(0)).is_err());
        assert!(
            validate_discount_definition(DiscountKind::FixedAmount, MAX_PRICE_CENTS + 1, None)
                .is_err()
        );
    }

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code("  summer-25 ").unwrap(), "SUMMER-25");
        assert!(normalize_code("ab").is_err());
        assert!(normalize_code("no spaces").is_err());
    }
}
