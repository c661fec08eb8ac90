// ABOUTME: Coach-issued discount code model
// ABOUTME: Percentage or fixed-amount reductions with usage and expiry limits
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::unknown_variant;
use crate::errors::AppError;

/// How a discount reduces the price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    /// `value` is a percentage (1..=100)
    Percentage,
    /// `value` is an amount in cents
    FixedAmount,
}

impl DiscountKind {
    /// Storage representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Percentage => "percentage",
            Self::FixedAmount => "fixed_amount",
        }
    }
}

impl FromStr for DiscountKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "percentage" => Ok(Self::Percentage),
            "fixed_amount" => Ok(Self::FixedAmount),
            other => Err(unknown_variant("discount kind", other)),
        }
    }
}

/// A coach-issued code reducing session price
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Discount {
    /// Discount ID
    pub id: Uuid,
    /// Issuing coach; the code only applies to this coach's offerings
    pub coach_id: Uuid,
    /// Uppercase code typed by players
    pub code: String,
    /// Reduction kind
    pub kind: DiscountKind,
    /// Percentage or cents depending on `kind`
    pub value: i64,
    /// Maximum redemptions, unlimited when absent
    pub max_uses: Option<i64>,
    /// Redemptions so far
    pub times_used: i64,
    /// Code stops working at this instant
    pub expires_at: Option<DateTime<Utc>>,
    /// Manually deactivated codes stop working
    pub is_active: bool,
    /// Creation time
    pub created_at: DateTime<Utc>,
}
