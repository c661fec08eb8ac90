// ABOUTME: Payment record model for gateway orders tied to sessions
// ABOUTME: Records provider order and capture identifiers for capture and refund
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::unknown_variant;
use crate::errors::AppError;

/// State of a gateway payment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentRecordStatus {
    /// Order created, waiting for approval and capture
    Created,
    /// Funds captured
    Captured,
    /// Capture failed at the gateway
    Failed,
    /// Captured funds returned
    Refunded,
}

impl PaymentRecordStatus {
    /// Storage representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Captured => "captured",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
        }
    }
}

impl FromStr for PaymentRecordStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(Self::Created),
            "captured" => Ok(Self::Captured),
            "failed" => Ok(Self::Failed),
            "refunded" => Ok(Self::Refunded),
            other => Err(unknown_variant("payment status", other)),
        }
    }
}

/// A payment attempt for a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    /// Payment ID
    pub id: Uuid,
    /// Paid session
    pub session_id: Uuid,
    /// Paying user
    pub user_id: Uuid,
    /// Amount in cents
    pub amount_cents: i64,
    /// ISO 4217 currency code
    pub currency: String,
    /// Gateway name
    pub provider: String,
    /// Gateway order ID
    pub provider_order_id: String,
    /// Gateway capture ID, set after capture
    pub provider_capture_id: Option<String>,
    /// Where the buyer approves the order, when the gateway needs approval
    pub approval_url: Option<String>,
    /// Payment state
    pub status: PaymentRecordStatus,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last state change
    pub updated_at: DateTime<Utc>,
}
