// ABOUTME: Booked coaching session model with its status state machine
// ABOUTME: Tracks pricing snapshot, payment state and cancellation details
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::unknown_variant;
use crate::errors::{AppError, AppResult};

/// Lifecycle of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Booked, waiting for coach confirmation or payment
    Pending,
    /// Confirmed by the coach or paid
    Confirmed,
    /// Took place
    Completed,
    /// Cancelled by a participant or an admin
    Cancelled,
}

impl SessionStatus {
    /// All statuses in lifecycle order
    pub const ALL: [Self; 4] = [
        Self::Pending,
        Self::Confirmed,
        Self::Completed,
        Self::Cancelled,
    ];

    /// Storage representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether the session still holds its time slot
    #[must_use]
    pub const fn holds_slot(self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }

    /// Whether `self -> next` is a legal transition
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Confirmed | Self::Cancelled)
                | (Self::Confirmed, Self::Completed | Self::Cancelled)
        )
    }

    /// Check a transition, returning a conflict error when it is illegal
    ///
    /// # Errors
    ///
    /// Returns `ResourceConflict` if the transition is not allowed
    pub fn ensure_transition(self, next: Self) -> AppResult<()> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(AppError::conflict(format!(
                "Cannot change session from {self} to {next}"
            )))
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(unknown_variant("session status", other)),
        }
    }
}

/// Payment state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Nothing captured yet
    Unpaid,
    /// Payment captured
    Paid,
    /// Captured payment returned
    Refunded,
}

impl PaymentStatus {
    /// Storage representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unpaid => "unpaid",
            Self::Paid => "paid",
            Self::Refunded => "refunded",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unpaid" => Ok(Self::Unpaid),
            "paid" => Ok(Self::Paid),
            "refunded" => Ok(Self::Refunded),
            other => Err(unknown_variant("payment status", other)),
        }
    }
}

/// A scheduled booking linking a user, coach, offering and time slot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Session ID
    pub id: Uuid,
    /// Player who booked
    pub user_id: Uuid,
    /// Coach delivering the session
    pub coach_id: Uuid,
    /// Booked booking type (exclusive with `custom_service_id`)
    pub booking_type_id: Option<Uuid>,
    /// Booked custom service (exclusive with `booking_type_id`)
    pub custom_service_id: Option<Uuid>,
    /// Reserved slot
    pub time_slot_id: Uuid,
    /// Slot start, copied at booking time
    pub starts_at: DateTime<Utc>,
    /// Slot end, copied at booking time
    pub ends_at: DateTime<Utc>,
    /// Lifecycle status
    pub status: SessionStatus,
    /// Payment state
    pub payment_status: PaymentStatus,
    /// Price before discount
    pub base_price_cents: i64,
    /// Applied discount
    pub discount_id: Option<Uuid>,
    /// Amount taken off by the discount
    pub discount_amount_cents: i64,
    /// Amount due
    pub price_cents: i64,
    /// Free-form notes from the player
    pub notes: Option<String>,
    /// Who cancelled, when cancelled
    pub cancelled_by: Option<Uuid>,
    /// Why it was cancelled
    pub cancellation_reason: Option<String>,
    /// Booking time
    pub created_at: DateTime<Utc>,
    /// Last status change
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Whether `user_id` is the player or the coach of this session
    #[must_use]
    pub fn is_participant(&self, user_id: Uuid) -> bool {
        self.user_id == user_id || self.coach_id == user_id
    }

    /// The participant on the other side from `user_id`
    #[must_use]
    pub fn counterpart_of(&self, user_id: Uuid) -> Uuid {
        if self.user_id == user_id {
            self.coach_id
        } else {
            self.user_id
        }
    }
}
