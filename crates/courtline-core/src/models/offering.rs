// ABOUTME: Coach offerings: booking types with a base price and bookable time slots
// ABOUTME: Time slots toggle availability when sessions are booked or cancelled
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A coach-defined service offering with a base price
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingType {
    /// Booking type ID
    pub id: Uuid,
    /// Owning coach
    pub coach_id: Uuid,
    /// Display name, e.g. "Private lesson"
    pub name: String,
    /// Longer description
    pub description: Option<String>,
    /// Session length
    pub duration_minutes: i64,
    /// Price before discounts
    pub base_price_cents: i64,
    /// Inactive types cannot be booked
    pub is_active: bool,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last update
    pub updated_at: DateTime<Utc>,
}

/// A coach-defined bookable interval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSlot {
    /// Slot ID
    pub id: Uuid,
    /// Owning coach
    pub coach_id: Uuid,
    /// Interval start
    pub starts_at: DateTime<Utc>,
    /// Interval end (exclusive)
    pub ends_at: DateTime<Utc>,
    /// False once booked or manually blocked
    pub is_available: bool,
    /// Creation time
    pub created_at: DateTime<Utc>,
}
