// ABOUTME: Ad-hoc coach-authored offering model
// ABOUTME: Custom services are offered to a specific user through chat before booking
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An ad-hoc, coach-authored offering sendable to a specific user via chat
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomService {
    /// Custom service ID
    pub id: Uuid,
    /// Authoring coach
    pub coach_id: Uuid,
    /// Display name
    pub name: String,
    /// Longer description
    pub description: Option<String>,
    /// Session length
    pub duration_minutes: i64,
    /// Price in cents
    pub price_cents: i64,
    /// Inactive services cannot be sent or booked
    pub is_active: bool,
    /// Creation time
    pub created_at: DateTime<Utc>,
}
