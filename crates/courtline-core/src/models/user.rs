// ABOUTME: User account model and role definitions
// ABOUTME: Players book sessions, coaches publish offerings, admins manage the platform
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::unknown_variant;
use crate::errors::AppError;

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// A player who books coaching sessions
    User,
    /// A coach who publishes booking types and time slots
    Coach,
    /// Platform administrator
    Admin,
}

impl UserRole {
    /// Storage representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Coach => "coach",
            Self::Admin => "admin",
        }
    }

    /// Whether the role may publish offerings
    #[must_use]
    pub const fn is_coach(self) -> bool {
        matches!(self, Self::Coach)
    }

    /// Whether the role bypasses ownership checks
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "coach" => Ok(Self::Coach),
            "admin" => Ok(Self::Admin),
            other => Err(unknown_variant("role", other)),
        }
    }
}

/// Registered account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Account ID
    pub id: Uuid,
    /// Login email (stored lowercase)
    pub email: String,
    /// bcrypt hash, never serialized
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    /// Name shown to other users
    pub display_name: String,
    /// Account role
    pub role: UserRole,
    /// Coach biography
    pub bio: Option<String>,
    /// Advertised hourly rate for coaches
    pub hourly_rate_cents: Option<i64>,
    /// Deactivated accounts cannot log in
    pub is_active: bool,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last profile update
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Build a new active account
    #[must_use]
    pub fn new(email: &str, password_hash: String, display_name: String, role: UserRole) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email: email.trim().to_lowercase(),
            password_hash,
            display_name,
            role,
            bio: None,
            hourly_rate_cents: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Profile visible to anyone browsing coaches
    #[must_use]
    pub fn public_profile(&self) -> PublicProfile {
        PublicProfile {
            id: self.id,
            display_name: self.display_name.clone(),
            role: self.role,
            bio: self.bio.clone(),
            hourly_rate_cents: self.hourly_rate_cents,
        }
    }
}

/// Public subset of a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicProfile {
    /// Account ID
    pub id: Uuid,
    /// Name
    pub display_name: String,
    /// Role
    pub role: UserRole,
    /// Coach biography
    pub bio: Option<String>,
    /// Advertised hourly rate
    pub hourly_rate_cents: Option<i64>,
}
