// ABOUTME: Dashboard analytics for coaches, players and administrators
// ABOUTME: Role checks and parameter validation in front of the aggregate queries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::Utc;

use crate::constants::analytics::{DEFAULT_REVENUE_MONTHS, MAX_REVENUE_MONTHS};
use crate::database::{CoachAnalytics, Database, PlatformAnalytics, UserAnalytics};
use crate::errors::{AppError, AppResult};
use crate::middleware::AuthResult;
use crate::models::UserRole;

/// Coach dashboard; `months` sizes the revenue series
///
/// # Errors
///
/// Returns `PermissionDenied` for non-coaches and `ValueOutOfRange` for
/// `months` outside `1..=24`
pub async fn coach_dashboard(
    database: &Database,
    caller: &AuthResult,
    months: Option<u32>,
) -> AppResult<CoachAnalytics> {
    caller.require_role(UserRole::Coach)?;
    let months = months.unwrap_or(DEFAULT_REVENUE_MONTHS);
    if !(1..=MAX_REVENUE_MONTHS).contains(&months) {
        return Err(AppError::out_of_range(format!(
            "months must be between 1 and {MAX_REVENUE_MONTHS}"
        )));
    }
    database
        .coach_analytics(caller.user_id, months, Utc::now())
        .await
}

/// Player dashboard
///
/// # Errors
///
/// Returns `PermissionDenied` unless the caller is a player
pub async fn user_dashboard(database: &Database, caller: &AuthResult) -> AppResult<UserAnalytics> {
    caller.require_role(UserRole::User)?;
    database.user_analytics(caller.user_id, Utc::now()).await
}

/// Platform-wide totals
///
/// # Errors
///
/// Returns `PermissionDenied` for non-admins
pub async fn platform_dashboard(
    database: &Database,
    caller: &AuthResult,
) -> AppResult<PlatformAnalytics> {
    caller.require_admin()?;
    database.platform_analytics().await
}
