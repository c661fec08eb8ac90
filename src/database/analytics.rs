// ABOUTME: Aggregate queries backing the coach, player and admin dashboards
// ABOUTME: Session counts by status, captured revenue, client counts and monthly revenue series
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use uuid::Uuid;

use super::{parse_id, ts, Database};
use crate::constants::analytics::TOP_BOOKING_TYPES;
use crate::errors::{AppError, AppResult};
use crate::models::{Session, SessionStatus, UserRole};

/// Number of sessions in one status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusCount {
    /// Session status
    pub status: SessionStatus,
    /// Sessions in that status
    pub count: i64,
}

/// Number of accounts with one role
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoleCount {
    /// Account role
    pub role: UserRole,
    /// Accounts with that role
    pub count: i64,
}

/// Captured revenue for one calendar month
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MonthlyRevenue {
    /// `YYYY-MM`
    pub month: String,
    /// Captured amount in cents
    pub revenue_cents: i64,
}

/// A booking type ranked by bookings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopBookingType {
    /// Booking type ID
    pub booking_type_id: Uuid,
    /// Booking type name
    pub name: String,
    /// Non-cancelled sessions booked with it
    pub session_count: i64,
}

/// Coach dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoachAnalytics {
    /// Sessions per status, every status listed
    pub sessions_by_status: Vec<StatusCount>,
    /// Captured, non-refunded payments for the coach's sessions
    pub total_revenue_cents: i64,
    /// Confirmed sessions that have not started yet
    pub upcoming_sessions: i64,
    /// Distinct players with at least one non-cancelled session
    pub distinct_clients: i64,
    /// Most booked booking types
    pub top_booking_types: Vec<TopBookingType>,
    /// Captured revenue per month, oldest first
    pub monthly_revenue: Vec<MonthlyRevenue>,
}

/// Player dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAnalytics {
    /// Sessions per status, every status listed
    pub sessions_by_status: Vec<StatusCount>,
    /// Captured, non-refunded payments made
    pub total_spent_cents: i64,
    /// Distinct coaches booked (excluding cancelled sessions)
    pub distinct_coaches: i64,
    /// Soonest pending or confirmed session that has not started
    pub next_session: Option<Session>,
}

/// Admin dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformAnalytics {
    /// Accounts per role
    pub users_by_role: Vec<RoleCount>,
    /// Sessions per status, every status listed
    pub sessions_by_status: Vec<StatusCount>,
    /// All captured, non-refunded payments
    pub gross_revenue_cents: i64,
    /// Discount codes currently active
    pub active_discounts: i64,
}

/// `YYYY-MM` keys for the `months` calendar months ending with `now`'s month
pub(crate) fn month_keys(now: DateTime<Utc>, months: u32) -> Vec<String> {
    let mut year = now.year();
    let mut month = now.month();
    let mut keys = Vec::with_capacity(months as usize);
    for _ in 0..months {
        keys.push(format!("{year:04}-{month:02}"));
        if month == 1 {
            month = 12;
            year -= 1;
        } else {
            month -= 1;
        }
    }
    keys.reverse();
    keys
}

fn complete_status_counts(found: &[(String, i64)]) -> AppResult<Vec<StatusCount>> {
    let mut counts: Vec<StatusCount> = SessionStatus::ALL
        .into_iter()
        .map(|status| StatusCount { status, count: 0 })
        .collect();
    for (status, count) in found {
        let status: SessionStatus = status.parse()?;
        if let Some(entry) = counts.iter_mut().find(|c| c.status == status) {
            entry.count = *count;
        }
    }
    Ok(counts)
}

impl Database {
    async fn status_counts(&self, column: &str, id: Option<Uuid>) -> AppResult<Vec<StatusCount>> {
        let rows = sqlx::query(&format!(
            "SELECT status, COUNT(*) AS n FROM sessions WHERE ($1 IS NULL OR {column} = $1) GROUP BY status"
        ))
        .bind(id.map(|id| id.to_string()))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to count sessions by status: {e}")))?;

        let found = rows
            .iter()
            .map(|r| Ok((r.try_get::<String, _>("status")?, r.try_get::<i64, _>("n")?)))
            .collect::<AppResult<Vec<_>>>()?;
        complete_status_counts(&found)
    }

    async fn scalar(&self, sql: &str, id: Option<Uuid>, label: &str) -> AppResult<i64> {
        sqlx::query_scalar(sql)
            .bind(id.map(|id| id.to_string()))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to compute {label}: {e}")))
    }

    /// Coach dashboard figures
    ///
    /// # Errors
    ///
    /// Returns an error if any aggregate query fails
    pub async fn coach_analytics(&self, coach_id: Uuid, months: u32, now: DateTime<Utc>) -> AppResult<CoachAnalytics> {
        let sessions_by_status = self.status_counts("coach_id", Some(coach_id)).await?;

        let total_revenue_cents = self
            .scalar(
                r"
                SELECT COALESCE(SUM(p.amount_cents), 0) FROM payments p
                JOIN sessions s ON s.id = p.session_id
                WHERE s.coach_id = $1 AND p.status = 'captured'
                ",
                Some(coach_id),
                "coach revenue",
            )
            .await?;

        let upcoming_sessions: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sessions WHERE coach_id = $1 AND status = 'confirmed' AND starts_at > $2",
        )
        .bind(coach_id.to_string())
        .bind(ts(now))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to count upcoming sessions: {e}")))?;

        let distinct_clients = self
            .scalar(
                "SELECT COUNT(DISTINCT user_id) FROM sessions WHERE coach_id = $1 AND status <> 'cancelled'",
                Some(coach_id),
                "distinct clients",
            )
            .await?;

        let top_rows = sqlx::query(
            r"
            SELECT b.id, b.name, COUNT(s.id) AS session_count
            FROM booking_types b
            JOIN sessions s ON s.booking_type_id = b.id AND s.status <> 'cancelled'
            WHERE b.coach_id = $1
            GROUP BY b.id, b.name
            ORDER BY session_count DESC, b.name ASC
            LIMIT $2
            ",
        )
        .bind(coach_id.to_string())
        .bind(TOP_BOOKING_TYPES)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to rank booking types: {e}")))?;
        let top_booking_types = top_rows
            .iter()
            .map(|r| {
                Ok(TopBookingType {
                    booking_type_id: parse_id(&r.try_get::<String, _>("id")?)?,
                    name: r.try_get("name")?,
                    session_count: r.try_get("session_count")?,
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        let keys = month_keys(now, months);
        let first_month = keys.first().cloned().unwrap_or_default();
        let revenue_rows = sqlx::query(
            r"
            SELECT substr(p.updated_at, 1, 7) AS month, SUM(p.amount_cents) AS revenue
            FROM payments p
            JOIN sessions s ON s.id = p.session_id
            WHERE s.coach_id = $1 AND p.status = 'captured' AND substr(p.updated_at, 1, 7) >= $2
            GROUP BY month
            ",
        )
        .bind(coach_id.to_string())
        .bind(&first_month)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to compute monthly revenue: {e}")))?;
        let found = revenue_rows
            .iter()
            .map(|r| Ok((r.try_get::<String, _>("month")?, r.try_get::<i64, _>("revenue")?)))
            .collect::<AppResult<Vec<_>>>()?;
        let monthly_revenue = keys
            .into_iter()
            .map(|month| {
                let revenue_cents = found
                    .iter()
                    .find(|(m, _)| *m == month)
                    .map_or(0, |(_, revenue)| *revenue);
                MonthlyRevenue {
                    month,
                    revenue_cents,
                }
            })
            .collect();

        Ok(CoachAnalytics {
            sessions_by_status,
            total_revenue_cents,
            upcoming_sessions,
            distinct_clients,
            top_booking_types,
            monthly_revenue,
        })
    }

    /// Player dashboard figures
    ///
    /// # Errors
    ///
    /// Returns an error if any aggregate query fails
    pub async fn user_analytics(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<UserAnalytics> {
        let sessions_by_status = self.status_counts("user_id", Some(user_id)).await?;

        let total_spent_cents = self
            .scalar(
                "SELECT COALESCE(SUM(amount_cents), 0) FROM payments WHERE user_id = $1 AND status = 'captured'",
                Some(user_id),
                "total spent",
            )
            .await?;

        let distinct_coaches = self
            .scalar(
                "SELECT COUNT(DISTINCT coach_id) FROM sessions WHERE user_id = $1 AND status <> 'cancelled'",
                Some(user_id),
                "distinct coaches",
            )
            .await?;

        let next_id: Option<String> = sqlx::query_scalar(
            r"
            SELECT id FROM sessions
            WHERE user_id = $1 AND status IN ('pending', 'confirmed') AND starts_at > $2
            ORDER BY starts_at ASC LIMIT 1
            ",
        )
        .bind(user_id.to_string())
        .bind(ts(now))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to find next session: {e}")))?;

        let next_session = match next_id {
            Some(id) => self.get_session(parse_id(&id)?).await?,
            None => None,
        };

        Ok(UserAnalytics {
            sessions_by_status,
            total_spent_cents,
            distinct_coaches,
            next_session,
        })
    }

    /// Admin dashboard figures
    ///
    /// # Errors
    ///
    /// Returns an error if any aggregate query fails
    pub async fn platform_analytics(&self) -> AppResult<PlatformAnalytics> {
        let role_rows = sqlx::query("SELECT role, COUNT(*) AS n FROM users GROUP BY role")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to count users by role: {e}")))?;
        let mut users_by_role: Vec<RoleCount> = [UserRole::User, UserRole::Coach, UserRole::Admin]
            .into_iter()
            .map(|role| RoleCount { role, count: 0 })
            .collect();
        for row in &role_rows {
            let role: UserRole = row.try_get::<String, _>("role")?.parse()?;
            let count: i64 = row.try_get("n")?;
            if let Some(entry) = users_by_role.iter_mut().find(|c| c.role == role) {
                entry.count = count;
            }
        }

        let sessions_by_status = self.status_counts("user_id", None).await?;
        let gross_revenue_cents = self
            .scalar(
                "SELECT COALESCE(SUM(amount_cents), 0) FROM payments WHERE status = 'captured' AND $1 IS NULL",
                None,
                "gross revenue",
            )
            .await?;
        let active_discounts = self
            .scalar(
                "SELECT COUNT(*) FROM discounts WHERE is_active = 1 AND $1 IS NULL",
                None,
                "active discounts",
            )
            .await?;

        Ok(PlatformAnalytics {
            users_by_role,
            sessions_by_status,
            gross_revenue_cents,
            active_discounts,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_month_keys_cross_year_boundary() {
        let now = Utc.with_ymd_and_hms(2025, 2, 14, 12, 0, 0).unwrap();
        assert_eq!(
            month_keys(now, 4),
            vec!["2024-11", "2024-12", "2025-01", "2025-02"]
        );
    }

    #[test]
    fn test_missing_statuses_are_zero() {
        let counts = complete_status_counts(&[("confirmed".to_owned(), 2)]).unwrap();
        assert_eq!(counts.len(), 4);
        assert_eq!(
            counts.iter().find(|c| c.status == SessionStatus::Confirmed).unwrap().count,
            2
        );
        assert!(counts
            .iter()
            .filter(|c| c.status != SessionStatus::Confirmed)
            .all(|c| c.count == 0));
    }
}
