// ABOUTME: SQLite persistence layer for the booking platform
// ABOUTME: Owns the connection pool, schema migrations and row conversion helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Database Management
//!
//! `Database` wraps a sqlx SQLite pool. Each submodule adds an `impl Database`
//! block for one resource together with the migration that creates its
//! tables. IDs are stored as hyphenated UUID text and timestamps as
//! fixed-width RFC 3339 text (UTC, millisecond precision), so string
//! comparison in SQL matches chronological order.

mod analytics;
mod booking_types;
mod conversations;
mod custom_services;
mod discounts;
mod payments;
mod sessions;
mod time_slots;
mod users;

pub use analytics::{
    CoachAnalytics, MonthlyRevenue, PlatformAnalytics, RoleCount, StatusCount, TopBookingType,
    UserAnalytics,
};
pub use sessions::{NewBooking, SessionFilter};
pub use time_slots::SlotQuery;
pub use users::ProfileUpdate;

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::errors::{AppError, AppResult};

/// Database manager shared by every request handler
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect to `database_url` and run migrations
    ///
    /// In-memory databases use a single pinned connection so every query sees
    /// the same data.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid, the connection fails or a
    /// migration fails
    pub async fn new(database_url: &str, max_connections: u32) -> AppResult<Self> {
        let in_memory = database_url.contains(":memory:");
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| AppError::config(format!("Invalid DATABASE_URL: {e}")))?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));
        let options = if in_memory {
            options
        } else {
            options.journal_mode(SqliteJournalMode::Wal)
        };

        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(max_connections.max(1))
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| AppError::database(format!("Failed to connect to database: {e}")))?;

        let db = Self { pool };
        db.migrate().await?;
        info!(in_memory, "Database ready");
        Ok(db)
    }

    /// Get a reference to the database pool
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Verify the database answers queries
    ///
    /// # Errors
    ///
    /// Returns an error if the probe query fails
    pub async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Database ping failed: {e}")))?;
        Ok(())
    }

    /// Run database migrations
    ///
    /// Order matters: referenced tables are created first.
    ///
    /// # Errors
    ///
    /// Returns an error if any statement fails
    pub async fn migrate(&self) -> AppResult<()> {
        self.migrate_users().await?;
        self.migrate_booking_types().await?;
        self.migrate_time_slots().await?;
        self.migrate_custom_services().await?;
        self.migrate_discounts().await?;
        self.migrate_sessions().await?;
        self.migrate_payments().await?;
        self.migrate_conversations().await?;
        Ok(())
    }

    /// Execute a list of DDL statements in order
    async fn execute_ddl(&self, statements: &[&str]) -> AppResult<()> {
        for statement in statements {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| AppError::database(format!("Migration failed: {e}")))?;
        }
        Ok(())
    }
}

/// Storage form of a timestamp
pub(crate) fn ts(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a stored timestamp
pub(crate) fn parse_ts(value: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::database(format!("Invalid stored timestamp '{value}': {e}")))
}

/// Parse an optional stored timestamp
pub(crate) fn parse_opt_ts(value: Option<String>) -> AppResult<Option<DateTime<Utc>>> {
    value.as_deref().map(parse_ts).transpose()
}

/// Parse a stored UUID
pub(crate) fn parse_id(value: &str) -> AppResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|e| AppError::database(format!("Invalid stored id '{value}': {e}")))
}

/// Parse an optional stored UUID
pub(crate) fn parse_opt_id(value: Option<String>) -> AppResult<Option<Uuid>> {
    value.as_deref().map(parse_id).transpose()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timestamp_storage_sorts_chronologically() {
        let early = Utc.with_ymd_and_hms(2025, 3, 9, 9, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2025, 11, 10, 8, 30, 0).unwrap();
        assert!(ts(early) < ts(late));
        assert_eq!(ts(early), "2025-03-09T09:00:00.000Z");
        assert_eq!(parse_ts(&ts(late)).unwrap(), late);
    }

    #[tokio::test]
    async fn test_in_memory_database_migrates_twice() {
        let db = Database::new("sqlite::memory:", 1).await.unwrap();
        db.migrate().await.unwrap();
        db.ping().await.unwrap();
    }
}
