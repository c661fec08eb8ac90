// ABOUTME: Booking type database operations
// ABOUTME: Coach-defined service offerings with base prices and soft deactivation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use super::{parse_id, parse_ts, ts, Database};
use crate::errors::{AppError, AppResult};
use crate::models::BookingType;

const BOOKING_TYPE_COLUMNS: &str = "id, coach_id, name, description, duration_minutes, \
                                    base_price_cents, is_active, created_at, updated_at";

fn row_to_booking_type(row: &SqliteRow) -> AppResult<BookingType> {
    Ok(BookingType {
        id: parse_id(&row.try_get::<String, _>("id")?)?,
        coach_id: parse_id(&row.try_get::<String, _>("coach_id")?)?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        duration_minutes: row.try_get("duration_minutes")?,
        base_price_cents: row.try_get("base_price_cents")?,
        is_active: row.try_get("is_active")?,
        created_at: parse_ts(&row.try_get::<String, _>("created_at")?)?,
        updated_at: parse_ts(&row.try_get::<String, _>("updated_at")?)?,
    })
}

impl Database {
    pub(super) async fn migrate_booking_types(&self) -> AppResult<()> {
        self.execute_ddl(&[
            r"
            CREATE TABLE IF NOT EXISTS booking_types (
                id TEXT PRIMARY KEY,
                coach_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                description TEXT,
                duration_minutes INTEGER NOT NULL CHECK (duration_minutes > 0),
                base_price_cents INTEGER NOT NULL CHECK (base_price_cents >= 0),
                is_active BOOLEAN NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
            "CREATE INDEX IF NOT EXISTS idx_booking_types_coach ON booking_types(coach_id, is_active)",
        ])
        .await
    }

    /// Insert a booking type
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails
    pub async fn create_booking_type(&self, booking_type: &BookingType) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO booking_types (id, coach_id, name, description, duration_minutes,
                                       base_price_cents, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ",
        )
        .bind(booking_type.id.to_string())
        .bind(booking_type.coach_id.to_string())
        .bind(&booking_type.name)
        .bind(&booking_type.description)
        .bind(booking_type.duration_minutes)
        .bind(booking_type.base_price_cents)
        .bind(booking_type.is_active)
        .bind(ts(booking_type.created_at))
        .bind(ts(booking_type.updated_at))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create booking type: {e}")))?;
        Ok(())
    }

    /// Get a booking type by ID, active or not
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn get_booking_type(&self, id: Uuid) -> AppResult<Option<BookingType>> {
        let row = sqlx::query(&format!(
            "SELECT {BOOKING_TYPE_COLUMNS} FROM booking_types WHERE id = $1"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get booking type: {e}")))?;
        row.as_ref().map(row_to_booking_type).transpose()
    }

    /// List a coach's booking types, cheapest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn list_booking_types(
        &self,
        coach_id: Uuid,
        active_only: bool,
    ) -> AppResult<Vec<BookingType>> {
        let rows = sqlx::query(&format!(
            r"
            SELECT {BOOKING_TYPE_COLUMNS} FROM booking_types
            WHERE coach_id = $1 AND ($2 = 0 OR is_active = 1)
            ORDER BY base_price_cents ASC, name ASC
            "
        ))
        .bind(coach_id.to_string())
        .bind(active_only)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list booking types: {e}")))?;
        rows.iter().map(row_to_booking_type).collect()
    }

    /// Persist edited fields of a booking type
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the booking type does not exist
    pub async fn update_booking_type(&self, booking_type: &BookingType) -> AppResult<()> {
        let result = sqlx::query(
            r"
            UPDATE booking_types SET
                name = $2, description = $3, duration_minutes = $4,
                base_price_cents = $5, is_active = $6, updated_at = $7
            WHERE id = $1
            ",
        )
        .bind(booking_type.id.to_string())
        .bind(&booking_type.name)
        .bind(&booking_type.description)
        .bind(booking_type.duration_minutes)
        .bind(booking_type.base_price_cents)
        .bind(booking_type.is_active)
        .bind(ts(booking_type.updated_at))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update booking type: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Booking type"));
        }
        Ok(())
    }
}
