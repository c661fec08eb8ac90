// ABOUTME: Time slot database operations
// ABOUTME: Overlap-checked slot creation, availability toggles and guarded deletion
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, Transaction};
use uuid::Uuid;

use super::{parse_id, parse_ts, ts, Database};
use crate::errors::{AppError, AppResult};
use crate::models::TimeSlot;

/// Filter for listing a coach's slots
#[derive(Debug, Clone, Copy, Default)]
pub struct SlotQuery {
    /// Only slots starting at or after this instant
    pub from: Option<DateTime<Utc>>,
    /// Only slots starting before this instant
    pub to: Option<DateTime<Utc>>,
    /// Hide booked and manually closed slots
    pub available_only: bool,
}

const SLOT_COLUMNS: &str = "id, coach_id, starts_at, ends_at, is_available, created_at";

/// SQL fragment matching sessions that still hold their slot
pub(super) const ACTIVE_SESSION_STATUSES: &str = "('pending', 'confirmed')";

pub(super) fn row_to_time_slot(row: &SqliteRow) -> AppResult<TimeSlot> {
    Ok(TimeSlot {
        id: parse_id(&row.try_get::<String, _>("id")?)?,
        coach_id: parse_id(&row.try_get::<String, _>("coach_id")?)?,
        starts_at: parse_ts(&row.try_get::<String, _>("starts_at")?)?,
        ends_at: parse_ts(&row.try_get::<String, _>("ends_at")?)?,
        is_available: row.try_get("is_available")?,
        created_at: parse_ts(&row.try_get::<String, _>("created_at")?)?,
    })
}

impl Database {
    pub(super) async fn migrate_time_slots(&self) -> AppResult<()> {
        self.execute_ddl(&[
            r"
            CREATE TABLE IF NOT EXISTS time_slots (
                id TEXT PRIMARY KEY,
                coach_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                starts_at TEXT NOT NULL,
                ends_at TEXT NOT NULL,
                is_available BOOLEAN NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                CHECK (ends_at > starts_at)
            )
            ",
            "CREATE INDEX IF NOT EXISTS idx_time_slots_coach_start ON time_slots(coach_id, starts_at)",
        ])
        .await
    }

    /// Insert slots atomically, rejecting any that overlap an existing slot of the same coach
    ///
    /// # Errors
    ///
    /// Returns `ResourceConflict` on overlap; nothing is inserted in that case
    pub async fn create_time_slots(&self, slots: &[TimeSlot]) -> AppResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

        for slot in slots {
            Self::insert_time_slot(&mut tx, slot).await?;
        }

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit time slots: {e}")))?;
        Ok(())
    }

    async fn insert_time_slot(tx: &mut Transaction<'_, Sqlite>, slot: &TimeSlot) -> AppResult<()> {
        let overlapping: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*) FROM time_slots
            WHERE coach_id = $1 AND starts_at < $3 AND ends_at > $2
            ",
        )
        .bind(slot.coach_id.to_string())
        .bind(ts(slot.starts_at))
        .bind(ts(slot.ends_at))
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to check slot overlap: {e}")))?;

        if overlapping > 0 {
            return Err(AppError::conflict(format!(
                "Time slot {} - {} overlaps an existing slot",
                ts(slot.starts_at),
                ts(slot.ends_at)
            )));
        }

        sqlx::query(
            r"
            INSERT INTO time_slots (id, coach_id, starts_at, ends_at, is_available, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(slot.id.to_string())
        .bind(slot.coach_id.to_string())
        .bind(ts(slot.starts_at))
        .bind(ts(slot.ends_at))
        .bind(slot.is_available)
        .bind(ts(slot.created_at))
        .execute(&mut **tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to create time slot: {e}")))?;
        Ok(())
    }

    /// Get a time slot by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn get_time_slot(&self, id: Uuid) -> AppResult<Option<TimeSlot>> {
        let row = sqlx::query(&format!("SELECT {SLOT_COLUMNS} FROM time_slots WHERE id = $1"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get time slot: {e}")))?;
        row.as_ref().map(row_to_time_slot).transpose()
    }

    /// List a coach's slots in start order
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn list_time_slots(&self, coach_id: Uuid, query: SlotQuery) -> AppResult<Vec<TimeSlot>> {
        let rows = sqlx::query(&format!(
            r"
            SELECT {SLOT_COLUMNS} FROM time_slots
            WHERE coach_id = $1
              AND ($2 IS NULL OR starts_at >= $2)
              AND ($3 IS NULL OR starts_at < $3)
              AND ($4 = 0 OR is_available = 1)
            ORDER BY starts_at ASC
            "
        ))
        .bind(coach_id.to_string())
        .bind(query.from.map(ts))
        .bind(query.to.map(ts))
        .bind(query.available_only)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list time slots: {e}")))?;
        rows.iter().map(row_to_time_slot).collect()
    }

    /// Open or close a slot by hand
    ///
    /// Opening is refused while a pending or confirmed session holds the slot.
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` for an unknown slot and `ResourceConflict`
    /// when an active session holds it
    pub async fn set_time_slot_availability(&self, id: Uuid, is_available: bool) -> AppResult<TimeSlot> {
        let result = sqlx::query(&format!(
            r"
            UPDATE time_slots SET is_available = $2
            WHERE id = $1
              AND ($2 = 0 OR NOT EXISTS (
                  SELECT 1 FROM sessions
                  WHERE time_slot_id = $1 AND status IN {ACTIVE_SESSION_STATUSES}))
            "
        ))
        .bind(id.to_string())
        .bind(is_available)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update slot availability: {e}")))?;

        let slot = self
            .get_time_slot(id)
            .await?
            .ok_or_else(|| AppError::not_found("Time slot"))?;
        if result.rows_affected() == 0 {
            return Err(AppError::conflict(
                "Time slot is held by an active session",
            ));
        }
        Ok(slot)
    }

    /// Delete a slot that no active session holds
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` for an unknown slot and `ResourceConflict`
    /// when an active session holds it
    pub async fn delete_time_slot(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query(&format!(
            r"
            DELETE FROM time_slots
            WHERE id = $1
              AND NOT EXISTS (
                  SELECT 1 FROM sessions
                  WHERE time_slot_id = $1 AND status IN {ACTIVE_SESSION_STATUSES})
            "
        ))
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to delete time slot: {e}")))?;

        if result.rows_affected() == 0 {
            return match self.get_time_slot(id).await? {
                Some(_) => Err(AppError::conflict(
                    "Time slot is held by an active session",
                )),
                None => Err(AppError::not_found("Time slot")),
            };
        }
        Ok(())
    }
}
