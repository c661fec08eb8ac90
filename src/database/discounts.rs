// ABOUTME: Discount code database operations
// ABOUTME: Per-coach unique codes, usage counters, deactivation and guarded deletion
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use super::{parse_id, parse_opt_ts, parse_ts, ts, Database};
use crate::errors::{AppError, AppResult, ErrorCode};
use crate::models::Discount;

const DISCOUNT_COLUMNS: &str =
    "id, coach_id, code, kind, value, max_uses, times_used, expires_at, is_active, created_at";

fn row_to_discount(row: &SqliteRow) -> AppResult<Discount> {
    let kind: String = row.try_get("kind")?;
    Ok(Discount {
        id: parse_id(&row.try_get::<String, _>("id")?)?,
        coach_id: parse_id(&row.try_get::<String, _>("coach_id")?)?,
        code: row.try_get("code")?,
        kind: kind.parse()?,
        value: row.try_get("value")?,
        max_uses: row.try_get("max_uses")?,
        times_used: row.try_get("times_used")?,
        expires_at: parse_opt_ts(row.try_get("expires_at")?)?,
        is_active: row.try_get("is_active")?,
        created_at: parse_ts(&row.try_get::<String, _>("created_at")?)?,
    })
}

impl Database {
    pub(super) async fn migrate_discounts(&self) -> AppResult<()> {
        self.execute_ddl(&[
            r"
            CREATE TABLE IF NOT EXISTS discounts (
                id TEXT PRIMARY KEY,
                coach_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                code TEXT NOT NULL,
                kind TEXT NOT NULL CHECK (kind IN ('percentage', 'fixed_amount')),
                value INTEGER NOT NULL CHECK (value > 0),
                max_uses INTEGER,
                times_used INTEGER NOT NULL DEFAULT 0,
                expires_at TEXT,
                is_active BOOLEAN NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                UNIQUE (coach_id, code)
            )
            ",
        ])
        .await
    }

    /// Insert a discount
    ///
    /// # Errors
    ///
    /// Returns `ResourceAlreadyExists` if the coach already has this code
    pub async fn create_discount(&self, discount: &Discount) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO discounts (id, coach_id, code, kind, value, max_uses, times_used,
                                   expires_at, is_active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ",
        )
        .bind(discount.id.to_string())
        .bind(discount.coach_id.to_string())
        .bind(&discount.code)
        .bind(discount.kind.as_str())
        .bind(discount.value)
        .bind(discount.max_uses)
        .bind(discount.times_used)
        .bind(discount.expires_at.map(ts))
        .bind(discount.is_active)
        .bind(ts(discount.created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| match AppError::from(e) {
            err if err.code == ErrorCode::ResourceAlreadyExists => AppError::already_exists(
                format!("Discount code {} already exists", discount.code),
            ),
            err => err,
        })?;
        Ok(())
    }

    /// Get a discount by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn get_discount(&self, id: Uuid) -> AppResult<Option<Discount>> {
        let row = sqlx::query(&format!("SELECT {DISCOUNT_COLUMNS} FROM discounts WHERE id = $1"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get discount: {e}")))?;
        row.as_ref().map(row_to_discount).transpose()
    }

    /// Look up a coach's discount by its normalized code
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn get_discount_by_code(&self, coach_id: Uuid, code: &str) -> AppResult<Option<Discount>> {
        let row = sqlx::query(&format!(
            "SELECT {DISCOUNT_COLUMNS} FROM discounts WHERE coach_id = $1 AND code = $2"
        ))
        .bind(coach_id.to_string())
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get discount by code: {e}")))?;
        row.as_ref().map(row_to_discount).transpose()
    }

    /// List a coach's discounts, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn list_discounts(&self, coach_id: Uuid) -> AppResult<Vec<Discount>> {
        let rows = sqlx::query(&format!(
            "SELECT {DISCOUNT_COLUMNS} FROM discounts WHERE coach_id = $1 ORDER BY created_at DESC"
        ))
        .bind(coach_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list discounts: {e}")))?;
        rows.iter().map(row_to_discount).collect()
    }

    /// Mark a discount inactive
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the discount does not exist
    pub async fn deactivate_discount(&self, id: Uuid) -> AppResult<Discount> {
        let result = sqlx::query("UPDATE discounts SET is_active = 0 WHERE id = $1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to deactivate discount: {e}")))?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Discount"));
        }
        self.get_discount(id)
            .await?
            .ok_or_else(|| AppError::not_found("Discount"))
    }

    /// Delete a discount that was never redeemed
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` for an unknown discount and
    /// `ResourceConflict` once it has been used
    pub async fn delete_unused_discount(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query(
            r"
            DELETE FROM discounts
            WHERE id = $1 AND times_used = 0
              AND NOT EXISTS (SELECT 1 FROM sessions WHERE discount_id = $1)
            ",
        )
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to delete discount: {e}")))?;

        if result.rows_affected() == 0 {
            return match self.get_discount(id).await? {
                Some(_) => Err(AppError::conflict(
                    "Discount has been used; deactivate it instead",
                )),
                None => Err(AppError::not_found("Discount")),
            };
        }
        Ok(())
    }
}
