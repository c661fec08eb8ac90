// ABOUTME: Custom service database operations
// ABOUTME: Coach-authored ad-hoc offerings and the per-user offer records that unlock booking
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use super::{parse_id, parse_ts, ts, Database};
use crate::errors::{AppError, AppResult};
use crate::models::CustomService;

const CUSTOM_SERVICE_COLUMNS: &str =
    "id, coach_id, name, description, duration_minutes, price_cents, is_active, created_at";

fn row_to_custom_service(row: &SqliteRow) -> AppResult<CustomService> {
    Ok(CustomService {
        id: parse_id(&row.try_get::<String, _>("id")?)?,
        coach_id: parse_id(&row.try_get::<String, _>("coach_id")?)?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        duration_minutes: row.try_get("duration_minutes")?,
        price_cents: row.try_get("price_cents")?,
        is_active: row.try_get("is_active")?,
        created_at: parse_ts(&row.try_get::<String, _>("created_at")?)?,
    })
}

impl Database {
    pub(super) async fn migrate_custom_services(&self) -> AppResult<()> {
        self.execute_ddl(&[
            r"
            CREATE TABLE IF NOT EXISTS custom_services (
                id TEXT PRIMARY KEY,
                coach_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                description TEXT,
                duration_minutes INTEGER NOT NULL CHECK (duration_minutes > 0),
                price_cents INTEGER NOT NULL CHECK (price_cents >= 0),
                is_active BOOLEAN NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL
            )
            ",
            r"
            CREATE TABLE IF NOT EXISTS custom_service_offers (
                custom_service_id TEXT NOT NULL REFERENCES custom_services(id) ON DELETE CASCADE,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                offered_at TEXT NOT NULL,
                PRIMARY KEY (custom_service_id, user_id)
            )
            ",
            "CREATE INDEX IF NOT EXISTS idx_custom_services_coach ON custom_services(coach_id)",
            "CREATE INDEX IF NOT EXISTS idx_custom_service_offers_user ON custom_service_offers(user_id)",
        ])
        .await
    }

    /// Insert a custom service
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails
    pub async fn create_custom_service(&self, service: &CustomService) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO custom_services (id, coach_id, name, description, duration_minutes,
                                         price_cents, is_active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ",
        )
        .bind(service.id.to_string())
        .bind(service.coach_id.to_string())
        .bind(&service.name)
        .bind(&service.description)
        .bind(service.duration_minutes)
        .bind(service.price_cents)
        .bind(service.is_active)
        .bind(ts(service.created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create custom service: {e}")))?;
        Ok(())
    }

    /// Get a custom service by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn get_custom_service(&self, id: Uuid) -> AppResult<Option<CustomService>> {
        let row = sqlx::query(&format!(
            "SELECT {CUSTOM_SERVICE_COLUMNS} FROM custom_services WHERE id = $1"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get custom service: {e}")))?;
        row.as_ref().map(row_to_custom_service).transpose()
    }

    /// List a coach's custom services, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn list_custom_services(
        &self,
        coach_id: Uuid,
        active_only: bool,
    ) -> AppResult<Vec<CustomService>> {
        let rows = sqlx::query(&format!(
            r"
            SELECT {CUSTOM_SERVICE_COLUMNS} FROM custom_services
            WHERE coach_id = $1 AND ($2 = 0 OR is_active = 1)
            ORDER BY created_at DESC
            "
        ))
        .bind(coach_id.to_string())
        .bind(active_only)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list custom services: {e}")))?;
        rows.iter().map(row_to_custom_service).collect()
    }

    /// Mark a custom service inactive
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the service does not exist
    pub async fn deactivate_custom_service(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("UPDATE custom_services SET is_active = 0 WHERE id = $1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to deactivate custom service: {e}")))?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Custom service"));
        }
        Ok(())
    }

    /// Record that a service was offered to a user; returns `false` if it already was
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails
    pub async fn record_custom_service_offer(&self, service_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            r"
            INSERT OR IGNORE INTO custom_service_offers (custom_service_id, user_id, offered_at)
            VALUES ($1, $2, $3)
            ",
        )
        .bind(service_id.to_string())
        .bind(user_id.to_string())
        .bind(ts(chrono::Utc::now()))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to record custom service offer: {e}")))?;
        Ok(result.rows_affected() > 0)
    }

    /// Whether a service was offered to a user
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn has_custom_service_offer(&self, service_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM custom_service_offers WHERE custom_service_id = $1 AND user_id = $2",
        )
        .bind(service_id.to_string())
        .bind(user_id.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to check custom service offer: {e}")))?;
        Ok(count > 0)
    }

    /// Active custom services offered to a user, most recent offer first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn list_offered_custom_services(&self, user_id: Uuid) -> AppResult<Vec<CustomService>> {
        let rows = sqlx::query(
            r"
            SELECT s.id, s.coach_id, s.name, s.description, s.duration_minutes,
                   s.price_cents, s.is_active, s.created_at
            FROM custom_services s
            JOIN custom_service_offers o ON o.custom_service_id = s.id
            WHERE o.user_id = $1 AND s.is_active = 1
            ORDER BY o.offered_at DESC
            ",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list offered custom services: {e}")))?;
        rows.iter().map(row_to_custom_service).collect()
    }
}
