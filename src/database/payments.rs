// ABOUTME: Payment record database operations
// ABOUTME: Gateway order bookkeeping with capture and refund updates mirrored onto sessions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use super::time_slots::ACTIVE_SESSION_STATUSES;
use super::{parse_id, parse_ts, ts, Database};
use crate::errors::{AppError, AppResult};
use crate::models::{Payment, PaymentRecordStatus, Session};

const PAYMENT_COLUMNS: &str = "id, session_id, user_id, amount_cents, currency, provider, \
     provider_order_id, provider_capture_id, approval_url, status, created_at, updated_at";

fn row_to_payment(row: &SqliteRow) -> AppResult<Payment> {
    let status: String = row.try_get("status")?;
    Ok(Payment {
        id: parse_id(&row.try_get::<String, _>("id")?)?,
        session_id: parse_id(&row.try_get::<String, _>("session_id")?)?,
        user_id: parse_id(&row.try_get::<String, _>("user_id")?)?,
        amount_cents: row.try_get("amount_cents")?,
        currency: row.try_get("currency")?,
        provider: row.try_get("provider")?,
        provider_order_id: row.try_get("provider_order_id")?,
        provider_capture_id: row.try_get("provider_capture_id")?,
        approval_url: row.try_get("approval_url")?,
        status: status.parse()?,
        created_at: parse_ts(&row.try_get::<String, _>("created_at")?)?,
        updated_at: parse_ts(&row.try_get::<String, _>("updated_at")?)?,
    })
}

impl Database {
    pub(super) async fn migrate_payments(&self) -> AppResult<()> {
        self.execute_ddl(&[
            r"
            CREATE TABLE IF NOT EXISTS payments (
                id TEXT PRIMARY KEY,
                session_id TEXT NOT NULL REFERENCES sessions(id),
                user_id TEXT NOT NULL REFERENCES users(id),
                amount_cents INTEGER NOT NULL CHECK (amount_cents >= 0),
                currency TEXT NOT NULL,
                provider TEXT NOT NULL,
                provider_order_id TEXT NOT NULL UNIQUE,
                provider_capture_id TEXT,
                approval_url TEXT,
                status TEXT NOT NULL CHECK (status IN ('created', 'captured', 'failed', 'refunded')),
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
            "CREATE INDEX IF NOT EXISTS idx_payments_session ON payments(session_id, status)",
            "CREATE INDEX IF NOT EXISTS idx_payments_user ON payments(user_id, created_at)",
        ])
        .await
    }

    /// Insert a payment record
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails
    pub async fn create_payment(&self, payment: &Payment) -> AppResult<()> {
        sqlx::query(&format!(
            "INSERT INTO payments ({PAYMENT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)"
        ))
        .bind(payment.id.to_string())
        .bind(payment.session_id.to_string())
        .bind(payment.user_id.to_string())
        .bind(payment.amount_cents)
        .bind(&payment.currency)
        .bind(&payment.provider)
        .bind(&payment.provider_order_id)
        .bind(&payment.provider_capture_id)
        .bind(&payment.approval_url)
        .bind(payment.status.as_str())
        .bind(ts(payment.created_at))
        .bind(ts(payment.updated_at))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create payment: {e}")))?;
        Ok(())
    }

    /// Get a payment by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn get_payment(&self, id: Uuid) -> AppResult<Option<Payment>> {
        self.fetch_payment("id", &id.to_string()).await
    }

    /// Get a payment by the gateway's order ID
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn get_payment_by_order_id(&self, order_id: &str) -> AppResult<Option<Payment>> {
        self.fetch_payment("provider_order_id", order_id).await
    }

    async fn fetch_payment(&self, column: &str, value: &str) -> AppResult<Option<Payment>> {
        let row = sqlx::query(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE {column} = $1"
        ))
        .bind(value)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get payment: {e}")))?;
        row.as_ref().map(row_to_payment).transpose()
    }

    /// Latest payment for a session in the given status
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn find_session_payment(
        &self,
        session_id: Uuid,
        status: PaymentRecordStatus,
    ) -> AppResult<Option<Payment>> {
        let row = sqlx::query(&format!(
            r"
            SELECT {PAYMENT_COLUMNS} FROM payments
            WHERE session_id = $1 AND status = $2
            ORDER BY created_at DESC LIMIT 1
            "
        ))
        .bind(session_id.to_string())
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to find session payment: {e}")))?;
        row.as_ref().map(row_to_payment).transpose()
    }

    /// A user's payments, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn list_payments(&self, user_id: Uuid, limit: i64, offset: i64) -> AppResult<(Vec<Payment>, i64)> {
        let rows = sqlx::query(&format!(
            r"
            SELECT {PAYMENT_COLUMNS} FROM payments
            WHERE user_id = $1
            ORDER BY created_at DESC, id
            LIMIT $2 OFFSET $3
            "
        ))
        .bind(user_id.to_string())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list payments: {e}")))?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM payments WHERE user_id = $1")
            .bind(user_id.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to count payments: {e}")))?;

        let payments = rows.iter().map(row_to_payment).collect::<AppResult<Vec<_>>>()?;
        Ok((payments, total))
    }

    /// Record a successful capture
    ///
    /// An active session becomes `paid`, and a pending one is confirmed. The
    /// capture is recorded even when the session was cancelled meanwhile; the
    /// returned session then still reads `cancelled`/`unpaid`.
    ///
    /// # Errors
    ///
    /// Returns `ResourceConflict` if the payment is no longer `created`
    pub async fn mark_payment_captured(
        &self,
        payment: &Payment,
        capture_id: &str,
    ) -> AppResult<(Payment, Session)> {
        let now = ts(Utc::now());
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

        let updated = sqlx::query(
            r"
            UPDATE payments SET status = 'captured', provider_capture_id = $2, updated_at = $3
            WHERE id = $1 AND status = 'created'
            ",
        )
        .bind(payment.id.to_string())
        .bind(capture_id)
        .bind(&now)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to mark payment captured: {e}")))?;

        if updated.rows_affected() == 0 {
            return Err(AppError::conflict("Payment order is no longer open"));
        }

        sqlx::query(&format!(
            r"
            UPDATE sessions
            SET payment_status = 'paid',
                status = CASE WHEN status = 'pending' THEN 'confirmed' ELSE status END,
                updated_at = $2
            WHERE id = $1 AND status IN {ACTIVE_SESSION_STATUSES}
            "
        ))
        .bind(payment.session_id.to_string())
        .bind(&now)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to mark session paid: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit capture: {e}")))?;

        let payment = self
            .get_payment(payment.id)
            .await?
            .ok_or_else(|| AppError::not_found("Payment"))?;
        let session = self
            .get_session(payment.session_id)
            .await?
            .ok_or_else(|| AppError::not_found("Session"))?;
        Ok((payment, session))
    }

    /// Record a failed capture
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails
    pub async fn mark_payment_failed(&self, payment_id: Uuid) -> AppResult<()> {
        sqlx::query("UPDATE payments SET status = 'failed', updated_at = $2 WHERE id = $1 AND status = 'created'")
            .bind(payment_id.to_string())
            .bind(ts(Utc::now()))
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to mark payment failed: {e}")))?;
        Ok(())
    }

    /// Record a refund of a captured payment and mark its session refunded
    ///
    /// # Errors
    ///
    /// Returns `ResourceConflict` if the payment is not captured
    pub async fn mark_payment_refunded(&self, payment: &Payment) -> AppResult<()> {
        let now = ts(Utc::now());
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

        let updated = sqlx::query(
            "UPDATE payments SET status = 'refunded', updated_at = $2 WHERE id = $1 AND status = 'captured'",
        )
        .bind(payment.id.to_string())
        .bind(&now)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to mark payment refunded: {e}")))?;

        if updated.rows_affected() == 0 {
            return Err(AppError::conflict("Payment is not captured"));
        }

        sqlx::query("UPDATE sessions SET payment_status = 'refunded', updated_at = $2 WHERE id = $1")
            .bind(payment.session_id.to_string())
            .bind(&now)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to mark session refunded: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit refund: {e}")))?;
        Ok(())
    }
}
