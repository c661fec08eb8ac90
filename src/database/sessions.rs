// ABOUTME: Session database operations including the transactional booking write
// ABOUTME: Reserves slots with guarded updates, tracks status transitions and cancellations
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, Transaction};
use uuid::Uuid;

use super::time_slots::ACTIVE_SESSION_STATUSES;
use super::{parse_id, parse_opt_id, parse_ts, ts, Database};
use crate::errors::{AppError, AppResult, ErrorCode};
use crate::models::{Session, SessionStatus};

/// Everything the booking transaction needs beyond the session row itself
#[derive(Debug, Clone)]
pub struct NewBooking {
    /// Fully priced session in `pending`/`unpaid` state
    pub session: Session,
    /// Cap on the user's pending sessions, including this one
    pub max_pending_bookings: i64,
    /// The slot must not start before this instant
    pub earliest_start: DateTime<Utc>,
}

/// Which sessions a listing returns
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionFilter {
    /// Sessions booked by this player
    pub user_id: Option<Uuid>,
    /// Sessions delivered by this coach
    pub coach_id: Option<Uuid>,
    /// Only sessions in this status
    pub status: Option<SessionStatus>,
}

const SESSION_COLUMNS: &str = "id, user_id, coach_id, booking_type_id, custom_service_id, \
     time_slot_id, starts_at, ends_at, status, payment_status, base_price_cents, discount_id, \
     discount_amount_cents, price_cents, notes, cancelled_by, cancellation_reason, \
     created_at, updated_at";

fn row_to_session(row: &SqliteRow) -> AppResult<Session> {
    let status: String = row.try_get("status")?;
    let payment_status: String = row.try_get("payment_status")?;
    Ok(Session {
        id: parse_id(&row.try_get::<String, _>("id")?)?,
        user_id: parse_id(&row.try_get::<String, _>("user_id")?)?,
        coach_id: parse_id(&row.try_get::<String, _>("coach_id")?)?,
        booking_type_id: parse_opt_id(row.try_get("booking_type_id")?)?,
        custom_service_id: parse_opt_id(row.try_get("custom_service_id")?)?,
        time_slot_id: parse_id(&row.try_get::<String, _>("time_slot_id")?)?,
        starts_at: parse_ts(&row.try_get::<String, _>("starts_at")?)?,
        ends_at: parse_ts(&row.try_get::<String, _>("ends_at")?)?,
        status: status.parse()?,
        payment_status: payment_status.parse()?,
        base_price_cents: row.try_get("base_price_cents")?,
        discount_id: parse_opt_id(row.try_get("discount_id")?)?,
        discount_amount_cents: row.try_get("discount_amount_cents")?,
        price_cents: row.try_get("price_cents")?,
        notes: row.try_get("notes")?,
        cancelled_by: parse_opt_id(row.try_get("cancelled_by")?)?,
        cancellation_reason: row.try_get("cancellation_reason")?,
        created_at: parse_ts(&row.try_get::<String, _>("created_at")?)?,
        updated_at: parse_ts(&row.try_get::<String, _>("updated_at")?)?,
    })
}

impl Database {
    pub(super) async fn migrate_sessions(&self) -> AppResult<()> {
        self.execute_ddl(&[
            r"
            CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id),
                coach_id TEXT NOT NULL REFERENCES users(id),
                booking_type_id TEXT REFERENCES booking_types(id),
                custom_service_id TEXT REFERENCES custom_services(id),
                time_slot_id TEXT NOT NULL,
                starts_at TEXT NOT NULL,
                ends_at TEXT NOT NULL,
                status TEXT NOT NULL CHECK (status IN ('pending', 'confirmed', 'completed', 'cancelled')),
                payment_status TEXT NOT NULL DEFAULT 'unpaid' CHECK (payment_status IN ('unpaid', 'paid', 'refunded')),
                base_price_cents INTEGER NOT NULL,
                discount_id TEXT REFERENCES discounts(id),
                discount_amount_cents INTEGER NOT NULL DEFAULT 0,
                price_cents INTEGER NOT NULL CHECK (price_cents >= 0),
                notes TEXT,
                cancelled_by TEXT,
                cancellation_reason TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                CHECK ((booking_type_id IS NULL) <> (custom_service_id IS NULL))
            )
            ",
            // At most one pending or confirmed session per slot
            r"
            CREATE UNIQUE INDEX IF NOT EXISTS idx_sessions_active_slot
            ON sessions(time_slot_id) WHERE status IN ('pending', 'confirmed')
            ",
            "CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id, status)",
            "CREATE INDEX IF NOT EXISTS idx_sessions_coach ON sessions(coach_id, status)",
        ])
        .await
    }

    /// Book a session in one transaction
    ///
    /// Reserves the slot, enforces the pending-booking cap, inserts the
    /// session and redeems the discount. Either all of it happens or none.
    ///
    /// # Errors
    ///
    /// - `ResourceConflict` if the slot is gone, taken or starts too soon
    /// - `LimitExceeded` if the user is at the pending cap or the discount ran out
    pub async fn create_booking(&self, booking: &NewBooking) -> AppResult<Session> {
        let session = &booking.session;
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

        let reserved = sqlx::query(
            r"
            UPDATE time_slots SET is_available = 0
            WHERE id = $1 AND coach_id = $2 AND is_available = 1 AND starts_at >= $3
            ",
        )
        .bind(session.time_slot_id.to_string())
        .bind(session.coach_id.to_string())
        .bind(ts(booking.earliest_start))
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to reserve time slot: {e}")))?;

        if reserved.rows_affected() == 0 {
            return Err(AppError::conflict("Time slot is no longer available"));
        }

        let pending: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sessions WHERE user_id = $1 AND status = 'pending'",
        )
        .bind(session.user_id.to_string())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to count pending sessions: {e}")))?;

        if pending >= booking.max_pending_bookings {
            return Err(AppError::limit_exceeded(format!(
                "You already have {pending} pending bookings (maximum {})",
                booking.max_pending_bookings
            )));
        }

        Self::insert_session(&mut tx, session).await?;

        if let Some(discount_id) = session.discount_id {
            Self::redeem_discount(&mut tx, discount_id, session.created_at).await?;
        }

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit booking: {e}")))?;
        Ok(session.clone())
    }

    async fn insert_session(tx: &mut Transaction<'_, Sqlite>, session: &Session) -> AppResult<()> {
        sqlx::query(&format!(
            r"
            INSERT INTO sessions ({SESSION_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
            "
        ))
        .bind(session.id.to_string())
        .bind(session.user_id.to_string())
        .bind(session.coach_id.to_string())
        .bind(session.booking_type_id.map(|id| id.to_string()))
        .bind(session.custom_service_id.map(|id| id.to_string()))
        .bind(session.time_slot_id.to_string())
        .bind(ts(session.starts_at))
        .bind(ts(session.ends_at))
        .bind(session.status.as_str())
        .bind(session.payment_status.as_str())
        .bind(session.base_price_cents)
        .bind(session.discount_id.map(|id| id.to_string()))
        .bind(session.discount_amount_cents)
        .bind(session.price_cents)
        .bind(&session.notes)
        .bind(session.cancelled_by.map(|id| id.to_string()))
        .bind(&session.cancellation_reason)
        .bind(ts(session.created_at))
        .bind(ts(session.updated_at))
        .execute(&mut **tx)
        .await
        .map_err(|e| match AppError::from(e) {
            err if err.code == ErrorCode::ResourceAlreadyExists => {
                AppError::conflict("Time slot is already booked")
            }
            err => err,
        })?;
        Ok(())
    }

    async fn redeem_discount(
        tx: &mut Transaction<'_, Sqlite>,
        discount_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        let redeemed = sqlx::query(
            r"
            UPDATE discounts SET times_used = times_used + 1
            WHERE id = $1 AND is_active = 1
              AND (max_uses IS NULL OR times_used < max_uses)
              AND (expires_at IS NULL OR expires_at > $2)
            ",
        )
        .bind(discount_id.to_string())
        .bind(ts(now))
        .execute(&mut **tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to redeem discount: {e}")))?;

        if redeemed.rows_affected() == 0 {
            return Err(AppError::limit_exceeded(
                "Discount code has reached its usage limit",
            ));
        }
        Ok(())
    }

    /// Get a session by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn get_session(&self, id: Uuid) -> AppResult<Option<Session>> {
        let row = sqlx::query(&format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = $1"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get session: {e}")))?;
        row.as_ref().map(row_to_session).transpose()
    }

    /// List sessions matching a filter, soonest slot first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn list_sessions(
        &self,
        filter: SessionFilter,
        limit: i64,
        offset: i64,
    ) -> AppResult<(Vec<Session>, i64)> {
        let where_clause = r"
            WHERE ($1 IS NULL OR user_id = $1)
              AND ($2 IS NULL OR coach_id = $2)
              AND ($3 IS NULL OR status = $3)
        ";
        let user_id = filter.user_id.map(|id| id.to_string());
        let coach_id = filter.coach_id.map(|id| id.to_string());
        let status = filter.status.map(SessionStatus::as_str);

        let rows = sqlx::query(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions {where_clause} \
             ORDER BY starts_at ASC, id LIMIT $4 OFFSET $5"
        ))
        .bind(&user_id)
        .bind(&coach_id)
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list sessions: {e}")))?;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM sessions {where_clause}"))
            .bind(&user_id)
            .bind(&coach_id)
            .bind(status)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to count sessions: {e}")))?;

        let sessions = rows.iter().map(row_to_session).collect::<AppResult<Vec<_>>>()?;
        Ok((sessions, total))
    }

    /// Number of pending sessions a user holds
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn count_pending_sessions(&self, user_id: Uuid) -> AppResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM sessions WHERE user_id = $1 AND status = 'pending'")
            .bind(user_id.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to count pending sessions: {e}")))
    }

    /// Move a session from `from` to `to`
    ///
    /// # Errors
    ///
    /// Returns `ResourceConflict` if the session is no longer in `from`
    pub async fn transition_session(
        &self,
        id: Uuid,
        from: SessionStatus,
        to: SessionStatus,
    ) -> AppResult<Session> {
        from.ensure_transition(to)?;
        let result = sqlx::query(
            "UPDATE sessions SET status = $3, updated_at = $4 WHERE id = $1 AND status = $2",
        )
        .bind(id.to_string())
        .bind(from.as_str())
        .bind(to.as_str())
        .bind(ts(Utc::now()))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update session status: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::conflict(format!(
                "Session is no longer {from}"
            )));
        }
        self.get_session(id)
            .await?
            .ok_or_else(|| AppError::not_found("Session"))
    }

    /// Cancel an active session and release its slot in one transaction
    ///
    /// # Errors
    ///
    /// Returns `ResourceConflict` if the session is already completed or cancelled
    pub async fn cancel_session(
        &self,
        session: &Session,
        cancelled_by: Uuid,
        reason: Option<&str>,
    ) -> AppResult<Session> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

        let result = sqlx::query(&format!(
            r"
            UPDATE sessions
            SET status = 'cancelled', cancelled_by = $2, cancellation_reason = $3, updated_at = $4
            WHERE id = $1 AND status IN {ACTIVE_SESSION_STATUSES}
            "
        ))
        .bind(session.id.to_string())
        .bind(cancelled_by.to_string())
        .bind(reason)
        .bind(ts(Utc::now()))
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to cancel session: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::conflict(format!(
                "Cannot cancel a {} session",
                session.status
            )));
        }

        sqlx::query("UPDATE time_slots SET is_available = 1 WHERE id = $1")
            .bind(session.time_slot_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to release time slot: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit cancellation: {e}")))?;

        self.get_session(session.id)
            .await?
            .ok_or_else(|| AppError::not_found("Session"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::{PaymentStatus, TimeSlot, User, UserRole};
    use chrono::Duration;

    async fn account(db: &Database, email: &str, role: UserRole) -> Uuid {
        let user = User::new(email, "hash".to_owned(), email.to_owned(), role);
        db.create_user(&user).await.unwrap();
        user.id
    }

    fn pending(user_id: Uuid, slot: &TimeSlot) -> Session {
        let now = Utc::now();
        Session {
            id: Uuid::new_v4(),
            user_id,
            coach_id: slot.coach_id,
            booking_type_id: None,
            custom_service_id: None,
            time_slot_id: slot.id,
            starts_at: slot.starts_at,
            ends_at: slot.ends_at,
            status: SessionStatus::Pending,
            payment_status: PaymentStatus::Unpaid,
            base_price_cents: 5000,
            discount_id: None,
            discount_amount_cents: 0,
            price_cents: 5000,
            notes: None,
            cancelled_by: None,
            cancellation_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_active_session_index_blocks_second_booking() {
        let db = Database::new("sqlite::memory:", 1).await.unwrap();
        let coach = account(&db, "coach@courtline.test", UserRole::Coach).await;
        let first = account(&db, "first@courtline.test", UserRole::User).await;
        let second = account(&db, "second@courtline.test", UserRole::User).await;

        let starts_at = Utc::now() + Duration::days(2);
        let slot = TimeSlot {
            id: Uuid::new_v4(),
            coach_id: coach,
            starts_at,
            ends_at: starts_at + Duration::hours(1),
            is_available: true,
            created_at: Utc::now(),
        };
        db.create_time_slots(std::slice::from_ref(&slot)).await.unwrap();

        let booking = |user_id| NewBooking {
            session: pending(user_id, &slot),
            max_pending_bookings: 5,
            earliest_start: Utc::now(),
        };
        db.create_booking(&booking(first)).await.unwrap();

        // Reopen the slot behind the guard so only the unique index stands in the way
        sqlx::query("UPDATE time_slots SET is_available = 1 WHERE id = $1")
            .bind(slot.id.to_string())
            .execute(&db.pool)
            .await
            .unwrap();

        let err = db.create_booking(&booking(second)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ResourceConflict);
        assert!(err.message.contains("already booked"));

        let (sessions, total) = db
            .list_sessions(
                SessionFilter {
                    user_id: Some(second),
                    ..SessionFilter::default()
                },
                10,
                0,
            )
            .await
            .unwrap();
        assert_eq!(total, 0);
        assert!(sessions.is_empty());
    }
}
