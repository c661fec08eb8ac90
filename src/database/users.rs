// ABOUTME: User management database operations
// ABOUTME: Handles registration, lookup, profile edits and admin activation changes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use super::{parse_id, parse_ts, ts, Database};
use crate::errors::{AppError, AppResult};
use crate::models::{User, UserRole};

/// Profile fields a user may change about themselves
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    /// New display name
    pub display_name: Option<String>,
    /// New biography
    pub bio: Option<String>,
    /// New hourly rate
    pub hourly_rate_cents: Option<i64>,
}

const USER_COLUMNS: &str = "id, email, password_hash, display_name, role, bio, \
                            hourly_rate_cents, is_active, created_at, updated_at";

fn row_to_user(row: &SqliteRow) -> AppResult<User> {
    let role: String = row.try_get("role")?;
    Ok(User {
        id: parse_id(&row.try_get::<String, _>("id")?)?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        display_name: row.try_get("display_name")?,
        role: role.parse()?,
        bio: row.try_get("bio")?,
        hourly_rate_cents: row.try_get("hourly_rate_cents")?,
        is_active: row.try_get("is_active")?,
        created_at: parse_ts(&row.try_get::<String, _>("created_at")?)?,
        updated_at: parse_ts(&row.try_get::<String, _>("updated_at")?)?,
    })
}

impl Database {
    pub(super) async fn migrate_users(&self) -> AppResult<()> {
        self.execute_ddl(&[
            r"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                display_name TEXT NOT NULL,
                role TEXT NOT NULL CHECK (role IN ('user', 'coach', 'admin')),
                bio TEXT,
                hourly_rate_cents INTEGER,
                is_active BOOLEAN NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
            "CREATE INDEX IF NOT EXISTS idx_users_role ON users(role, is_active)",
        ])
        .await
    }

    /// Insert a new user
    ///
    /// # Errors
    ///
    /// Returns `ResourceAlreadyExists` if the email is taken
    pub async fn create_user(&self, user: &User) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO users (id, email, password_hash, display_name, role, bio,
                               hourly_rate_cents, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ",
        )
        .bind(user.id.to_string())
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.display_name)
        .bind(user.role.as_str())
        .bind(&user.bio)
        .bind(user.hourly_rate_cents)
        .bind(user.is_active)
        .bind(ts(user.created_at))
        .bind(ts(user.updated_at))
        .execute(&self.pool)
        .await
        .map_err(|e| match AppError::from(e) {
            err if err.code == crate::errors::ErrorCode::ResourceAlreadyExists => {
                AppError::already_exists("An account with this email already exists")
            }
            err => err,
        })?;
        Ok(())
    }

    /// Get a user by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn get_user(&self, user_id: Uuid) -> AppResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get user: {e}")))?;
        row.as_ref().map(row_to_user).transpose()
    }

    /// Get a user by (case-insensitive) email
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn get_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email.trim().to_lowercase())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get user by email: {e}")))?;
        row.as_ref().map(row_to_user).transpose()
    }

    /// Apply a profile update and return the stored user
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the user does not exist
    pub async fn update_user_profile(&self, user_id: Uuid, update: &ProfileUpdate) -> AppResult<User> {
        let result = sqlx::query(
            r"
            UPDATE users SET
                display_name = COALESCE($2, display_name),
                bio = COALESCE($3, bio),
                hourly_rate_cents = COALESCE($4, hourly_rate_cents),
                updated_at = $5
            WHERE id = $1
            ",
        )
        .bind(user_id.to_string())
        .bind(&update.display_name)
        .bind(&update.bio)
        .bind(update.hourly_rate_cents)
        .bind(ts(chrono::Utc::now()))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update profile: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("User"));
        }
        self.get_user(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))
    }

    /// Activate or deactivate an account
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the user does not exist
    pub async fn set_user_active(&self, user_id: Uuid, is_active: bool) -> AppResult<User> {
        let result = sqlx::query("UPDATE users SET is_active = $2, updated_at = $3 WHERE id = $1")
            .bind(user_id.to_string())
            .bind(is_active)
            .bind(ts(chrono::Utc::now()))
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to update user status: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("User"));
        }
        self.get_user(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))
    }

    /// List users, optionally filtered by role and activity, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn list_users(
        &self,
        role: Option<UserRole>,
        active_only: bool,
        limit: i64,
        offset: i64,
    ) -> AppResult<(Vec<User>, i64)> {
        let role = role.map(UserRole::as_str);
        let rows = sqlx::query(&format!(
            r"
            SELECT {USER_COLUMNS} FROM users
            WHERE ($1 IS NULL OR role = $1) AND ($2 = 0 OR is_active = 1)
            ORDER BY created_at DESC, id
            LIMIT $3 OFFSET $4
            "
        ))
        .bind(role)
        .bind(active_only)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list users: {e}")))?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE ($1 IS NULL OR role = $1) AND ($2 = 0 OR is_active = 1)",
        )
        .bind(role)
        .bind(active_only)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to count users: {e}")))?;

        let users = rows.iter().map(row_to_user).collect::<AppResult<Vec<_>>>()?;
        Ok((users, total))
    }
}
