// ABOUTME: Conversion from sqlx errors into the unified application error
// ABOUTME: Maps constraint violations onto conflict codes so routes return 409 instead of 500
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::{AppError, ErrorCode};

impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> Self {
        match &error {
            sqlx::Error::RowNotFound => Self::new(ErrorCode::ResourceNotFound, "Record not found"),
            sqlx::Error::Database(db_error) if db_error.is_unique_violation() => Self::new(
                ErrorCode::ResourceAlreadyExists,
                "A record with the same unique value already exists",
            ),
            sqlx::Error::Database(db_error) if db_error.is_foreign_key_violation() => Self::new(
                ErrorCode::InvalidInput,
                "Referenced record does not exist",
            ),
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                Self::database(format!("Database pool unavailable: {error}"))
            }
            _ => Self::database(format!("Database operation failed: {error}")),
        }
    }
}
