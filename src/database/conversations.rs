// ABOUTME: Database operations for user-coach conversations and messages
// ABOUTME: Handles get-or-create conversations, message history, read receipts and unread counts
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use super::{parse_id, parse_opt_id, parse_opt_ts, parse_ts, ts, Database};
use crate::constants::messaging::PREVIEW_LENGTH;
use crate::errors::{AppError, AppResult};
use crate::models::{Conversation, ConversationSummary, Message};

const MESSAGE_COLUMNS: &str =
    "id, conversation_id, sender_id, kind, content, custom_service_id, read_at, created_at";

fn row_to_conversation(row: &SqliteRow) -> AppResult<Conversation> {
    Ok(Conversation {
        id: parse_id(&row.try_get::<String, _>("id")?)?,
        user_id: parse_id(&row.try_get::<String, _>("user_id")?)?,
        coach_id: parse_id(&row.try_get::<String, _>("coach_id")?)?,
        created_at: parse_ts(&row.try_get::<String, _>("created_at")?)?,
        updated_at: parse_ts(&row.try_get::<String, _>("updated_at")?)?,
    })
}

fn row_to_message(row: &SqliteRow) -> AppResult<Message> {
    let kind: String = row.try_get("kind")?;
    Ok(Message {
        id: parse_id(&row.try_get::<String, _>("id")?)?,
        conversation_id: parse_id(&row.try_get::<String, _>("conversation_id")?)?,
        sender_id: parse_id(&row.try_get::<String, _>("sender_id")?)?,
        kind: kind.parse()?,
        content: row.try_get("content")?,
        custom_service_id: parse_opt_id(row.try_get("custom_service_id")?)?,
        read_at: parse_opt_ts(row.try_get("read_at")?)?,
        created_at: parse_ts(&row.try_get::<String, _>("created_at")?)?,
    })
}

/// First `PREVIEW_LENGTH` characters of a message, with an ellipsis when cut
fn preview(content: &str) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(PREVIEW_LENGTH).collect();
    if chars.next().is_some() {
        format!("{head}…")
    } else {
        head
    }
}

impl Database {
    pub(super) async fn migrate_conversations(&self) -> AppResult<()> {
        self.execute_ddl(&[
            r"
            CREATE TABLE IF NOT EXISTS conversations (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                coach_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE (user_id, coach_id)
            )
            ",
            r"
            CREATE TABLE IF NOT EXISTS messages (
                id TEXT PRIMARY KEY,
                conversation_id TEXT NOT NULL REFERENCES conversations(id) ON DELETE CASCADE,
                sender_id TEXT NOT NULL REFERENCES users(id),
                kind TEXT NOT NULL CHECK (kind IN ('text', 'custom_service_offer')),
                content TEXT NOT NULL,
                custom_service_id TEXT REFERENCES custom_services(id),
                read_at TEXT,
                created_at TEXT NOT NULL
            )
            ",
            "CREATE INDEX IF NOT EXISTS idx_conversations_coach ON conversations(coach_id)",
            "CREATE INDEX IF NOT EXISTS idx_messages_conversation ON messages(conversation_id, created_at)",
        ])
        .await
    }

    /// Get the conversation between a player and a coach, creating it if needed
    ///
    /// # Errors
    ///
    /// Returns an error if the insert or lookup fails
    pub async fn get_or_create_conversation(&self, user_id: Uuid, coach_id: Uuid) -> AppResult<Conversation> {
        let now = ts(Utc::now());
        sqlx::query(
            r"
            INSERT OR IGNORE INTO conversations (id, user_id, coach_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            ",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(user_id.to_string())
        .bind(coach_id.to_string())
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create conversation: {e}")))?;

        let row = sqlx::query(
            r"
            SELECT id, user_id, coach_id, created_at, updated_at
            FROM conversations WHERE user_id = $1 AND coach_id = $2
            ",
        )
        .bind(user_id.to_string())
        .bind(coach_id.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to load conversation: {e}")))?;
        row_to_conversation(&row)
    }

    /// Get a conversation by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn get_conversation(&self, id: Uuid) -> AppResult<Option<Conversation>> {
        let row = sqlx::query(
            "SELECT id, user_id, coach_id, created_at, updated_at FROM conversations WHERE id = $1",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get conversation: {e}")))?;
        row.as_ref().map(row_to_conversation).transpose()
    }

    /// Conversations a user takes part in, most recently active first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn list_conversation_summaries(&self, user_id: Uuid) -> AppResult<Vec<ConversationSummary>> {
        let rows = sqlx::query(
            r"
            SELECT c.id, c.updated_at,
                   other.id AS participant_id,
                   other.display_name AS participant_name,
                   (SELECT m.content FROM messages m
                    WHERE m.conversation_id = c.id
                    ORDER BY m.created_at DESC, m.rowid DESC LIMIT 1) AS last_message,
                   (SELECT COUNT(*) FROM messages m
                    WHERE m.conversation_id = c.id AND m.sender_id <> $1 AND m.read_at IS NULL) AS unread_count
            FROM conversations c
            JOIN users other
              ON other.id = CASE WHEN c.user_id = $1 THEN c.coach_id ELSE c.user_id END
            WHERE c.user_id = $1 OR c.coach_id = $1
            ORDER BY c.updated_at DESC
            ",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list conversations: {e}")))?;

        rows.iter()
            .map(|r| {
                let last: Option<String> = r.try_get("last_message")?;
                Ok(ConversationSummary {
                    id: parse_id(&r.try_get::<String, _>("id")?)?,
                    participant_id: parse_id(&r.try_get::<String, _>("participant_id")?)?,
                    participant_name: r.try_get("participant_name")?,
                    last_message_preview: last.as_deref().map(preview),
                    unread_count: r.try_get("unread_count")?,
                    updated_at: parse_ts(&r.try_get::<String, _>("updated_at")?)?,
                })
            })
            .collect()
    }

    /// Store a message and bump the conversation's activity time
    ///
    /// # Errors
    ///
    /// Returns an error if either write fails
    pub async fn add_message(&self, message: &Message) -> AppResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

        sqlx::query(&format!(
            "INSERT INTO messages ({MESSAGE_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"
        ))
        .bind(message.id.to_string())
        .bind(message.conversation_id.to_string())
        .bind(message.sender_id.to_string())
        .bind(message.kind.as_str())
        .bind(&message.content)
        .bind(message.custom_service_id.map(|id| id.to_string()))
        .bind(message.read_at.map(ts))
        .bind(ts(message.created_at))
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to add message: {e}")))?;

        sqlx::query("UPDATE conversations SET updated_at = $2 WHERE id = $1")
            .bind(message.conversation_id.to_string())
            .bind(ts(message.created_at))
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to touch conversation: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit message: {e}")))?;
        Ok(())
    }

    /// A page of messages, oldest first
    ///
    /// `offset` counts back from the newest message, so offset 0 is the
    /// latest page.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn list_messages(
        &self,
        conversation_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> AppResult<(Vec<Message>, i64)> {
        let rows = sqlx::query(&format!(
            r"
            SELECT {MESSAGE_COLUMNS} FROM (
                SELECT {MESSAGE_COLUMNS}, rowid AS seq FROM messages
                WHERE conversation_id = $1
                ORDER BY created_at DESC, seq DESC
                LIMIT $2 OFFSET $3
            ) ORDER BY created_at ASC, seq ASC
            "
        ))
        .bind(conversation_id.to_string())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list messages: {e}")))?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE conversation_id = $1")
            .bind(conversation_id.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to count messages: {e}")))?;

        let messages = rows.iter().map(row_to_message).collect::<AppResult<Vec<_>>>()?;
        Ok((messages, total))
    }

    /// Mark every message the reader did not send as read
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails
    pub async fn mark_messages_read(&self, conversation_id: Uuid, reader_id: Uuid) -> AppResult<u64> {
        let result = sqlx::query(
            r"
            UPDATE messages SET read_at = $3
            WHERE conversation_id = $1 AND sender_id <> $2 AND read_at IS NULL
            ",
        )
        .bind(conversation_id.to_string())
        .bind(reader_id.to_string())
        .bind(ts(Utc::now()))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to mark messages read: {e}")))?;
        Ok(result.rows_affected())
    }

    /// Unread messages across all of a user's conversations
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn count_unread_messages(&self, user_id: Uuid) -> AppResult<i64> {
        sqlx::query_scalar(
            r"
            SELECT COUNT(*) FROM messages m
            JOIN conversations c ON c.id = m.conversation_id
            WHERE (c.user_id = $1 OR c.coach_id = $1)
              AND m.sender_id <> $1 AND m.read_at IS NULL
            ",
        )
        .bind(user_id.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to count unread messages: {e}")))
    }
}
