// ABOUTME: Chat business logic between players and coaches
// ABOUTME: Conversation creation, participant checks, message sending and read tracking
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::Utc;
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use crate::constants::messaging::MAX_MESSAGE_LENGTH;
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::middleware::AuthResult;
use crate::models::{Conversation, ConversationSummary, Message, MessageKind, UserRole};
use crate::pagination::{Page, PageParams};

/// Conversation creation input
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct StartConversationRequest {
    /// The other party
    pub participant_id: Uuid,
}

/// Message input
#[derive(Debug, Clone, Deserialize)]
pub struct SendMessageRequest {
    /// Message text
    pub content: String,
}

/// Get or create the conversation between the caller and another user
///
/// # Errors
///
/// Returns `InvalidInput` unless one side is a coach and the other a player,
/// and `ResourceNotFound` for an unknown or inactive participant
pub async fn start_conversation(
    database: &Database,
    caller: &AuthResult,
    participant_id: Uuid,
) -> AppResult<Conversation> {
    let participant = database
        .get_user(participant_id)
        .await?
        .filter(|user| user.is_active)
        .ok_or_else(|| AppError::not_found("User"))?;

    match (caller.role, participant.role) {
        (UserRole::User, UserRole::Coach) => {
            database
                .get_or_create_conversation(caller.user_id, participant.id)
                .await
        }
        (UserRole::Coach, UserRole::User) => {
            database
                .get_or_create_conversation(participant.id, caller.user_id)
                .await
        }
        _ => Err(AppError::invalid_input(
            "Conversations are between one player and one coach",
        )),
    }
}

/// The caller's conversations, most recently active first
///
/// # Errors
///
/// Returns an error if the query fails
pub async fn list_conversations(
    database: &Database,
    caller: &AuthResult,
) -> AppResult<Vec<ConversationSummary>> {
    database.list_conversation_summaries(caller.user_id).await
}

async fn participant_conversation(
    database: &Database,
    caller: &AuthResult,
    id: Uuid,
) -> AppResult<Conversation> {
    let conversation = database
        .get_conversation(id)
        .await?
        .ok_or_else(|| AppError::not_found("Conversation"))?;
    if !conversation.is_participant(caller.user_id) {
        return Err(AppError::forbidden("You are not part of this conversation"));
    }
    Ok(conversation)
}

/// A page of messages, marking the other party's messages read
///
/// # Errors
///
/// Returns `ResourceNotFound` or `PermissionDenied` for non-participants
pub async fn list_messages(
    database: &Database,
    caller: &AuthResult,
    conversation_id: Uuid,
    page: &PageParams,
) -> AppResult<Page<Message>> {
    let conversation = participant_conversation(database, caller, conversation_id).await?;
    let marked = database
        .mark_messages_read(conversation.id, caller.user_id)
        .await?;
    if marked > 0 {
        debug!(conversation_id = %conversation.id, marked, "Messages marked read");
    }
    let (messages, total) = database
        .list_messages(conversation.id, page.limit(), page.offset())
        .await?;
    Ok(Page::new(messages, total, page))
}

/// Post a text message
///
/// # Errors
///
/// Returns `InvalidInput` for empty or overlong content and
/// `PermissionDenied` for non-participants
#[tracing::instrument(skip(database, caller, request), fields(sender_id = %caller.user_id))]
pub async fn send_message(
    database: &Database,
    caller: &AuthResult,
    conversation_id: Uuid,
    request: SendMessageRequest,
) -> AppResult<Message> {
    let content = request.content.trim();
    if content.is_empty() {
        return Err(AppError::invalid_input("Message cannot be empty"));
    }
    if content.chars().count() > MAX_MESSAGE_LENGTH {
        return Err(AppError::invalid_input(format!(
            "Message cannot exceed {MAX_MESSAGE_LENGTH} characters"
        )));
    }
    let conversation = participant_conversation(database, caller, conversation_id).await?;

    let message = Message {
        id: Uuid::new_v4(),
        conversation_id: conversation.id,
        sender_id: caller.user_id,
        kind: MessageKind::Text,
        content: content.to_owned(),
        custom_service_id: None,
        read_at: None,
        created_at: Utc::now(),
    };
    database.add_message(&message).await?;
    Ok(message)
}

/// Unread messages addressed to the caller
///
/// # Errors
///
/// Returns an error if the query fails
pub async fn unread_count(database: &Database, caller: &AuthResult) -> AppResult<i64> {
    database.count_unread_messages(caller.user_id).await
}
