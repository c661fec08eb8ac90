// ABOUTME: Chat conversation and message models between players and coaches
// ABOUTME: Messages are plain text or a custom service offer
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::unknown_variant;
use crate::errors::AppError;

/// A one-to-one conversation between a player and a coach
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Conversation ID
    pub id: Uuid,
    /// Player side
    pub user_id: Uuid,
    /// Coach side
    pub coach_id: Uuid,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Time of the latest message
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Whether `user_id` takes part in the conversation
    #[must_use]
    pub fn is_participant(&self, user_id: Uuid) -> bool {
        self.user_id == user_id || self.coach_id == user_id
    }

    /// The participant on the other side from `user_id`
    #[must_use]
    pub fn counterpart_of(&self, user_id: Uuid) -> Uuid {
        if self.user_id == user_id {
            self.coach_id
        } else {
            self.user_id
        }
    }
}

/// Message payload type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Plain text
    Text,
    /// A custom service offered by the coach
    CustomServiceOffer,
}

impl MessageKind {
    /// Storage representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::CustomServiceOffer => "custom_service_offer",
        }
    }
}

impl FromStr for MessageKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "custom_service_offer" => Ok(Self::CustomServiceOffer),
            other => Err(unknown_variant("message kind", other)),
        }
    }
}

/// A chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Message ID
    pub id: Uuid,
    /// Parent conversation
    pub conversation_id: Uuid,
    /// Author
    pub sender_id: Uuid,
    /// Payload type
    pub kind: MessageKind,
    /// Text body
    pub content: String,
    /// Offered custom service, for offer messages
    pub custom_service_id: Option<Uuid>,
    /// When the recipient read it
    pub read_at: Option<DateTime<Utc>>,
    /// Send time
    pub created_at: DateTime<Utc>,
}

/// Conversation row for listings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSummary {
    /// Conversation ID
    pub id: Uuid,
    /// The other participant
    pub participant_id: Uuid,
    /// The other participant's name
    pub participant_name: String,
    /// Truncated text of the latest message
    pub last_message_preview: Option<String>,
    /// Messages from the other participant not read yet
    pub unread_count: i64,
    /// Time of the latest message
    pub updated_at: DateTime<Utc>,
}
