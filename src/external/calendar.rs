// ABOUTME: Calendar synchronisation for confirmed coaching sessions
// ABOUTME: No-op implementation and a webhook implementation that pushes event changes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use crate::errors::{AppError, AppResult};

/// Calendar entry for one session
#[derive(Debug, Clone, Serialize)]
pub struct CalendarEvent {
    /// Session the event mirrors
    pub session_id: Uuid,
    /// Coach attending
    pub coach_id: Uuid,
    /// Player attending
    pub user_id: Uuid,
    /// Event title
    pub title: String,
    /// Start time
    pub starts_at: DateTime<Utc>,
    /// End time
    pub ends_at: DateTime<Utc>,
}

/// A calendar backend
#[async_trait]
pub trait CalendarSync: Send + Sync {
    /// Create or update the event for a session
    async fn upsert_event(&self, event: &CalendarEvent) -> AppResult<()>;

    /// Remove the event for a session
    async fn remove_event(&self, session_id: Uuid) -> AppResult<()>;
}

/// Calendar sync disabled
#[derive(Debug, Default)]
pub struct NoopCalendarSync;

#[async_trait]
impl CalendarSync for NoopCalendarSync {
    async fn upsert_event(&self, event: &CalendarEvent) -> AppResult<()> {
        debug!(session_id = %event.session_id, "Calendar sync disabled, skipping upsert");
        Ok(())
    }

    async fn remove_event(&self, session_id: Uuid) -> AppResult<()> {
        debug!(%session_id, "Calendar sync disabled, skipping removal");
        Ok(())
    }
}

/// Pushes session events to a webhook: `POST` for upserts, `DELETE` for removals
pub struct WebhookCalendarSync {
    http_client: reqwest::Client,
    url: String,
}

impl WebhookCalendarSync {
    /// Create a webhook sync targeting `url`
    ///
    /// # Errors
    ///
    /// Returns an internal error if the HTTP client cannot be built
    pub fn new(url: String) -> AppResult<Self> {
        Ok(Self {
            http_client: super::http_client()?,
            url,
        })
    }

    async fn check(response: Result<reqwest::Response, reqwest::Error>) -> AppResult<()> {
        let response =
            response.map_err(|e| AppError::external_service("Calendar webhook", e.to_string()))?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(AppError::external_service(
                "Calendar webhook",
                format!("HTTP {}", response.status()),
            ))
        }
    }
}

#[async_trait]
impl CalendarSync for WebhookCalendarSync {
    async fn upsert_event(&self, event: &CalendarEvent) -> AppResult<()> {
        Self::check(self.http_client.post(&self.url).json(event).send().await).await
    }

    async fn remove_event(&self, session_id: Uuid) -> AppResult<()> {
        Self::check(
            self.http_client
                .delete(&self.url)
                .json(&json!({ "session_id": session_id }))
                .send()
                .await,
        )
        .await
    }
}
