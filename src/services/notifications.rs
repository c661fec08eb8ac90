// ABOUTME: Fire-and-forget side effects of session changes: emails and calendar sync
// ABOUTME: Runs on spawned tasks so request latency and outcomes never depend on delivery
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Session notifications
//!
//! Every function here returns immediately. Delivery failures are logged at
//! `warn` and otherwise ignored.

use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::external::{CalendarEvent, CalendarSync, EmailSender, OutgoingEmail};
use crate::models::{Session, User};
use crate::resources::ServerResources;

/// Handles cloned out of `ServerResources` for a background task
#[derive(Clone)]
struct Notifier {
    database: Arc<Database>,
    email: Arc<dyn EmailSender>,
    calendar: Arc<dyn CalendarSync>,
}

impl Notifier {
    fn from_resources(resources: &ServerResources) -> Self {
        Self {
            database: Arc::clone(&resources.database),
            email: Arc::clone(&resources.email_sender),
            calendar: Arc::clone(&resources.calendar),
        }
    }

    async fn user(&self, id: Uuid) -> AppResult<User> {
        self.database
            .get_user(id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))
    }

    async fn email(&self, to: &User, subject: String, body: String) -> AppResult<()> {
        self.email
            .send(&OutgoingEmail {
                to: to.email.clone(),
                subject,
                body,
            })
            .await
    }

    async fn calendar_event(&self, session: &Session) -> AppResult<CalendarEvent> {
        let player = self.user(session.user_id).await?;
        let coach = self.user(session.coach_id).await?;
        Ok(CalendarEvent {
            session_id: session.id,
            coach_id: session.coach_id,
            user_id: session.user_id,
            title: format!("Tennis session: {} with {}", player.display_name, coach.display_name),
            starts_at: session.starts_at,
            ends_at: session.ends_at,
        })
    }
}

fn spawn_delivery<F>(kind: &'static str, session_id: Uuid, delivery: F)
where
    F: std::future::Future<Output = AppResult<()>> + Send + 'static,
{
    tokio::spawn(async move {
        match delivery.await {
            Ok(()) => debug!(%session_id, kind, "Notification delivered"),
            Err(e) => warn!(%session_id, kind, error = %e, "Notification delivery failed"),
        }
    });
}

fn when(session: &Session) -> String {
    session.starts_at.format("%Y-%m-%d %H:%M UTC").to_string()
}

/// Tell the coach about a new booking
pub fn session_booked(resources: &ServerResources, session: &Session) {
    let notifier = Notifier::from_resources(resources);
    let session = session.clone();
    spawn_delivery("session_booked", session.id, async move {
        let coach = notifier.user(session.coach_id).await?;
        let player = notifier.user(session.user_id).await?;
        notifier
            .email(
                &coach,
                format!("New booking request from {}", player.display_name),
                format!(
                    "{} booked a session on {}. Confirm it in Courtline.",
                    player.display_name,
                    when(&session)
                ),
            )
            .await
    });
}

/// Push the confirmed session to the calendar and tell the player
pub fn session_confirmed(resources: &ServerResources, session: &Session) {
    let notifier = Notifier::from_resources(resources);
    let session = session.clone();
    spawn_delivery("session_confirmed", session.id, async move {
        let event = notifier.calendar_event(&session).await?;
        notifier.calendar.upsert_event(&event).await?;

        let player = notifier.user(session.user_id).await?;
        notifier
            .email(
                &player,
                "Your session is confirmed".to_owned(),
                format!("Your session on {} is confirmed.", when(&session)),
            )
            .await
    });
}

/// Tell the coach a session was paid, syncing the calendar when payment confirmed it
pub fn payment_captured(resources: &ServerResources, session: &Session) {
    let notifier = Notifier::from_resources(resources);
    let session = session.clone();
    spawn_delivery("payment_captured", session.id, async move {
        let event = notifier.calendar_event(&session).await?;
        notifier.calendar.upsert_event(&event).await?;

        let coach = notifier.user(session.coach_id).await?;
        notifier
            .email(
                &coach,
                "Session paid".to_owned(),
                format!("The session on {} has been paid.", when(&session)),
            )
            .await
    });
}

/// Remove the calendar event and tell whoever did not cancel
pub fn session_cancelled(resources: &ServerResources, session: &Session, cancelled_by: Uuid) {
    let notifier = Notifier::from_resources(resources);
    let session = session.clone();
    spawn_delivery("session_cancelled", session.id, async move {
        notifier.calendar.remove_event(session.id).await?;

        let reason = session
            .cancellation_reason
            .as_deref()
            .map(|r| format!(" Reason: {r}"))
            .unwrap_or_default();
        for recipient in [session.user_id, session.coach_id] {
            if recipient == cancelled_by {
                continue;
            }
            let user = notifier.user(recipient).await?;
            notifier
                .email(
                    &user,
                    "Session cancelled".to_owned(),
                    format!("The session on {} was cancelled.{reason}", when(&session)),
                )
                .await?;
        }
        Ok(())
    });
}
