// ABOUTME: Outbound email transports for booking notifications
// ABOUTME: Log-only sender for development and an HTTP sender for transactional mail APIs
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

use crate::errors::{AppError, AppResult};

/// One email to deliver
#[derive(Debug, Clone, Serialize)]
pub struct OutgoingEmail {
    /// Recipient address
    pub to: String,
    /// Subject line
    pub subject: String,
    /// Plain-text body
    pub body: String,
}

/// An email transport
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Transport name for logs
    fn name(&self) -> &'static str;

    /// Deliver one email
    async fn send(&self, email: &OutgoingEmail) -> AppResult<()>;
}

/// Writes emails to the log instead of sending them
#[derive(Debug, Default)]
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn send(&self, email: &OutgoingEmail) -> AppResult<()> {
        info!(
            email.to = %email.to,
            email.subject = %email.subject,
            email.body = %email.body,
            "Email (not sent, log transport)"
        );
        Ok(())
    }
}

/// Posts emails as JSON to a transactional mail API
pub struct HttpEmailSender {
    http_client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    from: String,
}

impl HttpEmailSender {
    /// Create a sender for `api_url`
    ///
    /// # Errors
    ///
    /// Returns an internal error if the HTTP client cannot be built
    pub fn new(api_url: String, api_key: Option<String>, from: String) -> AppResult<Self> {
        Ok(Self {
            http_client: super::http_client()?,
            api_url,
            api_key,
            from,
        })
    }
}

#[async_trait]
impl EmailSender for HttpEmailSender {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn send(&self, email: &OutgoingEmail) -> AppResult<()> {
        let mut request = self.http_client.post(&self.api_url).json(&serde_json::json!({
            "from": self.from,
            "to": email.to,
            "subject": email.subject,
            "text": email.body,
        }));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::external_service("Email API", e.to_string()))?;
        if !response.status().is_success() {
            return Err(AppError::external_service(
                "Email API",
                format!("HTTP {}", response.status()),
            ));
        }
        Ok(())
    }
}
