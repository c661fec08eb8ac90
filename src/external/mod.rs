// ABOUTME: External service integrations: payment gateway, email and calendar
// ABOUTME: Trait seams with production and development implementations chosen from config
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! External Service Clients
//!
//! Each integration is a trait object held in `ServerResources`, so tests can
//! swap in doubles.

pub mod calendar;
pub mod email;
pub mod payment_gateway;

use std::sync::Arc;
use std::time::Duration;

pub use calendar::{CalendarEvent, CalendarSync, NoopCalendarSync, WebhookCalendarSync};
pub use email::{EmailSender, HttpEmailSender, LogEmailSender, OutgoingEmail};
pub use payment_gateway::{
    GatewayCapture, GatewayOrder, GatewayRefund, OfflineGateway, OrderRequest, PayPalConfig,
    PayPalGateway, PaymentGateway,
};

use crate::config::{EmailProvider, PaymentProvider, ServerConfig};
use crate::constants::external::{CONNECT_TIMEOUT_SECS, REQUEST_TIMEOUT_SECS};
use crate::errors::{AppError, AppResult};

/// HTTP client with bounded connect and request times
///
/// # Errors
///
/// Returns an internal error if the TLS backend cannot be initialized
pub(crate) fn http_client() -> AppResult<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .map_err(|e| AppError::internal(format!("Failed to create HTTP client: {e}")))
}

/// Build the configured payment gateway
///
/// # Errors
///
/// Returns a config error if `PayPal` is selected without credentials
pub fn payment_gateway_from_config(config: &ServerConfig) -> AppResult<Arc<dyn PaymentGateway>> {
    match config.payment.provider {
        PaymentProvider::Offline => Ok(Arc::new(OfflineGateway)),
        PaymentProvider::PayPal => {
            let (Some(client_id), Some(client_secret)) = (
                config.payment.paypal_client_id.clone(),
                config.payment.paypal_client_secret.clone(),
            ) else {
                return Err(AppError::config("PayPal credentials are not configured"));
            };
            Ok(Arc::new(PayPalGateway::new(PayPalConfig {
                base_url: config.payment.paypal_base_url.clone(),
                client_id,
                client_secret,
                return_url: config.payment.return_url.clone(),
            })?))
        }
    }
}

/// Build the configured email transport
///
/// # Errors
///
/// Returns a config error if the HTTP transport has no URL
pub fn email_sender_from_config(config: &ServerConfig) -> AppResult<Arc<dyn EmailSender>> {
    match config.email.provider {
        EmailProvider::Log => Ok(Arc::new(LogEmailSender)),
        EmailProvider::Http => {
            let api_url = config
                .email
                .api_url
                .clone()
                .ok_or_else(|| AppError::config("EMAIL_API_URL is not configured"))?;
            Ok(Arc::new(HttpEmailSender::new(
                api_url,
                config.email.api_key.clone(),
                config.email.from_address.clone(),
            )?))
        }
    }
}

/// Build the configured calendar sync
///
/// # Errors
///
/// Returns an internal error if the webhook HTTP client cannot be built
pub fn calendar_sync_from_config(config: &ServerConfig) -> AppResult<Arc<dyn CalendarSync>> {
    match &config.calendar.webhook_url {
        Some(url) => Ok(Arc::new(WebhookCalendarSync::new(url.clone())?)),
        None => Ok(Arc::new(NoopCalendarSync)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outbound_client_builds_with_timeouts() {
        assert!(http_client().is_ok());
        assert!(REQUEST_TIMEOUT_SECS > CONNECT_TIMEOUT_SECS);
    }
}
