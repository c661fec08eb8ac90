// ABOUTME: Payment gateway abstraction with PayPal REST and offline implementations
// ABOUTME: Creates and captures checkout orders and refunds captures, caching the OAuth token
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Payment gateways
//!
//! Amounts are passed around in integer minor units and converted to the
//! gateway's decimal string format at the edge. Only two-decimal currencies
//! are supported.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::constants::payments::{PROVIDER_OFFLINE, PROVIDER_PAYPAL};
use crate::errors::{AppError, AppResult};

/// Refresh the cached access token this long before it expires
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Order to open at the gateway
#[derive(Debug, Clone)]
pub struct OrderRequest {
    /// Amount in cents
    pub amount_cents: i64,
    /// ISO 4217 currency code
    pub currency: String,
    /// Our reference (the session ID)
    pub reference: String,
    /// Line shown to the buyer
    pub description: String,
}

/// Order opened at the gateway
#[derive(Debug, Clone)]
pub struct GatewayOrder {
    /// Gateway order ID
    pub order_id: String,
    /// Where the buyer approves the payment, when the gateway needs approval
    pub approval_url: Option<String>,
}

/// Result of capturing an approved order
#[derive(Debug, Clone)]
pub struct GatewayCapture {
    /// Gateway capture ID, used for refunds
    pub capture_id: String,
}

/// Result of refunding a capture
#[derive(Debug, Clone)]
pub struct GatewayRefund {
    /// Gateway refund ID
    pub refund_id: String,
}

/// A payment processor
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Provider name stored on payment records
    fn name(&self) -> &'static str;

    /// Open a checkout order
    async fn create_order(&self, request: &OrderRequest) -> AppResult<GatewayOrder>;

    /// Capture an approved order
    async fn capture_order(&self, order_id: &str) -> AppResult<GatewayCapture>;

    /// Refund a capture in full or in part
    async fn refund_capture(
        &self,
        capture_id: &str,
        amount_cents: i64,
        currency: &str,
    ) -> AppResult<GatewayRefund>;
}

/// Format cents as a decimal amount string
///
/// # Errors
///
/// Returns `InvalidInput` for negative amounts
pub fn format_amount(amount_cents: i64) -> AppResult<String> {
    if amount_cents < 0 {
        return Err(AppError::invalid_input("Payment amount cannot be negative"));
    }
    Ok(format!("{}.{:02}", amount_cents / 100, amount_cents % 100))
}

// ============================================================================
// Offline gateway
// ============================================================================

/// Gateway that approves everything locally; for development and tests
#[derive(Debug, Default)]
pub struct OfflineGateway;

#[async_trait]
impl PaymentGateway for OfflineGateway {
    fn name(&self) -> &'static str {
        PROVIDER_OFFLINE
    }

    async fn create_order(&self, request: &OrderRequest) -> AppResult<GatewayOrder> {
        format_amount(request.amount_cents)?;
        let order_id = format!("OFFLINE-{}", Uuid::new_v4().simple());
        debug!(order_id, reference = %request.reference, "Offline order created");
        Ok(GatewayOrder {
            order_id,
            approval_url: None,
        })
    }

    async fn capture_order(&self, order_id: &str) -> AppResult<GatewayCapture> {
        debug!(order_id, "Offline order captured");
        Ok(GatewayCapture {
            capture_id: format!("OFFLINE-CAP-{}", Uuid::new_v4().simple()),
        })
    }

    async fn refund_capture(
        &self,
        capture_id: &str,
        amount_cents: i64,
        _currency: &str,
    ) -> AppResult<GatewayRefund> {
        debug!(capture_id, amount_cents, "Offline capture refunded");
        Ok(GatewayRefund {
            refund_id: format!("OFFLINE-REF-{}", Uuid::new_v4().simple()),
        })
    }
}

// ============================================================================
// PayPal gateway
// ============================================================================

/// `PayPal` REST credentials and endpoint
#[derive(Debug, Clone)]
pub struct PayPalConfig {
    /// API base URL, sandbox or live
    pub base_url: String,
    /// OAuth client ID
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: String,
    /// Where the buyer returns after approval
    pub return_url: Option<String>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    refresh_after: Instant,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct Link {
    href: String,
    rel: String,
}

#[derive(Debug, Deserialize)]
struct OrderResponse {
    id: String,
    #[serde(default)]
    links: Vec<Link>,
}

#[derive(Debug, Deserialize)]
struct CaptureResponse {
    status: String,
    #[serde(default)]
    purchase_units: Vec<CapturedUnit>,
}

#[derive(Debug, Deserialize)]
struct CapturedUnit {
    payments: Option<CapturedPayments>,
}

#[derive(Debug, Deserialize)]
struct CapturedPayments {
    #[serde(default)]
    captures: Vec<CaptureRecord>,
}

#[derive(Debug, Deserialize)]
struct CaptureRecord {
    id: String,
}

#[derive(Debug, Deserialize)]
struct RefundResponse {
    id: String,
}

/// `PayPal` Orders v2 client
pub struct PayPalGateway {
    config: PayPalConfig,
    http_client: reqwest::Client,
    token: RwLock<Option<CachedToken>>,
}

impl PayPalGateway {
    /// Create a `PayPal` gateway
    ///
    /// # Errors
    ///
    /// Returns an internal error if the HTTP client cannot be built
    pub fn new(config: PayPalConfig) -> AppResult<Self> {
        Ok(Self {
            config,
            http_client: super::http_client()?,
            token: RwLock::new(None),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url.trim_end_matches('/'))
    }

    /// Client-credentials access token, reused until shortly before expiry
    async fn access_token(&self) -> AppResult<String> {
        {
            let cached = self.token.read().await;
            if let Some(token) = cached.as_ref() {
                if Instant::now() < token.refresh_after {
                    return Ok(token.access_token.clone());
                }
            }
        }

        let mut cached = self.token.write().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.refresh_after {
                return Ok(token.access_token.clone());
            }
        }

        let response = self
            .http_client
            .post(self.url("/v1/oauth2/token"))
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| AppError::external_service("PayPal", e.to_string()))?;
        let token: TokenResponse = Self::parse_response(response).await?;

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_REFRESH_MARGIN);
        info!(expires_in = token.expires_in, "Obtained PayPal access token");
        *cached = Some(CachedToken {
            access_token: token.access_token.clone(),
            refresh_after: Instant::now() + lifetime,
        });
        Ok(token.access_token)
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> AppResult<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::external_service(
                "PayPal",
                format!("HTTP {status}: {body}"),
            ));
        }
        response
            .json()
            .await
            .map_err(|e| AppError::external_service("PayPal", format!("JSON parse error: {e}")))
    }
}

#[async_trait]
impl PaymentGateway for PayPalGateway {
    fn name(&self) -> &'static str {
        PROVIDER_PAYPAL
    }

    async fn create_order(&self, request: &OrderRequest) -> AppResult<GatewayOrder> {
        let token = self.access_token().await?;
        let mut body = json!({
            "intent": "CAPTURE",
            "purchase_units": [{
                "reference_id": request.reference,
                "description": request.description,
                "amount": {
                    "currency_code": request.currency,
                    "value": format_amount(request.amount_cents)?,
                }
            }]
        });
        if let Some(return_url) = &self.config.return_url {
            body["application_context"] = json!({ "return_url": return_url });
        }

        let response = self
            .http_client
            .post(self.url("/v2/checkout/orders"))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::external_service("PayPal", e.to_string()))?;
        let order: OrderResponse = Self::parse_response(response).await?;

        let approval_url = order
            .links
            .into_iter()
            .find(|link| link.rel == "approve" || link.rel == "payer-action")
            .map(|link| link.href);
        Ok(GatewayOrder {
            order_id: order.id,
            approval_url,
        })
    }

    async fn capture_order(&self, order_id: &str) -> AppResult<GatewayCapture> {
        let token = self.access_token().await?;
        let response = self
            .http_client
            .post(self.url(&format!("/v2/checkout/orders/{order_id}/capture")))
            .bearer_auth(token)
            .json(&json!({}))
            .send()
            .await
            .map_err(|e| AppError::external_service("PayPal", e.to_string()))?;
        let capture: CaptureResponse = Self::parse_response(response).await?;

        if capture.status != "COMPLETED" {
            return Err(AppError::external_service(
                "PayPal",
                format!("Order capture ended in status {}", capture.status),
            ));
        }
        capture
            .purchase_units
            .into_iter()
            .filter_map(|unit| unit.payments)
            .flat_map(|payments| payments.captures)
            .next()
            .map(|record| GatewayCapture {
                capture_id: record.id,
            })
            .ok_or_else(|| AppError::external_service("PayPal", "Capture response had no capture"))
    }

    async fn refund_capture(
        &self,
        capture_id: &str,
        amount_cents: i64,
        currency: &str,
    ) -> AppResult<GatewayRefund> {
        let token = self.access_token().await?;
        let response = self
            .http_client
            .post(self.url(&format!("/v2/payments/captures/{capture_id}/refund")))
            .bearer_auth(token)
            .json(&json!({
                "amount": {
                    "value": format_amount(amount_cents)?,
                    "currency_code": currency,
                }
            }))
            .send()
            .await
            .map_err(|e| AppError::external_service("PayPal", e.to_string()))?;
        let refund: RefundResponse = Self::parse_response(response).await?;
        Ok(GatewayRefund {
            refund_id: refund.id,
        })
    }
}
