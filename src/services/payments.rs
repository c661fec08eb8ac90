// ABOUTME: Payment business logic for session checkout through the configured gateway
// ABOUTME: Order creation and reuse, capture, refunds on cancellation and payment history
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Payments
//!
//! A session is paid through a two-step checkout: an order is opened at the
//! gateway, the player approves it, and the capture marks the session paid.
//! Gateway calls are never made inside a database transaction.

use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::external::OrderRequest;
use crate::logging::AppLogger;
use crate::middleware::AuthResult;
use crate::models::{Payment, PaymentRecordStatus, PaymentStatus, Session, SessionStatus};
use crate::pagination::{Page, PageParams};
use crate::resources::ServerResources;
use crate::services::notifications;

/// Order creation input
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CreateOrderRequest {
    /// Session to pay for
    pub session_id: Uuid,
}

/// Open a checkout order for one of the caller's sessions
///
/// An order that is still open for the session is returned instead of
/// creating a second one.
///
/// # Errors
///
/// - `PermissionDenied` unless the caller booked the session
/// - `ResourceConflict` when the session is not pending/confirmed or already paid
/// - `InvalidInput` for a free session
/// - `ExternalServiceError` when the gateway rejects the order
#[tracing::instrument(skip(resources, caller), fields(user_id = %caller.user_id))]
pub async fn create_order(
    resources: &ServerResources,
    caller: &AuthResult,
    session_id: Uuid,
) -> AppResult<Payment> {
    let database = resources.database.as_ref();
    let session = database
        .get_session(session_id)
        .await?
        .ok_or_else(|| AppError::not_found("Session"))?;
    if session.user_id != caller.user_id {
        return Err(AppError::forbidden("Only the player who booked can pay for a session"));
    }
    if !session.status.holds_slot() {
        return Err(AppError::conflict(format!(
            "Cannot pay for a {} session",
            session.status
        )));
    }
    if session.payment_status != PaymentStatus::Unpaid {
        return Err(AppError::conflict("Session is already paid"));
    }
    if session.price_cents == 0 {
        return Err(AppError::invalid_input("Free sessions do not need payment"));
    }

    if let Some(open) = database
        .find_session_payment(session.id, PaymentRecordStatus::Created)
        .await?
    {
        return Ok(open);
    }

    let gateway = &resources.payment_gateway;
    let currency = resources.config.payment.currency.clone();
    let order = gateway
        .create_order(&OrderRequest {
            amount_cents: session.price_cents,
            currency: currency.clone(),
            reference: session.id.to_string(),
            description: format!(
                "Tennis session on {}",
                session.starts_at.format("%Y-%m-%d %H:%M UTC")
            ),
        })
        .await?;

    let now = Utc::now();
    let payment = Payment {
        id: Uuid::new_v4(),
        session_id: session.id,
        user_id: caller.user_id,
        amount_cents: session.price_cents,
        currency,
        provider: gateway.name().to_owned(),
        provider_order_id: order.order_id,
        provider_capture_id: None,
        approval_url: order.approval_url,
        status: PaymentRecordStatus::Created,
        created_at: now,
        updated_at: now,
    };
    database.create_payment(&payment).await?;
    AppLogger::log_payment_event(&payment.id.to_string(), &payment.provider, "order_created", true);
    Ok(payment)
}

/// Capture an approved order and mark its session paid
///
/// A pending session becomes confirmed on capture. If the session is
/// cancelled while the gateway call is in flight, the captured funds are
/// refunded straight away.
///
/// # Errors
///
/// - `ResourceNotFound` for an unknown order
/// - `ResourceConflict` when the order is not open or the session no longer holds its slot
/// - `ExternalServiceError` when the gateway refuses the capture; the order is then failed
#[tracing::instrument(skip(resources, caller), fields(user_id = %caller.user_id))]
pub async fn capture_order(
    resources: &ServerResources,
    caller: &AuthResult,
    order_id: &str,
) -> AppResult<(Payment, Session)> {
    let database = resources.database.as_ref();
    let payment = database
        .get_payment_by_order_id(order_id)
        .await?
        .ok_or_else(|| AppError::not_found("Payment order"))?;
    if payment.user_id != caller.user_id {
        return Err(AppError::forbidden("This payment belongs to another user"));
    }
    if payment.status != PaymentRecordStatus::Created {
        return Err(AppError::conflict(format!(
            "Payment order is already {}",
            payment.status.as_str()
        )));
    }
    let session = database
        .get_session(payment.session_id)
        .await?
        .ok_or_else(|| AppError::not_found("Session"))?;
    if !session.status.holds_slot() {
        return Err(AppError::conflict(format!(
            "Cannot capture payment for a {} session",
            session.status
        )));
    }

    let capture = match resources.payment_gateway.capture_order(order_id).await {
        Ok(capture) => capture,
        Err(e) => {
            database.mark_payment_failed(payment.id).await?;
            AppLogger::log_payment_event(&payment.id.to_string(), &payment.provider, "capture", false);
            return Err(e);
        }
    };

    let (payment, session) = database
        .mark_payment_captured(&payment, &capture.capture_id)
        .await?;
    AppLogger::log_payment_event(&payment.id.to_string(), &payment.provider, "capture", true);

    if !session.status.holds_slot() {
        warn!(
            payment_id = %payment.id,
            session_id = %session.id,
            status = %session.status,
            "Session left its slot during capture, refunding"
        );
        refund(resources, &payment).await?;
        return Err(AppError::conflict(format!(
            "Session was {} during checkout; the payment has been refunded",
            session.status
        )));
    }
    notifications::payment_captured(resources, &session);
    Ok((payment, session))
}

/// Refund the captured payment of a session
///
/// Returns `None` when the session has no captured payment.
///
/// # Errors
///
/// Returns `ExternalServiceError` when the gateway refuses the refund; the
/// payment then stays captured
pub async fn refund_session_payment(
    resources: &ServerResources,
    session: &Session,
) -> AppResult<Option<Payment>> {
    let database = resources.database.as_ref();
    let Some(payment) = database
        .find_session_payment(session.id, PaymentRecordStatus::Captured)
        .await?
    else {
        warn!(session_id = %session.id, "Paid session has no captured payment to refund");
        return Ok(None);
    };
    refund(resources, &payment).await.map(Some)
}

async fn refund(resources: &ServerResources, payment: &Payment) -> AppResult<Payment> {
    let capture_id = payment
        .provider_capture_id
        .as_deref()
        .ok_or_else(|| AppError::internal("Captured payment has no capture ID"))?;

    let result = resources
        .payment_gateway
        .refund_capture(capture_id, payment.amount_cents, &payment.currency)
        .await;
    let refund = match result {
        Ok(refund) => refund,
        Err(e) => {
            AppLogger::log_payment_event(&payment.id.to_string(), &payment.provider, "refund", false);
            return Err(e);
        }
    };

    resources.database.mark_payment_refunded(payment).await?;
    AppLogger::log_payment_event(&payment.id.to_string(), &payment.provider, "refund", true);
    info!(payment_id = %payment.id, refund_id = %refund.refund_id, "Payment refunded");
    resources
        .database
        .get_payment(payment.id)
        .await?
        .ok_or_else(|| AppError::not_found("Payment"))
}

/// Retry the refund of a cancelled session's payment
///
/// # Errors
///
/// Returns `PermissionDenied` for non-admins and `ResourceConflict` unless the
/// payment is captured and its session cancelled
#[tracing::instrument(skip(resources, caller), fields(admin_id = %caller.user_id))]
pub async fn refund_payment(
    resources: &ServerResources,
    caller: &AuthResult,
    payment_id: Uuid,
) -> AppResult<Payment> {
    caller.require_admin()?;
    let database = resources.database.as_ref();
    let payment = database
        .get_payment(payment_id)
        .await?
        .ok_or_else(|| AppError::not_found("Payment"))?;
    if payment.status != PaymentRecordStatus::Captured {
        return Err(AppError::conflict("Only captured payments can be refunded"));
    }
    let session = database
        .get_session(payment.session_id)
        .await?
        .ok_or_else(|| AppError::not_found("Session"))?;
    if session.status != SessionStatus::Cancelled {
        return Err(AppError::conflict("Only payments of cancelled sessions can be refunded"));
    }
    refund(resources, &payment).await
}

/// The caller's payment history
///
/// # Errors
///
/// Returns an error if the query fails
pub async fn list_payments(
    database: &Database,
    caller: &AuthResult,
    page: &PageParams,
) -> AppResult<Page<Payment>> {
    let (payments, total) = database
        .list_payments(caller.user_id, page.limit(), page.offset())
        .await?;
    Ok(Page::new(payments, total, page))
}

/// One payment, visible to its owner and admins
///
/// # Errors
///
/// Returns `ResourceNotFound` or `PermissionDenied`
pub async fn get_payment(database: &Database, caller: &AuthResult, id: Uuid) -> AppResult<Payment> {
    let payment = database
        .get_payment(id)
        .await?
        .ok_or_else(|| AppError::not_found("Payment"))?;
    caller.require_owner_or_admin(payment.user_id)?;
    Ok(payment)
}
