// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: In-memory database, test app wiring, account fixtures and integration test doubles
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic
)]
//! Shared test utilities for `courtline_server`

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use chrono::{DateTime, DurationRound, Utc};
use courtline_server::{
    auth::AuthManager,
    config::ServerConfig,
    constants::accounts::MIN_BCRYPT_COST,
    database::Database,
    errors::{AppError, AppResult},
    external::{
        CalendarEvent, CalendarSync, EmailSender, GatewayCapture, GatewayOrder, GatewayRefund,
        OrderRequest, OutgoingEmail, PaymentGateway,
    },
    models::{User, UserRole},
    resources::{Integrations, ServerResources},
    server::build_router,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::helpers::axum_test::AxumTestRequest;

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        let _ = tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .try_init();
    });
}

/// Standard test database setup
pub async fn create_test_database() -> Arc<Database> {
    init_test_logging();
    Arc::new(
        Database::new("sqlite::memory:", 1)
            .await
            .expect("in-memory database"),
    )
}

/// Configuration used by every test app
pub fn test_config() -> ServerConfig {
    let mut config = ServerConfig::default();
    config.database.url = "sqlite::memory:".to_owned();
    config.auth.jwt_secret = "courtline-test-secret-0123456789".to_owned();
    config.auth.bcrypt_cost = MIN_BCRYPT_COST;
    config
}

// ============================================================================
// Test doubles
// ============================================================================

/// Gateway that records calls and can be told to fail
#[derive(Default)]
pub struct FakeGateway {
    counter: AtomicU64,
    pub fail_capture: AtomicBool,
    pub fail_refund: AtomicBool,
    pub orders: Mutex<Vec<OrderRequest>>,
    pub refunds: Mutex<Vec<(String, i64)>>,
    /// Session the coach cancels while the next capture is in flight
    pub cancel_during_capture: Mutex<Option<(Arc<Database>, Uuid)>>,
}

impl FakeGateway {
    fn next(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn create_order(&self, request: &OrderRequest) -> AppResult<GatewayOrder> {
        self.orders.lock().unwrap().push(request.clone());
        let order_id = format!("ORDER-{}", self.next());
        Ok(GatewayOrder {
            approval_url: Some(format!("https://pay.test/approve/{order_id}")),
            order_id,
        })
    }

    async fn capture_order(&self, order_id: &str) -> AppResult<GatewayCapture> {
        if self.fail_capture.load(Ordering::SeqCst) {
            return Err(AppError::external_service("FakePay", "capture declined"));
        }
        let cancel = self.cancel_during_capture.lock().unwrap().take();
        if let Some((database, session_id)) = cancel {
            let session = database.get_session(session_id).await?.unwrap();
            database
                .cancel_session(&session, session.coach_id, Some("Court flooded"))
                .await?;
        }
        Ok(GatewayCapture {
            capture_id: format!("CAP-{order_id}"),
        })
    }

    async fn refund_capture(
        &self,
        capture_id: &str,
        amount_cents: i64,
        _currency: &str,
    ) -> AppResult<GatewayRefund> {
        if self.fail_refund.load(Ordering::SeqCst) {
            return Err(AppError::external_service("FakePay", "refund declined"));
        }
        self.refunds
            .lock()
            .unwrap()
            .push((capture_id.to_owned(), amount_cents));
        Ok(GatewayRefund {
            refund_id: format!("REF-{}", self.next()),
        })
    }
}

/// Email sender that keeps every message
#[derive(Default)]
pub struct RecordingEmailSender {
    pub sent: Mutex<Vec<OutgoingEmail>>,
}

#[async_trait]
impl EmailSender for RecordingEmailSender {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn send(&self, email: &OutgoingEmail) -> AppResult<()> {
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

/// Calendar sync that keeps every call
#[derive(Default)]
pub struct RecordingCalendar {
    pub upserts: Mutex<Vec<CalendarEvent>>,
    pub removals: Mutex<Vec<Uuid>>,
}

#[async_trait]
impl CalendarSync for RecordingCalendar {
    async fn upsert_event(&self, event: &CalendarEvent) -> AppResult<()> {
        self.upserts.lock().unwrap().push(event.clone());
        Ok(())
    }

    async fn remove_event(&self, session_id: Uuid) -> AppResult<()> {
        self.removals.lock().unwrap().push(session_id);
        Ok(())
    }
}

// ============================================================================
// Test app
// ============================================================================

/// A fully wired application with observable integrations
pub struct TestApp {
    pub resources: Arc<ServerResources>,
    pub gateway: Arc<FakeGateway>,
    pub email: Arc<RecordingEmailSender>,
    pub calendar: Arc<RecordingCalendar>,
}

/// An account with a valid token
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub token: String,
}

impl TestApp {
    /// Build an app with the default test configuration
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    /// Build an app with a custom configuration
    pub async fn with_config(config: ServerConfig) -> Self {
        init_test_logging();
        let database = Database::new(&config.database.url, 1)
            .await
            .expect("in-memory database");
        let auth_manager = AuthManager::new(
            config.auth.jwt_secret.as_bytes(),
            config.auth.jwt_expiry_hours,
            config.auth.bcrypt_cost,
        );

        let gateway = Arc::new(FakeGateway::default());
        let email = Arc::new(RecordingEmailSender::default());
        let calendar = Arc::new(RecordingCalendar::default());
        let integrations = Integrations {
            payment_gateway: gateway.clone(),
            email_sender: email.clone(),
            calendar: calendar.clone(),
        };

        let resources = Arc::new(ServerResources::new(
            database,
            auth_manager,
            Arc::new(config),
            integrations,
        ));
        Self {
            resources,
            gateway,
            email,
            calendar,
        }
    }

    /// The application router with its middleware
    pub fn router(&self) -> Router {
        build_router(&self.resources)
    }

    /// Register an account through the API
    pub async fn register(&self, role: UserRole) -> TestUser {
        let email = format!("{}-{}@courtline.test", role.as_str(), Uuid::new_v4().simple());
        let response = AxumTestRequest::post("/api/auth/register")
            .json(&json!({
                "email": email,
                "password": "correct-horse-battery",
                "display_name": format!("Test {}", role.as_str()),
                "role": role.as_str(),
            }))
            .send(self.router())
            .await;
        assert_eq!(response.status(), 201, "registration failed");
        let body: Value = response.json();
        TestUser {
            id: body["user"]["id"].as_str().unwrap().parse().unwrap(),
            email,
            token: body["token"].as_str().unwrap().to_owned(),
        }
    }

    /// Create an admin directly in the database; registration refuses the role
    pub async fn create_admin(&self) -> TestUser {
        let email = format!("admin-{}@courtline.test", Uuid::new_v4().simple());
        let hash = self
            .resources
            .auth_manager
            .hash_password("correct-horse-battery")
            .await
            .unwrap();
        let user = User::new(&email, hash, "Admin".to_owned(), UserRole::Admin);
        self.resources.database.create_user(&user).await.unwrap();
        let token = self.resources.auth_manager.generate_token(&user).unwrap();
        TestUser {
            id: user.id,
            email,
            token: token.token,
        }
    }

    /// Create a booking type for `coach` and return its ID
    pub async fn create_booking_type(&self, coach: &TestUser, price_cents: i64) -> Uuid {
        let response = AxumTestRequest::post("/api/booking-types")
            .bearer(&coach.token)
            .json(&json!({
                "name": "Private lesson",
                "duration_minutes": 60,
                "base_price_cents": price_cents,
            }))
            .send(self.router())
            .await;
        assert_eq!(response.status(), 201, "booking type creation failed");
        let body: Value = response.json();
        body["id"].as_str().unwrap().parse().unwrap()
    }

    /// Create a one hour slot starting `hours_from_now` hours ahead
    pub async fn create_slot(&self, coach: &TestUser, hours_from_now: i64) -> Uuid {
        let starts_at = hours_ahead(hours_from_now);
        let response = AxumTestRequest::post("/api/time-slots")
            .bearer(&coach.token)
            .json(&json!({
                "starts_at": starts_at,
                "ends_at": starts_at + chrono::Duration::hours(1),
            }))
            .send(self.router())
            .await;
        assert_eq!(response.status(), 201, "slot creation failed");
        let body: Value = response.json();
        body["id"].as_str().unwrap().parse().unwrap()
    }

    /// Book `slot_id` with `booking_type_id` and return the raw response body
    pub async fn book(&self, user: &TestUser, slot_id: Uuid, booking_type_id: Uuid) -> Value {
        let response = AxumTestRequest::post("/api/sessions")
            .bearer(&user.token)
            .json(&json!({
                "time_slot_id": slot_id,
                "booking_type_id": booking_type_id,
            }))
            .send(self.router())
            .await;
        assert_eq!(response.status(), 201, "booking failed");
        response.json()
    }
}

/// A whole hour `hours` from now
pub fn hours_ahead(hours: i64) -> DateTime<Utc> {
    (Utc::now() + chrono::Duration::hours(hours))
        .duration_trunc(chrono::Duration::hours(1))
        .unwrap()
}

/// Poll `condition` until it holds or a second passes
pub async fn wait_until<F: Fn() -> bool>(condition: F) -> bool {
    for _ in 0..100 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
