// ABOUTME: Integration tests for booking types, time slots and the session lifecycle
// ABOUTME: Covers booking rules, double booking, pending caps, discounts and cancellation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;
mod helpers;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{hours_ahead, test_config, wait_until, TestApp};
use courtline_server::database::NewBooking;
use courtline_server::models::{TimeSlot, UserRole};
use helpers::axum_test::AxumTestRequest;
use serde_json::{json, Value};
use uuid::Uuid;

#[tokio::test]
async fn test_booking_type_validation_and_ownership() {
    let app = TestApp::new().await;
    let coach = app.register(UserRole::Coach).await;
    let other_coach = app.register(UserRole::Coach).await;
    let user = app.register(UserRole::User).await;

    AxumTestRequest::post("/api/booking-types")
        .bearer(&user.token)
        .json(&json!({ "name": "Lesson", "duration_minutes": 60, "base_price_cents": 100 }))
        .send(app.router())
        .await
        .assert_status(StatusCode::FORBIDDEN);

    AxumTestRequest::post("/api/booking-types")
        .bearer(&coach.token)
        .json(&json!({ "name": "Marathon", "duration_minutes": 600, "base_price_cents": 100 }))
        .send(app.router())
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let code = AxumTestRequest::post("/api/booking-types")
        .bearer(&coach.token)
        .json(&json!({
            "name": "Gold plated",
            "duration_minutes": 60,
            "base_price_cents": 1_000_000_000_000_000_000_i64,
        }))
        .send(app.router())
        .await
        .assert_status(StatusCode::BAD_REQUEST)
        .error_code();
    assert_eq!(code, "VALUE_OUT_OF_RANGE");

    let id = app.create_booking_type(&coach, 5000).await;

    AxumTestRequest::put(&format!("/api/booking-types/{id}"))
        .bearer(&other_coach.token)
        .json(&json!({ "base_price_cents": 1 }))
        .send(app.router())
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let updated: Value = AxumTestRequest::put(&format!("/api/booking-types/{id}"))
        .bearer(&coach.token)
        .json(&json!({ "base_price_cents": 5500 }))
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(updated["base_price_cents"], 5500);

    AxumTestRequest::delete(&format!("/api/booking-types/{id}"))
        .bearer(&coach.token)
        .send(app.router())
        .await
        .assert_status(StatusCode::OK);

    let listed: Value = AxumTestRequest::get(&format!("/api/coaches/{}/booking-types", coach.id))
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert!(listed.as_array().unwrap().is_empty());

    let kept: Value = AxumTestRequest::get(&format!("/api/booking-types/{id}"))
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(kept["is_active"], false);
}

#[tokio::test]
async fn test_time_slot_overlap_and_bulk_rules() {
    let app = TestApp::new().await;
    let coach = app.register(UserRole::Coach).await;
    let start = hours_ahead(24);

    app.create_slot(&coach, 24).await;

    AxumTestRequest::post("/api/time-slots")
        .bearer(&coach.token)
        .json(&json!({
            "starts_at": start + Duration::minutes(30),
            "ends_at": start + Duration::minutes(90),
        }))
        .send(app.router())
        .await
        .assert_status(StatusCode::CONFLICT);

    AxumTestRequest::post("/api/time-slots")
        .bearer(&coach.token)
        .json(&json!({ "starts_at": start + Duration::hours(5), "ends_at": start + Duration::hours(4) }))
        .send(app.router())
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    AxumTestRequest::post("/api/time-slots")
        .bearer(&coach.token)
        .json(&json!({ "starts_at": Utc::now() - Duration::hours(2), "ends_at": Utc::now() - Duration::hours(1) }))
        .send(app.router())
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    // Overlapping each other: nothing is created
    AxumTestRequest::post("/api/time-slots/bulk")
        .bearer(&coach.token)
        .json(&json!({ "slots": [
            { "starts_at": start + Duration::hours(2), "ends_at": start + Duration::hours(3) },
            { "starts_at": start + Duration::minutes(150), "ends_at": start + Duration::hours(4) },
        ]}))
        .send(app.router())
        .await
        .assert_status(StatusCode::CONFLICT);

    let created: Value = AxumTestRequest::post("/api/time-slots/bulk")
        .bearer(&coach.token)
        .json(&json!({ "slots": [
            { "starts_at": start + Duration::hours(2), "ends_at": start + Duration::hours(3) },
            { "starts_at": start + Duration::hours(3), "ends_at": start + Duration::hours(4) },
        ]}))
        .send(app.router())
        .await
        .assert_status(StatusCode::CREATED)
        .json();
    assert_eq!(created.as_array().unwrap().len(), 2);

    let listed: Value = AxumTestRequest::get(&format!("/api/coaches/{}/time-slots", coach.id))
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(listed.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_book_session_happy_path() {
    let app = TestApp::new().await;
    let coach = app.register(UserRole::Coach).await;
    let user = app.register(UserRole::User).await;
    let booking_type = app.create_booking_type(&coach, 6000).await;
    let slot = app.create_slot(&coach, 48).await;

    let session = app.book(&user, slot, booking_type).await;
    assert_eq!(session["status"], "pending");
    assert_eq!(session["payment_status"], "unpaid");
    assert_eq!(session["price_cents"], 6000);
    assert_eq!(session["coach_id"], coach.id.to_string());

    let available: Value = AxumTestRequest::get(&format!(
        "/api/coaches/{}/time-slots?available_only=true",
        coach.id
    ))
    .send(app.router())
    .await
    .assert_status(StatusCode::OK)
    .json();
    assert!(available.as_array().unwrap().is_empty());

    let coach_email = coach.email.clone();
    assert!(
        wait_until(|| app
            .email
            .sent
            .lock()
            .unwrap()
            .iter()
            .any(|e| e.to == coach_email))
        .await
    );

    let listed: Value = AxumTestRequest::get("/api/sessions")
        .bearer(&coach.token)
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(listed["total"], 1);
}

#[tokio::test]
async fn test_double_booking_is_rejected() {
    let app = TestApp::new().await;
    let coach = app.register(UserRole::Coach).await;
    let first = app.register(UserRole::User).await;
    let second = app.register(UserRole::User).await;
    let booking_type = app.create_booking_type(&coach, 6000).await;
    let slot = app.create_slot(&coach, 48).await;

    app.book(&first, slot, booking_type).await;

    let code = AxumTestRequest::post("/api/sessions")
        .bearer(&second.token)
        .json(&json!({ "time_slot_id": slot, "booking_type_id": booking_type }))
        .send(app.router())
        .await
        .assert_status(StatusCode::CONFLICT)
        .error_code();
    assert_eq!(code, "RESOURCE_CONFLICT");
}

#[tokio::test]
async fn test_booking_rule_order() {
    let app = TestApp::new().await;
    let coach = app.register(UserRole::Coach).await;
    let other_coach = app.register(UserRole::Coach).await;
    let user = app.register(UserRole::User).await;
    let booking_type = app.create_booking_type(&coach, 6000).await;
    let other_slot = app.create_slot(&other_coach, 30).await;

    // Neither offering given
    AxumTestRequest::post("/api/sessions")
        .bearer(&user.token)
        .json(&json!({ "time_slot_id": other_slot }))
        .send(app.router())
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    // Unknown booking type
    AxumTestRequest::post("/api/sessions")
        .bearer(&user.token)
        .json(&json!({ "time_slot_id": other_slot, "booking_type_id": Uuid::new_v4() }))
        .send(app.router())
        .await
        .assert_status(StatusCode::NOT_FOUND);

    // Slot belongs to someone else
    AxumTestRequest::post("/api/sessions")
        .bearer(&user.token)
        .json(&json!({ "time_slot_id": other_slot, "booking_type_id": booking_type }))
        .send(app.router())
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    // Coaches cannot book
    let slot = app.create_slot(&coach, 30).await;
    AxumTestRequest::post("/api/sessions")
        .bearer(&other_coach.token)
        .json(&json!({ "time_slot_id": slot, "booking_type_id": booking_type }))
        .send(app.router())
        .await
        .assert_status(StatusCode::FORBIDDEN);

    // Manually blocked slot
    AxumTestRequest::put(&format!("/api/time-slots/{slot}/availability"))
        .bearer(&coach.token)
        .json(&json!({ "is_available": false }))
        .send(app.router())
        .await
        .assert_status(StatusCode::OK);
    AxumTestRequest::post("/api/sessions")
        .bearer(&user.token)
        .json(&json!({ "time_slot_id": slot, "booking_type_id": booking_type }))
        .send(app.router())
        .await
        .assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_minimum_lead_time_is_enforced() {
    let mut config = test_config();
    config.booking.min_lead_minutes = 120;
    let app = TestApp::with_config(config).await;
    let coach = app.register(UserRole::Coach).await;
    let user = app.register(UserRole::User).await;
    let booking_type = app.create_booking_type(&coach, 6000).await;

    // Slot created before the lead time was raised
    let starts_at = Utc::now() + Duration::minutes(30);
    let slot = TimeSlot {
        id: Uuid::new_v4(),
        coach_id: coach.id,
        starts_at,
        ends_at: starts_at + Duration::hours(1),
        is_available: true,
        created_at: Utc::now(),
    };
    app.resources
        .database
        .create_time_slots(std::slice::from_ref(&slot))
        .await
        .unwrap();

    let code = AxumTestRequest::post("/api/sessions")
        .bearer(&user.token)
        .json(&json!({ "time_slot_id": slot.id, "booking_type_id": booking_type }))
        .send(app.router())
        .await
        .assert_status(StatusCode::BAD_REQUEST)
        .error_code();
    assert_eq!(code, "VALUE_OUT_OF_RANGE");
}

#[tokio::test]
async fn test_pending_booking_cap() {
    let mut config = test_config();
    config.booking.max_pending_bookings = 2;
    let app = TestApp::with_config(config).await;
    let coach = app.register(UserRole::Coach).await;
    let user = app.register(UserRole::User).await;
    let booking_type = app.create_booking_type(&coach, 6000).await;

    for hours in [24, 26] {
        let slot = app.create_slot(&coach, hours).await;
        app.book(&user, slot, booking_type).await;
    }

    let slot = app.create_slot(&coach, 28).await;
    let code = AxumTestRequest::post("/api/sessions")
        .bearer(&user.token)
        .json(&json!({ "time_slot_id": slot, "booking_type_id": booking_type }))
        .send(app.router())
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY)
        .error_code();
    assert_eq!(code, "LIMIT_EXCEEDED");
}

#[tokio::test]
async fn test_confirm_complete_and_cancel() {
    let app = TestApp::new().await;
    let coach = app.register(UserRole::Coach).await;
    let user = app.register(UserRole::User).await;
    let booking_type = app.create_booking_type(&coach, 0).await;
    let slot = app.create_slot(&coach, 24).await;
    let session = app.book(&user, slot, booking_type).await;
    let id = session["id"].as_str().unwrap().to_owned();

    AxumTestRequest::post(&format!("/api/sessions/{id}/confirm"))
        .bearer(&user.token)
        .send(app.router())
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let confirmed: Value = AxumTestRequest::post(&format!("/api/sessions/{id}/confirm"))
        .bearer(&coach.token)
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(confirmed["status"], "confirmed");
    assert!(wait_until(|| !app.calendar.upserts.lock().unwrap().is_empty()).await);

    AxumTestRequest::post(&format!("/api/sessions/{id}/confirm"))
        .bearer(&coach.token)
        .send(app.router())
        .await
        .assert_status(StatusCode::CONFLICT);

    // Slot is tomorrow
    AxumTestRequest::post(&format!("/api/sessions/{id}/complete"))
        .bearer(&coach.token)
        .send(app.router())
        .await
        .assert_status(StatusCode::CONFLICT);

    let cancelled: Value = AxumTestRequest::post(&format!("/api/sessions/{id}/cancel"))
        .bearer(&user.token)
        .json(&json!({ "reason": "Rain forecast" }))
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(cancelled["status"], "cancelled");
    assert_eq!(cancelled["cancelled_by"], user.id.to_string());
    assert_eq!(cancelled["cancellation_reason"], "Rain forecast");

    let session_id: Uuid = id.parse().unwrap();
    assert!(wait_until(|| app.calendar.removals.lock().unwrap().contains(&session_id)).await);

    AxumTestRequest::post(&format!("/api/sessions/{id}/cancel"))
        .bearer(&coach.token)
        .send(app.router())
        .await
        .assert_status(StatusCode::CONFLICT);

    // Released slot can be booked again
    let again = app.book(&user, slot, booking_type).await;
    assert_eq!(again["status"], "pending");
}

#[tokio::test]
async fn test_past_session_can_be_completed() {
    let app = TestApp::new().await;
    let coach = app.register(UserRole::Coach).await;
    let user = app.register(UserRole::User).await;
    let booking_type = app.create_booking_type(&coach, 0).await;
    let slot = app.create_slot(&coach, 24).await;
    let booked = app.book(&user, slot, booking_type).await;
    let template: Uuid = booked["id"].as_str().unwrap().parse().unwrap();
    let database = &app.resources.database;

    // A slot that already started, booked straight through the database
    let starts_at = Utc::now() - Duration::hours(2);
    let past = TimeSlot {
        id: Uuid::new_v4(),
        coach_id: coach.id,
        starts_at,
        ends_at: starts_at + Duration::hours(1),
        is_available: true,
        created_at: Utc::now(),
    };
    database
        .create_time_slots(std::slice::from_ref(&past))
        .await
        .unwrap();

    let mut session = database.get_session(template).await.unwrap().unwrap();
    session.id = Uuid::new_v4();
    session.time_slot_id = past.id;
    session.starts_at = past.starts_at;
    session.ends_at = past.ends_at;
    let past_session = database
        .create_booking(&NewBooking {
            session,
            max_pending_bookings: 10,
            earliest_start: Utc::now() - Duration::days(1),
        })
        .await
        .unwrap();

    AxumTestRequest::post(&format!("/api/sessions/{}/confirm", past_session.id))
        .bearer(&coach.token)
        .send(app.router())
        .await
        .assert_status(StatusCode::OK);

    AxumTestRequest::post(&format!("/api/sessions/{}/complete", past_session.id))
        .bearer(&user.token)
        .send(app.router())
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let completed: Value =
        AxumTestRequest::post(&format!("/api/sessions/{}/complete", past_session.id))
            .bearer(&coach.token)
            .send(app.router())
            .await
            .assert_status(StatusCode::OK)
            .json();
    assert_eq!(completed["status"], "completed");

    AxumTestRequest::post(&format!("/api/sessions/{}/cancel", past_session.id))
        .bearer(&user.token)
        .send(app.router())
        .await
        .assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_sessions_are_private_to_participants() {
    let app = TestApp::new().await;
    let coach = app.register(UserRole::Coach).await;
    let user = app.register(UserRole::User).await;
    let stranger = app.register(UserRole::User).await;
    let admin = app.create_admin().await;
    let booking_type = app.create_booking_type(&coach, 0).await;
    let slot = app.create_slot(&coach, 24).await;
    let session = app.book(&user, slot, booking_type).await;
    let id = session["id"].as_str().unwrap();

    AxumTestRequest::get(&format!("/api/sessions/{id}"))
        .bearer(&stranger.token)
        .send(app.router())
        .await
        .assert_status(StatusCode::FORBIDDEN);

    AxumTestRequest::get(&format!("/api/sessions/{id}"))
        .bearer(&admin.token)
        .send(app.router())
        .await
        .assert_status(StatusCode::OK);

    let mine: Value = AxumTestRequest::get("/api/sessions?status=pending")
        .bearer(&stranger.token)
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(mine["total"], 0);

    let all: Value = AxumTestRequest::get("/api/sessions")
        .bearer(&admin.token)
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(all["total"], 1);
}

#[tokio::test]
async fn test_booked_slot_cannot_be_deleted_or_reopened() {
    let app = TestApp::new().await;
    let coach = app.register(UserRole::Coach).await;
    let user = app.register(UserRole::User).await;
    let booking_type = app.create_booking_type(&coach, 0).await;
    let slot = app.create_slot(&coach, 24).await;
    app.book(&user, slot, booking_type).await;

    AxumTestRequest::delete(&format!("/api/time-slots/{slot}"))
        .bearer(&coach.token)
        .send(app.router())
        .await
        .assert_status(StatusCode::CONFLICT);

    AxumTestRequest::put(&format!("/api/time-slots/{slot}/availability"))
        .bearer(&coach.token)
        .json(&json!({ "is_available": true }))
        .send(app.router())
        .await
        .assert_status(StatusCode::CONFLICT);

    let free = app.create_slot(&coach, 30).await;
    AxumTestRequest::delete(&format!("/api/time-slots/{free}"))
        .bearer(&coach.token)
        .send(app.router())
        .await
        .assert_status(StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_discount_codes_apply_and_guard_deletion() {
    let app = TestApp::new().await;
    let coach = app.register(UserRole::Coach).await;
    let user = app.register(UserRole::User).await;
    let booking_type = app.create_booking_type(&coach, 6000).await;

    let discount: Value = AxumTestRequest::post("/api/discounts")
        .bearer(&coach.token)
        .json(&json!({ "code": "spring20", "kind": "percentage", "value": 20, "max_uses": 1 }))
        .send(app.router())
        .await
        .assert_status(StatusCode::CREATED)
        .json();
    assert_eq!(discount["code"], "SPRING20");
    let discount_id = discount["id"].as_str().unwrap().to_owned();

    AxumTestRequest::post("/api/discounts")
        .bearer(&coach.token)
        .json(&json!({ "code": "SPRING20", "kind": "fixed_amount", "value": 500 }))
        .send(app.router())
        .await
        .assert_status(StatusCode::CONFLICT);

    AxumTestRequest::post("/api/discounts")
        .bearer(&coach.token)
        .json(&json!({ "code": "HUGE", "kind": "percentage", "value": 150 }))
        .send(app.router())
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let quote: Value = AxumTestRequest::get(&format!(
        "/api/discounts/quote?code=spring20&booking_type_id={booking_type}"
    ))
    .bearer(&user.token)
    .send(app.router())
    .await
    .assert_status(StatusCode::OK)
    .json();
    assert_eq!(quote["base_price_cents"], 6000);
    assert_eq!(quote["discount_amount_cents"], 1200);
    assert_eq!(quote["final_price_cents"], 4800);

    // Quotes preview a player's booking price
    AxumTestRequest::get(&format!(
        "/api/discounts/quote?code=spring20&booking_type_id={booking_type}"
    ))
    .bearer(&coach.token)
    .send(app.router())
    .await
    .assert_status(StatusCode::FORBIDDEN);

    let slot = app.create_slot(&coach, 24).await;
    let session: Value = AxumTestRequest::post("/api/sessions")
        .bearer(&user.token)
        .json(&json!({
            "time_slot_id": slot,
            "booking_type_id": booking_type,
            "discount_code": "Spring20",
        }))
        .send(app.router())
        .await
        .assert_status(StatusCode::CREATED)
        .json();
    assert_eq!(session["price_cents"], 4800);
    assert_eq!(session["discount_amount_cents"], 1200);

    // Single use exhausted
    let slot = app.create_slot(&coach, 26).await;
    AxumTestRequest::post("/api/sessions")
        .bearer(&user.token)
        .json(&json!({
            "time_slot_id": slot,
            "booking_type_id": booking_type,
            "discount_code": "SPRING20",
        }))
        .send(app.router())
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    AxumTestRequest::delete(&format!("/api/discounts/{discount_id}"))
        .bearer(&coach.token)
        .send(app.router())
        .await
        .assert_status(StatusCode::CONFLICT);

    let deactivated: Value =
        AxumTestRequest::put(&format!("/api/discounts/{discount_id}/deactivate"))
            .bearer(&coach.token)
            .send(app.router())
            .await
            .assert_status(StatusCode::OK)
            .json();
    assert_eq!(deactivated["is_active"], false);

    // Unknown code for this coach
    AxumTestRequest::get(&format!(
        "/api/discounts/quote?code=NOPE&booking_type_id={booking_type}"
    ))
    .bearer(&user.token)
    .send(app.router())
    .await
    .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unused_discount_can_be_deleted() {
    let app = TestApp::new().await;
    let coach = app.register(UserRole::Coach).await;

    let discount: Value = AxumTestRequest::post("/api/discounts")
        .bearer(&coach.token)
        .json(&json!({ "code": "WELCOME", "kind": "fixed_amount", "value": 1000 }))
        .send(app.router())
        .await
        .assert_status(StatusCode::CREATED)
        .json();

    AxumTestRequest::delete(&format!("/api/discounts/{}", discount["id"].as_str().unwrap()))
        .bearer(&coach.token)
        .send(app.router())
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let list: Value = AxumTestRequest::get("/api/discounts")
        .bearer(&coach.token)
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert!(list.as_array().unwrap().is_empty());
}
