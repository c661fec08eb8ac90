// ABOUTME: Integration tests for the coach, player and platform dashboards
// ABOUTME: Checks role gating, parameter bounds and the aggregate figures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;
mod helpers;

use axum::http::StatusCode;
use common::TestApp;
use courtline_server::models::UserRole;
use helpers::axum_test::AxumTestRequest;
use serde_json::{json, Value};

fn status_count(dashboard: &Value, status: &str) -> i64 {
    dashboard["sessions_by_status"]
        .as_array()
        .unwrap()
        .iter()
        .find(|entry| entry["status"] == status)
        .and_then(|entry| entry["count"].as_i64())
        .unwrap()
}

#[tokio::test]
async fn test_dashboards_are_role_gated() {
    let app = TestApp::new().await;
    let coach = app.register(UserRole::Coach).await;
    let user = app.register(UserRole::User).await;

    AxumTestRequest::get("/api/analytics/coach")
        .bearer(&user.token)
        .send(app.router())
        .await
        .assert_status(StatusCode::FORBIDDEN);
    AxumTestRequest::get("/api/analytics/user")
        .bearer(&coach.token)
        .send(app.router())
        .await
        .assert_status(StatusCode::FORBIDDEN);
    AxumTestRequest::get("/api/analytics/platform")
        .bearer(&coach.token)
        .send(app.router())
        .await
        .assert_status(StatusCode::FORBIDDEN);
    AxumTestRequest::get("/api/analytics/user")
        .send(app.router())
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_revenue_window_bounds() {
    let app = TestApp::new().await;
    let coach = app.register(UserRole::Coach).await;

    for months in [0, 25] {
        AxumTestRequest::get(&format!("/api/analytics/coach?months={months}"))
            .bearer(&coach.token)
            .send(app.router())
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    let default_window: Value = AxumTestRequest::get("/api/analytics/coach")
        .bearer(&coach.token)
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(default_window["monthly_revenue"].as_array().unwrap().len(), 6);

    let year: Value = AxumTestRequest::get("/api/analytics/coach?months=12")
        .bearer(&coach.token)
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(year["monthly_revenue"].as_array().unwrap().len(), 12);
}

#[tokio::test]
async fn test_dashboard_figures() {
    let app = TestApp::new().await;
    let admin = app.create_admin().await;
    let coach = app.register(UserRole::Coach).await;
    let user = app.register(UserRole::User).await;
    let booking_type = app.create_booking_type(&coach, 6000).await;

    // One paid session and one pending
    let paid_slot = app.create_slot(&coach, 24).await;
    let paid = app.book(&user, paid_slot, booking_type).await;
    let order: Value = AxumTestRequest::post("/api/payments/orders")
        .bearer(&user.token)
        .json(&json!({ "session_id": paid["id"] }))
        .send(app.router())
        .await
        .assert_status(StatusCode::CREATED)
        .json();
    let order_id = order["payment"]["provider_order_id"].as_str().unwrap();
    AxumTestRequest::post(&format!("/api/payments/orders/{order_id}/capture"))
        .bearer(&user.token)
        .send(app.router())
        .await
        .assert_status(StatusCode::OK);

    let pending_slot = app.create_slot(&coach, 48).await;
    app.book(&user, pending_slot, booking_type).await;

    let coach_view: Value = AxumTestRequest::get("/api/analytics/coach")
        .bearer(&coach.token)
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(coach_view["total_revenue_cents"], 6000);
    assert_eq!(coach_view["upcoming_sessions"], 1);
    assert_eq!(coach_view["distinct_clients"], 1);
    assert_eq!(status_count(&coach_view, "confirmed"), 1);
    assert_eq!(status_count(&coach_view, "pending"), 1);
    assert_eq!(status_count(&coach_view, "cancelled"), 0);
    assert_eq!(coach_view["top_booking_types"][0]["session_count"], 2);
    let months = coach_view["monthly_revenue"].as_array().unwrap();
    assert_eq!(months.last().unwrap()["revenue_cents"], 6000);

    let user_view: Value = AxumTestRequest::get("/api/analytics/user")
        .bearer(&user.token)
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(user_view["total_spent_cents"], 6000);
    assert_eq!(user_view["distinct_coaches"], 1);
    assert_eq!(user_view["next_session"]["id"], paid["id"]);

    let platform: Value = AxumTestRequest::get("/api/analytics/platform")
        .bearer(&admin.token)
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(platform["gross_revenue_cents"], 6000);
    let roles = platform["users_by_role"].as_array().unwrap();
    for role in ["user", "coach", "admin"] {
        let count = roles.iter().find(|r| r["role"] == role).unwrap()["count"].clone();
        assert_eq!(count, 1, "role {role}");
    }
}
