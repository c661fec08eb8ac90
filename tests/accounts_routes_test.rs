// ABOUTME: Integration tests for registration, login, profiles and account administration
// ABOUTME: Drives the auth, users, coaches and admin routers through the full middleware stack
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;
mod helpers;

use axum::http::StatusCode;
use common::{test_config, TestApp};
use courtline_server::models::UserRole;
use helpers::axum_test::AxumTestRequest;
use serde_json::{json, Value};

#[tokio::test]
async fn test_register_returns_user_and_token() {
    let app = TestApp::new().await;
    let response = AxumTestRequest::post("/api/auth/register")
        .json(&json!({
            "email": "Serena@Example.com",
            "password": "ace-serve-123",
            "display_name": "Serena",
        }))
        .send(app.router())
        .await
        .assert_status(StatusCode::CREATED);

    let body: Value = response.json();
    assert_eq!(body["user"]["role"], "user");
    assert!(body["user"].get("password_hash").is_none());
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert!(body["expires_at"].is_string());
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let mut config = test_config();
    config.http.max_body_bytes = 256;
    let app = TestApp::with_config(config).await;

    AxumTestRequest::post("/api/auth/register")
        .json(&json!({
            "email": "bulky@example.com",
            "password": "ace-serve-123",
            "display_name": "x".repeat(1024),
        }))
        .send(app.router())
        .await
        .assert_status(StatusCode::PAYLOAD_TOO_LARGE);

    AxumTestRequest::post("/api/auth/register")
        .json(&json!({
            "email": "slim@example.com",
            "password": "ace-serve-123",
            "display_name": "Slim",
        }))
        .send(app.router())
        .await
        .assert_status(StatusCode::CREATED);
}

#[tokio::test]
async fn test_register_rejects_admin_role_and_weak_input() {
    let app = TestApp::new().await;

    let code = AxumTestRequest::post("/api/auth/register")
        .json(&json!({
            "email": "root@example.com",
            "password": "long-enough-pw",
            "display_name": "Root",
            "role": "admin",
        }))
        .send(app.router())
        .await
        .assert_status(StatusCode::BAD_REQUEST)
        .error_code();
    assert_eq!(code, "INVALID_INPUT");

    AxumTestRequest::post("/api/auth/register")
        .json(&json!({
            "email": "short@example.com",
            "password": "short",
            "display_name": "Short",
        }))
        .send(app.router())
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    AxumTestRequest::post("/api/auth/register")
        .json(&json!({
            "email": "not-an-email",
            "password": "long-enough-pw",
            "display_name": "Nobody",
        }))
        .send(app.router())
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_duplicate_email_conflicts() {
    let app = TestApp::new().await;
    let user = app.register(UserRole::User).await;

    AxumTestRequest::post("/api/auth/register")
        .json(&json!({
            "email": user.email,
            "password": "another-password",
            "display_name": "Twin",
        }))
        .send(app.router())
        .await
        .assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_login_and_refresh() {
    let app = TestApp::new().await;
    let user = app.register(UserRole::User).await;

    AxumTestRequest::post("/api/auth/login")
        .json(&json!({ "email": user.email, "password": "wrong-password" }))
        .send(app.router())
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    let body: Value = AxumTestRequest::post("/api/auth/login")
        .json(&json!({ "email": user.email, "password": "correct-horse-battery" }))
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    let token = body["token"].as_str().unwrap().to_owned();

    AxumTestRequest::post("/api/auth/refresh")
        .bearer(&token)
        .send(app.router())
        .await
        .assert_status(StatusCode::OK);

    AxumTestRequest::post("/api/auth/refresh")
        .send(app.router())
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_invalid_token_is_rejected() {
    let app = TestApp::new().await;
    let code = AxumTestRequest::get("/api/users/me")
        .bearer("not-a-jwt")
        .send(app.router())
        .await
        .assert_status(StatusCode::UNAUTHORIZED)
        .error_code();
    assert!(code.starts_with("AUTH_"));
}

#[tokio::test]
async fn test_profile_update_limits_coach_fields() {
    let app = TestApp::new().await;
    let user = app.register(UserRole::User).await;
    let coach = app.register(UserRole::Coach).await;

    AxumTestRequest::put("/api/users/me")
        .bearer(&user.token)
        .json(&json!({ "hourly_rate_cents": 5000 }))
        .send(app.router())
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let body: Value = AxumTestRequest::put("/api/users/me")
        .bearer(&coach.token)
        .json(&json!({
            "display_name": "Coach Rafa",
            "bio": "Clay court specialist",
            "hourly_rate_cents": 8000,
        }))
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(body["display_name"], "Coach Rafa");
    assert_eq!(body["hourly_rate_cents"], 8000);

    let me: Value = AxumTestRequest::get("/api/users/me")
        .bearer(&coach.token)
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(me["bio"], "Clay court specialist");
}

#[tokio::test]
async fn test_coach_directory_is_public() {
    let app = TestApp::new().await;
    let coach = app.register(UserRole::Coach).await;
    app.register(UserRole::User).await;
    app.create_booking_type(&coach, 6000).await;

    let list: Value = AxumTestRequest::get("/api/coaches")
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(list["total"], 1);
    assert_eq!(list["items"][0]["id"], coach.id.to_string());

    let profile: Value = AxumTestRequest::get(&format!("/api/coaches/{}", coach.id))
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(profile["booking_types"].as_array().unwrap().len(), 1);

    AxumTestRequest::get("/api/coaches/not-a-uuid")
        .send(app.router())
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_can_deactivate_accounts() {
    let app = TestApp::new().await;
    let admin = app.create_admin().await;
    let user = app.register(UserRole::User).await;

    AxumTestRequest::get("/api/admin/users")
        .bearer(&user.token)
        .send(app.router())
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let users: Value = AxumTestRequest::get("/api/admin/users?role=user")
        .bearer(&admin.token)
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(users["total"], 1);

    AxumTestRequest::put(&format!("/api/admin/users/{}/status", admin.id))
        .bearer(&admin.token)
        .json(&json!({ "is_active": false }))
        .send(app.router())
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    AxumTestRequest::put(&format!("/api/admin/users/{}/status", user.id))
        .bearer(&admin.token)
        .json(&json!({ "is_active": false }))
        .send(app.router())
        .await
        .assert_status(StatusCode::OK);

    AxumTestRequest::get("/api/users/me")
        .bearer(&user.token)
        .send(app.router())
        .await
        .assert_status(StatusCode::FORBIDDEN);

    AxumTestRequest::post("/api/auth/login")
        .json(&json!({ "email": user.email, "password": "correct-horse-battery" }))
        .send(app.router())
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_health_and_request_id() {
    let app = TestApp::new().await;
    let response = AxumTestRequest::get("/health").send(app.router()).await;
    assert_eq!(response.status(), 200);
    assert!(response
        .header("x-request-id")
        .is_some_and(|id| id.starts_with("req_")));
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");

    let response = AxumTestRequest::get("/ready")
        .header("x-request-id", "client-supplied")
        .send(app.router())
        .await;
    assert_eq!(response.status(), 200);
    assert_eq!(response.header("x-request-id"), Some("client-supplied"));
}
