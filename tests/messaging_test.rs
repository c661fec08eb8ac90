// ABOUTME: Integration tests for coach and player conversations and custom service offers
// ABOUTME: Covers participant rules, read tracking and booking an offered custom service
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;
mod helpers;

use axum::http::StatusCode;
use common::{TestApp, TestUser};
use courtline_server::models::UserRole;
use helpers::axum_test::AxumTestRequest;
use serde_json::{json, Value};

async fn start(app: &TestApp, caller: &TestUser, participant: &TestUser) -> String {
    let conversation: Value = AxumTestRequest::post("/api/conversations")
        .bearer(&caller.token)
        .json(&json!({ "participant_id": participant.id }))
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    conversation["id"].as_str().unwrap().to_owned()
}

async fn unread(app: &TestApp, who: &TestUser) -> i64 {
    let body: Value = AxumTestRequest::get("/api/conversations/unread-count")
        .bearer(&who.token)
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    body["unread_count"].as_i64().unwrap()
}

#[tokio::test]
async fn test_conversation_is_shared_between_both_sides() {
    let app = TestApp::new().await;
    let coach = app.register(UserRole::Coach).await;
    let user = app.register(UserRole::User).await;

    let from_user = start(&app, &user, &coach).await;
    let from_coach = start(&app, &coach, &user).await;
    assert_eq!(from_user, from_coach);

    let other_user = app.register(UserRole::User).await;
    AxumTestRequest::post("/api/conversations")
        .bearer(&user.token)
        .json(&json!({ "participant_id": other_user.id }))
        .send(app.router())
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    AxumTestRequest::post("/api/conversations")
        .bearer(&user.token)
        .json(&json!({ "participant_id": uuid::Uuid::new_v4() }))
        .send(app.router())
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_messages_and_unread_tracking() {
    let app = TestApp::new().await;
    let coach = app.register(UserRole::Coach).await;
    let user = app.register(UserRole::User).await;
    let conversation = start(&app, &user, &coach).await;

    for text in ["Hi coach", "  Can we work on my serve?  "] {
        AxumTestRequest::post(&format!("/api/conversations/{conversation}/messages"))
            .bearer(&user.token)
            .json(&json!({ "content": text }))
            .send(app.router())
            .await
            .assert_status(StatusCode::CREATED);
    }

    AxumTestRequest::post(&format!("/api/conversations/{conversation}/messages"))
        .bearer(&user.token)
        .json(&json!({ "content": "   " }))
        .send(app.router())
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    AxumTestRequest::post(&format!("/api/conversations/{conversation}/messages"))
        .bearer(&user.token)
        .json(&json!({ "content": "x".repeat(2001) }))
        .send(app.router())
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    assert_eq!(unread(&app, &coach).await, 2);
    assert_eq!(unread(&app, &user).await, 0);

    let summaries: Value = AxumTestRequest::get("/api/conversations")
        .bearer(&coach.token)
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(summaries[0]["participant_id"], user.id.to_string());
    assert_eq!(summaries[0]["unread_count"], 2);

    let page: Value = AxumTestRequest::get(&format!("/api/conversations/{conversation}/messages"))
        .bearer(&coach.token)
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(page["total"], 2);
    assert_eq!(page["items"][0]["content"], "Hi coach");
    assert_eq!(page["items"][1]["content"], "Can we work on my serve?");
    assert_eq!(unread(&app, &coach).await, 0);

    // Latest message only
    let newest: Value =
        AxumTestRequest::get(&format!("/api/conversations/{conversation}/messages?limit=1"))
            .bearer(&coach.token)
            .send(app.router())
            .await
            .assert_status(StatusCode::OK)
            .json();
    assert_eq!(newest["items"].as_array().unwrap().len(), 1);
    assert_eq!(newest["items"][0]["content"], "Can we work on my serve?");
}

#[tokio::test]
async fn test_outsiders_cannot_read_conversations() {
    let app = TestApp::new().await;
    let coach = app.register(UserRole::Coach).await;
    let user = app.register(UserRole::User).await;
    let outsider = app.register(UserRole::User).await;
    let conversation = start(&app, &user, &coach).await;

    AxumTestRequest::get(&format!("/api/conversations/{conversation}/messages"))
        .bearer(&outsider.token)
        .send(app.router())
        .await
        .assert_status(StatusCode::FORBIDDEN);

    AxumTestRequest::post(&format!("/api/conversations/{conversation}/messages"))
        .bearer(&outsider.token)
        .json(&json!({ "content": "hello?" }))
        .send(app.router())
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_custom_service_offer_and_booking() {
    let app = TestApp::new().await;
    let coach = app.register(UserRole::Coach).await;
    let user = app.register(UserRole::User).await;
    let other_user = app.register(UserRole::User).await;

    let service: Value = AxumTestRequest::post("/api/custom-services")
        .bearer(&coach.token)
        .json(&json!({
            "name": "Match play analysis",
            "duration_minutes": 90,
            "price_cents": 9050,
        }))
        .send(app.router())
        .await
        .assert_status(StatusCode::CREATED)
        .json();
    let service_id = service["id"].as_str().unwrap().to_owned();

    let slot = app.create_slot(&coach, 24).await;

    // Not offered to this player yet
    AxumTestRequest::post("/api/sessions")
        .bearer(&user.token)
        .json(&json!({ "time_slot_id": slot, "custom_service_id": service_id }))
        .send(app.router())
        .await
        .assert_status(StatusCode::FORBIDDEN);

    AxumTestRequest::post(&format!("/api/custom-services/{service_id}/send"))
        .bearer(&user.token)
        .json(&json!({ "user_id": user.id }))
        .send(app.router())
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let sent: Value = AxumTestRequest::post(&format!("/api/custom-services/{service_id}/send"))
        .bearer(&coach.token)
        .json(&json!({ "user_id": user.id }))
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(sent["newly_offered"], true);
    assert_eq!(sent["message"]["kind"], "custom_service_offer");
    assert_eq!(sent["message"]["content"], "Match play analysis (90 min, 90.50)");

    let resent: Value = AxumTestRequest::post(&format!("/api/custom-services/{service_id}/send"))
        .bearer(&coach.token)
        .json(&json!({ "user_id": user.id }))
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(resent["newly_offered"], false);
    assert_eq!(resent["conversation_id"], sent["conversation_id"]);

    let offers: Value = AxumTestRequest::get("/api/custom-services/offers")
        .bearer(&user.token)
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(offers.as_array().unwrap().len(), 1);

    let none: Value = AxumTestRequest::get("/api/custom-services/offers")
        .bearer(&other_user.token)
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert!(none.as_array().unwrap().is_empty());

    let session: Value = AxumTestRequest::post("/api/sessions")
        .bearer(&user.token)
        .json(&json!({ "time_slot_id": slot, "custom_service_id": service_id }))
        .send(app.router())
        .await
        .assert_status(StatusCode::CREATED)
        .json();
    assert_eq!(session["price_cents"], 9050);
    assert_eq!(session["custom_service_id"], service_id);

    AxumTestRequest::post("/api/sessions")
        .bearer(&other_user.token)
        .json(&json!({
            "time_slot_id": app.create_slot(&coach, 30).await,
            "custom_service_id": service_id,
        }))
        .send(app.router())
        .await
        .assert_status(StatusCode::FORBIDDEN);

    // Deleted services can no longer be sent
    AxumTestRequest::delete(&format!("/api/custom-services/{service_id}"))
        .bearer(&coach.token)
        .send(app.router())
        .await
        .assert_status(StatusCode::NO_CONTENT);
    AxumTestRequest::post(&format!("/api/custom-services/{service_id}/send"))
        .bearer(&coach.token)
        .json(&json!({ "user_id": other_user.id }))
        .send(app.router())
        .await
        .assert_status(StatusCode::CONFLICT);
}
