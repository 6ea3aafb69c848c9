// ABOUTME: HTTP integration tests for the admin dashboard and health endpoints
// ABOUTME: Checks analytics counts against seeded data and the public health probes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aura Portal Authors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;
mod helpers;

use common::{admin, create_account, create_test_resources, standard_user, test_app};
use helpers::axum_test::AxumTestRequest;
use portal_core::models::Role;
use serde_json::json;

#[tokio::test]
async fn test_health_endpoint() {
    let resources = create_test_resources().await;

    let body = AxumTestRequest::get("/health")
        .send(test_app(&resources))
        .await
        .expect_json(200);

    assert_eq!(body["status"], "healthy");
    assert!(body["version"].is_string());
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_ready_endpoint_checks_database() {
    let resources = create_test_resources().await;

    let body = AxumTestRequest::get("/ready")
        .send(test_app(&resources))
        .await
        .expect_json(200);

    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_analytics_requires_admin() {
    let resources = create_test_resources().await;
    let (_, token) = standard_user(&resources, "alice").await;
    let app = test_app(&resources);

    let anonymous = AxumTestRequest::get("/api/admin/analytics")
        .send(app.clone())
        .await;
    assert_eq!(anonymous.status(), 401);

    let standard = AxumTestRequest::get("/api/admin/analytics")
        .bearer(&token)
        .send(app)
        .await;
    assert_eq!(standard.status(), 403);
}

#[tokio::test]
async fn test_analytics_counts() {
    let resources = create_test_resources().await;
    let (_, admin_token) = admin(&resources).await;
    let (alice, alice_token) = standard_user(&resources, "alice").await;
    create_account(&resources, "dormant", Role::Standard, false).await;
    let app = test_app(&resources);

    for (subject, priority) in [("One", "low"), ("Two", "high"), ("Three", "high")] {
        AxumTestRequest::post("/api/tickets")
            .bearer(&alice_token)
            .json(&json!({ "subject": subject, "message": "help", "priority": priority }))
            .send(app.clone())
            .await
            .expect_json(201);
    }
    let tickets = AxumTestRequest::get("/api/tickets")
        .bearer(&admin_token)
        .send(app.clone())
        .await
        .expect_json(200);
    let first_id = tickets["tickets"][0]["id"].as_str().unwrap().to_owned();
    AxumTestRequest::patch(&format!("/api/tickets/{first_id}"))
        .bearer(&admin_token)
        .json(&json!({ "status": "resolved" }))
        .send(app.clone())
        .await
        .expect_json(200);

    AxumTestRequest::post("/api/devices")
        .bearer(&admin_token)
        .json(&json!({ "serialNumber": "A-1", "userId": alice.id }))
        .send(app.clone())
        .await
        .expect_json(201);
    AxumTestRequest::post("/api/releases")
        .bearer(&admin_token)
        .json(&json!({
            "version": "2.1.0",
            "fileName": "AuraSetup.exe",
            "platform": "windows",
            "platformLabel": "Windows",
            "isLatest": true
        }))
        .send(app.clone())
        .await
        .expect_json(201);
    for active in [true, false] {
        AxumTestRequest::post("/api/announcements")
            .bearer(&admin_token)
            .json(&json!({ "title": "t", "body": "b", "active": active }))
            .send(app.clone())
            .await
            .expect_json(201);
    }
    for visible in [true, true, false] {
        AxumTestRequest::post("/api/resources")
            .bearer(&admin_token)
            .json(&json!({ "title": "r", "type": "pdf", "visible": visible }))
            .send(app.clone())
            .await
            .expect_json(201);
    }

    let body = AxumTestRequest::get("/api/admin/analytics")
        .bearer(&admin_token)
        .send(app)
        .await
        .expect_json(200);

    assert_eq!(body["users"]["total"], 3);
    assert_eq!(body["users"]["active"], 2);
    assert_eq!(body["tickets"]["total"], 3);
    assert_eq!(body["tickets"]["open"], 2);
    assert_eq!(body["tickets"]["byStatus"]["resolved"], 1);
    assert_eq!(body["tickets"]["byStatus"]["closed"], 0);
    assert_eq!(body["tickets"]["byPriority"]["high"], 2);
    assert_eq!(body["tickets"]["byPriority"]["medium"], 0);
    assert_eq!(body["releases"], 1);
    assert_eq!(body["announcements"], 2);
    assert_eq!(body["activeAnnouncements"], 1);
    assert_eq!(body["devices"], 1);
    assert_eq!(body["visibleResources"], 2);
}
