// ABOUTME: HTTP integration tests for announcements, learning resources and settings
// ABOUTME: Covers publication windows, visibility flags, admin previews and settings upserts
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aura Portal Authors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;
mod helpers;

use axum::Router;
use chrono::{Duration, SecondsFormat, Utc};
use common::{admin, create_test_resources, standard_user, test_app};
use helpers::axum_test::AxumTestRequest;
use serde_json::{json, Value};

fn rfc3339(offset: Duration) -> String {
    (Utc::now() + offset).to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn titles(body: &Value, key: &str) -> Vec<String> {
    body[key]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["title"].as_str().unwrap().to_owned())
        .collect()
}

async fn post_announcement(app: &Router, token: &str, payload: Value) -> Value {
    AxumTestRequest::post("/api/announcements")
        .bearer(token)
        .json(&payload)
        .send(app.clone())
        .await
        .expect_json(201)["announcement"]
        .clone()
}

async fn seed_announcements(app: &Router, token: &str) {
    post_announcement(app, token, json!({ "title": "Live", "body": "b" })).await;
    post_announcement(app, token, json!({ "title": "Switched off", "body": "b", "active": false })).await;
    post_announcement(
        app,
        token,
        json!({ "title": "Scheduled", "body": "b", "startAt": rfc3339(Duration::days(1)) }),
    )
    .await;
    post_announcement(
        app,
        token,
        json!({ "title": "Expired", "body": "b", "endAt": rfc3339(Duration::days(-1)) }),
    )
    .await;
    post_announcement(
        app,
        token,
        json!({
            "title": "Windowed",
            "body": "b",
            "type": "maintenance",
            "startAt": rfc3339(Duration::hours(-1)),
            "endAt": rfc3339(Duration::hours(1))
        }),
    )
    .await;
}

// ============================================================================
// Announcements
// ============================================================================

#[tokio::test]
async fn test_announcement_defaults() {
    let resources = create_test_resources().await;
    let (_, token) = admin(&resources).await;

    let announcement =
        post_announcement(&test_app(&resources), &token, json!({ "title": "Hello", "body": "World" }))
            .await;

    assert_eq!(announcement["type"], "news");
    assert_eq!(announcement["active"], true);
    assert!(announcement["startAt"].is_null());
    assert!(announcement["endAt"].is_null());
}

#[tokio::test]
async fn test_public_sees_only_published_announcements() {
    let resources = create_test_resources().await;
    let (_, admin_token) = admin(&resources).await;
    let (_, user_token) = standard_user(&resources, "alice").await;
    let app = test_app(&resources);
    seed_announcements(&app, &admin_token).await;

    let anonymous = AxumTestRequest::get("/api/announcements")
        .send(app.clone())
        .await
        .expect_json(200);
    let mut visible = titles(&anonymous, "announcements");
    visible.sort();
    assert_eq!(visible, vec!["Live", "Windowed"]);

    let user = AxumTestRequest::get("/api/announcements?active=false")
        .bearer(&user_token)
        .send(app)
        .await
        .expect_json(200);
    let mut visible = titles(&user, "announcements");
    visible.sort();
    assert_eq!(visible, vec!["Live", "Windowed"]);
}

#[tokio::test]
async fn test_admin_sees_all_announcements_unless_previewing() {
    let resources = create_test_resources().await;
    let (_, token) = admin(&resources).await;
    let app = test_app(&resources);
    seed_announcements(&app, &token).await;

    let all = AxumTestRequest::get("/api/announcements")
        .bearer(&token)
        .send(app.clone())
        .await
        .expect_json(200);
    assert_eq!(all["announcements"].as_array().unwrap().len(), 5);

    let preview = AxumTestRequest::get("/api/announcements?active=true")
        .bearer(&token)
        .send(app)
        .await
        .expect_json(200);
    assert_eq!(preview["announcements"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_announcement_window_must_be_ordered() {
    let resources = create_test_resources().await;
    let (_, token) = admin(&resources).await;
    let app = test_app(&resources);

    let inverted = AxumTestRequest::post("/api/announcements")
        .bearer(&token)
        .json(&json!({
            "title": "Backwards",
            "body": "b",
            "startAt": rfc3339(Duration::days(2)),
            "endAt": rfc3339(Duration::days(1))
        }))
        .send(app.clone())
        .await;
    assert_eq!(inverted.status(), 400);

    let created = post_announcement(
        &app,
        &token,
        json!({ "title": "Ok", "body": "b", "endAt": rfc3339(Duration::days(1)) }),
    )
    .await;
    let uri = format!("/api/announcements/{}", created["id"].as_str().unwrap());

    let bad_patch = AxumTestRequest::patch(&uri)
        .bearer(&token)
        .json(&json!({ "startAt": rfc3339(Duration::days(3)) }))
        .send(app.clone())
        .await;
    assert_eq!(bad_patch.status(), 400);

    let cleared = AxumTestRequest::patch(&uri)
        .bearer(&token)
        .json(&json!({ "endAt": null, "startAt": rfc3339(Duration::days(3)) }))
        .send(app)
        .await
        .expect_json(200);
    assert!(cleared["announcement"]["endAt"].is_null());
    assert!(cleared["announcement"]["startAt"].is_string());
}

#[tokio::test]
async fn test_deactivated_announcement_disappears_for_users() {
    let resources = create_test_resources().await;
    let (_, token) = admin(&resources).await;
    let app = test_app(&resources);

    let created = post_announcement(&app, &token, json!({ "title": "Live", "body": "b" })).await;
    AxumTestRequest::patch(&format!("/api/announcements/{}", created["id"].as_str().unwrap()))
        .bearer(&token)
        .json(&json!({ "active": false }))
        .send(app.clone())
        .await
        .expect_json(200);

    let body = AxumTestRequest::get("/api/announcements")
        .send(app)
        .await
        .expect_json(200);
    assert!(body["announcements"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_standard_user_cannot_post_announcements() {
    let resources = create_test_resources().await;
    let (_, token) = standard_user(&resources, "alice").await;

    let response = AxumTestRequest::post("/api/announcements")
        .bearer(&token)
        .json(&json!({ "title": "Spam", "body": "b" }))
        .send(test_app(&resources))
        .await;

    assert_eq!(response.status(), 403);
}

#[tokio::test]
async fn test_delete_announcement() {
    let resources = create_test_resources().await;
    let (_, token) = admin(&resources).await;
    let app = test_app(&resources);

    let created = post_announcement(&app, &token, json!({ "title": "Live", "body": "b" })).await;
    let uri = format!("/api/announcements/{}", created["id"].as_str().unwrap());

    let body = AxumTestRequest::delete(&uri)
        .bearer(&token)
        .send(app.clone())
        .await
        .expect_json(200);
    assert_eq!(body["message"], "Announcement deleted");

    let again = AxumTestRequest::delete(&uri).bearer(&token).send(app).await;
    assert_eq!(again.status(), 404);
}

// ============================================================================
// Learning resources
// ============================================================================

async fn post_resource(app: &Router, token: &str, payload: Value) -> Value {
    AxumTestRequest::post("/api/resources")
        .bearer(token)
        .json(&payload)
        .send(app.clone())
        .await
        .expect_json(201)["resource"]
        .clone()
}

#[tokio::test]
async fn test_resources_sorted_and_filtered_by_visibility() {
    let resources = create_test_resources().await;
    let (_, token) = admin(&resources).await;
    let app = test_app(&resources);

    post_resource(&app, &token, json!({ "title": "Third", "type": "video", "order": 3 })).await;
    post_resource(&app, &token, json!({ "title": "First", "type": "pdf", "order": 1 })).await;
    post_resource(
        &app,
        &token,
        json!({ "title": "Hidden", "type": "link", "order": 2, "visible": false }),
    )
    .await;

    let public = AxumTestRequest::get("/api/resources")
        .send(app.clone())
        .await
        .expect_json(200);
    assert_eq!(titles(&public, "resources"), vec!["First", "Third"]);

    let admin_view = AxumTestRequest::get("/api/resources")
        .bearer(&token)
        .send(app.clone())
        .await
        .expect_json(200);
    assert_eq!(titles(&admin_view, "resources"), vec!["First", "Hidden", "Third"]);

    let admin_preview = AxumTestRequest::get("/api/resources?visible=true")
        .bearer(&token)
        .send(app)
        .await
        .expect_json(200);
    assert_eq!(titles(&admin_preview, "resources"), vec!["First", "Third"]);
}

#[tokio::test]
async fn test_resource_requires_title_and_type() {
    let resources = create_test_resources().await;
    let (_, token) = admin(&resources).await;
    let app = test_app(&resources);

    let no_type = AxumTestRequest::post("/api/resources")
        .bearer(&token)
        .json(&json!({ "title": "Manual" }))
        .send(app.clone())
        .await
        .expect_json(400);
    assert_eq!(no_type["code"], "MISSING_REQUIRED_FIELD");

    let bad_type = AxumTestRequest::post("/api/resources")
        .bearer(&token)
        .json(&json!({ "title": "Manual", "type": "hologram" }))
        .send(app)
        .await;
    assert_eq!(bad_type.status(), 400);
}

#[tokio::test]
async fn test_resource_update_and_delete() {
    let resources = create_test_resources().await;
    let (_, token) = admin(&resources).await;
    let (_, user_token) = standard_user(&resources, "alice").await;
    let app = test_app(&resources);

    let created = post_resource(
        &app,
        &token,
        json!({ "title": "Setup guide", "type": "video", "level": "Beginner", "duration": "12:30" }),
    )
    .await;
    assert_eq!(created["order"], 0);
    assert_eq!(created["visible"], true);
    let uri = format!("/api/resources/{}", created["id"].as_str().unwrap());

    let denied = AxumTestRequest::patch(&uri)
        .bearer(&user_token)
        .json(&json!({ "visible": false }))
        .send(app.clone())
        .await;
    assert_eq!(denied.status(), 403);

    let updated = AxumTestRequest::patch(&uri)
        .bearer(&token)
        .json(&json!({ "visible": false, "order": 7 }))
        .send(app.clone())
        .await
        .expect_json(200);
    assert_eq!(updated["resource"]["visible"], false);
    assert_eq!(updated["resource"]["order"], 7);
    assert_eq!(updated["resource"]["level"], "Beginner");

    let body = AxumTestRequest::delete(&uri)
        .bearer(&token)
        .send(app)
        .await
        .expect_json(200);
    assert_eq!(body["message"], "Resource deleted");
}

// ============================================================================
// Settings
// ============================================================================

#[tokio::test]
async fn test_setting_upsert_and_public_read() {
    let resources = create_test_resources().await;
    let (_, token) = admin(&resources).await;
    let app = test_app(&resources);

    let created = AxumTestRequest::post("/api/settings")
        .bearer(&token)
        .json(&json!({
            "key": "support_email",
            "value": "help@example.com",
            "description": "Where tickets escalate"
        }))
        .send(app.clone())
        .await
        .expect_json(200);
    assert_eq!(created["setting"]["value"], "help@example.com");

    let replaced = AxumTestRequest::post("/api/settings")
        .bearer(&token)
        .json(&json!({ "key": "support_email", "value": { "primary": "ops@example.com" } }))
        .send(app.clone())
        .await
        .expect_json(200);
    assert_eq!(replaced["setting"]["value"]["primary"], "ops@example.com");
    assert_eq!(replaced["setting"]["description"], "Where tickets escalate");

    let public = AxumTestRequest::get("/api/settings/support_email")
        .send(app.clone())
        .await
        .expect_json(200);
    assert_eq!(public["setting"]["value"]["primary"], "ops@example.com");

    let missing = AxumTestRequest::get("/api/settings/nope").send(app).await;
    assert_eq!(missing.status(), 404);
}

#[tokio::test]
async fn test_settings_listing_is_admin_only() {
    let resources = create_test_resources().await;
    let (_, token) = admin(&resources).await;
    let (_, user_token) = standard_user(&resources, "alice").await;
    let app = test_app(&resources);

    for key in ["b_key", "a_key"] {
        AxumTestRequest::post("/api/settings")
            .bearer(&token)
            .json(&json!({ "key": key, "value": true }))
            .send(app.clone())
            .await
            .expect_json(200);
    }

    let listing = AxumTestRequest::get("/api/settings")
        .bearer(&token)
        .send(app.clone())
        .await
        .expect_json(200);
    let keys: Vec<&str> = listing["settings"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["key"].as_str().unwrap())
        .collect();
    assert_eq!(keys, vec!["a_key", "b_key"]);

    let denied = AxumTestRequest::get("/api/settings")
        .bearer(&user_token)
        .send(app.clone())
        .await;
    assert_eq!(denied.status(), 403);

    let write = AxumTestRequest::post("/api/settings")
        .bearer(&user_token)
        .json(&json!({ "key": "a_key", "value": false }))
        .send(app)
        .await;
    assert_eq!(write.status(), 403);
}

#[tokio::test]
async fn test_setting_update_and_delete() {
    let resources = create_test_resources().await;
    let (_, token) = admin(&resources).await;
    let app = test_app(&resources);

    let missing_value = AxumTestRequest::post("/api/settings")
        .bearer(&token)
        .json(&json!({ "key": "maintenance" }))
        .send(app.clone())
        .await
        .expect_json(400);
    assert_eq!(missing_value["code"], "MISSING_REQUIRED_FIELD");

    let unknown = AxumTestRequest::patch("/api/settings/maintenance")
        .bearer(&token)
        .json(&json!({ "value": true }))
        .send(app.clone())
        .await;
    assert_eq!(unknown.status(), 404);

    AxumTestRequest::post("/api/settings")
        .bearer(&token)
        .json(&json!({ "key": "maintenance", "value": false }))
        .send(app.clone())
        .await
        .expect_json(200);

    let updated = AxumTestRequest::patch("/api/settings/maintenance")
        .bearer(&token)
        .json(&json!({ "value": true, "description": "Show the banner" }))
        .send(app.clone())
        .await
        .expect_json(200);
    assert_eq!(updated["setting"]["value"], true);
    assert_eq!(updated["setting"]["description"], "Show the banner");

    let body = AxumTestRequest::delete("/api/settings/maintenance")
        .bearer(&token)
        .send(app.clone())
        .await
        .expect_json(200);
    assert_eq!(body["message"], "Setting deleted");

    let gone = AxumTestRequest::get("/api/settings/maintenance").send(app).await;
    assert_eq!(gone.status(), 404);
}
