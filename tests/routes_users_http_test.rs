// ABOUTME: HTTP integration tests for account and profile routes
// ABOUTME: Covers admin account management, self-protection rules and profile password changes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aura Portal Authors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;
mod helpers;

use common::{admin, create_test_resources, standard_user, test_app, TEST_PASSWORD};
use helpers::axum_test::AxumTestRequest;
use serde_json::json;

#[tokio::test]
async fn test_admin_creates_account_with_defaults() {
    let resources = create_test_resources().await;
    let (admin, token) = admin(&resources).await;

    let body = AxumTestRequest::post("/api/users")
        .bearer(&token)
        .json(&json!({ "name": "Bob", "username": "Bob", "password": "secret1" }))
        .send(test_app(&resources))
        .await
        .expect_json(201);

    assert_eq!(body["user"]["username"], "bob");
    assert_eq!(body["user"]["role"], "standard");
    assert_eq!(body["user"]["isActive"], true);
    assert_eq!(body["user"]["createdBy"], admin.id);
    assert!(body["user"].get("passwordHash").is_none());
}

#[tokio::test]
async fn test_created_account_can_log_in() {
    let resources = create_test_resources().await;
    let (_, token) = admin(&resources).await;
    let app = test_app(&resources);

    AxumTestRequest::post("/api/users")
        .bearer(&token)
        .json(&json!({ "name": "Bob", "username": "bob", "password": "secret1" }))
        .send(app.clone())
        .await
        .expect_json(201);

    let response = AxumTestRequest::post("/api/auth/login")
        .json(&json!({ "username": "bob", "password": "secret1" }))
        .send(app)
        .await;
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_create_account_validation() {
    let resources = create_test_resources().await;
    let (_, token) = admin(&resources).await;
    let app = test_app(&resources);

    let missing = AxumTestRequest::post("/api/users")
        .bearer(&token)
        .json(&json!({ "username": "bob", "password": "secret1" }))
        .send(app.clone())
        .await
        .expect_json(400);
    assert_eq!(missing["code"], "MISSING_REQUIRED_FIELD");

    let short_password = AxumTestRequest::post("/api/users")
        .bearer(&token)
        .json(&json!({ "name": "Bob", "username": "bob", "password": "123" }))
        .send(app.clone())
        .await
        .expect_json(400);
    assert_eq!(short_password["code"], "INVALID_INPUT");

    let bad_handle = AxumTestRequest::post("/api/users")
        .bearer(&token)
        .json(&json!({ "name": "Bob", "username": "b", "password": "secret1" }))
        .send(app)
        .await
        .expect_json(400);
    assert_eq!(bad_handle["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_duplicate_username_conflicts() {
    let resources = create_test_resources().await;
    let (_, token) = admin(&resources).await;
    standard_user(&resources, "bob").await;

    let body = AxumTestRequest::post("/api/users")
        .bearer(&token)
        .json(&json!({ "name": "Other Bob", "username": "BOB", "password": "secret1" }))
        .send(test_app(&resources))
        .await
        .expect_json(409);

    assert_eq!(body["code"], "RESOURCE_ALREADY_EXISTS");
}

#[tokio::test]
async fn test_list_users_includes_creator() {
    let resources = create_test_resources().await;
    let (admin, token) = admin(&resources).await;
    let app = test_app(&resources);

    AxumTestRequest::post("/api/users")
        .bearer(&token)
        .json(&json!({ "name": "Bob", "username": "bob", "password": "secret1" }))
        .send(app.clone())
        .await
        .expect_json(201);

    let body = AxumTestRequest::get("/api/users")
        .bearer(&token)
        .send(app)
        .await
        .expect_json(200);

    let users = body["users"].as_array().unwrap();
    assert_eq!(users.len(), 2);
    let bob = users.iter().find(|u| u["username"] == "bob").unwrap();
    assert_eq!(bob["creator"]["id"], admin.id);
    assert_eq!(bob["creator"]["username"], "admin");
    assert!(bob.get("passwordHash").is_none());
}

#[tokio::test]
async fn test_admin_updates_account_role() {
    let resources = create_test_resources().await;
    let (_, token) = admin(&resources).await;
    let (bob, _) = standard_user(&resources, "bob").await;

    let body = AxumTestRequest::patch(&format!("/api/users/{}", bob.id))
        .bearer(&token)
        .json(&json!({ "role": "admin", "name": "Robert" }))
        .send(test_app(&resources))
        .await
        .expect_json(200);

    assert_eq!(body["user"]["role"], "admin");
    assert_eq!(body["user"]["name"], "Robert");
    assert_eq!(body["user"]["username"], "bob");
}

#[tokio::test]
async fn test_update_unknown_account_is_not_found() {
    let resources = create_test_resources().await;
    let (_, token) = admin(&resources).await;

    let response = AxumTestRequest::patch("/api/users/does-not-exist")
        .bearer(&token)
        .json(&json!({ "name": "Ghost" }))
        .send(test_app(&resources))
        .await;

    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_activate_toggles_and_sets() {
    let resources = create_test_resources().await;
    let (_, token) = admin(&resources).await;
    let (bob, _) = standard_user(&resources, "bob").await;
    let app = test_app(&resources);
    let uri = format!("/api/users/{}/activate", bob.id);

    let toggled = AxumTestRequest::patch(&uri)
        .bearer(&token)
        .send(app.clone())
        .await
        .expect_json(200);
    assert_eq!(toggled["user"]["isActive"], false);

    let set = AxumTestRequest::patch(&uri)
        .bearer(&token)
        .json(&json!({ "isActive": true }))
        .send(app.clone())
        .await
        .expect_json(200);
    assert_eq!(set["user"]["isActive"], true);

    let again = AxumTestRequest::patch(&uri)
        .bearer(&token)
        .json(&json!({ "isActive": true }))
        .send(app)
        .await
        .expect_json(200);
    assert_eq!(again["user"]["isActive"], true);
}

#[tokio::test]
async fn test_deactivated_account_cannot_log_in() {
    let resources = create_test_resources().await;
    let (_, token) = admin(&resources).await;
    let (bob, _) = standard_user(&resources, "bob").await;
    let app = test_app(&resources);

    AxumTestRequest::patch(&format!("/api/users/{}/activate", bob.id))
        .bearer(&token)
        .json(&json!({ "isActive": false }))
        .send(app.clone())
        .await
        .expect_json(200);

    let body = AxumTestRequest::post("/api/auth/login")
        .json(&json!({ "username": "bob", "password": TEST_PASSWORD }))
        .send(app)
        .await
        .expect_json(403);
    assert_eq!(body["code"], "ACCOUNT_INACTIVE");
}

#[tokio::test]
async fn test_admin_cannot_deactivate_or_delete_self() {
    let resources = create_test_resources().await;
    let (admin, token) = admin(&resources).await;
    let app = test_app(&resources);

    let deactivate = AxumTestRequest::patch(&format!("/api/users/{}/activate", admin.id))
        .bearer(&token)
        .json(&json!({ "isActive": false }))
        .send(app.clone())
        .await;
    assert_eq!(deactivate.status(), 400);

    let delete = AxumTestRequest::delete(&format!("/api/users/{}", admin.id))
        .bearer(&token)
        .send(app)
        .await;
    assert_eq!(delete.status(), 400);
}

#[tokio::test]
async fn test_admin_cannot_deactivate_self_through_update() {
    let resources = create_test_resources().await;
    let (admin, token) = admin(&resources).await;
    let app = test_app(&resources);
    let uri = format!("/api/users/{}", admin.id);

    let body = AxumTestRequest::patch(&uri)
        .bearer(&token)
        .json(&json!({ "isActive": false }))
        .send(app.clone())
        .await
        .expect_json(400);
    assert_eq!(body["code"], "INVALID_INPUT");

    let me = AxumTestRequest::get("/api/users/me")
        .bearer(&token)
        .send(app.clone())
        .await
        .expect_json(200);
    assert_eq!(me["user"]["isActive"], true);

    let renamed = AxumTestRequest::patch(&uri)
        .bearer(&token)
        .json(&json!({ "name": "Head Admin", "isActive": true }))
        .send(app)
        .await
        .expect_json(200);
    assert_eq!(renamed["user"]["name"], "Head Admin");
}

#[tokio::test]
async fn test_activate_rejects_malformed_body() {
    let resources = create_test_resources().await;
    let (_, token) = admin(&resources).await;
    let (bob, _) = standard_user(&resources, "bob").await;
    let app = test_app(&resources);
    let uri = format!("/api/users/{}/activate", bob.id);

    let wrong_type = AxumTestRequest::patch(&uri)
        .bearer(&token)
        .json(&json!({ "isActive": "no" }))
        .send(app.clone())
        .await
        .expect_json(400);
    assert_eq!(wrong_type["code"], "INVALID_INPUT");

    let broken = AxumTestRequest::patch(&uri)
        .bearer(&token)
        .raw_json("{\"isActive\": ")
        .send(app.clone())
        .await
        .expect_json(400);
    assert_eq!(broken["code"], "INVALID_INPUT");

    let account = resources.database.get_account(&bob.id).await.unwrap().unwrap();
    assert!(account.is_active);

    let toggled = AxumTestRequest::patch(&uri)
        .bearer(&token)
        .raw_json("")
        .send(app)
        .await
        .expect_json(200);
    assert_eq!(toggled["user"]["isActive"], false);
}

#[tokio::test]
async fn test_delete_account() {
    let resources = create_test_resources().await;
    let (_, token) = admin(&resources).await;
    let (bob, _) = standard_user(&resources, "bob").await;
    let app = test_app(&resources);
    let uri = format!("/api/users/{}", bob.id);

    let body = AxumTestRequest::delete(&uri)
        .bearer(&token)
        .send(app.clone())
        .await
        .expect_json(200);
    assert_eq!(body["message"], "User deleted");

    let again = AxumTestRequest::delete(&uri).bearer(&token).send(app).await;
    assert_eq!(again.status(), 404);
}

#[tokio::test]
async fn test_standard_user_cannot_manage_accounts() {
    let resources = create_test_resources().await;
    let (alice, token) = standard_user(&resources, "alice").await;
    let app = test_app(&resources);

    let create = AxumTestRequest::post("/api/users")
        .bearer(&token)
        .json(&json!({ "name": "Eve", "username": "eve", "password": "secret1" }))
        .send(app.clone())
        .await;
    assert_eq!(create.status(), 403);

    let promote = AxumTestRequest::patch(&format!("/api/users/{}", alice.id))
        .bearer(&token)
        .json(&json!({ "role": "admin" }))
        .send(app)
        .await;
    assert_eq!(promote.status(), 403);
}

// ============================================================================
// /api/users/me
// ============================================================================

#[tokio::test]
async fn test_update_own_name() {
    let resources = create_test_resources().await;
    let (_, token) = standard_user(&resources, "alice").await;

    let body = AxumTestRequest::patch("/api/users/me")
        .bearer(&token)
        .json(&json!({ "name": "Alice Liddell" }))
        .send(test_app(&resources))
        .await
        .expect_json(200);

    assert_eq!(body["user"]["name"], "Alice Liddell");
    assert_eq!(body["user"]["role"], "standard");
}

#[tokio::test]
async fn test_change_own_password_requires_current() {
    let resources = create_test_resources().await;
    let (_, token) = standard_user(&resources, "alice").await;
    let app = test_app(&resources);

    let missing = AxumTestRequest::patch("/api/users/me")
        .bearer(&token)
        .json(&json!({ "password": "new-secret" }))
        .send(app.clone())
        .await;
    assert_eq!(missing.status(), 400);

    let wrong = AxumTestRequest::patch("/api/users/me")
        .bearer(&token)
        .json(&json!({ "password": "new-secret", "currentPassword": "nope-nope" }))
        .send(app.clone())
        .await
        .expect_json(401);
    assert_eq!(wrong["code"], "INVALID_CREDENTIALS");

    AxumTestRequest::patch("/api/users/me")
        .bearer(&token)
        .json(&json!({ "password": "new-secret", "currentPassword": TEST_PASSWORD }))
        .send(app.clone())
        .await
        .expect_json(200);

    let old = AxumTestRequest::post("/api/auth/login")
        .json(&json!({ "username": "alice", "password": TEST_PASSWORD }))
        .send(app.clone())
        .await;
    assert_eq!(old.status(), 401);

    let new = AxumTestRequest::post("/api/auth/login")
        .json(&json!({ "username": "alice", "password": "new-secret" }))
        .send(app)
        .await;
    assert_eq!(new.status(), 200);
}

#[tokio::test]
async fn test_profile_update_ignores_role() {
    let resources = create_test_resources().await;
    let (_, token) = standard_user(&resources, "alice").await;

    let body = AxumTestRequest::patch("/api/users/me")
        .bearer(&token)
        .json(&json!({ "role": "admin", "isActive": false }))
        .send(test_app(&resources))
        .await
        .expect_json(200);

    assert_eq!(body["user"]["role"], "standard");
    assert_eq!(body["user"]["isActive"], true);
}
