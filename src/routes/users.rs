// ABOUTME: Account routes for self-service profile and admin account management
// ABOUTME: Profile read/update for any principal, list/create/update/activate/delete for admins
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aura Portal Authors

use super::{created, deleted, ok, optional_text, required_text, JsonBody};
use crate::credentials::{hash_password, verify_password};
use crate::database::{AccountUpdate, CreatorSummary, NewAccount};
use crate::resources::ServerResources;
use axum::{
    body::Bytes,
    extract::{Json, Path, State},
    http::HeaderMap,
    response::Response,
    routing::{get, patch},
    Router,
};
use axum_extra::extract::WithRejection;
use chrono::{DateTime, Utc};
use portal_core::{
    errors::{AppError, AppResult},
    models::{normalize_username, validate_password, validate_username, Account, Role},
    permissions::Capability,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Public view of an account; never carries the password hash
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    /// Account id
    pub id: String,
    /// Display name
    pub name: String,
    /// Handle
    pub username: String,
    /// Role
    pub role: Role,
    /// Whether the account may log in
    pub is_active: bool,
    /// Id of the creating admin
    pub created_by: Option<String>,
    /// Creating admin, populated in admin listings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator: Option<CreatorSummary>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl From<&Account> for AccountView {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id.clone(),
            name: account.name.clone(),
            username: account.username.clone(),
            role: account.role,
            is_active: account.is_active,
            created_by: account.created_by.clone(),
            creator: None,
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
struct UserEnvelope {
    user: AccountView,
}

impl UserEnvelope {
    fn of(account: &Account) -> Self {
        Self {
            user: AccountView::from(account),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateProfileBody {
    name: Option<String>,
    password: Option<String>,
    current_password: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateAccountBody {
    name: Option<String>,
    username: Option<String>,
    password: Option<String>,
    role: Option<Role>,
    is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateAccountBody {
    name: Option<String>,
    username: Option<String>,
    password: Option<String>,
    role: Option<Role>,
    is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActivateBody {
    is_active: Option<bool>,
}

/// An empty body means "toggle"; anything else must be a valid `ActivateBody`
fn parse_activate_body(body: &[u8]) -> AppResult<ActivateBody> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ActivateBody::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| AppError::invalid_input(format!("Invalid request body: {e}")))
}

/// Account routes
pub struct UserRoutes;

impl UserRoutes {
    /// Create all account routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/users/me",
                get(Self::handle_get_me).patch(Self::handle_update_me),
            )
            .route(
                "/api/users",
                get(Self::handle_list).post(Self::handle_create),
            )
            .route(
                "/api/users/:id",
                patch(Self::handle_update).delete(Self::handle_delete),
            )
            .route("/api/users/:id/activate", patch(Self::handle_activate))
            .with_state(resources)
    }

    async fn load_account(resources: &ServerResources, id: &str) -> AppResult<Account> {
        resources
            .database
            .get_account(id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))
    }

    /// Handle GET /api/users/me
    async fn handle_get_me(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let principal = resources
            .gate
            .authorize(&headers, Capability::ReadOwnProfile)?;
        let account = Self::load_account(&resources, &principal.id).await?;
        Ok(ok(UserEnvelope::of(&account)))
    }

    /// Handle PATCH /api/users/me
    async fn handle_update_me(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        WithRejection(Json(body), _): JsonBody<UpdateProfileBody>,
    ) -> Result<Response, AppError> {
        let principal = resources
            .gate
            .authorize(&headers, Capability::UpdateOwnProfile)?;
        let account = Self::load_account(&resources, &principal.id).await?;

        let mut update = AccountUpdate {
            name: optional_text(body.name),
            ..AccountUpdate::default()
        };

        if let Some(password) = body.password.filter(|p| !p.is_empty()) {
            let current = body
                .current_password
                .filter(|p| !p.is_empty())
                .ok_or_else(|| {
                    AppError::invalid_input("Current password is required to set a new password")
                })?;
            if !verify_password(&current, &account.password_hash).await? {
                return Err(AppError::invalid_credentials());
            }
            validate_password(&password)?;
            update.password_hash = Some(hash_password(&password, resources.bcrypt_cost()).await?);
        }

        let account = resources
            .database
            .update_account(&account.id, &update)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;

        info!(account_id = %account.id, "Profile updated");
        Ok(ok(UserEnvelope::of(&account)))
    }

    /// Handle GET /api/users
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        resources
            .gate
            .authorize(&headers, Capability::ManageAccounts)?;

        let users: Vec<AccountView> = resources
            .database
            .list_accounts()
            .await?
            .into_iter()
            .map(|entry| AccountView {
                creator: entry.creator,
                ..AccountView::from(&entry.account)
            })
            .collect();

        Ok(ok(serde_json::json!({ "users": users })))
    }

    /// Handle POST /api/users
    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        WithRejection(Json(body), _): JsonBody<CreateAccountBody>,
    ) -> Result<Response, AppError> {
        let principal = resources
            .gate
            .authorize(&headers, Capability::ManageAccounts)?;

        let name = required_text(body.name, "name")?;
        let username = normalize_username(&required_text(body.username, "username")?);
        let password = body
            .password
            .filter(|p| !p.is_empty())
            .ok_or_else(|| AppError::missing_field("password"))?;
        validate_username(&username)?;
        validate_password(&password)?;

        let account = resources
            .database
            .create_account(&NewAccount {
                name,
                username,
                password_hash: hash_password(&password, resources.bcrypt_cost()).await?,
                role: body.role.unwrap_or(Role::Standard),
                is_active: body.is_active.unwrap_or(true),
                created_by: Some(principal.id.clone()),
            })
            .await?;

        info!(
            account_id = %account.id,
            username = %account.username,
            created_by = %principal.id,
            "Account created"
        );
        Ok(created(UserEnvelope::of(&account)))
    }

    /// Handle PATCH /api/users/:id
    async fn handle_update(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
        WithRejection(Json(body), _): JsonBody<UpdateAccountBody>,
    ) -> Result<Response, AppError> {
        let principal = resources
            .gate
            .authorize(&headers, Capability::ManageAccounts)?;

        if id == principal.id && body.is_active == Some(false) {
            return Err(AppError::invalid_input(
                "You cannot deactivate your own account",
            ));
        }

        let username = optional_text(body.username)
            .map(|u| normalize_username(&u))
            .map(|u| validate_username(&u).map(|()| u))
            .transpose()?;

        let password_hash = match body.password.filter(|p| !p.is_empty()) {
            Some(password) => {
                validate_password(&password)?;
                Some(hash_password(&password, resources.bcrypt_cost()).await?)
            }
            None => None,
        };

        let update = AccountUpdate {
            name: optional_text(body.name),
            username,
            password_hash,
            role: body.role,
            is_active: body.is_active,
        };

        let account = resources
            .database
            .update_account(&id, &update)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;

        info!(account_id = %account.id, "Account updated");
        Ok(ok(UserEnvelope::of(&account)))
    }

    /// Handle PATCH /api/users/:id/activate
    ///
    /// Toggles the flag when the body omits `isActive`.
    async fn handle_activate(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
        body: Bytes,
    ) -> Result<Response, AppError> {
        let principal = resources
            .gate
            .authorize(&headers, Capability::SetAccountActive)?;
        let is_active = parse_activate_body(&body)?.is_active;

        if id == principal.id && is_active != Some(true) {
            return Err(AppError::invalid_input(
                "You cannot deactivate your own account",
            ));
        }

        let account = resources
            .database
            .set_account_active(&id, is_active)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;

        info!(account_id = %account.id, is_active = account.is_active, "Account status changed");
        Ok(ok(UserEnvelope::of(&account)))
    }

    /// Handle DELETE /api/users/:id
    async fn handle_delete(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let principal = resources
            .gate
            .authorize(&headers, Capability::ManageAccounts)?;

        if id == principal.id {
            return Err(AppError::invalid_input("You cannot delete your own account"));
        }

        if !resources.database.delete_account(&id).await? {
            return Err(AppError::not_found("User"));
        }

        info!(account_id = %id, deleted_by = %principal.id, "Account deleted");
        Ok(deleted("User"))
    }
}
