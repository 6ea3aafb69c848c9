// ABOUTME: Support ticket routes
// ABOUTME: Owners open, read and reply; only admins triage status, priority and assignment
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aura Portal Authors

//! Ticket routes
//!
//! `PATCH /api/tickets/:id` serves both replies and triage. Owners may send the
//! whole body, but status, priority and assignment are dropped unless the
//! principal is an admin.

use super::{
    created, deleted, nullable, ok, optional_text, required_text, JsonBody, QueryParams,
};
use crate::database::{NewTicket, TicketReply, TicketUpdate};
use crate::middleware::AccessGate;
use crate::resources::ServerResources;
use axum::{
    extract::{Json, Path, Query, State},
    http::HeaderMap,
    response::Response,
    routing::get,
    Router,
};
use axum_extra::extract::WithRejection;
use portal_core::{
    errors::AppError,
    models::{TicketPriority, TicketStatus},
    permissions::{Capability, Principal},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Default, Deserialize)]
struct TicketListQuery {
    status: Option<TicketStatus>,
}

#[derive(Debug, Deserialize)]
struct CreateTicketBody {
    subject: Option<String>,
    message: Option<String>,
    priority: Option<TicketPriority>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateTicketBody {
    message: Option<String>,
    status: Option<TicketStatus>,
    priority: Option<TicketPriority>,
    #[serde(default, deserialize_with = "nullable")]
    assigned_to: Option<Option<String>>,
}

impl UpdateTicketBody {
    fn has_triage(&self) -> bool {
        self.status.is_some() || self.priority.is_some() || self.assigned_to.is_some()
    }
}

/// Ticket routes
pub struct TicketRoutes;

impl TicketRoutes {
    /// Create all ticket routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/tickets",
                get(Self::handle_list).post(Self::handle_create),
            )
            .route(
                "/api/tickets/:id",
                get(Self::handle_get)
                    .patch(Self::handle_update)
                    .delete(Self::handle_delete),
            )
            .with_state(resources)
    }

    /// Handle GET /api/tickets
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        WithRejection(Query(query), _): QueryParams<TicketListQuery>,
    ) -> Result<Response, AppError> {
        let principal = resources
            .gate
            .authorize(&headers, Capability::ListTickets)?;

        let owner = (!principal.is_admin()).then_some(principal.id.as_str());
        let tickets = resources
            .database
            .list_tickets(owner, query.status)
            .await?;

        Ok(ok(serde_json::json!({ "tickets": tickets })))
    }

    /// Handle POST /api/tickets
    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        WithRejection(Json(body), _): JsonBody<CreateTicketBody>,
    ) -> Result<Response, AppError> {
        let principal = resources
            .gate
            .authorize(&headers, Capability::CreateTicket)?;

        let ticket = resources
            .database
            .create_ticket(&NewTicket {
                user_id: principal.id.clone(),
                subject: required_text(body.subject, "subject")?,
                message: required_text(body.message, "message")?,
                is_staff: principal.is_admin(),
                priority: body.priority.unwrap_or_default(),
            })
            .await?;

        info!(ticket_id = %ticket.id, account_id = %principal.id, "Ticket opened");
        Ok(created(serde_json::json!({ "ticket": ticket })))
    }

    /// Handle GET /api/tickets/:id
    async fn handle_get(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let principal = resources.gate.authenticate(&headers)?;

        let ticket = resources
            .database
            .get_ticket(&id)
            .await?
            .ok_or_else(|| AppError::not_found("Ticket"))?;
        AccessGate::permit(&principal, Capability::ReadTicket, Some(&ticket.user_id))?;

        Ok(ok(serde_json::json!({ "ticket": ticket })))
    }

    /// Handle PATCH /api/tickets/:id
    async fn handle_update(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
        WithRejection(Json(body), _): JsonBody<UpdateTicketBody>,
    ) -> Result<Response, AppError> {
        let principal = resources.gate.authenticate(&headers)?;

        let ticket = resources
            .database
            .get_ticket(&id)
            .await?
            .ok_or_else(|| AppError::not_found("Ticket"))?;
        AccessGate::permit(&principal, Capability::ReplyTicket, Some(&ticket.user_id))?;

        let update = Self::ticket_update(&principal, body);
        let ticket = resources
            .database
            .update_ticket(&ticket.id, &update)
            .await?
            .ok_or_else(|| AppError::not_found("Ticket"))?;

        info!(ticket_id = %ticket.id, status = ticket.status.as_str(), "Ticket updated");
        Ok(ok(serde_json::json!({ "ticket": ticket })))
    }

    /// Build the storage update, dropping triage fields the principal may not set
    fn ticket_update(principal: &Principal, body: UpdateTicketBody) -> TicketUpdate {
        let triage_requested = body.has_triage();
        let UpdateTicketBody {
            message,
            status,
            priority,
            assigned_to,
        } = body;

        let message = optional_text(message).map(|text| TicketReply {
            from_user: principal.id.clone(),
            is_staff: principal.is_admin(),
            body: text,
        });

        if AccessGate::permit(principal, Capability::TriageTicket, None).is_err() {
            if triage_requested {
                debug!(account_id = %principal.id, "Ignoring triage fields from non-admin");
            }
            return TicketUpdate {
                message,
                ..TicketUpdate::default()
            };
        }

        TicketUpdate {
            message,
            status,
            priority,
            // null or an empty string clears the assignee
            assigned_to: assigned_to.map(optional_text),
        }
    }

    /// Handle DELETE /api/tickets/:id
    async fn handle_delete(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        resources
            .gate
            .authorize(&headers, Capability::DeleteTicket)?;

        if !resources.database.delete_ticket(&id).await? {
            return Err(AppError::not_found("Ticket"));
        }

        info!(ticket_id = %id, "Ticket deleted");
        Ok(deleted("Ticket"))
    }
}
