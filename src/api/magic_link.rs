// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Magic-link issuance endpoint.
//!
//! One request walks Authenticated → Validated → Authorized → LinkIssued →
//! Delivered; the first failing step short-circuits to its mapped error
//! response and later steps never run. Nothing is persisted or retried:
//! a generated-but-undelivered link is simply reported as a failure.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::{
    auth::GatewayAuth,
    config::AccessPolicy,
    error::ApiError,
    providers::{
        allowlist::AllowlistError,
        email::{sign_in_message, EmailError},
        identity::{IdentityError, IssuedLink},
    },
    state::AppState,
};

/// Wire request. Lenient on shape: a missing `email` is a validation
/// failure, not a deserialization failure.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct MagicLinkRequest {
    pub email: Option<String>,
    pub redirect_to: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MagicLinkResponse {
    pub ok: bool,
}

/// Validated issuance request, request-scoped.
#[derive(Debug)]
struct LinkRequest {
    email: String,
    redirect_to: String,
}

#[utoipa::path(
    post,
    path = "/magic-link",
    request_body = MagicLinkRequest,
    tag = "MagicLink",
    responses(
        (status = 200, description = "Link issued", body = MagicLinkResponse),
        (status = 400, description = "Missing or invalid email"),
        (status = 401, description = "Caller not authenticated"),
        (status = 403, description = "Email not on the allow-list"),
        (status = 500, description = "Allow-list store failure"),
        (status = 502, description = "Identity or email provider failure")
    )
)]
pub async fn request_magic_link(
    State(state): State<AppState>,
    _auth: GatewayAuth,
    body: String,
) -> Result<Json<MagicLinkResponse>, ApiError> {
    let request: MagicLinkRequest =
        serde_json::from_str(&body).map_err(|_| ApiError::bad_request("Invalid JSON body"))?;
    let request = validate(request, &state.config.default_redirect_url)?;

    authorize(&state, &request.email).await?;

    let issued = state
        .identity
        .issue(&request.email, &request.redirect_to, state.config.link_delivery)
        .await
        .map_err(map_identity_error)?;

    if let IssuedLink::LinkOnly(link) = issued {
        let settings = state
            .config
            .email
            .as_ref()
            .ok_or_else(|| ApiError::internal("email delivery is not configured"))?;
        let mailer = state
            .mailer
            .as_ref()
            .ok_or_else(|| ApiError::internal("email delivery is not configured"))?;
        let message = sign_in_message(settings, &request.email, &link);
        mailer.send(&message).await.map_err(map_email_error)?;
    }

    info!(email = %request.email, "magic link issued");
    Ok(Json(MagicLinkResponse { ok: true }))
}

/// Non-POST methods on the issuance path.
pub async fn method_not_allowed() -> ApiError {
    ApiError::method_not_allowed("Method not allowed")
}

fn validate(request: MagicLinkRequest, default_redirect: &str) -> Result<LinkRequest, ApiError> {
    let email = request.email.unwrap_or_default().trim().to_string();
    if email.is_empty() {
        return Err(ApiError::bad_request("Missing email"));
    }
    if !is_valid_email(&email) {
        return Err(ApiError::bad_request("Invalid email"));
    }

    // Passed through as a plain string; redirect origins are not
    // allow-listed here.
    let redirect_to = request
        .redirect_to
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default_redirect.to_string());

    Ok(LinkRequest { email, redirect_to })
}

/// Basic shape check: local part, `@`, domain with an interior dot, no
/// whitespace anywhere.
fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

async fn authorize(state: &AppState, email: &str) -> Result<(), ApiError> {
    match state.config.access_policy {
        AccessPolicy::RequireListed => {
            let listed = state
                .allowlist
                .contains(email)
                .await
                .map_err(map_allowlist_error)?;
            if !listed {
                warn!(email = %email, "rejecting request: email not on allow-list");
                return Err(ApiError::forbidden("Email not allowed"));
            }
        }
        // Self-registration trusts an out-of-band gate (e.g. a completed
        // checkout) upstream of the gateway.
        AccessPolicy::SelfRegister => {
            state
                .allowlist
                .upsert(email, &state.config.allowlist_source)
                .await
                .map_err(map_allowlist_error)?;
        }
    }
    Ok(())
}

fn map_allowlist_error(error: AllowlistError) -> ApiError {
    warn!(%error, "allow-list store call failed");
    ApiError::internal(format!("Allow-list store: {error}"))
}

fn map_identity_error(error: IdentityError) -> ApiError {
    warn!(%error, "identity provider call failed");
    ApiError::bad_gateway(format!("Magic link issuance: {error}"))
}

fn map_email_error(error: EmailError) -> ApiError {
    warn!(%error, "email provider call failed");
    match error {
        EmailError::Delivery { status, body } => {
            ApiError::bad_gateway(format!("Email provider returned {status}")).with_details(body)
        }
        other => ApiError::bad_gateway(format!("Email delivery: {other}")),
    }
}
