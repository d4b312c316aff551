// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared-secret authentication for calling clients.
//!
//! Use the `GatewayAuth` extractor in handlers to require the configured
//! bearer secret:
//!
//! ```rust,ignore
//! async fn my_handler(_auth: GatewayAuth, body: String) -> impl IntoResponse {
//!     // only reached with a valid Authorization header
//! }
//! ```
//!
//! The extractor runs against request parts, so the body is never read
//! before the check passes.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::warn;

use crate::{error::ApiError, state::AppState};

/// Extractor that admits a request only when the `Authorization` header
/// carries the configured shared secret.
pub struct GatewayAuth;

impl FromRequestParts<AppState> for GatewayAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());

        if token_matches(header, state.config.bearer_token.as_deref()) {
            return Ok(GatewayAuth);
        }

        // The reason stays in the logs; the caller only ever sees 401.
        match (header, state.config.bearer_token.as_deref()) {
            (_, None) => warn!("rejecting request: no bearer secret configured"),
            (None, _) => warn!("rejecting request: missing Authorization header"),
            _ => warn!("rejecting request: bearer token mismatch"),
        }
        Err(ApiError::unauthorized("Unauthorized"))
    }
}

/// Accepts `Bearer <token>` (case-insensitive scheme) or a bare token and
/// compares for exact equality with the configured secret.
///
/// Fail-closed: an unconfigured secret rejects every request rather than
/// leaving the endpoint open.
pub fn token_matches(header: Option<&str>, secret: Option<&str>) -> bool {
    let Some(secret) = secret else {
        return false;
    };
    let Some(header) = header else {
        return false;
    };
    let presented = strip_bearer(header.trim());
    !presented.is_empty() && presented == secret
}

fn strip_bearer(value: &str) -> &str {
    match value.get(..7) {
        Some(prefix) if prefix.eq_ignore_ascii_case("bearer ") => value[7..].trim_start(),
        _ => value,
    }
}
