// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! GoTrue-style identity provider client.
//!
//! The provider can either generate a sign-in link and email it itself
//! (`/otp`), or generate the link and hand it back for the gateway to
//! deliver (`/admin/generate_link`). The link is an opaque, single-use,
//! time-limited credential; the gateway never interprets it.

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

use crate::config::LinkDelivery;

/// Outcome of a link issuance call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssuedLink {
    /// The provider generated the link and emailed it itself.
    DeliveredByProvider,
    /// The provider returned the link; delivery is on the gateway.
    LinkOnly(String),
}

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("identity request failed: {0}")]
    Request(String),

    #[error("identity provider returned {status}: {body}")]
    Upstream { status: StatusCode, body: String },

    #[error("identity response was invalid: {0}")]
    InvalidResponse(String),

    #[error("no action_link in identity response")]
    MissingLink,
}

#[derive(Debug, Clone)]
pub struct IdentityClient {
    base_url: String,
    service_key: String,
    http: Client,
}

impl IdentityClient {
    pub fn new(base_url: &str, service_key: &str, http: Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key: service_key.to_string(),
            http,
        }
    }

    /// Obtain a sign-in link for `email`. The integration shape is fixed by
    /// deployment configuration, never per request.
    pub async fn issue(
        &self,
        email: &str,
        redirect_to: &str,
        delivery: LinkDelivery,
    ) -> Result<IssuedLink, IdentityError> {
        match delivery {
            LinkDelivery::Provider => {
                self.send_otp(email, redirect_to).await?;
                Ok(IssuedLink::DeliveredByProvider)
            }
            LinkDelivery::Gateway => {
                let link = self.generate_link(email, redirect_to).await?;
                Ok(IssuedLink::LinkOnly(link))
            }
        }
    }

    async fn send_otp(&self, email: &str, redirect_to: &str) -> Result<(), IdentityError> {
        let response = self
            .http
            .post(format!("{}/otp", self.base_url))
            .query(&[("redirect_to", redirect_to)])
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .json(&json!({ "email": email, "create_user": false }))
            .send()
            .await
            .map_err(|e| IdentityError::Request(format!("POST /otp failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(IdentityError::Upstream { status, body });
        }
        Ok(())
    }

    async fn generate_link(&self, email: &str, redirect_to: &str) -> Result<String, IdentityError> {
        let response = self
            .http
            .post(format!("{}/admin/generate_link", self.base_url))
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .json(&json!({
                "type": "magiclink",
                "email": email,
                "redirect_to": redirect_to,
            }))
            .send()
            .await
            .map_err(|e| IdentityError::Request(format!("POST /admin/generate_link failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(IdentityError::Upstream { status, body });
        }

        let body: Value = response.json().await.map_err(|e| {
            IdentityError::InvalidResponse(format!("generate_link returned invalid JSON: {e}"))
        })?;
        extract_action_link(&body)
            .map(str::to_string)
            .ok_or(IdentityError::MissingLink)
    }
}

/// Some provider deployments nest the link under `properties`.
fn extract_action_link(response: &Value) -> Option<&str> {
    response
        .get("action_link")
        .and_then(Value::as_str)
        .or_else(|| {
            response
                .pointer("/properties/action_link")
                .and_then(Value::as_str)
        })
}
