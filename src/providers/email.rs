// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Resend-style transactional email client.
//!
//! Used only in gateway-delivery mode: the identity provider hands back the
//! sign-in link and the gateway renders and sends the message itself.

use reqwest::{Client, StatusCode};
use serde::Serialize;

use crate::config::EmailSettings;

/// Rendered message, serialized directly to the provider wire format.
#[derive(Debug, Clone, Serialize)]
pub struct OutboundMessage {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
}

/// Build the sign-in message for `recipient` embedding `link`.
///
/// Subject, sender, and reply-to come from configuration only; a request
/// can never set them.
pub fn sign_in_message(settings: &EmailSettings, recipient: &str, link: &str) -> OutboundMessage {
    OutboundMessage {
        from: settings.from.clone(),
        to: vec![recipient.to_string()],
        subject: settings.subject.clone(),
        html: render_html(link),
        text: render_text(link),
        reply_to: settings.reply_to.clone(),
    }
}

fn render_html(link: &str) -> String {
    format!(
        r#"<div style="font-family:system-ui,-apple-system,Segoe UI,Roboto,Arial,sans-serif;color:#0f172a">
  <h2>Sign in</h2>
  <p>Click to sign in securely:</p>
  <p style="margin:24px 0">
    <a href="{link}" style="background:#7c3aed;color:#fff;padding:12px 16px;border-radius:10px;text-decoration:none;display:inline-block">Open sign-in link</a>
  </p>
  <p style="word-break:break-all;"><a href="{link}">{link}</a></p>
</div>"#
    )
}

fn render_text(link: &str) -> String {
    format!("Sign in\n{link}\n")
}

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("email request failed: {0}")]
    Request(String),

    #[error("email provider returned {status}")]
    Delivery { status: StatusCode, body: String },
}

#[derive(Debug, Clone)]
pub struct EmailClient {
    base_url: String,
    api_key: String,
    http: Client,
}

impl EmailClient {
    pub fn new(settings: &EmailSettings, http: Client) -> Self {
        Self {
            base_url: settings.api_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            http,
        }
    }

    /// Exactly one delivery attempt. The provider does not guarantee
    /// idempotency of "send email", so a retry risks duplicate messages.
    pub async fn send(&self, message: &OutboundMessage) -> Result<(), EmailError> {
        let response = self
            .http
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(&self.api_key)
            .json(message)
            .send()
            .await
            .map_err(|e| EmailError::Request(format!("POST /emails failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EmailError::Delivery { status, body });
        }
        Ok(())
    }
}
