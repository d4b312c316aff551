// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use reqwest::Client;

use crate::config::{AppConfig, DOWNSTREAM_TIMEOUT};
use crate::providers::{allowlist::AllowlistClient, email::EmailClient, identity::IdentityClient};

/// Shared application state: immutable configuration plus the downstream
/// provider clients. Cloned per request; no mutable state is shared across
/// concurrent invocations.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub allowlist: AllowlistClient,
    pub identity: IdentityClient,
    /// Present only in gateway-delivery mode.
    pub mailer: Option<EmailClient>,
}

impl AppState {
    /// One pooled HTTP client with a fixed timeout serves all three
    /// downstream integrations.
    pub fn new(config: AppConfig) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(DOWNSTREAM_TIMEOUT).build()?;

        let allowlist = AllowlistClient::new(
            &config.allowlist_api_url,
            &config.allowlist_service_key,
            http.clone(),
        );
        let identity = IdentityClient::new(
            &config.identity_api_url,
            &config.identity_service_key,
            http.clone(),
        );
        let mailer = config
            .email
            .as_ref()
            .map(|settings| EmailClient::new(settings, http));

        Ok(Self {
            config: Arc::new(config),
            allowlist,
            identity,
            mailer,
        })
    }
}

#[cfg(test)]
pub mod test_support {
    use super::*;
    use crate::config::{AccessPolicy, LinkDelivery};

    pub const TEST_SECRET: &str = "edge-secret";
    pub const TEST_REDIRECT: &str = "https://app.example.com/#magiclink";

    pub fn config(allowlist_url: &str, identity_url: &str) -> AppConfig {
        AppConfig {
            bearer_token: Some(TEST_SECRET.to_string()),
            default_redirect_url: TEST_REDIRECT.to_string(),
            access_policy: AccessPolicy::RequireListed,
            allowlist_source: "login".to_string(),
            allowlist_api_url: allowlist_url.to_string(),
            allowlist_service_key: "allowlist-service-key".to_string(),
            identity_api_url: identity_url.to_string(),
            identity_service_key: "identity-service-key".to_string(),
            link_delivery: LinkDelivery::Provider,
            email: None,
        }
    }

    pub fn state(config: AppConfig) -> AppState {
        AppState::new(config).expect("test state")
    }
}
