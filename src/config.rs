// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment exactly once at startup and
//! injected into handlers through `AppState`; a missing or invalid required
//! value aborts the process before the listener binds.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `GATEWAY_BEARER_TOKEN` | Shared secret for calling clients | Unset = reject all |
//! | `DEFAULT_REDIRECT_URL` | Fallback redirect target for issued links | Required |
//! | `ACCESS_POLICY` | `require-listed` or `self-register` | `require-listed` |
//! | `ALLOWLIST_SOURCE` | Provenance tag written on self-register upsert | `checkout` |
//! | `ALLOWLIST_API_URL` | PostgREST-style allow-list store root | Required |
//! | `ALLOWLIST_SERVICE_KEY` | Allow-list store service key | Required |
//! | `IDENTITY_API_URL` | GoTrue-style identity API root | Required |
//! | `IDENTITY_SERVICE_KEY` | Identity admin service key | Required |
//! | `LINK_DELIVERY` | `provider` or `gateway` | `provider` |
//! | `EMAIL_API_URL` | Transactional email API root | `https://api.resend.com` |
//! | `EMAIL_API_KEY` | Email API key | Required if `LINK_DELIVERY=gateway` |
//! | `EMAIL_FROM` | Sender address | Required if `LINK_DELIVERY=gateway` |
//! | `EMAIL_REPLY_TO` | Optional reply-to address | Unset |
//! | `EMAIL_SUBJECT` | Message subject | `Your sign-in link` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::time::Duration;

use url::Url;

/// Fixed timeout applied to every downstream provider call.
pub const DOWNSTREAM_TIMEOUT: Duration = Duration::from_secs(10);

const DEFAULT_EMAIL_API_URL: &str = "https://api.resend.com";
const DEFAULT_EMAIL_SUBJECT: &str = "Your sign-in link";
const DEFAULT_ALLOWLIST_SOURCE: &str = "checkout";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    Missing(String),

    #[error("{name} is not a valid URL: {value}")]
    InvalidUrl { name: String, value: String },

    #[error("{name} has unsupported value: {value}")]
    InvalidValue { name: String, value: String },
}

/// How an email earns the right to receive a sign-in link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessPolicy {
    /// Read-only gate: the email must already be on the allow-list.
    RequireListed,
    /// Upsert the email into the allow-list before issuance. Appropriate only
    /// when an out-of-band gate (e.g. a completed checkout) exists upstream;
    /// the gateway itself performs no such check.
    SelfRegister,
}

impl AccessPolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "require-listed" => Some(Self::RequireListed),
            "self-register" => Some(Self::SelfRegister),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::RequireListed => "require-listed",
            Self::SelfRegister => "self-register",
        }
    }
}

/// Which side emails the issued link to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkDelivery {
    /// The identity provider generates and emails the link itself.
    Provider,
    /// The identity provider only generates the link; the gateway renders
    /// and sends the email.
    Gateway,
}

impl LinkDelivery {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "provider" => Some(Self::Provider),
            "gateway" => Some(Self::Gateway),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Provider => "provider",
            Self::Gateway => "gateway",
        }
    }
}

/// Email provider settings, present only in gateway-delivery mode.
///
/// Subject, sender, and reply-to are configuration-driven; a request can
/// never set them.
#[derive(Debug, Clone)]
pub struct EmailSettings {
    pub api_url: String,
    pub api_key: String,
    pub from: String,
    pub reply_to: Option<String>,
    pub subject: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Shared secret for calling clients. `None` means reject every request.
    pub bearer_token: Option<String>,
    pub default_redirect_url: String,
    pub access_policy: AccessPolicy,
    pub allowlist_source: String,
    pub allowlist_api_url: String,
    pub allowlist_service_key: String,
    pub identity_api_url: String,
    pub identity_service_key: String,
    pub link_delivery: LinkDelivery,
    pub email: Option<EmailSettings>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let bearer_token = env_optional("GATEWAY_BEARER_TOKEN");
        let default_redirect_url = env_required("DEFAULT_REDIRECT_URL")?;

        let access_policy = match env_optional("ACCESS_POLICY") {
            Some(value) => {
                AccessPolicy::parse(&value).ok_or_else(|| ConfigError::InvalidValue {
                    name: "ACCESS_POLICY".to_string(),
                    value: value.clone(),
                })?
            }
            None => AccessPolicy::RequireListed,
        };
        let allowlist_source = env_or_default("ALLOWLIST_SOURCE", DEFAULT_ALLOWLIST_SOURCE);
        let allowlist_api_url = env_required_url("ALLOWLIST_API_URL")?;
        let allowlist_service_key = env_required("ALLOWLIST_SERVICE_KEY")?;

        let identity_api_url = env_required_url("IDENTITY_API_URL")?;
        let identity_service_key = env_required("IDENTITY_SERVICE_KEY")?;

        let link_delivery = match env_optional("LINK_DELIVERY") {
            Some(value) => {
                LinkDelivery::parse(&value).ok_or_else(|| ConfigError::InvalidValue {
                    name: "LINK_DELIVERY".to_string(),
                    value: value.clone(),
                })?
            }
            None => LinkDelivery::Provider,
        };
        let email = match link_delivery {
            LinkDelivery::Gateway => Some(EmailSettings {
                api_url: env_or_default("EMAIL_API_URL", DEFAULT_EMAIL_API_URL),
                api_key: env_required("EMAIL_API_KEY")?,
                from: env_required("EMAIL_FROM")?,
                reply_to: env_optional("EMAIL_REPLY_TO"),
                subject: env_or_default("EMAIL_SUBJECT", DEFAULT_EMAIL_SUBJECT),
            }),
            LinkDelivery::Provider => None,
        };

        Ok(Self {
            bearer_token,
            default_redirect_url,
            access_policy,
            allowlist_source,
            allowlist_api_url,
            allowlist_service_key,
            identity_api_url,
            identity_service_key,
            link_delivery,
            email,
        })
    }
}

fn env_required(name: &str) -> Result<String, ConfigError> {
    env_optional(name).ok_or_else(|| ConfigError::Missing(name.to_string()))
}

fn env_required_url(name: &str) -> Result<String, ConfigError> {
    let value = env_required(name)?;
    if Url::parse(&value).is_err() {
        return Err(ConfigError::InvalidUrl {
            name: name.to_string(),
            value,
        });
    }
    Ok(value)
}

fn env_optional(name: &str) -> Option<String> {
    match std::env::var(name) {
        Ok(value) => {
            let trimmed = value.trim().to_string();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed)
            }
        }
        Err(_) => None,
    }
}

fn env_or_default(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_policy_parsing_is_stable() {
        assert_eq!(
            AccessPolicy::parse("require-listed"),
            Some(AccessPolicy::RequireListed)
        );
        assert_eq!(
            AccessPolicy::parse("Self-Register"),
            Some(AccessPolicy::SelfRegister)
        );
        assert_eq!(AccessPolicy::parse(" require-listed "), Some(AccessPolicy::RequireListed));
        assert_eq!(AccessPolicy::parse("open"), None);
    }

    #[test]
    fn link_delivery_parsing_is_stable() {
        assert_eq!(LinkDelivery::parse("provider"), Some(LinkDelivery::Provider));
        assert_eq!(LinkDelivery::parse("GATEWAY"), Some(LinkDelivery::Gateway));
        assert_eq!(LinkDelivery::parse("smtp"), None);
    }

    #[test]
    fn as_str_round_trips() {
        for policy in [AccessPolicy::RequireListed, AccessPolicy::SelfRegister] {
            assert_eq!(AccessPolicy::parse(policy.as_str()), Some(policy));
        }
        for delivery in [LinkDelivery::Provider, LinkDelivery::Gateway] {
            assert_eq!(LinkDelivery::parse(delivery.as_str()), Some(delivery));
        }
    }
}
