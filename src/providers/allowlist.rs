// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! PostgREST-style allow-list store client.
//!
//! The store holds one row per authorized email in an `allowed_emails`
//! table. This subsystem only reads rows and upserts new ones; it never
//! mutates or deletes existing entries.

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

/// One row in the store's `allowed_emails` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllowListEntry {
    pub email: String,
    /// Provenance tag, e.g. "checkout" or "login".
    pub source: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AllowlistError {
    #[error("allow-list request failed: {0}")]
    Request(String),

    #[error("allow-list store returned {status}: {body}")]
    Backend { status: StatusCode, body: String },
}

#[derive(Debug, Clone)]
pub struct AllowlistClient {
    base_url: String,
    service_key: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct EmailRow {
    #[allow(dead_code)]
    email: String,
}

impl AllowlistClient {
    pub fn new(base_url: &str, service_key: &str, http: Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key: service_key.to_string(),
            http,
        }
    }

    /// Read-only membership check. Absence is `Ok(false)`, never an error;
    /// only transport and backend failures surface as `Err`.
    pub async fn contains(&self, email: &str) -> Result<bool, AllowlistError> {
        let filter = format!("eq.{email}");
        let response = self
            .http
            .get(format!("{}/allowed_emails", self.base_url))
            .query(&[("select", "email"), ("email", filter.as_str())])
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .send()
            .await
            .map_err(|e| AllowlistError::Request(format!("lookup failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AllowlistError::Backend { status, body });
        }

        let rows: Vec<EmailRow> = response
            .json()
            .await
            .map_err(|e| AllowlistError::Request(format!("lookup returned invalid JSON: {e}")))?;
        Ok(!rows.is_empty())
    }

    /// Idempotent upsert. A conflict on the unique email key merges into the
    /// existing row, so concurrent writes for the same email resolve
    /// last-write-wins on the store side.
    pub async fn upsert(&self, email: &str, source: &str) -> Result<(), AllowlistError> {
        let entry = AllowListEntry {
            email: email.to_string(),
            source: source.to_string(),
        };
        let response = self
            .http
            .post(format!("{}/allowed_emails", self.base_url))
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .header("Prefer", "resolution=merge-duplicates")
            .json(&[entry])
            .send()
            .await
            .map_err(|e| AllowlistError::Request(format!("upsert failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AllowlistError::Backend { status, body });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> AllowlistClient {
        AllowlistClient::new(&server.uri(), "service-key", Client::new())
    }

    #[tokio::test]
    async fn contains_returns_true_for_listed_email() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/allowed_emails"))
            .and(query_param("select", "email"))
            .and(query_param("email", "eq.a@b.com"))
            .and(header("apikey", "service-key"))
            .and(header("Authorization", "Bearer service-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "email": "a@b.com" }])))
            .mount(&server)
            .await;

        assert!(client(&server).contains("a@b.com").await.unwrap());
    }

    #[tokio::test]
    async fn contains_returns_false_for_empty_result() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/allowed_emails"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        assert!(!client(&server).contains("nobody@x.com").await.unwrap());
    }

    #[tokio::test]
    async fn contains_surfaces_backend_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/allowed_emails"))
            .respond_with(ResponseTemplate::new(500).set_body_string("db down"))
            .mount(&server)
            .await;

        let error = client(&server).contains("a@b.com").await.unwrap_err();
        match error {
            AllowlistError::Backend { status, body } => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(body, "db down");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn upsert_sends_merge_duplicates_row() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/allowed_emails"))
            .and(header("Prefer", "resolution=merge-duplicates"))
            .and(header("apikey", "service-key"))
            .and(body_json(json!([{ "email": "a@b.com", "source": "checkout" }])))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        client(&server).upsert("a@b.com", "checkout").await.unwrap();
    }

    #[tokio::test]
    async fn upsert_surfaces_backend_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/allowed_emails"))
            .respond_with(ResponseTemplate::new(409).set_body_string("conflict"))
            .mount(&server)
            .await;

        let error = client(&server).upsert("a@b.com", "checkout").await.unwrap_err();
        assert!(matches!(error, AllowlistError::Backend { .. }));
    }
}
