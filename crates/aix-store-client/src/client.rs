//! HTTP client for the hosted table store and auth API

use crate::error::{Result, StoreError};
use crate::query::Query;
use crate::store::RemoteStore;
use crate::types::*;
use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder, StatusCode};
use serde_json::Value;
use std::sync::RwLock;
use std::time::Duration;

/// HTTP client for the hosted store
///
/// # Example
///
/// ```rust,no_run
/// use aix_store_client::{Query, RemoteStore, StoreClient, StoreConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = StoreClient::new(StoreConfig {
///     base_url: "https://project.example.co".into(),
///     anon_key: Some("public-anon-key".into()),
///     ..Default::default()
/// })?;
///
/// let phones = client
///     .select("smartphones", &Query::new().order_desc("order_rank").limit(10))
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct StoreClient {
    config: StoreConfig,
    client: Client,
    /// Bearer token of the signed-in user, replaces the anon key when set
    access_token: RwLock<Option<String>>,
}

impl StoreClient {
    /// Create a new store client
    pub fn new(config: StoreConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        if let Some(ref anon_key) = config.anon_key {
            let value = header::HeaderValue::from_str(anon_key)
                .map_err(|e| StoreError::Auth(format!("invalid anon key: {}", e)))?;
            headers.insert("apikey", value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            config,
            client,
            access_token: RwLock::new(None),
        })
    }

    /// Get the client configuration
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Use a user token for subsequent REST calls (`None` reverts to the anon key)
    pub fn set_access_token(&self, token: Option<String>) {
        if let Ok(mut guard) = self.access_token.write() {
            *guard = token;
        }
    }

    // ==================== Auth API ====================

    /// Sign in with e-mail and password
    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthSession> {
        let url = format!("{}?grant_type=password", self.config.auth_url("token"));

        let response = self
            .client
            .post(&url)
            .header(header::CONTENT_TYPE, "application/json")
            .json(&PasswordGrant { email, password })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body: AuthErrorBody = response.json().await.unwrap_or_default();
            return Err(StoreError::Auth(
                body.into_message()
                    .unwrap_or_else(|| format!("sign-in rejected with HTTP {}", status)),
            ));
        }

        let session: AuthSession = response.json().await?;
        self.set_access_token(Some(session.access_token.clone()));
        tracing::info!(user_id = %session.user.id, "Signed in");
        Ok(session)
    }

    /// Revoke the current session; the user token is dropped locally even
    /// when the request fails
    pub async fn sign_out(&self) -> Result<()> {
        let url = self.config.auth_url("logout");
        let request = self.authorize(self.client.post(&url));
        self.set_access_token(None);
        let response = request.send().await?;

        if !response.status().is_success() && response.status() != StatusCode::UNAUTHORIZED {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Server {
                status,
                message: body,
            });
        }
        Ok(())
    }

    /// Fetch the user behind the current access token
    pub async fn get_user(&self) -> Result<AuthUser> {
        let url = self.config.auth_url("user");
        let response = self.authorize(self.client.get(&url)).send().await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(StoreError::Auth("no active session".to_string()));
        }
        self.handle_response(response).await
    }

    // ==================== Helper Methods ====================

    fn table_url(&self, table: &str, query: &Query, extra: &[(&str, &str)]) -> String {
        let mut url = self.config.table_url(table);
        let mut parts = Vec::new();
        let qs = query.to_query_string();
        if !qs.is_empty() {
            parts.push(qs);
        }
        for (k, v) in extra {
            parts.push(format!("{}={}", k, urlencoding::encode(v)));
        }
        if !parts.is_empty() {
            url.push('?');
            url.push_str(&parts.join("&"));
        }
        url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let token = self
            .access_token
            .read()
            .ok()
            .and_then(|guard| guard.clone())
            .or_else(|| self.config.anon_key.clone());
        match token {
            Some(token) => request.header(header::AUTHORIZATION, format!("Bearer {}", token)),
            None => request,
        }
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound("Resource not found".to_string()));
        }

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Server {
                status,
                message: body,
            });
        }

        let body = response.json().await?;
        Ok(body)
    }

    async fn handle_rows(&self, response: reqwest::Response) -> Result<Vec<Value>> {
        match self.handle_response::<Value>(response).await? {
            Value::Array(rows) => Ok(rows),
            Value::Null => Ok(Vec::new()),
            other => Ok(vec![other]),
        }
    }
}

#[async_trait]
impl RemoteStore for StoreClient {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Value>> {
        let url = self.table_url(table, query, &[]);
        tracing::debug!(table, %url, "select");

        let response = self.authorize(self.client.get(&url)).send().await?;
        self.handle_rows(response).await
    }

    async fn insert(&self, table: &str, record: Value) -> Result<Value> {
        let url = self.table_url(table, &Query::new(), &[]);

        let response = self
            .authorize(self.client.post(&url))
            .header(header::CONTENT_TYPE, "application/json")
            .header("Prefer", "return=representation")
            .json(&record)
            .send()
            .await?;

        self.handle_rows(response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                StoreError::InvalidResponse(format!("insert into {} returned no row", table))
            })
    }

    async fn update(&self, table: &str, patch: Value, matching: &Query) -> Result<Vec<Value>> {
        let url = self.table_url(table, matching, &[]);

        let response = self
            .authorize(self.client.patch(&url))
            .header(header::CONTENT_TYPE, "application/json")
            .header("Prefer", "return=representation")
            .json(&patch)
            .send()
            .await?;

        self.handle_rows(response).await
    }

    async fn upsert(&self, table: &str, record: Value, conflict_key: &str) -> Result<Value> {
        let url = self.table_url(table, &Query::new(), &[("on_conflict", conflict_key)]);

        let response = self
            .authorize(self.client.post(&url))
            .header(header::CONTENT_TYPE, "application/json")
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .json(&record)
            .send()
            .await?;

        self.handle_rows(response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                StoreError::InvalidResponse(format!("upsert into {} returned no row", table))
            })
    }

    async fn delete(&self, table: &str, matching: &Query) -> Result<usize> {
        let url = self.table_url(table, matching, &[]);

        let response = self
            .authorize(self.client.delete(&url))
            .header("Prefer", "return=representation")
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(0);
        }
        Ok(self.handle_rows(response).await?.len())
    }
}
