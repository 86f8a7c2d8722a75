//! Connector-side API client.
//!
//! Talks to the same backend surface as the dashboard client but stands on
//! its own: the base URL already includes `/api`, authentication is a
//! site-wide API key, and the timeout is the host platform's 30 seconds.

use std::time::Duration;

use reqwest::Method;
use serde_json::Value;
use tracing::debug;

use crate::SyncError;
use crate::meta::{DEFAULT_API_URL, MetaStore, OPTION_API_KEY, OPTION_API_URL};

/// Request timeout for connector calls: 30 seconds.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for passport CRUD from the store side.
#[derive(Debug)]
pub struct ConnectorApi {
    api_url: String,
    api_key: String,
    http: reqwest::Client,
}

impl ConnectorApi {
    /// Build a client from an API base URL (including `/api`) and key.
    ///
    /// An empty key sends unauthenticated requests.
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self, SyncError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SyncError::Request(format!("client init: {e}")))?;
        Ok(Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            http,
        })
    }

    /// Build a client from the connector options in the meta store.
    pub fn from_store(store: &MetaStore) -> Result<Self, SyncError> {
        let api_url = store
            .option(OPTION_API_URL)
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let api_key = store.option(OPTION_API_KEY).unwrap_or_default();
        Self::new(api_url, api_key)
    }

    /// Make an API request; `data` is sent as the JSON body for POST/PUT.
    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        data: Option<&Value>,
    ) -> Result<Value, SyncError> {
        let url = format!("{}/{}", self.api_url, endpoint.trim_start_matches('/'));
        debug!(%method, %url, "connector request");

        let mut builder = self
            .http
            .request(method, &url)
            .header("Accept", "application/json");
        if !self.api_key.is_empty() {
            builder = builder.bearer_auth(&self.api_key);
        }
        if let Some(data) = data {
            builder = builder.json(data);
        }

        let resp = builder
            .send()
            .await
            .map_err(|e| SyncError::Request(e.to_string()))?;

        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|e| SyncError::Request(e.to_string()))?;
        // Deletes answer 204 with no body; read that as null.
        let parsed: Option<Value> = if body.trim().is_empty() {
            Some(Value::Null)
        } else {
            serde_json::from_str(&body).ok()
        };

        if status >= 400 {
            let detail = parsed
                .as_ref()
                .and_then(|v| v.get("detail"))
                .and_then(|v| v.as_str())
                .unwrap_or("Unknown API error")
                .to_string();
            return Err(SyncError::Api { status, detail });
        }

        parsed.ok_or_else(|| SyncError::Parse(format!("invalid JSON body (HTTP {status})")))
    }

    /// List all passports.
    pub async fn get_passports(&self) -> Result<Value, SyncError> {
        self.request(Method::GET, "passports/", None).await
    }

    /// Fetch one passport.
    pub async fn get_passport(&self, id: &str) -> Result<Value, SyncError> {
        self.request(Method::GET, &format!("passports/{id}/"), None)
            .await
    }

    /// Create a passport.
    pub async fn create_passport(&self, data: &Value) -> Result<Value, SyncError> {
        self.request(Method::POST, "passports/", Some(data)).await
    }

    /// Replace a passport.
    pub async fn update_passport(&self, id: &str, data: &Value) -> Result<Value, SyncError> {
        self.request(Method::PUT, &format!("passports/{id}/"), Some(data))
            .await
    }

    /// Delete a passport.
    pub async fn delete_passport(&self, id: &str) -> Result<Value, SyncError> {
        self.request(Method::DELETE, &format!("passports/{id}/"), None)
            .await
    }
}
