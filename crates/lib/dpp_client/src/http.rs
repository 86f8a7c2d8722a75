//! HTTP client for the passport backend.
//!
//! Wraps outbound calls with JSON headers, a fixed request timeout, an
//! optional bearer credential and request/response diagnostics. Endpoints
//! are normalised so every call lands under `/api/`.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use reqwest::Method;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use dpp_core::passport::{Passport, PassportInput};

use crate::error::{ApiError, ApiResult};

/// Backend URL used when nothing else is configured.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

/// Fixed timeout for every API request: 10 seconds.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Shorter timeout for the connectivity probe: 5 seconds.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// The authenticated user as returned by `/api/users/me/`.
#[derive(Debug, Clone, Deserialize)]
pub struct CurrentUser {
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub username: Option<String>,
}

/// Outcome of a backend connectivity probe.
#[derive(Debug, Clone)]
pub struct ConnectionReport {
    pub success: bool,
    /// Base URL that was probed.
    pub url: String,
    /// HTTP status of the last response, if any response arrived.
    pub status: Option<u16>,
    /// True when no response was received at all.
    pub is_network_error: bool,
    pub detail: Option<String>,
}

/// Client for the passport backend REST surface.
#[derive(Debug)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
    bearer: Mutex<Option<String>>,
}

impl ApiClient {
    /// Build a client against a backend base URL (no trailing slash needed).
    pub fn new(base_url: impl Into<String>) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ApiError::Network(format!("client init: {e}")))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
            bearer: Mutex::new(None),
        })
    }

    /// The backend base URL this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Set or clear the bearer credential attached to every request.
    pub fn set_bearer_token(&self, token: Option<String>) {
        *self.bearer.lock().unwrap_or_else(PoisonError::into_inner) = token;
    }

    /// Current bearer credential, if any.
    pub fn bearer_token(&self) -> Option<String> {
        self.bearer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Normalise an endpoint so it always starts with `/api/`.
    fn api_endpoint(endpoint: &str) -> String {
        if endpoint.starts_with("/api/") {
            endpoint.to_string()
        } else if endpoint.starts_with('/') {
            format!("/api{endpoint}")
        } else {
            format!("/api/{endpoint}")
        }
    }

    /// Generic JSON call against the backend.
    ///
    /// Attaches the bearer header when a token is set, classifies non-2xx
    /// responses through [`ApiError::from_response`] and decodes the body
    /// into `T`.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<serde_json::Value>,
    ) -> ApiResult<T> {
        let url = format!("{}{}", self.base_url, Self::api_endpoint(endpoint));
        debug!(%method, %url, "API request");

        let mut builder = self
            .http
            .request(method.clone(), &url)
            .header("Accept", "application/json");
        if let Some(token) = self.bearer_token() {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &body {
            builder = builder.json(body);
        }

        let resp = builder.send().await.map_err(|e| {
            warn!(%method, %url, error = %e, "API request failed");
            ApiError::from_transport(e)
        })?;

        let status = resp.status();
        let text = resp.text().await.map_err(ApiError::from_transport)?;
        if !status.is_success() {
            warn!(%method, %url, status = status.as_u16(), "API error response");
            return Err(ApiError::from_response(status.as_u16(), &text));
        }

        debug!(%method, %url, status = status.as_u16(), "API response");
        // Some endpoints answer 2xx with an empty body; decode that as null.
        let payload = if text.trim().is_empty() { "null" } else { &text };
        serde_json::from_str(payload).map_err(|e| ApiError::Decode(e.to_string()))
    }

    // -----------------------------------------------------------------------
    // Passport operations
    // -----------------------------------------------------------------------

    /// List all passports visible to the authenticated user.
    pub async fn list_passports(&self) -> ApiResult<Vec<Passport>> {
        self.request(Method::GET, "/passports/", None).await
    }

    /// Fetch one passport by id.
    pub async fn get_passport(&self, id: &str) -> ApiResult<Passport> {
        self.request(Method::GET, &format!("/passports/{id}/"), None)
            .await
    }

    /// Create a passport.
    pub async fn create_passport(&self, input: &PassportInput) -> ApiResult<Passport> {
        let body = serde_json::to_value(input).map_err(|e| ApiError::Decode(e.to_string()))?;
        self.request(Method::POST, "/passports/", Some(body)).await
    }

    /// Replace a passport (full-document update, never a partial patch).
    pub async fn update_passport(&self, id: &str, input: &PassportInput) -> ApiResult<Passport> {
        let body = serde_json::to_value(input).map_err(|e| ApiError::Decode(e.to_string()))?;
        self.request(Method::PUT, &format!("/passports/{id}/"), Some(body))
            .await
    }

    /// Validate the current credential and fetch the user behind it.
    pub async fn current_user(&self) -> ApiResult<CurrentUser> {
        self.request(Method::GET, "/users/me/", None).await
    }

    // -----------------------------------------------------------------------
    // Connectivity probe
    // -----------------------------------------------------------------------

    /// Probe backend liveness.
    ///
    /// Tries `/api/health-check/` with a short timeout; when that fails,
    /// probes the admin login page before reporting the backend down, since
    /// older deployments do not expose the health endpoint.
    pub async fn test_backend_connection(&self) -> ConnectionReport {
        let probe = match reqwest::Client::builder().timeout(PROBE_TIMEOUT).build() {
            Ok(c) => c,
            Err(e) => {
                return ConnectionReport {
                    success: false,
                    url: self.base_url.clone(),
                    status: None,
                    is_network_error: true,
                    detail: Some(e.to_string()),
                };
            }
        };

        let health_url = format!("{}/api/health-check/", self.base_url);
        debug!(url = %health_url, "probing backend");
        let first_err = match probe.get(&health_url).send().await {
            Ok(resp) if resp.status().is_success() => {
                let status = resp.status().as_u16();
                let detail = resp.text().await.ok();
                return ConnectionReport {
                    success: true,
                    url: self.base_url.clone(),
                    status: Some(status),
                    is_network_error: false,
                    detail,
                };
            }
            Ok(resp) => {
                let status = resp.status().as_u16();
                ConnectionReport {
                    success: false,
                    url: self.base_url.clone(),
                    status: Some(status),
                    is_network_error: false,
                    detail: None,
                }
            }
            Err(e) => ConnectionReport {
                success: false,
                url: self.base_url.clone(),
                status: None,
                is_network_error: true,
                detail: Some(e.to_string()),
            },
        };

        // Alternative probe in case health-check is not implemented.
        let admin_url = format!("{}/admin/login/", self.base_url);
        debug!(url = %admin_url, "probing alternative endpoint");
        match probe.get(&admin_url).send().await {
            Ok(resp) if resp.status().is_success() => ConnectionReport {
                success: true,
                url: self.base_url.clone(),
                status: Some(resp.status().as_u16()),
                is_network_error: false,
                detail: Some("Admin login page reachable".to_string()),
            },
            _ => {
                warn!(url = %self.base_url, "all backend connection attempts failed");
                first_err
            }
        }
    }
}
