//! Magic-link authentication flows.
//!
//! A magic link is a single-use, time-limited URL token. Requesting one is
//! terminal for that interaction (no polling); verifying one converts the
//! token into a session. Email verification shares the exchange shape but
//! only unlocks the ability to log in.

use std::time::Duration;

use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::http::ApiClient;
use crate::session::{SessionStore, SessionTokens};

/// Delay before the post-login dashboard redirect, so the success message
/// stays visible: 2 seconds.
pub const DASHBOARD_REDIRECT_DELAY: Duration = Duration::from_secs(2);

/// Delay before the post-save dashboard redirect: 1.5 seconds.
pub const SAVE_REDIRECT_DELAY: Duration = Duration::from_millis(1500);

/// Terminal states of a token-exchange page.
///
/// `Verifying` is entered once and is the only state that issues a network
/// call; it is never re-entered — the user restarts the flow instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyState {
    Verifying,
    Success,
    Error { message: String },
}

/// Token pair payload from `/api/users/magic-link/verify/`.
#[derive(Debug, Deserialize)]
struct MagicLinkVerifyResponse {
    access: String,
    refresh: String,
}

#[derive(Debug, Serialize)]
struct EmailPayload<'a> {
    email: &'a str,
}

#[derive(Debug, Serialize)]
struct TokenPayload<'a> {
    token: &'a str,
}

/// Registration payload for `/api/auth/register/`.
#[derive(Debug, Clone, Serialize)]
pub struct RegistrationRequest {
    pub email: String,
    pub username: String,
    pub password: String,
    /// Confirmation copy; the backend rejects mismatches.
    pub password2: String,
}

/// Ask the backend to email a login link.
///
/// Success means "link sent" and ends the interaction; the caller retries
/// manually on failure.
pub async fn request_magic_link(client: &ApiClient, email: &str) -> ApiResult<()> {
    let body = serde_json::to_value(EmailPayload { email })
        .map_err(|e| ApiError::Decode(e.to_string()))?;
    let _: serde_json::Value = client
        .request(Method::POST, "/users/magic-link/request/", Some(body))
        .await?;
    info!(email, "magic link requested");
    Ok(())
}

/// Exchange a one-time magic-link token for a session.
///
/// On success both tokens are persisted through the store and the client's
/// bearer credential is set for the remainder of the session. On failure
/// nothing is persisted.
pub async fn verify_magic_link(
    client: &ApiClient,
    store: &SessionStore,
    token: &str,
) -> ApiResult<SessionTokens> {
    let body = serde_json::to_value(TokenPayload { token })
        .map_err(|e| ApiError::Decode(e.to_string()))?;
    let resp: MagicLinkVerifyResponse = client
        .request(Method::POST, "/users/magic-link/verify/", Some(body))
        .await?;

    let tokens = SessionTokens {
        access_token: resp.access,
        refresh_token: resp.refresh,
    };
    store.save(&tokens)?;
    client.set_bearer_token(Some(tokens.access_token.clone()));
    info!("magic link verified, session established");
    Ok(tokens)
}

/// Run the magic-login page flow, mapping the exchange onto [`VerifyState`].
///
/// A missing token short-circuits to the error state without any network
/// call. The error state is terminal; the user must request a new link.
pub async fn run_magic_login(
    client: &ApiClient,
    store: &SessionStore,
    token: &str,
) -> VerifyState {
    if token.is_empty() {
        return VerifyState::Error {
            message: "Invalid login link. Please request a new one.".to_string(),
        };
    }
    match verify_magic_link(client, store, token).await {
        Ok(_) => VerifyState::Success,
        Err(_) => VerifyState::Error {
            message: "This login link is invalid or expired. Please request a new one."
                .to_string(),
        },
    }
}

/// Exchange an account-activation token.
///
/// Success unlocks login but does not authenticate — no tokens are issued.
pub async fn verify_email(client: &ApiClient, token: &str) -> ApiResult<()> {
    let body = serde_json::to_value(TokenPayload { token })
        .map_err(|e| ApiError::Decode(e.to_string()))?;
    let _: serde_json::Value = client
        .request(Method::POST, "/users/verify-email/", Some(body))
        .await?;
    info!("email verified");
    Ok(())
}

/// Run the email-verification page flow.
pub async fn run_email_verification(client: &ApiClient, token: &str) -> VerifyState {
    if token.is_empty() {
        return VerifyState::Error {
            message: "Invalid verification link. Please register again.".to_string(),
        };
    }
    match verify_email(client, token).await {
        Ok(()) => VerifyState::Success,
        Err(_) => VerifyState::Error {
            message: "This verification link is invalid or expired. Please register again."
                .to_string(),
        },
    }
}

/// Create an account. The backend sends the verification email.
pub async fn register(client: &ApiClient, request: &RegistrationRequest) -> ApiResult<()> {
    let body =
        serde_json::to_value(request).map_err(|e| ApiError::Decode(e.to_string()))?;
    let _: serde_json::Value = client
        .request(Method::POST, "/auth/register/", Some(body))
        .await?;
    info!(email = %request.email, "registration submitted");
    Ok(())
}

/// Destroy the session: clear the persisted tokens and the bearer header.
pub fn logout(client: &ApiClient, store: &SessionStore) -> ApiResult<()> {
    store.clear()?;
    client.set_bearer_token(None);
    info!("logged out");
    Ok(())
}
