//! # dpp_client
//!
//! Dashboard-side client for the Digital Product Passport backend: the
//! authenticated API client, the session store, the magic-link auth flow,
//! the route guard, and the offline-tolerant passport viewer.

pub mod auth;
pub mod cache;
pub mod error;
pub mod guard;
pub mod http;
pub mod session;
pub mod viewer;

pub use error::{ApiError, ApiResult};
pub use http::ApiClient;
pub use session::{SessionStore, SessionTokens};

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
