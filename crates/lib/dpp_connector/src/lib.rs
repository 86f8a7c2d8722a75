//! # dpp_connector
//!
//! Store-side connector that mirrors product records into the passport
//! backend. It is an independent client of the same wire contract as the
//! dashboard — the two share the backend surface, deliberately not code.

pub mod api;
pub mod meta;
pub mod sync;

use thiserror::Error;

pub use api::ConnectorApi;
pub use meta::MetaStore;
pub use sync::{Product, ProductSync};

/// Connector errors.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The backend answered with an error status.
    #[error("API error ({status}): {detail}")]
    Api { status: u16, detail: String },

    /// The request never completed.
    #[error("Request failed: {0}")]
    Request(String),

    /// The response body could not be parsed.
    #[error("Response parse error: {0}")]
    Parse(String),

    /// The local meta store could not be read or written.
    #[error("Meta store error: {0}")]
    Store(String),
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::Store(err.to_string())
    }
}

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
