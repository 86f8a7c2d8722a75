//! CLI error type.
//!
//! Everything reaching `main` is user-facing text; nothing panics.

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] dpp_client::ApiError),

    #[error(transparent)]
    Sync(#[from] dpp_connector::SyncError),

    #[error("Not authenticated. Run `dpp login <email>` to request a magic link.")]
    Unauthenticated,

    /// Token-exchange failures carry the page's own message.
    #[error("{0}")]
    Auth(String),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("Backend connection failed: {0}")]
    Connection(String),

    #[error("Sync failed for product {0}")]
    SyncFailed(u64),
}
