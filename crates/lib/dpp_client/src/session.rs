//! Session token persistence.
//!
//! One store owns the `{access, refresh}` token pair on disk; every
//! component that issues authenticated calls is handed the same store
//! instead of reading ambient state. The refresh token is persisted but
//! never exchanged — re-login happens through a fresh magic link.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ApiError, ApiResult};

/// File the token pair is persisted to, inside the state directory.
const SESSION_FILE: &str = "session.json";

/// The bearer token pair returned by magic-link verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTokens {
    /// Short-lived token sent on every authenticated request.
    pub access_token: String,
    /// Stored alongside the access token; not exchanged by this client.
    pub refresh_token: String,
}

/// File-backed store for the current session.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Create a store rooted at a state directory.
    pub fn new(state_dir: impl AsRef<Path>) -> Self {
        Self {
            path: state_dir.as_ref().join(SESSION_FILE),
        }
    }

    /// Persist a token pair, replacing any previous session.
    pub fn save(&self, tokens: &SessionTokens) -> ApiResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json =
            serde_json::to_string_pretty(tokens).map_err(|e| ApiError::Storage(e.to_string()))?;
        fs::write(&self.path, json)?;
        debug!(path = %self.path.display(), "session saved");
        Ok(())
    }

    /// Load the persisted token pair, if a session exists.
    ///
    /// A missing or unreadable file is simply "no session".
    pub fn load(&self) -> Option<SessionTokens> {
        let raw = fs::read_to_string(&self.path).ok()?;
        serde_json::from_str(&raw).ok()
    }

    /// Destroy the session. Removing a session that does not exist is fine.
    pub fn clear(&self) -> ApiResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "session cleared");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Default state directory: `<data dir>/dpp`.
pub fn default_state_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("dpp")
}
