//! Route guard.
//!
//! Gates protected surfaces on a server-side token validation round trip.
//! There is no local expiry check and no caching of results — every check
//! re-validates against the backend.

use tracing::{debug, warn};

use crate::http::{ApiClient, CurrentUser};
use crate::session::SessionStore;

/// Outcome of an access check.
#[derive(Debug)]
pub enum AccessState {
    /// Token validated; render the protected content.
    Authenticated(CurrentUser),
    /// No usable session; redirect to the login entry point.
    Unauthenticated,
}

impl AccessState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AccessState::Authenticated(_))
    }
}

/// Check whether the stored session grants access.
///
/// An absent token classifies as unauthenticated immediately, with no
/// network call. A present token is validated with exactly one "who am I"
/// round trip; any failure — including a plain network failure — purges
/// both stored tokens.
pub async fn check_access(client: &ApiClient, store: &SessionStore) -> AccessState {
    let Some(tokens) = store.load() else {
        debug!("no stored session, unauthenticated");
        return AccessState::Unauthenticated;
    };

    client.set_bearer_token(Some(tokens.access_token));
    match client.current_user().await {
        Ok(user) => {
            debug!(user_id = user.id, "token validated");
            AccessState::Authenticated(user)
        }
        Err(err) => {
            warn!(error = %err, "token validation failed, purging session");
            if let Err(e) = store.clear() {
                warn!(error = %e, "failed to purge session");
            }
            client.set_bearer_token(None);
            AccessState::Unauthenticated
        }
    }
}
