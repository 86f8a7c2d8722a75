//! Offline-tolerant passport viewer.
//!
//! Network-first, cache-second, fail-loud-third: a successful fetch
//! refreshes the snapshot cache; a failed fetch falls back to the
//! last-known-good snapshot and flags the result as degraded; with no
//! snapshot the fetch error surfaces for a manual retry.

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use dpp_core::passport::Passport;

use crate::cache::SnapshotCache;
use crate::error::{ApiError, ApiResult};
use crate::http::ApiClient;

/// Connectivity as reported by the hosting platform.
///
/// This signal drives the degraded banner for live data; it does not decide
/// whether a fetch is attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    Online,
    Offline,
}

/// Where the displayed document came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    /// Fresh from the backend.
    Live,
    /// Last-known-good snapshot; staleness unbounded.
    Cached,
}

/// A loaded passport plus its display state.
#[derive(Debug, Clone)]
pub struct PassportView {
    pub passport: Passport,
    pub source: DataSource,
    /// Whether the degraded-mode banner shows.
    pub offline: bool,
}

/// Loads passports with snapshot fallback.
#[derive(Debug)]
pub struct PassportViewer<'a> {
    client: &'a ApiClient,
    cache: &'a SnapshotCache,
}

impl<'a> PassportViewer<'a> {
    pub fn new(client: &'a ApiClient, cache: &'a SnapshotCache) -> Self {
        Self { client, cache }
    }

    /// Load a passport by id.
    ///
    /// On a successful fetch the snapshot is refreshed and the banner
    /// follows the reported connectivity signal alone. On a failed fetch a
    /// snapshot hit renders with the banner forced on and no error
    /// surfaced; a miss propagates the fetch error. A manual refresh is
    /// simply another call.
    pub async fn load(&self, id: &str, connectivity: Connectivity) -> ApiResult<PassportView> {
        match self.client.get_passport(id).await {
            Ok(passport) => {
                // Best-effort cache: a failed write loses the update silently.
                if let Err(e) = self.cache.store(&passport) {
                    warn!(id, error = %e, "snapshot write failed");
                }
                Ok(PassportView {
                    passport,
                    source: DataSource::Live,
                    offline: connectivity == Connectivity::Offline,
                })
            }
            Err(err) => match self.cache.load(id) {
                Some(passport) => {
                    debug!(id, "fetch failed, serving cached snapshot");
                    Ok(PassportView {
                        passport,
                        source: DataSource::Cached,
                        offline: true,
                    })
                }
                None => {
                    warn!(id, error = %err, "fetch failed with no snapshot");
                    Err(err)
                }
            },
        }
    }

    /// [`Self::load`], cancellable by the owner of the token.
    ///
    /// Dropping the page no longer leaves a fetch writing into disposed
    /// state: cancel the token on teardown and the load resolves to
    /// [`ApiError::Cancelled`] without touching the cache.
    pub async fn load_cancellable(
        &self,
        id: &str,
        connectivity: Connectivity,
        cancel: &CancellationToken,
    ) -> ApiResult<PassportView> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(ApiError::Cancelled),
            view = self.load(id, connectivity) => view,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::DEFAULT_BACKEND_URL;
    use tempfile::tempdir;

    #[tokio::test]
    async fn cancelled_token_short_circuits_the_load() {
        let client = ApiClient::new(DEFAULT_BACKEND_URL).unwrap();
        let dir = tempdir().unwrap();
        let cache = SnapshotCache::new(dir.path());
        let viewer = PassportViewer::new(&client, &cache);

        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = viewer
            .load_cancellable("abc", Connectivity::Online, &cancel)
            .await;
        assert!(matches!(result, Err(ApiError::Cancelled)));
        // Nothing was written to the cache.
        assert!(cache.load("abc").is_none());
    }
}
