//! Passport snapshot cache.
//!
//! Keeps the last successfully fetched copy of each passport so the viewer
//! can render something when the backend is unreachable. Snapshots are
//! overwritten only on a successful fetch, never proactively evicted, and
//! their staleness is unbounded by design.

use std::fs;
use std::path::{Path, PathBuf};

use dashmap::DashMap;
use tracing::debug;

use dpp_core::passport::Passport;

use crate::error::{ApiError, ApiResult};

/// Subdirectory of the state dir holding snapshot files.
const SNAPSHOT_DIR: &str = "passports";

/// Snapshot file name prefix, keyed by passport id.
const SNAPSHOT_PREFIX: &str = "dpp_passport_";

/// Id-keyed store of last-known-good passport documents.
///
/// Reads are memoised in-process; the files are the durable copy.
#[derive(Debug)]
pub struct SnapshotCache {
    dir: PathBuf,
    memo: DashMap<String, Passport>,
}

impl SnapshotCache {
    /// Create a cache rooted at a state directory.
    pub fn new(state_dir: impl AsRef<Path>) -> Self {
        Self {
            dir: state_dir.as_ref().join(SNAPSHOT_DIR),
            memo: DashMap::new(),
        }
    }

    fn snapshot_path(&self, id: &str) -> PathBuf {
        // Ids are opaque; keep the file name safe.
        let safe: String = id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{SNAPSHOT_PREFIX}{safe}.json"))
    }

    /// Persist a snapshot, replacing any previous copy for that id.
    pub fn store(&self, passport: &Passport) -> ApiResult<()> {
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(passport)
            .map_err(|e| ApiError::Storage(e.to_string()))?;
        fs::write(self.snapshot_path(&passport.id), json)?;
        self.memo.insert(passport.id.clone(), passport.clone());
        debug!(id = %passport.id, "snapshot stored");
        Ok(())
    }

    /// Read the last-known-good snapshot for a passport id.
    ///
    /// A missing or unreadable snapshot is a miss; the cache never fails a
    /// read loudly.
    pub fn load(&self, id: &str) -> Option<Passport> {
        if let Some(hit) = self.memo.get(id) {
            return Some(hit.clone());
        }
        let raw = fs::read_to_string(self.snapshot_path(id)).ok()?;
        let passport: Passport = serde_json::from_str(&raw).ok()?;
        self.memo.insert(id.to_string(), passport.clone());
        Some(passport)
    }
}
