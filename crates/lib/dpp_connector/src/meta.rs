//! Product meta and connector options.
//!
//! The post-meta/options analog of the host platform: per-product string
//! key/value pairs plus site-wide options, persisted as one JSON document
//! with write-through semantics.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::SyncError;

/// Per-product flag enabling sync on save ("yes" enables).
pub const META_SYNC_ENABLED: &str = "_dpp_sync_enabled";
/// Backend passport id stored after the first successful create.
pub const META_PASSPORT_ID: &str = "_dpp_passport_id";
/// QR code persisted before the first sync so later syncs reuse it.
pub const META_QR_CODE: &str = "_dpp_qr_code";
/// Carbon footprint, parsed as a float (0.0 when unparsable).
pub const META_CARBON_FOOTPRINT: &str = "_dpp_carbon_footprint";
/// Recyclability yes/no flag.
pub const META_RECYCLABLE: &str = "_dpp_recyclable";
/// Comma-separated materials list.
pub const META_MATERIALS: &str = "_dpp_materials";
/// Unix timestamp of the last successful sync.
pub const META_LAST_SYNC: &str = "_dpp_last_sync";

/// Site-wide option: backend API base URL.
pub const OPTION_API_URL: &str = "dpp_connector_api_url";
/// Site-wide option: backend API key.
pub const OPTION_API_KEY: &str = "dpp_connector_api_key";

/// API URL used when the option is unset.
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";

#[derive(Debug, Default, Serialize, Deserialize)]
struct MetaDocument {
    #[serde(default)]
    options: BTreeMap<String, String>,
    #[serde(default)]
    products: BTreeMap<String, BTreeMap<String, String>>,
}

/// File-backed store of product meta and connector options.
#[derive(Debug)]
pub struct MetaStore {
    path: PathBuf,
    doc: Mutex<MetaDocument>,
}

impl MetaStore {
    /// Open a store at the given path; a missing file starts empty.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SyncError> {
        let path = path.as_ref().to_path_buf();
        let doc = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| SyncError::Store(e.to_string()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => MetaDocument::default(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path,
            doc: Mutex::new(doc),
        })
    }

    fn persist(&self, doc: &MetaDocument) -> Result<(), SyncError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json =
            serde_json::to_string_pretty(doc).map_err(|e| SyncError::Store(e.to_string()))?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    /// Read one meta value for a product.
    pub fn product_meta(&self, product_id: u64, key: &str) -> Option<String> {
        self.doc
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .products
            .get(&product_id.to_string())
            .and_then(|meta| meta.get(key))
            .cloned()
    }

    /// Write one meta value for a product (write-through to disk).
    pub fn set_product_meta(
        &self,
        product_id: u64,
        key: &str,
        value: impl Into<String>,
    ) -> Result<(), SyncError> {
        let mut doc = self.doc.lock().unwrap_or_else(PoisonError::into_inner);
        doc.products
            .entry(product_id.to_string())
            .or_default()
            .insert(key.to_string(), value.into());
        self.persist(&doc)
    }

    /// Read a site-wide option.
    pub fn option(&self, key: &str) -> Option<String> {
        self.doc
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .options
            .get(key)
            .cloned()
    }

    /// Write a site-wide option (write-through to disk).
    pub fn set_option(&self, key: &str, value: impl Into<String>) -> Result<(), SyncError> {
        let mut doc = self.doc.lock().unwrap_or_else(PoisonError::into_inner);
        doc.options.insert(key.to_string(), value.into());
        self.persist(&doc)
    }
}
