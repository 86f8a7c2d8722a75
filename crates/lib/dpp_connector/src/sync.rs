//! Product sync.
//!
//! Builds a passport payload from product fields and meta, chooses create
//! vs. update from the stored passport id, and reports the outcome as a
//! boolean — an API failure is logged and surfaced to the caller, never
//! raised further.

use chrono::Utc;
use serde_json::{Value, json};
use tracing::{debug, error};

use dpp_core::qr::generate_qr_code;

use crate::SyncError;
use crate::api::ConnectorApi;
use crate::meta::{
    META_CARBON_FOOTPRINT, META_LAST_SYNC, META_MATERIALS, META_PASSPORT_ID, META_QR_CODE,
    META_RECYCLABLE, META_SYNC_ENABLED, MetaStore,
};

/// Physical dimensions as the platform reports them (freeform strings).
#[derive(Debug, Clone, Default)]
pub struct Dimensions {
    pub length: Option<String>,
    pub width: Option<String>,
    pub height: Option<String>,
}

/// A product record as handed over on save.
#[derive(Debug, Clone)]
pub struct Product {
    pub id: u64,
    pub name: String,
    pub weight: Option<String>,
    pub dimensions: Dimensions,
    /// Custom attributes, label → joined value string.
    pub attributes: Vec<(String, String)>,
}

/// Syncs products into the passport backend.
#[derive(Debug)]
pub struct ProductSync<'a> {
    api: &'a ConnectorApi,
    store: &'a MetaStore,
    site_host: String,
}

impl<'a> ProductSync<'a> {
    pub fn new(api: &'a ConnectorApi, store: &'a MetaStore, site_host: impl Into<String>) -> Self {
        Self {
            api,
            store,
            site_host: site_host.into(),
        }
    }

    /// Sync one product. Returns whether the sync succeeded.
    ///
    /// Products without the per-product sync flag are skipped. Any API
    /// failure is logged and reported as `false`.
    pub async fn sync_product(&self, product: &Product) -> bool {
        if self.store.product_meta(product.id, META_SYNC_ENABLED).as_deref() != Some("yes") {
            debug!(product_id = product.id, "sync disabled for product, skipping");
            return false;
        }
        match self.run_sync(product).await {
            Ok(()) => true,
            Err(e) => {
                error!(product_id = product.id, error = %e, "sync failed");
                false
            }
        }
    }

    async fn run_sync(&self, product: &Product) -> Result<(), SyncError> {
        let payload = self.prepare_passport_data(product)?;

        match self.store.product_meta(product.id, META_PASSPORT_ID) {
            Some(passport_id) => {
                self.api.update_passport(&passport_id, &payload).await?;
            }
            None => {
                let created = self.api.create_passport(&payload).await?;
                // Store the returned id so the next save updates in place.
                if let Some(id) = passport_id_from(&created) {
                    self.store
                        .set_product_meta(product.id, META_PASSPORT_ID, id)?;
                }
            }
        }

        self.store.set_product_meta(
            product.id,
            META_LAST_SYNC,
            Utc::now().timestamp().to_string(),
        )?;
        Ok(())
    }

    /// Build the passport payload from product fields and meta.
    fn prepare_passport_data(&self, product: &Product) -> Result<Value, SyncError> {
        let qr_code = self.ensure_qr_code(product)?;

        let carbon_footprint: f64 = self
            .store
            .product_meta(product.id, META_CARBON_FOOTPRINT)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0.0);
        let recyclable =
            self.store.product_meta(product.id, META_RECYCLABLE).as_deref() == Some("yes");
        let materials: Vec<String> = self
            .store
            .product_meta(product.id, META_MATERIALS)
            .filter(|raw| !raw.is_empty())
            .map(|raw| raw.split(',').map(|s| s.trim().to_string()).collect())
            .unwrap_or_default();

        Ok(json!({
            "name": product.name,
            "qr_code": qr_code,
            "sustainability_data": {
                "carbon_footprint": carbon_footprint,
                "recyclable": recyclable,
                "materials": materials,
                "product_attributes": product_attributes(product),
                "compliance": {
                    "eu_ecodesign": true,
                    "regulation_ref": "EU Regulation 2022/1369",
                },
            },
        }))
    }

    /// Reuse the stored QR code or generate and persist one.
    ///
    /// Persisting before the first sync keeps the field idempotent across
    /// later syncs.
    fn ensure_qr_code(&self, product: &Product) -> Result<String, SyncError> {
        if let Some(code) = self.store.product_meta(product.id, META_QR_CODE)
            && !code.is_empty()
        {
            return Ok(code);
        }
        let code = generate_qr_code(product.id, &self.site_host, Utc::now().timestamp());
        self.store
            .set_product_meta(product.id, META_QR_CODE, code.clone())?;
        Ok(code)
    }
}

/// Derived product attributes: weight, dimensions and custom attributes.
fn product_attributes(product: &Product) -> Value {
    let mut attrs = json!({
        "weight": product.weight,
        "dimensions": {
            "length": product.dimensions.length,
            "width": product.dimensions.width,
            "height": product.dimensions.height,
        },
    });
    if !product.attributes.is_empty() {
        let custom: serde_json::Map<String, Value> = product
            .attributes
            .iter()
            .map(|(name, value)| (name.clone(), Value::String(value.clone())))
            .collect();
        attrs["attributes"] = Value::Object(custom);
    }
    attrs
}

/// Extract the passport id from a create response.
fn passport_id_from(created: &Value) -> Option<String> {
    match created.get("id")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product() -> Product {
        Product {
            id: 42,
            name: "Shoe".into(),
            weight: Some("0.4".into()),
            dimensions: Dimensions {
                length: Some("30".into()),
                width: Some("12".into()),
                height: Some("10".into()),
            },
            attributes: vec![("Color".into(), "Blue, Red".into())],
        }
    }

    #[test]
    fn product_attributes_include_custom_attributes_when_present() {
        let attrs = product_attributes(&product());
        assert_eq!(attrs["weight"], json!("0.4"));
        assert_eq!(attrs["dimensions"]["length"], json!("30"));
        assert_eq!(attrs["attributes"]["Color"], json!("Blue, Red"));
    }

    #[test]
    fn product_attributes_omit_custom_attributes_when_empty() {
        let mut p = product();
        p.attributes.clear();
        let attrs = product_attributes(&p);
        assert!(attrs.get("attributes").is_none());
    }

    #[test]
    fn passport_id_accepts_string_and_number_ids() {
        assert_eq!(passport_id_from(&json!({"id": "p-1"})), Some("p-1".into()));
        assert_eq!(passport_id_from(&json!({"id": 17})), Some("17".into()));
        assert_eq!(passport_id_from(&json!({"name": "x"})), None);
    }
}
