//! Passport domain models.
//!
//! A passport is a product record plus a freeform sustainability mapping.
//! The mapping is always present (possibly empty), never null, and is only
//! ever replaced as a whole document — there is no partial patch.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fields::SustainabilityValue;

/// Open mapping from field name to a typed sustainability value.
pub type SustainabilityData = BTreeMap<String, SustainabilityValue>;

/// A Digital Product Passport as served by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passport {
    /// Opaque identifier, externally assigned, immutable once created.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Externally-unique identifier linking the physical product.
    pub qr_code: String,
    /// Freeform sustainability mapping. Consumers must handle arbitrary keys.
    #[serde(default)]
    pub sustainability_data: SustainabilityData,
    /// Server-assigned creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Server-assigned last-update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Passport {
    /// Whether the passport carries any sustainability data.
    ///
    /// An explicitly-empty mapping is a valid state distinct from "document
    /// not loaded"; callers render a "no data available" notice for it.
    pub fn has_sustainability_data(&self) -> bool {
        !self.sustainability_data.is_empty()
    }
}

/// Payload for creating or fully replacing a passport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassportInput {
    pub name: String,
    pub qr_code: String,
    #[serde(default)]
    pub sustainability_data: SustainabilityData,
}
