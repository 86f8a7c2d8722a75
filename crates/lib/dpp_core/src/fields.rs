//! Sustainability field codec.
//!
//! The editing surface works on ordered `{key, value}` string pairs; the
//! wire format is a mapping of typed values. One pure function per
//! direction keeps the coercion rules testable independently of any UI.

use serde::{Deserialize, Serialize};

use crate::passport::SustainabilityData;

/// A typed sustainability value.
///
/// Untagged on the wire: `true`, `12.5`, `["steel", "plastic"]` and
/// `"hand wash"` all map onto the matching variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SustainabilityValue {
    Bool(bool),
    Number(f64),
    List(Vec<String>),
    Text(String),
}

/// One editable key/value row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldEntry {
    pub key: String,
    pub value: String,
}

impl FieldEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Coerce a raw field value string into a typed value.
///
/// Precedence:
/// 1. literal `"true"` / `"false"` → boolean
/// 2. non-empty and parses as a finite number → number
/// 3. contains a comma → comma-split, trimmed list of strings
/// 4. otherwise → string
///
/// Only finite numbers coerce; `"inf"` and `"NaN"` have no JSON number
/// representation and stay strings.
pub fn parse_field_value(raw: &str) -> SustainabilityValue {
    match raw {
        "true" => return SustainabilityValue::Bool(true),
        "false" => return SustainabilityValue::Bool(false),
        _ => {}
    }
    let trimmed = raw.trim();
    if !trimmed.is_empty()
        && let Ok(n) = trimmed.parse::<f64>()
        && n.is_finite()
    {
        return SustainabilityValue::Number(n);
    }
    if raw.contains(',') {
        return SustainabilityValue::List(
            raw.split(',').map(|s| s.trim().to_string()).collect(),
        );
    }
    SustainabilityValue::Text(raw.to_string())
}

/// Render a typed value back into its editable string form.
///
/// Lists are joined with `", "`; everything else uses its display form.
/// The inverse of [`parse_field_value`] up to the coercion rules (a
/// single-element list reads back as plain text, as in the original form).
pub fn format_field_value(value: &SustainabilityValue) -> String {
    match value {
        SustainabilityValue::Bool(b) => b.to_string(),
        SustainabilityValue::Number(n) => n.to_string(),
        SustainabilityValue::List(items) => items.join(", "),
        SustainabilityValue::Text(s) => s.clone(),
    }
}

/// Collapse editable rows into the submitted mapping.
///
/// Rows with an empty key or empty value are dropped. Duplicate keys are
/// permitted in the editor but collapse to one entry, last write wins.
pub fn collect_fields(entries: &[FieldEntry]) -> SustainabilityData {
    let mut data = SustainabilityData::new();
    for entry in entries {
        if entry.key.is_empty() || entry.value.is_empty() {
            continue;
        }
        data.insert(entry.key.clone(), parse_field_value(&entry.value));
    }
    data
}

/// Expand an existing mapping into editable rows.
pub fn expand_fields(data: &SustainabilityData) -> Vec<FieldEntry> {
    data.iter()
        .map(|(key, value)| FieldEntry::new(key.clone(), format_field_value(value)))
        .collect()
}
