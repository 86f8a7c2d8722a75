//! QR code generation.
//!
//! Codes follow the fixed format `DPP-{SITE8}-{PRODUCTID}-{HASH8}` so a
//! product synced once keeps the same code on every later sync.

use sha2::{Digest, Sha256};

/// Code prefix.
const QR_PREFIX: &str = "DPP";

/// Characters of the site host kept in the code.
const SITE_PART_LEN: usize = 8;

/// Hex characters of the hash kept in the code.
const HASH_PART_LEN: usize = 8;

/// Generate a QR code for a product.
///
/// The site part is the host with non-alphanumerics stripped, truncated to
/// eight characters; the hash part is the first eight hex characters of
/// SHA-256 over product id, site host and timestamp. The whole code is
/// uppercased. Deterministic for fixed inputs.
pub fn generate_qr_code(product_id: u64, site_host: &str, timestamp: i64) -> String {
    let site_part: String = site_host
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(SITE_PART_LEN)
        .collect();

    let digest = Sha256::digest(format!("{product_id}{site_host}{timestamp}").as_bytes());
    let hash_hex = format!("{digest:x}");
    let hash_part = &hash_hex[..HASH_PART_LEN];

    format!("{QR_PREFIX}-{site_part}-{product_id}-{hash_part}").to_uppercase()
}
