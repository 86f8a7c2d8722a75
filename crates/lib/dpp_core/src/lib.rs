//! # dpp_core
//!
//! Core domain model for Digital Product Passports: the passport document
//! itself, the freeform sustainability field codec, and QR code generation.

pub mod fields;
pub mod passport;
pub mod qr;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
