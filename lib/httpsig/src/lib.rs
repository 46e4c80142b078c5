//!
//! Construction and verification of Cavage-style HTTP `Signature` headers
//!
//! Supports `rsa-sha256`, `hmac-sha256`, and the generalised `hs2019` scheme
//! with optional `created`/`expires` validity bounds.
//!

pub mod cavage;
pub mod crypto;
