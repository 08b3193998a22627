//! Canonical JSON hashing and RSA-PSS signing primitives.
//!
//! Every signable entity in the system is hashed the same way: serialize to
//! JCS-canonical JSON (RFC 8785), then SHA-256 the UTF-8 bytes. Signing
//! never touches the entity directly — it signs that hex content hash.

pub mod canonicalization;
pub mod error;
pub mod signing;

pub use canonicalization::{content_hash, emit_jcs, hex_decode, hex_encode, hex_sha256};
pub use error::CanonError;
pub use signing::{generate_keypair, sign_content_hash, verify_signature};
