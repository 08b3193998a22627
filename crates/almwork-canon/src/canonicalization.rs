use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::CanonError;

pub const CANONICALIZATION_BACKEND: &str = "jcs-rfc8785";
pub const HASH_ALGORITHM: &str = "sha256";

/// Serializes `value` to JCS-canonical JSON (RFC 8785).
///
/// Field order in the source struct is irrelevant: two structurally equal
/// values always emit byte-identical output, which is what makes
/// [`content_hash`] stable across re-fetches of the same snapshot.
pub fn emit_jcs<T: Serialize>(value: &T) -> Result<String, CanonError> {
    let json_value = serde_json::to_value(value)?;
    let json_bytes = serde_json_canonicalizer::to_vec(&json_value)
        .map_err(|e| CanonError::Jcs(e.to_string()))?;
    Ok(String::from_utf8(json_bytes)?)
}

/// Computes the lowercase hex SHA-256 digest of a value's JCS-canonical form.
///
/// This is the content hash every signature is taken over (invariant: the
/// same logical snapshot always hashes the same regardless of which code
/// path produced the in-memory struct).
pub fn content_hash<T: Serialize>(value: &T) -> Result<String, CanonError> {
    let canonical = emit_jcs(value)?;
    Ok(hex_sha256(canonical.as_bytes()))
}

#[must_use]
pub fn hex_sha256(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    hex_encode(&digest)
}

#[must_use]
pub fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write as _;
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}

pub fn hex_decode(s: &str) -> Result<Vec<u8>, CanonError> {
    if s.len() % 2 != 0 {
        return Err(CanonError::Hex("odd-length hex string".into()));
    }
    (0..s.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&s[i..i + 2], 16)
                .map_err(|e| CanonError::Hex(format!("invalid hex byte at offset {i}: {e}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Sample {
        b: i32,
        a: i32,
    }

    #[test]
    fn jcs_sorts_keys() {
        let json = emit_jcs(&Sample { b: 2, a: 1 }).unwrap();
        assert_eq!(json, r#"{"a":1,"b":2}"#);
    }

    #[test]
    fn content_hash_is_deterministic() {
        let h1 = content_hash(&Sample { b: 2, a: 1 }).unwrap();
        let h2 = content_hash(&Sample { a: 1, b: 2 }).unwrap();
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);
    }

    #[test]
    fn hex_roundtrip() {
        let bytes = [0u8, 1, 255, 16];
        let encoded = hex_encode(&bytes);
        assert_eq!(hex_decode(&encoded).unwrap(), bytes);
    }
}
