use rand::rngs::OsRng;
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::pss::{BlindedSigningKey, Signature, VerifyingKey};
use rsa::signature::{RandomizedSigner, SignatureEncoding, Verifier};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;

use crate::canonicalization::hex_encode;
use crate::error::CanonError;

/// Key size used for newly generated identities. 3072 bits matches the
/// conservative end of what regulated-environment PKI typically mandates
/// for RSA through at least 2030.
pub const KEY_BITS: usize = 3072;

/// Generates a fresh RSA key pair, PEM-encoded (PKCS#8).
pub fn generate_keypair() -> Result<(String, String), CanonError> {
    use rsa::pkcs8::{EncodePrivateKey, EncodePublicKey, LineEnding};

    let mut rng = OsRng;
    let private_key = RsaPrivateKey::new(&mut rng, KEY_BITS)
        .map_err(|e| CanonError::KeyParse(e.to_string()))?;
    let public_key = RsaPublicKey::from(&private_key);

    let private_pem = private_key
        .to_pkcs8_pem(LineEnding::LF)
        .map_err(|e| CanonError::KeyParse(e.to_string()))?
        .to_string();
    let public_pem = public_key
        .to_public_key_pem(LineEnding::LF)
        .map_err(|e| CanonError::KeyParse(e.to_string()))?;

    Ok((private_pem, public_pem))
}

/// Signs a hex-encoded SHA-256 content hash with RSA-PSS
/// (SHA-256 digest, MGF1(SHA-256), salt length = digest length).
///
/// Returns the lowercase hex-encoded signature bytes.
pub fn sign_content_hash(private_key_pem: &str, content_hash_hex: &str) -> Result<String, CanonError> {
    let private_key = RsaPrivateKey::from_pkcs8_pem(private_key_pem)
        .map_err(|e| CanonError::KeyParse(e.to_string()))?;
    let signing_key = BlindedSigningKey::<Sha256>::new(private_key);
    let mut rng = OsRng;

    let signature = signing_key.sign_with_rng(&mut rng, content_hash_hex.as_bytes());
    Ok(hex_encode(&signature.to_bytes()))
}

/// Verifies a signature produced by [`sign_content_hash`] against the same
/// content hash and the signer's public key.
pub fn verify_signature(
    public_key_pem: &str,
    content_hash_hex: &str,
    signature_hex: &str,
) -> Result<bool, CanonError> {
    let public_key = RsaPublicKey::from_public_key_pem(public_key_pem)
        .map_err(|e| CanonError::KeyParse(e.to_string()))?;
    let verifying_key = VerifyingKey::<Sha256>::new(public_key);

    let signature_bytes = crate::canonicalization::hex_decode(signature_hex)?;
    let signature = Signature::try_from(signature_bytes.as_slice())
        .map_err(|e| CanonError::Verify(e.to_string()))?;

    Ok(verifying_key
        .verify(content_hash_hex.as_bytes(), &signature)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_then_verify_roundtrips() {
        let (private_pem, public_pem) = generate_keypair().unwrap();
        let hash = crate::canonicalization::hex_sha256(b"some canonical content");
        let sig = sign_content_hash(&private_pem, &hash).unwrap();
        assert!(verify_signature(&public_pem, &hash, &sig).unwrap());
    }

    #[test]
    fn verify_rejects_tampered_hash() {
        let (private_pem, public_pem) = generate_keypair().unwrap();
        let hash = crate::canonicalization::hex_sha256(b"original content");
        let sig = sign_content_hash(&private_pem, &hash).unwrap();
        let other_hash = crate::canonicalization::hex_sha256(b"different content");
        assert!(!verify_signature(&public_pem, &other_hash, &sig).unwrap());
    }

    #[test]
    fn verify_rejects_wrong_key() {
        let (private_pem, _) = generate_keypair().unwrap();
        let (_, other_public_pem) = generate_keypair().unwrap();
        let hash = crate::canonicalization::hex_sha256(b"content");
        let sig = sign_content_hash(&private_pem, &hash).unwrap();
        assert!(!verify_signature(&other_public_pem, &hash, &sig).unwrap());
    }
}
