//! Sealing secret values for upload.
//!
//! GitHub accepts secret values encrypted as a libsodium sealed box against
//! the repository or environment public key, base64-encoded.

use crate::error::{Error, Result};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use crypto_box::PublicKey;
use crypto_box::aead::OsRng;

/// Seal `plaintext` for the base64-encoded X25519 `public_key`.
///
/// Returns the base64-encoded ciphertext.
pub fn seal_secret(public_key: &str, plaintext: &str) -> Result<String> {
    let raw = STANDARD
        .decode(public_key.trim())
        .map_err(|e| Error::Seal(format!("public key is not valid base64: {e}")))?;
    let bytes: [u8; 32] = raw
        .try_into()
        .map_err(|raw: Vec<u8>| Error::Seal(format!("public key must be 32 bytes, got {}", raw.len())))?;

    let sealed = PublicKey::from(bytes)
        .seal(&mut OsRng, plaintext.as_bytes())
        .map_err(|e| Error::Seal(e.to_string()))?;

    Ok(STANDARD.encode(sealed))
}
