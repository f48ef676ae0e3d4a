//! Notebook access token generation, at-rest encryption and hashing.
//!
//! A token is a random UUID v4 string handed to the browser inside the
//! Jupyter access URL. Only an encrypted envelope and a SHA-256 hash are
//! persisted. The envelope text is `base64(ciphertext) + "." + base64(nonce)`
//! where the ciphertext carries the AES-256-GCM tag and the nonce is 96 bits.
//!
//! Keys are never stored: [`OwnerKey::derive`] rebuilds the per-owner key on
//! every call from the server secret and the owner's id via HKDF-SHA256.

use std::fmt;

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use hkdf::Hkdf;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::TokenError;
use crate::types::OwnerId;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Separator between the ciphertext and nonce halves of an envelope.
pub const ENVELOPE_SEPARATOR: char = '.';

/// AES-GCM nonce length in bytes.
pub const NONCE_LEN: usize = 12;

/// Minimum accepted length of the server-side key material.
pub const MIN_SECRET_LEN: usize = 32;

/// HKDF salt; fixed so the same owner always maps to the same key.
const KDF_SALT: &[u8] = b"mlcloud-notebook-token";

/// HKDF info prefix; the owner id is appended.
const KDF_INFO_PREFIX: &[u8] = b"notebook-access-token:v1:";

// ---------------------------------------------------------------------------
// Plaintext token
// ---------------------------------------------------------------------------

/// A plaintext access token. Held in memory for one request only.
///
/// `Debug` is redacted so the value cannot leak through logs or error chains.
#[derive(Clone, PartialEq, Eq)]
pub struct PlaintextToken(String);

impl PlaintextToken {
    /// Generate a fresh token with UUID v4 randomness.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Borrow the raw token text, e.g. to build an access URL.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// SHA-256 hex digest of the token, as stored alongside the envelope.
    pub fn hash(&self) -> String {
        hash_token(&self.0)
    }
}

impl fmt::Debug for PlaintextToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PlaintextToken(<redacted>)")
    }
}

/// Compute the lowercase hex SHA-256 digest of a token.
pub fn hash_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    format!("{digest:x}")
}

// ---------------------------------------------------------------------------
// Key derivation
// ---------------------------------------------------------------------------

/// A 256-bit AES key bound to a single owner.
pub struct OwnerKey([u8; 32]);

impl OwnerKey {
    /// Derive the owner's key from the server secret and their id.
    pub fn derive(server_secret: &[u8], owner_id: OwnerId) -> Self {
        let hk = Hkdf::<Sha256>::new(Some(KDF_SALT), server_secret);

        let mut info = Vec::with_capacity(KDF_INFO_PREFIX.len() + 36);
        info.extend_from_slice(KDF_INFO_PREFIX);
        info.extend_from_slice(owner_id.hyphenated().to_string().as_bytes());

        let mut okm = [0u8; 32];
        hk.expand(&info, &mut okm)
            .expect("32 bytes is a valid HKDF-SHA256 output length");
        Self(okm)
    }

    fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.0))
    }
}

impl fmt::Debug for OwnerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OwnerKey(<redacted>)")
    }
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// Encrypt a token under `key` with a fresh random nonce.
///
/// Returns the envelope text suitable for the `encrypted_token` column.
pub fn seal(key: &OwnerKey, token: &PlaintextToken) -> Result<String, TokenError> {
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = key
        .cipher()
        .encrypt(&nonce, token.expose().as_bytes())
        .map_err(|_| TokenError::Encryption)?;

    Ok(format!(
        "{}{ENVELOPE_SEPARATOR}{}",
        STANDARD.encode(ciphertext),
        STANDARD.encode(nonce)
    ))
}

/// Decrypt an envelope produced by [`seal`].
///
/// Any framing problem or authentication failure is a
/// [`TokenError::Decryption`]; a wrong key never yields plausible output.
pub fn open(key: &OwnerKey, envelope: &str) -> Result<PlaintextToken, TokenError> {
    let (ct_b64, nonce_b64) = envelope
        .split_once(ENVELOPE_SEPARATOR)
        .ok_or(TokenError::Decryption("missing envelope separator"))?;

    let ciphertext = STANDARD
        .decode(ct_b64)
        .map_err(|_| TokenError::Decryption("ciphertext is not valid base64"))?;
    let nonce_bytes = STANDARD
        .decode(nonce_b64)
        .map_err(|_| TokenError::Decryption("nonce is not valid base64"))?;

    if nonce_bytes.len() != NONCE_LEN {
        return Err(TokenError::Decryption("nonce has the wrong length"));
    }

    let plaintext = key
        .cipher()
        .decrypt(Nonce::from_slice(&nonce_bytes), ciphertext.as_slice())
        .map_err(|_| TokenError::Decryption("authentication tag mismatch"))?;

    String::from_utf8(plaintext)
        .map(PlaintextToken)
        .map_err(|_| TokenError::Decryption("plaintext is not UTF-8"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
