//! Field encryption at rest
//!
//! Slide content, speaker notes and comments are stored as ChaCha20-Poly1305
//! ciphertext. The wire form is a tagged, base64 string:
//!
//! ```text
//! enc1:<base64(nonce || sealed)>
//! ```
//!
//! The tag lets `decrypt` tell "never encrypted" apart from "corrupted":
//! untagged input is legacy plaintext and is returned as-is, tagged input
//! that fails to open is corrupted and is also returned as-is, with a warning.
//! Neither case is an error for the caller.

use base64::{engine::general_purpose::STANDARD, Engine};
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use rand::RngCore;
use tracing::{debug, warn};

use crate::error::CodecError;

/// Prefix marking a string as ciphertext produced by [`FieldCipher`]
pub const CIPHERTEXT_TAG: &str = "enc1:";

/// Nonce size for ChaCha20-Poly1305 (12 bytes)
pub const NONCE_SIZE: usize = 12;

/// Key size (32 bytes)
pub const KEY_SIZE: usize = 32;

/// Poly1305 tag appended to every sealed message
const AUTH_TAG_SIZE: usize = 16;

const KEY_DERIVATION_CONTEXT: &str = "slidedeck 2024-06 field encryption v1";

/// Symmetric cipher for text fields
#[derive(Clone)]
pub struct FieldCipher {
    key: [u8; KEY_SIZE],
}

impl std::fmt::Debug for FieldCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldCipher").finish_non_exhaustive()
    }
}

impl FieldCipher {
    /// Derive a key from a passphrase
    ///
    /// The same passphrase always yields the same key, so every session
    /// configured with it can read what the others wrote.
    pub fn from_passphrase(passphrase: &str) -> Self {
        Self {
            key: blake3::derive_key(KEY_DERIVATION_CONTEXT, passphrase.as_bytes()),
        }
    }

    /// Create from raw key bytes
    pub fn from_bytes(key: [u8; KEY_SIZE]) -> Self {
        Self { key }
    }

    /// Generate a random key
    pub fn generate() -> Self {
        let mut key = [0u8; KEY_SIZE];
        rand::rng().fill_bytes(&mut key);
        Self { key }
    }

    /// Check whether a string carries the ciphertext tag
    pub fn is_ciphertext(text: &str) -> bool {
        text.starts_with(CIPHERTEXT_TAG)
    }

    /// Encrypt a field value
    ///
    /// Never fails for the caller. Sealing can only fail for inputs far
    /// beyond any slide field; in that case the plaintext is returned and
    /// `decrypt` reads it back unchanged.
    pub fn encrypt(&self, plaintext: &str) -> String {
        match self.seal(plaintext) {
            Ok(ciphertext) => ciphertext,
            Err(e) => {
                warn!(error = %e, "field encryption failed, storing plaintext");
                plaintext.to_string()
            }
        }
    }

    /// Decrypt a field value, falling back to the input on any failure
    pub fn decrypt(&self, text: &str) -> String {
        match self.open(text) {
            Ok(plaintext) => plaintext,
            Err(CodecError::Untagged) => {
                debug!("field is not tagged ciphertext, treating as legacy plaintext");
                text.to_string()
            }
            Err(e) => {
                warn!(error = %e, "field decryption failed, falling back to raw text");
                text.to_string()
            }
        }
    }

    /// Encrypt, surfacing failures
    pub fn seal(&self, plaintext: &str) -> Result<String, CodecError> {
        let cipher = ChaCha20Poly1305::new_from_slice(&self.key)
            .map_err(|e| CodecError::InvalidKey(e.to_string()))?;

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let sealed = cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| CodecError::EncryptionFailed(e.to_string()))?;

        let mut payload = Vec::with_capacity(NONCE_SIZE + sealed.len());
        payload.extend_from_slice(&nonce_bytes);
        payload.extend_from_slice(&sealed);

        Ok(format!("{}{}", CIPHERTEXT_TAG, STANDARD.encode(payload)))
    }

    /// Decrypt, surfacing failures
    pub fn open(&self, text: &str) -> Result<String, CodecError> {
        let encoded = text.strip_prefix(CIPHERTEXT_TAG).ok_or(CodecError::Untagged)?;

        let payload = STANDARD
            .decode(encoded)
            .map_err(|e| CodecError::InvalidEncoding(e.to_string()))?;

        if payload.len() < NONCE_SIZE + AUTH_TAG_SIZE {
            return Err(CodecError::DataTooShort {
                expected: NONCE_SIZE + AUTH_TAG_SIZE,
                actual: payload.len(),
            });
        }

        let (nonce_bytes, sealed) = payload.split_at(NONCE_SIZE);
        let cipher = ChaCha20Poly1305::new_from_slice(&self.key)
            .map_err(|e| CodecError::InvalidKey(e.to_string()))?;

        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce_bytes), sealed)
            .map_err(|e| CodecError::DecryptionFailed(e.to_string()))?;

        String::from_utf8(plaintext).map_err(|e| CodecError::InvalidEncoding(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_including_empty_and_markup() {
        let cipher = FieldCipher::from_passphrase("correct horse");
        for plaintext in [
            "",
            "Q3 Plan",
            "<b>Bold</b> and <i>italic</i><br>",
            "emoji 🎉 and ünïcødé",
        ] {
            let sealed = cipher.encrypt(plaintext);
            assert!(FieldCipher::is_ciphertext(&sealed));
            assert_eq!(cipher.decrypt(&sealed), plaintext);
        }
    }

    #[test]
    fn test_encrypt_uses_fresh_nonce() {
        let cipher = FieldCipher::generate();
        assert_ne!(cipher.encrypt("same"), cipher.encrypt("same"));
    }

    #[test]
    fn test_decrypt_plaintext_falls_back() {
        let cipher = FieldCipher::generate();
        assert_eq!(cipher.decrypt("just some notes"), "just some notes");
        assert_eq!(cipher.decrypt(""), "");
        assert_eq!(cipher.open("just some notes"), Err(CodecError::Untagged));
    }

    #[test]
    fn test_decrypt_corrupted_ciphertext_falls_back() {
        let cipher = FieldCipher::generate();

        let bad_base64 = "enc1:!!!not base64!!!";
        assert_eq!(cipher.decrypt(bad_base64), bad_base64);

        let too_short = format!("{}{}", CIPHERTEXT_TAG, STANDARD.encode([1u8, 2, 3]));
        assert_eq!(cipher.decrypt(&too_short), too_short);
        assert!(matches!(
            cipher.open(&too_short),
            Err(CodecError::DataTooShort { .. })
        ));
    }

    #[test]
    fn test_wrong_key_falls_back_to_ciphertext() {
        let writer = FieldCipher::from_passphrase("alpha");
        let reader = FieldCipher::from_passphrase("beta");

        let sealed = writer.encrypt("secret");
        assert_eq!(reader.decrypt(&sealed), sealed);
        assert!(matches!(
            reader.open(&sealed),
            Err(CodecError::DecryptionFailed(_))
        ));
    }

    #[test]
    fn test_passphrase_derivation_is_deterministic() {
        let a = FieldCipher::from_passphrase("shared");
        let b = FieldCipher::from_passphrase("shared");
        assert_eq!(b.decrypt(&a.encrypt("hello")), "hello");
    }

    #[test]
    fn test_debug_does_not_leak_key() {
        let cipher = FieldCipher::from_bytes([7u8; KEY_SIZE]);
        assert_eq!(format!("{:?}", cipher), "FieldCipher { .. }");
    }
}
