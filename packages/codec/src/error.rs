//! Error types for the codec

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CodecError {
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Not a tagged ciphertext")]
    Untagged,

    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    #[error("Data too short: expected at least {expected} bytes, got {actual}")]
    DataTooShort { expected: usize, actual: usize },

    #[error("Invalid key: {0}")]
    InvalidKey(String),
}
