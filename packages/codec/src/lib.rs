//! # Slidedeck Codec
//!
//! Converts slide text fields between their three representations:
//!
//! ```text
//! surface markup ──normalize──▶ FieldValue ──encrypt──▶ ciphertext (at rest)
//!                ◀─denormalize─            ◀─decrypt──
//! ```
//!
//! Both directions of the cipher are total: `decrypt` hands back its input
//! when the input is not ciphertext it can open.

mod cipher;
mod error;
mod field;

pub use cipher::{FieldCipher, CIPHERTEXT_TAG, KEY_SIZE, NONCE_SIZE};
pub use error::CodecError;
pub use field::{denormalize, is_structurally_empty, normalize, plain_text, FieldValue};
