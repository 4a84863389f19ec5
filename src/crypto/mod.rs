//! Cryptographic operations for PassForge
//!
//! Envelope encryption: records are sealed with AES-256-GCM under a
//! symmetric key stored in a separate file.

pub mod cipher;
pub mod key;

pub use cipher::{decrypt, encrypt, NONCE_LENGTH, TAG_LENGTH};
pub use key::{EncryptionKey, KEY_FILENAME, KEY_LENGTH};
