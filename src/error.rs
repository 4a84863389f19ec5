//! Error types for PassForge Core

use thiserror::Error;
use uuid::Uuid;

/// Main error type for vault and generation operations
#[derive(Error, Debug)]
pub enum VaultError {
    /// Keyword input cannot be turned into a usable fragment
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Constraint set violates its own invariants
    #[error("Invalid constraint set: {0}")]
    InvalidConstraintSet(String),

    /// Generation exhausted its repair attempts without satisfying the rules
    #[error("Constraints not satisfiable after {0} repair attempts")]
    ConstraintUnsatisfiable(u32),

    /// Encryption key file is missing or unreadable
    #[error("Encryption key unavailable: {0}")]
    KeyUnavailable(String),

    /// Encryption key file exists but does not contain a valid key
    #[error("Malformed encryption key: {0}")]
    MalformedKey(String),

    /// Encryption failed
    #[error("Encryption error: {0}")]
    EncryptionError(String),

    /// Authentication tag mismatch - wrong key or tampered ciphertext
    #[error("Decryption failed (authentication): {0}")]
    AuthenticationFailed(String),

    /// Stored ciphertext is structurally invalid (e.g. shorter than a nonce)
    #[error("Corrupted ciphertext: {0}")]
    CorruptedCiphertext(String),

    /// Password record not found
    #[error("Record not found: {0}")]
    RecordNotFound(Uuid),

    /// Constraint set not found
    #[error("Constraint set not found: {0}")]
    ConstraintSetNotFound(Uuid),

    /// Import hit a record id collision under the Fail policy
    #[error("Import conflict on record id: {0}")]
    ImportConflict(Uuid),

    /// Unsupported store or export format version
    #[error("Invalid format version: {0}")]
    InvalidVersion(String),

    /// Database operation failed
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Serialization or deserialization failed
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl VaultError {
    /// True for every failure mode of `read_record` that happens after the
    /// ciphertext left the database (distinguished from lookup errors)
    pub fn is_decryption_error(&self) -> bool {
        matches!(
            self,
            VaultError::AuthenticationFailed(_)
                | VaultError::CorruptedCiphertext(_)
                | VaultError::KeyUnavailable(_)
                | VaultError::MalformedKey(_)
        )
    }
}

impl From<rusqlite::Error> for VaultError {
    fn from(err: rusqlite::Error) -> Self {
        VaultError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for VaultError {
    fn from(err: serde_json::Error) -> Self {
        VaultError::SerializationError(err.to_string())
    }
}

/// Result type alias for vault operations
pub type Result<T> = std::result::Result<T, VaultError>;
