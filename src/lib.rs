//! # PassForge
//!
//! A password toolkit library: keyword-based generation under named
//! constraint sets, strength analysis, and an encrypted on-disk vault.
//!
//! ## Features
//!
//! - Constraint-satisfying password generation from memorable keywords
//! - Pattern-based and passphrase generation
//! - Entropy and penalty based strength scoring
//! - AES-256-GCM encrypted record storage over SQLite
//! - Key rotation and encrypted JSON export/import
//!
//! ## Example
//!
//! ```no_run
//! use passforge::{NewRecord, Vault};
//! use std::path::Path;
//!
//! let mut vault = Vault::create(Path::new("/path/to/vault")).unwrap();
//!
//! let sets = vault.list_constraint_sets().unwrap();
//! let candidate = vault
//!     .generate_password(&["river".to_string(), "otter".to_string()], sets[0].id)
//!     .unwrap();
//!
//! let id = vault
//!     .create_record(NewRecord::with_label("GitHub"), &candidate.raw_value)
//!     .unwrap();
//! println!("stored record {id}");
//! ```

pub mod constraints;
pub mod crypto;
pub mod error;
pub mod generator;
pub mod storage;

// Re-export main types
pub use constraints::{default_sets, CharClass, ConstraintSet};
pub use crypto::{EncryptionKey, KEY_FILENAME};
pub use error::{Result, VaultError};
pub use generator::{
    analyze, analyze_with_keywords, generate, generate_passphrase, generate_pattern,
    PassphraseOptions, PasswordCandidate, Penalty, StrengthReport, TransformOptions,
};
pub use storage::{
    ImportPolicy, ImportSummary, NewRecord, RecordMetadata, RecordUpdate, SearchFilter, Vault,
    DB_FILENAME, STORE_VERSION,
};
