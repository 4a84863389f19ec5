//! Password generation and strength analysis
//!
//! Keyword transformation, constraint-satisfying generation, pattern and
//! passphrase generation, and the strength analyzer. Everything here is
//! pure computation over a supplied (or thread-local) CSPRNG.

pub mod passphrase;
pub mod password;
pub mod strength;
pub mod transform;

pub use passphrase::{generate_passphrase, PassphraseOptions};
pub use password::{generate, generate_pattern, generate_with_rng, PasswordCandidate};
pub use strength::{analyze, analyze_with_keywords, Penalty, StrengthReport};
pub use transform::{transform_keywords, TransformOptions, LEET_MAP};
