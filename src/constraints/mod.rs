//! Constraint sets
//!
//! A constraint set is a named, persisted bundle of password-composition
//! rules. It is an immutable value type: validation runs at construction
//! and again before every persistence boundary.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, VaultError};

/// Lowercase letter class
pub const LOWERCASE: &str = "abcdefghijklmnopqrstuvwxyz";
/// Uppercase letter class
pub const UPPERCASE: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
/// Digit class
pub const DIGITS: &str = "0123456789";
/// Symbol class used for generation
pub const SYMBOLS: &str = "!@#$%^&*()_+-={}[];:|,.<>?~";

/// Character class of a password character
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CharClass {
    /// Uppercase letters (A-Z)
    Upper,
    /// Lowercase letters (a-z)
    Lower,
    /// Digits (0-9)
    Digit,
    /// Everything else printable
    Symbol,
}

impl CharClass {
    /// Classify a character. Control characters and whitespace have no class.
    pub fn of(c: char) -> Option<CharClass> {
        if c.is_ascii_uppercase() {
            Some(CharClass::Upper)
        } else if c.is_ascii_lowercase() {
            Some(CharClass::Lower)
        } else if c.is_ascii_digit() {
            Some(CharClass::Digit)
        } else if c.is_ascii_graphic() {
            Some(CharClass::Symbol)
        } else {
            None
        }
    }

    /// The characters drawn for this class during generation
    pub fn chars(&self) -> &'static str {
        match self {
            CharClass::Upper => UPPERCASE,
            CharClass::Lower => LOWERCASE,
            CharClass::Digit => DIGITS,
            CharClass::Symbol => SYMBOLS,
        }
    }

    /// Nominal alphabet size of this class, used for entropy estimates
    pub fn size(&self) -> usize {
        match self {
            CharClass::Upper | CharClass::Lower => 26,
            CharClass::Digit => 10,
            CharClass::Symbol => 32,
        }
    }
}

/// A named bundle of password-composition rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintSet {
    /// Unique identifier, referenced from generation requests
    pub id: Uuid,
    /// Display name
    pub name: String,
    /// Minimum password length (inclusive)
    pub min_length: usize,
    /// Maximum password length (inclusive)
    pub max_length: usize,
    /// Require at least one uppercase letter
    pub require_upper: bool,
    /// Require at least one lowercase letter
    pub require_lower: bool,
    /// Require at least one digit
    pub require_digit: bool,
    /// Require at least one symbol
    pub require_symbol: bool,
    /// Characters that must be allowed even if their class is disabled
    pub included_chars: BTreeSet<char>,
    /// Characters that must never appear
    pub excluded_chars: BTreeSet<char>,
    /// Maximum run of identical consecutive characters
    pub max_consecutive_repeat: usize,
}

impl ConstraintSet {
    /// Create a constraint set with the default rules and a fresh id
    pub fn new(name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            min_length: 8,
            max_length: 20,
            require_upper: true,
            require_lower: true,
            require_digit: true,
            require_symbol: true,
            included_chars: BTreeSet::new(),
            excluded_chars: BTreeSet::new(),
            max_consecutive_repeat: 2,
        }
    }

    /// Validate the set against its invariants.
    ///
    /// Returns `InvalidConstraintSet` naming the first violated rule.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(VaultError::InvalidConstraintSet(
                "name must not be empty".to_string(),
            ));
        }
        if self.min_length < 1 {
            return Err(VaultError::InvalidConstraintSet(
                "minimum length must be at least 1".to_string(),
            ));
        }
        if self.min_length > self.max_length {
            return Err(VaultError::InvalidConstraintSet(format!(
                "minimum length {} exceeds maximum length {}",
                self.min_length, self.max_length
            )));
        }
        if self.max_consecutive_repeat < 1 {
            return Err(VaultError::InvalidConstraintSet(
                "max consecutive repeat must be at least 1".to_string(),
            ));
        }

        let conflicts: Vec<char> = self
            .included_chars
            .intersection(&self.excluded_chars)
            .copied()
            .collect();
        if !conflicts.is_empty() {
            return Err(VaultError::InvalidConstraintSet(format!(
                "characters both included and excluded: {}",
                conflicts.iter().collect::<String>()
            )));
        }

        if self.required_classes().is_empty() && self.included_chars.is_empty() {
            return Err(VaultError::InvalidConstraintSet(
                "at least one character class or included character is needed".to_string(),
            ));
        }

        // A required class with every member excluded can never be satisfied
        for class in self.required_classes() {
            if self.class_pool(class).is_empty() {
                return Err(VaultError::InvalidConstraintSet(format!(
                    "required class {:?} is fully excluded",
                    class
                )));
            }
        }

        if self.required_classes().len() > self.max_length {
            return Err(VaultError::InvalidConstraintSet(format!(
                "{} required classes cannot fit in {} characters",
                self.required_classes().len(),
                self.max_length
            )));
        }

        Ok(())
    }

    /// The classes this set requires, in a fixed order
    pub fn required_classes(&self) -> Vec<CharClass> {
        let mut classes = Vec::new();
        if self.require_upper {
            classes.push(CharClass::Upper);
        }
        if self.require_lower {
            classes.push(CharClass::Lower);
        }
        if self.require_digit {
            classes.push(CharClass::Digit);
        }
        if self.require_symbol {
            classes.push(CharClass::Symbol);
        }
        classes
    }

    /// Characters of one class with exclusions applied
    pub fn class_pool(&self, class: CharClass) -> Vec<char> {
        class
            .chars()
            .chars()
            .filter(|c| !self.excluded_chars.contains(c))
            .collect()
    }

    /// The full allowed alphabet: enabled classes minus excluded characters,
    /// plus explicitly included characters
    pub fn alphabet(&self) -> Vec<char> {
        let mut chars = BTreeSet::new();
        for class in self.required_classes() {
            chars.extend(self.class_pool(class));
        }
        chars.extend(self.included_chars.iter().copied());
        chars.into_iter().collect()
    }

    /// Check whether a character may appear in passwords of this set
    pub fn allows(&self, c: char) -> bool {
        if self.excluded_chars.contains(&c) {
            return false;
        }
        if self.included_chars.contains(&c) {
            return true;
        }
        match CharClass::of(c) {
            Some(class) => self.required_classes().contains(&class),
            None => false,
        }
    }

    /// Check a finished password against every rule of this set
    pub fn is_satisfied_by(&self, password: &str) -> bool {
        let len = password.chars().count();
        if len < self.min_length || len > self.max_length {
            return false;
        }
        if password.chars().any(|c| self.excluded_chars.contains(&c)) {
            return false;
        }
        for class in self.required_classes() {
            if !password.chars().any(|c| CharClass::of(c) == Some(class)) {
                return false;
            }
        }
        !exceeds_repeat_limit(password, self.max_consecutive_repeat)
    }
}

/// True when any character repeats more than `limit` times in a row
pub fn exceeds_repeat_limit(password: &str, limit: usize) -> bool {
    let mut run = 0usize;
    let mut prev: Option<char> = None;
    for c in password.chars() {
        if Some(c) == prev {
            run += 1;
        } else {
            run = 1;
            prev = Some(c);
        }
        if run > limit {
            return true;
        }
    }
    false
}

/// The constraint sets seeded into a freshly created vault
pub fn default_sets() -> Vec<ConstraintSet> {
    let standard = ConstraintSet {
        min_length: 8,
        max_length: 16,
        ..ConstraintSet::new("Standard")
    };

    let strong = ConstraintSet {
        min_length: 12,
        max_length: 24,
        included_chars: ['!', '@', '#', '$'].into_iter().collect(),
        ..ConstraintSet::new("Strong")
    };

    let simple = ConstraintSet {
        min_length: 6,
        max_length: 12,
        require_symbol: false,
        excluded_chars: ['!', '@', '#', '$', '%', '^', '&', '*', '(', ')', '+', '=']
            .into_iter()
            .collect(),
        ..ConstraintSet::new("Simple")
    };

    vec![standard, strong, simple]
}
