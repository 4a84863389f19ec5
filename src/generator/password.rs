//! Password generation
//!
//! Combines transformed keyword fragments with randomly drawn characters
//! until the active constraint set is satisfied, with a bounded repair loop
//! instead of unbounded retries.

use rand::seq::{IndexedRandom, SliceRandom};
use rand::Rng;
use uuid::Uuid;

use crate::constraints::{CharClass, ConstraintSet, DIGITS, LOWERCASE, SYMBOLS, UPPERCASE};
use crate::error::{Result, VaultError};
use crate::generator::transform::{transform_keywords, TransformOptions};

/// Upper bound on local repair attempts before giving up
pub const MAX_REPAIR_ATTEMPTS: u32 = 10;

/// An in-memory, not-yet-saved generated password
#[derive(Debug, Clone)]
pub struct PasswordCandidate {
    /// The generated password
    pub raw_value: String,
    /// Keywords the candidate was derived from, in input order
    pub source_keywords: Vec<String>,
    /// The constraint set the candidate was generated against
    pub constraint_set_id: Uuid,
}

/// Generate a password candidate from keywords under a constraint set.
///
/// Uses the thread-local CSPRNG. See [`generate_with_rng`] for the
/// deterministic seam.
pub fn generate(keywords: &[String], constraints: &ConstraintSet) -> Result<PasswordCandidate> {
    generate_with_rng(
        keywords,
        constraints,
        &TransformOptions::default(),
        &mut rand::rng(),
    )
}

/// Generate with an explicit random source.
///
/// Algorithm: validate the set, reserve one character per required class
/// (this keeps minimal lengths with many mandatory classes solvable),
/// splice in transformed keyword fragments, fill with random draws from
/// the allowed alphabet up to a length drawn from `[min, max]`, shuffle,
/// then run at most [`MAX_REPAIR_ATTEMPTS`] local repairs before failing
/// with `ConstraintUnsatisfiable`.
pub fn generate_with_rng<R: Rng + ?Sized>(
    keywords: &[String],
    constraints: &ConstraintSet,
    options: &TransformOptions,
    rng: &mut R,
) -> Result<PasswordCandidate> {
    constraints.validate()?;

    let target_len = rng.random_range(constraints.min_length..=constraints.max_length);
    let mut chars: Vec<char> = Vec::with_capacity(target_len);

    // One reserved slot per required class
    for class in constraints.required_classes() {
        let pool = constraints.class_pool(class);
        let Some(&c) = pool.choose(rng) else {
            return Err(VaultError::InvalidConstraintSet(format!(
                "required class {:?} is fully excluded",
                class
            )));
        };
        chars.push(c);
    }

    let budget = target_len.saturating_sub(chars.len());
    let fragments = transform_keywords(keywords, constraints, budget, options, rng)?;
    for fragment in &fragments {
        chars.extend(fragment.chars());
    }

    let alphabet = constraints.alphabet();
    if alphabet.is_empty() {
        return Err(VaultError::InvalidConstraintSet(
            "allowed alphabet is empty".to_string(),
        ));
    }
    while chars.len() < target_len {
        chars.push(*alphabet.choose(rng).unwrap_or(&alphabet[0]));
    }
    chars.shuffle(rng);

    let mut password: String = chars.iter().collect();
    for _ in 0..MAX_REPAIR_ATTEMPTS {
        if constraints.is_satisfied_by(&password) {
            return Ok(PasswordCandidate {
                raw_value: password,
                source_keywords: keywords.to_vec(),
                constraint_set_id: constraints.id,
            });
        }
        password = repair(&password, constraints, rng);
    }

    if constraints.is_satisfied_by(&password) {
        return Ok(PasswordCandidate {
            raw_value: password,
            source_keywords: keywords.to_vec(),
            constraint_set_id: constraints.id,
        });
    }
    Err(VaultError::ConstraintUnsatisfiable(MAX_REPAIR_ATTEMPTS))
}

/// One local mutation towards satisfying the constraint set.
///
/// Missing required classes are fixed before repeat runs: a random position
/// is overwritten with a character of the missing class, then the first
/// over-long run is broken with a character differing from its neighbors.
fn repair<R: Rng + ?Sized>(password: &str, constraints: &ConstraintSet, rng: &mut R) -> String {
    let mut chars: Vec<char> = password.chars().collect();
    if chars.is_empty() {
        return String::new();
    }

    for class in constraints.required_classes() {
        if chars.iter().any(|c| CharClass::of(*c) == Some(class)) {
            continue;
        }
        let pool = constraints.class_pool(class);
        if let Some(&c) = pool.choose(rng) {
            let pos = rng.random_range(0..chars.len());
            chars[pos] = c;
        }
        return chars.into_iter().collect();
    }

    let limit = constraints.max_consecutive_repeat;
    let alphabet = constraints.alphabet();
    let mut run = 1usize;
    for i in 1..chars.len() {
        if chars[i] == chars[i - 1] {
            run += 1;
        } else {
            run = 1;
        }
        if run > limit {
            let prev = chars[i - 1];
            let next = chars.get(i + 1).copied();
            let choices: Vec<char> = alphabet
                .iter()
                .copied()
                .filter(|c| *c != prev && Some(*c) != next)
                .collect();
            if let Some(&c) = choices.choose(rng) {
                chars[i] = c;
            }
            break;
        }
    }
    chars.into_iter().collect()
}

/// Generate a password from a pattern.
///
/// Pattern grammar: `a` lowercase letter, `A` uppercase letter, `n` digit,
/// `s` symbol, `x` any character; every other character is kept literally.
pub fn generate_pattern(pattern: &str) -> Result<String> {
    generate_pattern_with_rng(pattern, &mut rand::rng())
}

/// Pattern generation with an explicit random source
pub fn generate_pattern_with_rng<R: Rng + ?Sized>(pattern: &str, rng: &mut R) -> Result<String> {
    if pattern.is_empty() {
        return Err(VaultError::InvalidInput("empty pattern".to_string()));
    }

    let lower: Vec<char> = LOWERCASE.chars().collect();
    let upper: Vec<char> = UPPERCASE.chars().collect();
    let digits: Vec<char> = DIGITS.chars().collect();
    let symbols: Vec<char> = SYMBOLS.chars().collect();
    let all: Vec<char> = [LOWERCASE, UPPERCASE, DIGITS, SYMBOLS]
        .concat()
        .chars()
        .collect();

    let mut password = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        let generated = match c {
            'a' => lower.choose(rng),
            'A' => upper.choose(rng),
            'n' => digits.choose(rng),
            's' => symbols.choose(rng),
            'x' => all.choose(rng),
            literal => {
                password.push(literal);
                continue;
            }
        };
        match generated {
            Some(&g) => password.push(g),
            None => {
                return Err(VaultError::InvalidInput(
                    "pattern class has no characters".to_string(),
                ))
            }
        }
    }
    Ok(password)
}
