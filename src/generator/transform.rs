//! Keyword transformation
//!
//! Turns raw user keywords into password-seed fragments: case variation,
//! leet-style substitution and truncation to the remaining length budget.
//! Pure functions of the input and a supplied random source.

use rand::Rng;

use crate::constraints::ConstraintSet;
use crate::error::{Result, VaultError};

/// Fixed leet-style substitution map
pub const LEET_MAP: &[(char, char)] = &[
    ('a', '4'),
    ('e', '3'),
    ('i', '1'),
    ('o', '0'),
    ('s', '5'),
    ('t', '7'),
    ('l', '1'),
    ('z', '2'),
];

/// Options controlling keyword transformation
#[derive(Debug, Clone)]
pub struct TransformOptions {
    /// Randomly vary the case of keyword letters
    pub case_variation: bool,
    /// Substitute some letters with their leet equivalents
    pub leet_substitution: bool,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            case_variation: true,
            leet_substitution: true,
        }
    }
}

/// Leet equivalent of a character, if the map defines one
pub fn leet_of(c: char) -> Option<char> {
    let lower = c.to_ascii_lowercase();
    LEET_MAP.iter().find(|(from, _)| *from == lower).map(|(_, to)| *to)
}

/// Transform keywords into fragments that fit the constraint alphabet.
///
/// Fragments are produced in keyword order and jointly truncated to
/// `budget` characters. A keyword whose characters cannot be mapped into
/// the alphabet at all fails with `InvalidInput`.
pub fn transform_keywords<R: Rng + ?Sized>(
    keywords: &[String],
    constraints: &ConstraintSet,
    budget: usize,
    options: &TransformOptions,
    rng: &mut R,
) -> Result<Vec<String>> {
    let mut fragments = Vec::new();
    let mut remaining = budget;

    for keyword in keywords {
        let trimmed = keyword.trim();
        if trimmed.is_empty() {
            continue;
        }
        if remaining == 0 {
            break;
        }

        let mut fragment = trimmed.to_string();
        if options.case_variation {
            fragment = randomize_case(&fragment, rng);
        }
        if options.leet_substitution {
            fragment = leet_substitute(&fragment, rng);
        }

        let fitted = fit_to_alphabet(&fragment, constraints);
        if fitted.is_empty() {
            return Err(VaultError::InvalidInput(format!(
                "keyword of {} characters has no representation in the allowed alphabet",
                trimmed.chars().count()
            )));
        }

        let truncated: String = fitted.chars().take(remaining).collect();
        remaining -= truncated.chars().count();
        fragments.push(truncated);
    }

    Ok(fragments)
}

/// Randomly vary letter case: roughly one in three letters is flipped
fn randomize_case<R: Rng + ?Sized>(fragment: &str, rng: &mut R) -> String {
    fragment
        .chars()
        .map(|c| {
            if c.is_ascii_alphabetic() && rng.random_range(0..3) == 0 {
                if c.is_ascii_lowercase() {
                    c.to_ascii_uppercase()
                } else {
                    c.to_ascii_lowercase()
                }
            } else {
                c
            }
        })
        .collect()
}

/// Replace one or two substitutable characters with leet equivalents
fn leet_substitute<R: Rng + ?Sized>(fragment: &str, rng: &mut R) -> String {
    let chars: Vec<char> = fragment.chars().collect();
    let positions: Vec<usize> = chars
        .iter()
        .enumerate()
        .filter(|(_, c)| leet_of(**c).is_some())
        .map(|(i, _)| i)
        .collect();

    if positions.is_empty() {
        return fragment.to_string();
    }

    let count = positions.len().min(rng.random_range(1..=2));
    let mut chosen = positions;
    // Partial Fisher-Yates: the first `count` entries end up random
    for i in 0..count {
        let j = rng.random_range(i..chosen.len());
        chosen.swap(i, j);
    }

    let mut result = chars;
    for &pos in chosen.iter().take(count) {
        if let Some(sub) = leet_of(result[pos]) {
            result[pos] = sub;
        }
    }
    result.into_iter().collect()
}

/// Map every character into the constraint alphabet, or drop it.
///
/// Fallback order: the character itself, its case-toggled form, its leet
/// equivalent. Characters with no allowed form are dropped.
fn fit_to_alphabet(fragment: &str, constraints: &ConstraintSet) -> String {
    fragment
        .chars()
        .filter_map(|c| {
            if constraints.allows(c) {
                return Some(c);
            }
            if c.is_ascii_alphabetic() {
                let toggled = if c.is_ascii_lowercase() {
                    c.to_ascii_uppercase()
                } else {
                    c.to_ascii_lowercase()
                };
                if constraints.allows(toggled) {
                    return Some(toggled);
                }
            }
            match leet_of(c) {
                Some(sub) if constraints.allows(sub) => Some(sub),
                _ => None,
            }
        })
        .collect()
}
