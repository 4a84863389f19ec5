//! Password strength analysis
//!
//! Scores a candidate password and returns a breakdown: an entropy
//! estimate, the character classes covered, and the penalties applied.
//! Pure and deterministic: the same password always yields the same report.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::constraints::CharClass;

/// Minimum run length flagged as sequential ("abc", "321")
const SEQUENTIAL_RUN_MIN: usize = 3;

/// A character repeated more than this many times in a row is penalized
const REPEAT_THRESHOLD: usize = 3;

/// Shortest untransformed keyword substring that counts as overexposure
const KEYWORD_EXPOSURE_MIN: usize = 4;

/// Penalty weights (score points deducted)
const WEIGHT_SEQUENTIAL: u32 = 10;
const WEIGHT_REPEAT: u32 = 8;
const WEIGHT_KEYBOARD: u32 = 10;
const WEIGHT_COMMON: u32 = 25;
const WEIGHT_KEYWORD: u32 = 15;

/// Built-in common-password fragments, always checked
const COMMON_PASSWORDS: &[&str] = &[
    "password", "123456", "qwerty", "letmein", "welcome", "admin", "iloveyou",
    "monkey", "dragon", "master", "sunshine", "princess", "football", "shadow",
];

/// Keyboard-row patterns flagged by the analyzer
const KEYBOARD_PATTERNS: &[&str] = &["qwer", "asdf", "zxcv", "1234", "5678", "9012"];

/// One deduction applied during analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Penalty {
    /// Human-readable cause, safe to display (never echoes the password)
    pub reason: String,
    /// Score points deducted
    pub weight: u32,
}

/// Result of analyzing a password
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrengthReport {
    /// Overall score, 0-100
    pub score: u8,
    /// Entropy estimate: length * log2(alphabet size actually used)
    pub entropy_bits: f64,
    /// Character classes present in the password
    pub class_coverage: BTreeSet<CharClass>,
    /// Deductions applied, in detection order
    pub penalties: Vec<Penalty>,
    /// Suggestions derived from the penalties and coverage
    pub feedback: Vec<String>,
}

/// Analyze a password on its own
pub fn analyze(password: &str) -> StrengthReport {
    analyze_detailed(password, &[], &[])
}

/// Analyze a password against the keywords it was generated from,
/// penalizing untransformed keyword exposure
pub fn analyze_with_keywords(password: &str, keywords: &[String]) -> StrengthReport {
    analyze_detailed(password, keywords, &[])
}

/// Full analysis with an optional caller-supplied common-password list
/// (checked in addition to the built-in list)
pub fn analyze_detailed(
    password: &str,
    keywords: &[String],
    extra_common: &[String],
) -> StrengthReport {
    let class_coverage: BTreeSet<CharClass> =
        password.chars().filter_map(CharClass::of).collect();

    let alphabet_size: usize = class_coverage.iter().map(|c| c.size()).sum();
    let length = password.chars().count();
    let entropy_bits = if alphabet_size > 0 {
        length as f64 * (alphabet_size as f64).log2()
    } else {
        0.0
    };

    let mut penalties = Vec::new();
    let lower = password.to_lowercase();

    for run in sequential_runs(password) {
        penalties.push(Penalty {
            reason: format!("sequential run of {} characters", run.chars().count()),
            weight: WEIGHT_SEQUENTIAL,
        });
    }

    for (c, run) in repeat_runs(password, REPEAT_THRESHOLD) {
        let shown = if c.is_ascii_alphanumeric() { c } else { '*' };
        penalties.push(Penalty {
            reason: format!("character '{shown}' repeated {run} times"),
            weight: WEIGHT_REPEAT,
        });
    }

    for pattern in KEYBOARD_PATTERNS {
        if lower.contains(pattern) {
            penalties.push(Penalty {
                reason: format!("keyboard pattern '{pattern}'"),
                weight: WEIGHT_KEYBOARD,
            });
        }
    }

    for common in COMMON_PASSWORDS
        .iter()
        .copied()
        .chain(extra_common.iter().map(|s| s.as_str()))
    {
        if common.len() >= KEYWORD_EXPOSURE_MIN && lower.contains(&common.to_lowercase()) {
            penalties.push(Penalty {
                reason: "contains a common password".to_string(),
                weight: WEIGHT_COMMON,
            });
        }
    }

    for keyword in keywords {
        let kw = keyword.trim().to_lowercase();
        if kw.chars().count() >= KEYWORD_EXPOSURE_MIN && lower.contains(&kw) {
            penalties.push(Penalty {
                reason: "contains an untransformed source keyword".to_string(),
                weight: WEIGHT_KEYWORD,
            });
        }
    }

    let base = entropy_bits.min(100.0);
    let deducted: u32 = penalties.iter().map(|p| p.weight).sum();
    let score = (base - deducted as f64).clamp(0.0, 100.0).round() as u8;

    let feedback = build_feedback(length, &class_coverage, &penalties);

    StrengthReport {
        score,
        entropy_bits,
        class_coverage,
        penalties,
        feedback,
    }
}

/// Ascending or descending alphanumeric runs of at least
/// `SEQUENTIAL_RUN_MIN` characters ("abcd", "4321")
fn sequential_runs(password: &str) -> Vec<String> {
    // Sequences stay within one class: 'z' does not continue into '0'
    fn step(a: char, b: char) -> Option<i32> {
        if !a.is_ascii_alphanumeric() || !b.is_ascii_alphanumeric() {
            return None;
        }
        if CharClass::of(a) != CharClass::of(b) {
            return None;
        }
        match b as i32 - a as i32 {
            1 => Some(1),
            -1 => Some(-1),
            _ => None,
        }
    }

    let chars: Vec<char> = password.to_lowercase().chars().collect();
    let mut runs = Vec::new();
    let mut start = 0usize;

    while start + SEQUENTIAL_RUN_MIN <= chars.len() {
        let Some(dir) = step(chars[start], chars[start + 1]) else {
            start += 1;
            continue;
        };
        let mut end = start + 1;
        while end + 1 < chars.len() && step(chars[end], chars[end + 1]) == Some(dir) {
            end += 1;
        }
        if end - start + 1 >= SEQUENTIAL_RUN_MIN {
            runs.push(chars[start..=end].iter().collect());
            start = end;
        } else {
            start += 1;
        }
    }
    runs
}

/// Characters repeated more than `threshold` times in a row,
/// with their run lengths
fn repeat_runs(password: &str, threshold: usize) -> Vec<(char, usize)> {
    let mut runs = Vec::new();
    let mut prev: Option<char> = None;
    let mut run = 0usize;

    for c in password.chars().chain(std::iter::once('\0')) {
        if Some(c) == prev {
            run += 1;
        } else {
            if let Some(p) = prev {
                if run > threshold {
                    runs.push((p, run));
                }
            }
            prev = Some(c);
            run = 1;
        }
    }
    runs
}

fn build_feedback(
    length: usize,
    coverage: &BTreeSet<CharClass>,
    penalties: &[Penalty],
) -> Vec<String> {
    let mut feedback = Vec::new();

    if length < 8 {
        feedback.push("Use at least 8 characters".to_string());
    } else if length < 12 {
        feedback.push("Consider 12 or more characters".to_string());
    }
    if !coverage.contains(&CharClass::Upper) {
        feedback.push("Add uppercase letters".to_string());
    }
    if !coverage.contains(&CharClass::Lower) {
        feedback.push("Add lowercase letters".to_string());
    }
    if !coverage.contains(&CharClass::Digit) {
        feedback.push("Add digits".to_string());
    }
    if !coverage.contains(&CharClass::Symbol) {
        feedback.push("Add symbols".to_string());
    }
    for penalty in penalties {
        feedback.push(format!("Avoid: {}", penalty.reason));
    }
    feedback
}
