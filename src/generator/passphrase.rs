//! Passphrase generation
//!
//! Word-based memorable passphrases as an alternative to character-level
//! generation: distinct words joined by a separator, optionally capitalized
//! and suffixed with digits and a symbol.

use rand::seq::IndexedRandom;
use rand::Rng;

use crate::constraints::SYMBOLS;
use crate::error::{Result, VaultError};

/// Built-in word list for passphrase generation
const WORD_LIST: &[&str] = &[
    "anchor", "autumn", "basket", "beacon", "bridge", "candle", "canyon",
    "carpet", "cellar", "circle", "copper", "cotton", "cradle", "desert",
    "ember", "falcon", "feather", "forest", "garden", "garnet", "glacier",
    "granite", "harbor", "hollow", "island", "jungle", "kettle", "lantern",
    "lagoon", "magnet", "marble", "meadow", "mirror", "molten", "needle",
    "nectar", "orchard", "oyster", "pebble", "pillow", "planet", "prairie",
    "quartz", "raven", "ribbon", "river", "saddle", "shadow", "silver",
    "spiral", "summit", "thunder", "timber", "tunnel", "velvet", "violet",
    "walnut", "willow", "winter", "zephyr",
];

/// Options for passphrase generation
#[derive(Debug, Clone)]
pub struct PassphraseOptions {
    /// Number of words (at least 2)
    pub words: usize,
    /// Separator placed between words
    pub separator: String,
    /// Capitalize the first letter of each word
    pub capitalize: bool,
    /// Append a number (0-999) to the last word
    pub append_number: bool,
    /// Append a symbol to the last word
    pub append_symbol: bool,
}

impl Default for PassphraseOptions {
    fn default() -> Self {
        Self {
            words: 4,
            separator: "-".to_string(),
            capitalize: true,
            append_number: true,
            append_symbol: true,
        }
    }
}

/// Generate a passphrase with the thread-local CSPRNG
pub fn generate_passphrase(options: &PassphraseOptions) -> Result<String> {
    generate_passphrase_with_rng(options, &mut rand::rng())
}

/// Generate a passphrase with an explicit random source
pub fn generate_passphrase_with_rng<R: Rng + ?Sized>(
    options: &PassphraseOptions,
    rng: &mut R,
) -> Result<String> {
    if options.words < 2 {
        return Err(VaultError::InvalidInput(
            "a passphrase needs at least 2 words".to_string(),
        ));
    }
    if options.words > WORD_LIST.len() {
        return Err(VaultError::InvalidInput(format!(
            "at most {} distinct words available",
            WORD_LIST.len()
        )));
    }

    // Sample distinct indices (partial Fisher-Yates)
    let mut indices: Vec<usize> = (0..WORD_LIST.len()).collect();
    for i in 0..options.words {
        let j = rng.random_range(i..indices.len());
        indices.swap(i, j);
    }

    let mut words: Vec<String> = indices
        .iter()
        .take(options.words)
        .map(|&i| {
            let word = WORD_LIST[i];
            if options.capitalize {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            } else {
                word.to_string()
            }
        })
        .collect();

    if options.append_number {
        let n: u32 = rng.random_range(0..1000);
        if let Some(last) = words.last_mut() {
            last.push_str(&n.to_string());
        }
    }
    if options.append_symbol {
        let symbols: Vec<char> = SYMBOLS.chars().collect();
        if let (Some(last), Some(&symbol)) = (words.last_mut(), symbols.choose(rng)) {
            last.push(symbol);
        }
    }

    Ok(words.join(&options.separator))
}
