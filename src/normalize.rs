//! Text normalization for search matching and artist slugs.
//!
//! Search is a case-insensitive substring match on the record name and its
//! album name. Folding punctuation and diacritics only widens that match:
//! anything found by plain lowercase comparison is still found.

use any_ascii::any_ascii;
use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::models::StreamRecord;

// ============================================================================
// REGEX PATTERNS
// ============================================================================

/// Runs of characters that cannot appear in an artist slug.
static NON_SLUG_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn is_combining_mark(c: char) -> bool {
    matches!(c, '\u{0300}'..='\u{036F}' | '\u{1AB0}'..='\u{1AFF}' |
             '\u{1DC0}'..='\u{1DFF}' | '\u{20D0}'..='\u{20FF}' |
             '\u{FE20}'..='\u{FE2F}')
}

/// Convert curly quotes and accent marks used as apostrophes to straight quotes.
pub fn normalize_punctuation(s: &str) -> String {
    s.replace(['\u{2018}', '\u{2019}'], "'")
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .replace(['\u{00B4}', '\u{0060}'], "'")
}

/// Lowercase and strip diacritics via NFKD decomposition ("Beyoncé" → "beyonce").
/// Non-Latin scripts are left as they are.
pub fn fold_diacritics(s: &str) -> String {
    normalize_punctuation(s)
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

/// Fold to lowercase ASCII, transliterating non-Latin scripts.
pub fn fold_to_ascii(s: &str) -> String {
    let stripped: String = s.nfkd().filter(|c| !is_combining_mark(*c)).collect();
    any_ascii(&stripped).to_lowercase()
}

/// Directory-safe artist key: "Beyoncé & Jay-Z" → "beyonce-jay-z".
pub fn artist_slug(artist: &str) -> String {
    let folded = fold_to_ascii(artist);
    NON_SLUG_CHARS
        .replace_all(&folded, "-")
        .trim_matches('-')
        .to_string()
}

// ============================================================================
// SEARCH QUERY
// ============================================================================

/// A prepared search term. Build once per keystroke, match against many records.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    plain: String,
    folded: String,
}

impl SearchQuery {
    pub fn new(term: &str) -> Self {
        Self {
            plain: term.to_lowercase(),
            folded: fold_diacritics(term),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.plain.is_empty()
    }

    pub fn matches_text(&self, text: &str) -> bool {
        text.to_lowercase().contains(&self.plain) || fold_diacritics(text).contains(&self.folded)
    }

    /// True if the record's name or album name contains the term.
    pub fn matches(&self, record: &StreamRecord) -> bool {
        self.matches_text(&record.name)
            || record
                .album_name
                .as_deref()
                .is_some_and(|album| self.matches_text(album))
    }
}

// ============================================================================
// TESTS
// ============================================================================
