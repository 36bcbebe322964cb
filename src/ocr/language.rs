//! Heuristic language detection over cleaned text.
//!
//! Each supported language is a character class; the score is the number of
//! matching characters. Slovak and Czech count plain Latin letters plus their
//! own diacritic letters, English counts plain Latin letters only, so generic
//! text ties and diacritics decide. Caller hints softly bias the result.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;

/// Multiplier applied to languages outside a non-empty hint set.
pub const UNHINTED_WEIGHT: f32 = 0.6;

const SLOVAK_LETTERS: &str = "áäčďéíĺľňóôŕšťúýž";
const CZECH_LETTERS: &str = "áčďéěíňóřšťúůýž";

/// Accepted hint shape: primary subtag plus optional subtags (`sk`, `sk-SK`).
static HINT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]{2,3}(-[a-z0-9]{2,8})*$").expect("valid hint pattern"));

/// Supported language classes, in tie-break order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Language {
    #[serde(rename = "sk")]
    Slovak,
    #[serde(rename = "cs")]
    Czech,
    #[serde(rename = "en")]
    English,
}

impl Language {
    /// All classes in declaration order.
    pub const ALL: [Language; 3] = [Language::Slovak, Language::Czech, Language::English];

    pub fn code(&self) -> &'static str {
        match self {
            Language::Slovak => "sk",
            Language::Czech => "cs",
            Language::English => "en",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        let primary = code.split(['-', '_']).next().unwrap_or("");
        match primary.to_lowercase().as_str() {
            "sk" => Some(Language::Slovak),
            "cs" | "cz" => Some(Language::Czech),
            "en" => Some(Language::English),
            _ => None,
        }
    }

    /// Whether a lower-cased, composed character belongs to this class.
    fn matches(&self, c: char) -> bool {
        match self {
            Language::Slovak => c.is_ascii_lowercase() || SLOVAK_LETTERS.contains(c),
            Language::Czech => c.is_ascii_lowercase() || CZECH_LETTERS.contains(c),
            Language::English => c.is_ascii_lowercase(),
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Raw per-class character counts, in [`Language::ALL`] order.
pub fn score(text: &str) -> [usize; 3] {
    let mut scores = [0usize; 3];
    for c in text.nfc().flat_map(char::to_lowercase) {
        for (i, language) in Language::ALL.iter().enumerate() {
            if language.matches(c) {
                scores[i] += 1;
            }
        }
    }
    scores
}

/// Pick the best-scoring class; never fails.
///
/// Hints that do not name a supported class still count as a non-empty hint
/// set, so every class is down-weighted equally in that case.
pub fn detect_language(text: &str, hints: &[String]) -> Language {
    let raw = score(text);
    let hinted: Vec<Language> = hints.iter().filter_map(|h| Language::from_code(h)).collect();

    let mut best = Language::ALL[0];
    let mut best_score = f32::MIN;

    for (language, count) in Language::ALL.iter().zip(raw) {
        let mut weighted = count as f32;
        if !hints.is_empty() && !hinted.contains(language) {
            weighted *= UNHINTED_WEIGHT;
        }
        // Strict comparison keeps the first declared class on ties
        if weighted > best_score {
            best = *language;
            best_score = weighted;
        }
    }

    best
}

/// Rejected language hint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid language hint: {0:?}")]
pub struct InvalidHint(pub String);

/// Trim, lower-case and validate caller-supplied hints. Duplicates are
/// dropped; order is otherwise kept for the recognition request.
pub fn normalize_hints(raw: &[String]) -> Result<Vec<String>, InvalidHint> {
    let mut hints: Vec<String> = Vec::with_capacity(raw.len());
    for hint in raw {
        let normalized = hint.trim().replace('_', "-").to_lowercase();
        if !HINT_PATTERN.is_match(&normalized) {
            return Err(InvalidHint(hint.clone()));
        }
        if !hints.contains(&normalized) {
            hints.push(normalized);
        }
    }
    Ok(hints)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hints(codes: &[&str]) -> Vec<String> {
        codes.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_scores() {
        // ľ is Slovak only; š č are shared; a b c d count everywhere
        assert_eq!(score("ľšč abcd"), [7, 6, 4]);
        assert_eq!(score("ŘEŘICHA"), [5, 7, 5]);
        assert_eq!(score("1234 !!"), [0, 0, 0]);
    }

    #[test]
    fn test_scores_compose_decomposed_input() {
        // "c" + combining caron composes to "č"
        assert_eq!(score("c\u{030C}"), [1, 1, 0]);
    }

    #[test]
    fn test_all_zero_returns_first_class() {
        assert_eq!(detect_language("", &[]), Language::Slovak);
        assert_eq!(detect_language("1234 !!", &[]), Language::Slovak);
        assert_eq!(detect_language("1234", &hints(&["en"])), Language::Slovak);
    }

    #[test]
    fn test_diacritics_decide() {
        assert_eq!(detect_language("Dobrá Káva", &[]), Language::Slovak);
        assert_eq!(detect_language("Ľahko pražená káva", &[]), Language::Slovak);
        assert_eq!(detect_language("Čerstvě pražená káva", &[]), Language::Czech);
    }

    #[test]
    fn test_hint_changes_winner_for_generic_latin() {
        let text = "single origin coffee";
        // all three classes tie without hints
        assert_eq!(detect_language(text, &[]), Language::Slovak);
        // with "en": sk and cs are scaled to 0.6
        assert_eq!(detect_language(text, &hints(&["en"])), Language::English);
    }

    #[test]
    fn test_hint_is_soft_bias() {
        // Strong Czech signal beats a Slovak hint: cs=6 -> 3.6 vs sk=0
        assert_eq!(detect_language("řěůřěů", &hints(&["sk"])), Language::Czech);
        // One diacritic is not enough against an English hint: sk=9*0.6 vs en=7
        assert_eq!(detect_language("Dobrá Káva", &hints(&["en"])), Language::English);
    }

    #[test]
    fn test_tie_keeps_declared_order() {
        // č counts for both Slovak and Czech
        assert_eq!(detect_language("č", &[]), Language::Slovak);
        assert_eq!(detect_language("č", &hints(&["sk", "cs"])), Language::Slovak);
        assert_eq!(detect_language("č", &hints(&["cs"])), Language::Czech);
    }

    #[test]
    fn test_region_subtag_hint() {
        assert_eq!(detect_language("washed", &hints(&["en-US"])), Language::English);
        assert_eq!(Language::from_code("cs_CZ"), Some(Language::Czech));
        assert_eq!(Language::from_code("de"), None);
    }

    #[test]
    fn test_unsupported_hint_weights_every_class() {
        assert_eq!(detect_language("washed", &hints(&["de"])), Language::Slovak);
    }

    #[test]
    fn test_normalize_hints() {
        let normalized = normalize_hints(&hints(&[" SK ", "en", "sk", "sk_SK"])).unwrap();
        assert_eq!(normalized, vec!["sk", "en", "sk-sk"]);
        assert!(normalize_hints(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_hints_rejected() {
        assert!(normalize_hints(&hints(&[""])).is_err());
        assert!(normalize_hints(&hints(&["english language"])).is_err());
        assert!(normalize_hints(&hints(&["s"])).is_err());
        assert_eq!(
            normalize_hints(&hints(&["sk", "12"])),
            Err(InvalidHint("12".to_string()))
        );
    }

    #[test]
    fn test_serializes_as_code() {
        assert_eq!(serde_json::to_string(&Language::Czech).unwrap(), "\"cs\"");
        assert_eq!(Language::Slovak.to_string(), "sk");
    }
}
