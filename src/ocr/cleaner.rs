//! Line cleanup for recognized text.
//!
//! Each line is normalized, checked against OCR noise heuristics, and
//! deduplicated on a case- and diacritic-insensitive key. Output order is
//! input order. Cleaning is pure and idempotent.

use std::collections::HashSet;

use tracing::debug;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Consecutive identical characters that mark a line as repeat noise.
pub const MAX_REPEAT_RUN: usize = 5;
/// Lines with fewer letters than this share are noise unless clearly numeric.
pub const MIN_ALPHA_RATIO: f32 = 0.2;
/// Digit count that keeps a letter-poor line (prices, weights, dates).
pub const MIN_DIGITS_FOR_NUMERIC: usize = 2;
/// Lines with more symbols than this share are noise.
pub const MAX_SYMBOL_RATIO: f32 = 0.6;

/// Cleaned output of a line list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanedText {
    /// Surviving lines, first occurrence order.
    pub lines: Vec<String>,
    /// Lines joined by newline.
    pub text: String,
    /// `text` with diacritics stripped, for fuzzy matching downstream.
    pub normalized: String,
}

/// Clean a line list and build the joined artifacts.
pub fn clean_text<I, S>(lines: I) -> CleanedText
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let lines = clean_lines(lines);
    let text = lines.join("\n");
    let normalized = strip_diacritics(&text);
    CleanedText {
        lines,
        text,
        normalized,
    }
}

/// Normalize, drop artifacts, and deduplicate.
pub fn clean_lines<I, S>(lines: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut cleaned = Vec::new();

    for raw in lines {
        let line = normalize_line(raw.as_ref());
        if is_artifact(&line) {
            if !line.is_empty() {
                debug!("Dropping OCR artifact line: {:?}", line);
            }
            continue;
        }
        if seen.insert(fold_key(&line)) {
            cleaned.push(line);
        }
    }

    cleaned
}

/// NFKC, straight quotes, single spaces, no control characters, trimmed.
pub fn normalize_line(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut pending_space = false;

    for c in line.nfkc().map(straighten_quote) {
        if c.is_whitespace() {
            pending_space = true;
        } else if is_stripped_control(c) {
            // Removed without closing a whitespace run
        } else {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(c);
        }
    }

    out
}

fn straighten_quote(c: char) -> char {
    match c {
        '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' | '\u{2032}' | '\u{2039}'
        | '\u{203A}' => '\'',
        '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' | '\u{2033}' | '\u{00AB}'
        | '\u{00BB}' => '"',
        other => other,
    }
}

/// C0 controls and DEL.
fn is_stripped_control(c: char) -> bool {
    matches!(c, '\u{0000}'..='\u{001F}' | '\u{007F}')
}

/// Whether a normalized line is OCR noise.
pub fn is_artifact(line: &str) -> bool {
    let total = line.chars().count();
    if total == 0 {
        return true;
    }

    let mut letters = 0usize;
    let mut digits = 0usize;
    let mut symbols = 0usize;
    let mut word_chars = 0usize;

    for c in line.chars() {
        if c.is_alphabetic() {
            letters += 1;
        }
        if c.is_ascii_digit() {
            digits += 1;
        }
        if c.is_alphanumeric() || c == '_' {
            word_chars += 1;
        } else if !c.is_whitespace() {
            symbols += 1;
        }
    }

    if word_chars == 0 {
        return true;
    }
    if has_repeat_run(line, MAX_REPEAT_RUN) {
        return true;
    }

    let alpha_ratio = letters as f32 / total as f32;
    if alpha_ratio < MIN_ALPHA_RATIO && digits < MIN_DIGITS_FOR_NUMERIC {
        return true;
    }

    let symbol_ratio = symbols as f32 / total as f32;
    symbol_ratio > MAX_SYMBOL_RATIO
}

fn has_repeat_run(line: &str, run: usize) -> bool {
    let mut previous = None;
    let mut count = 0usize;
    for c in line.chars() {
        if Some(c) == previous {
            count += 1;
        } else {
            previous = Some(c);
            count = 1;
        }
        if count >= run {
            return true;
        }
    }
    false
}

/// Deduplication key: diacritics stripped, lower-cased.
pub fn fold_key(line: &str) -> String {
    strip_diacritics(line).to_lowercase()
}

/// Remove combining marks after canonical decomposition.
pub fn strip_diacritics(text: &str) -> String {
    text.nfd().filter(|c| !is_combining_mark(*c)).collect()
}
