//! Final OCR result and confidence aggregation.

use serde::Serialize;

use super::cleaner::clean_text;
use super::language::{detect_language, Language};
use super::reconstruct::{Block, Line, Reconstruction};

/// Mean of the present values; `None` when nothing is present.
pub fn mean_confidence<I>(values: I) -> Option<f32>
where
    I: IntoIterator<Item = Option<f32>>,
{
    let (sum, count) = values
        .into_iter()
        .flatten()
        .filter(|v| !v.is_nan())
        .fold((0.0f32, 0usize), |(sum, count), v| (sum + v, count + 1));

    if count == 0 {
        None
    } else {
        Some(sum / count as f32)
    }
}

/// Result metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrMetadata {
    pub detected_language: Language,
    /// Mean line confidence; `None` when the engine reported none.
    pub confidence: Option<f32>,
}

/// Structured output of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrResult {
    /// Text exactly as the engine reported it.
    pub raw_text: String,
    /// Cleaned, deduplicated lines joined by newline.
    pub cleaned_text: String,
    /// `cleaned_text` with diacritics stripped.
    pub normalized_text: String,
    pub cleaned_lines: Vec<String>,
    pub blocks: Vec<Block>,
    pub lines: Vec<Line>,
    pub metadata: OcrMetadata,
}

impl OcrResult {
    /// Clean, detect language, and package everything.
    ///
    /// Reconstructed lines feed the cleaner; when the engine only returned the
    /// flat annotation, the raw text lines are used instead.
    pub fn assemble(raw_text: String, reconstruction: Reconstruction, hints: &[String]) -> Self {
        let cleaned = if reconstruction.lines.is_empty() {
            clean_text(raw_text.lines())
        } else {
            clean_text(reconstruction.lines.iter().map(|l| l.text.as_str()))
        };

        let detected_language = detect_language(&cleaned.text, hints);
        let confidence = mean_confidence(reconstruction.lines.iter().map(|l| l.confidence));

        Self {
            raw_text,
            cleaned_text: cleaned.text,
            normalized_text: cleaned.normalized,
            cleaned_lines: cleaned.lines,
            blocks: reconstruction.blocks,
            lines: reconstruction.lines,
            metadata: OcrMetadata {
                detected_language,
                confidence,
            },
        }
    }

    /// Whether the engine found any text at all.
    pub fn is_empty(&self) -> bool {
        self.raw_text.is_empty()
    }
}
