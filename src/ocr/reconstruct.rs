//! Rebuild plain-text lines and blocks from the hierarchical annotation.

use serde::Serialize;

use super::result::mean_confidence;
use super::vision::{AnnotateImageResponse, BreakType, WordAnnotation};

/// A reconstructed row of text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Line {
    pub text: String,
    pub confidence: Option<f32>,
}

/// A recognized region, lines in reading order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    /// Lines joined by newline.
    pub text: String,
    /// Mean of the line confidences that are present.
    pub confidence: Option<f32>,
    pub lines: Vec<Line>,
}

impl Block {
    fn from_lines(lines: Vec<Line>) -> Self {
        let text = lines
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let confidence = mean_confidence(lines.iter().map(|l| l.confidence));
        Self {
            text,
            confidence,
            lines,
        }
    }
}

/// Output of the reconstruction walk.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconstruction {
    pub blocks: Vec<Block>,
    /// Every line of every block, same order.
    pub lines: Vec<Line>,
}

/// Word reduced to what the line builder needs.
struct ReducedWord {
    text: String,
    confidence: Option<f32>,
    boundary: Option<BreakType>,
}

impl ReducedWord {
    fn from_annotation(word: &WordAnnotation) -> Self {
        let text: String = word.symbols.iter().map(|s| s.text.as_str()).collect();
        let confidence = mean_confidence(word.symbols.iter().map(|s| s.confidence))
            .or(word.confidence);
        let boundary = word.symbols.iter().rev().find_map(|s| s.break_type());
        Self {
            text,
            confidence,
            boundary,
        }
    }
}

/// In-progress line state threaded through the word loop.
#[derive(Default)]
struct LineAccumulator {
    text: String,
    confidences: Vec<f32>,
}

impl LineAccumulator {
    fn push_word(&mut self, word: &ReducedWord) {
        if !self.text.is_empty() && !self.text.ends_with(' ') {
            self.text.push(' ');
        }
        self.text.push_str(&word.text);
        if let Some(confidence) = word.confidence {
            self.confidences.push(confidence);
        }
    }

    fn push_space(&mut self) {
        self.text.push(' ');
    }

    /// Freeze the current line; `None` when it holds only whitespace.
    fn flush(&mut self) -> Option<Line> {
        let text = self.text.trim().to_string();
        let confidence = mean_confidence(self.confidences.drain(..).map(Some));
        self.text.clear();

        if text.is_empty() {
            None
        } else {
            Some(Line { text, confidence })
        }
    }
}

/// Walk pages → blocks → paragraphs → words → symbols in document order.
///
/// A response without `fullTextAnnotation` yields empty collections.
pub fn reconstruct(response: &AnnotateImageResponse) -> Reconstruction {
    let Some(annotation) = &response.full_text_annotation else {
        return Reconstruction::default();
    };

    let mut blocks = Vec::new();

    for block in annotation.pages.iter().flat_map(|p| p.blocks.iter()) {
        let mut lines = Vec::new();
        let mut current = LineAccumulator::default();

        for word in block.paragraphs.iter().flat_map(|p| p.words.iter()) {
            let word = ReducedWord::from_annotation(word);
            // Empty words contribute neither text nor their break signal
            if word.text.is_empty() {
                continue;
            }

            current.push_word(&word);

            match word.boundary {
                Some(b) if b.is_space() => current.push_space(),
                Some(b) if b.ends_line() => lines.extend(current.flush()),
                _ => {}
            }
        }

        lines.extend(current.flush());

        if !lines.is_empty() {
            blocks.push(Block::from_lines(lines));
        }
    }

    let lines = blocks.iter().flat_map(|b| b.lines.iter().cloned()).collect();

    Reconstruction { blocks, lines }
}

/// Full recognized text: the hierarchical annotation text, then the first
/// flat annotation, then empty.
pub fn raw_text(response: &AnnotateImageResponse) -> String {
    if let Some(annotation) = &response.full_text_annotation {
        if !annotation.text.is_empty() {
            return annotation.text.clone();
        }
    }
    response
        .text_annotations
        .first()
        .map(|a| a.description.clone())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn symbol(text: &str, confidence: Option<f32>, brk: Option<&str>) -> serde_json::Value {
        let mut value = json!({ "text": text });
        if let Some(c) = confidence {
            value["confidence"] = json!(c);
        }
        if let Some(b) = brk {
            value["property"] = json!({ "detectedBreak": { "type": b } });
        }
        value
    }

    /// Word whose last symbol carries `brk`.
    fn word(text: &str, confidence: f32, brk: Option<&str>) -> serde_json::Value {
        let chars: Vec<char> = text.chars().collect();
        let symbols: Vec<_> = chars
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let last = i + 1 == chars.len();
                symbol(&c.to_string(), Some(confidence), if last { brk } else { None })
            })
            .collect();
        json!({ "symbols": symbols })
    }

    fn response(blocks: Vec<Vec<serde_json::Value>>) -> AnnotateImageResponse {
        let blocks: Vec<_> = blocks
            .into_iter()
            .map(|words| json!({ "paragraphs": [{ "words": words }] }))
            .collect();
        serde_json::from_value(json!({
            "fullTextAnnotation": { "text": "raw", "pages": [{ "blocks": blocks }] }
        }))
        .unwrap()
    }

    #[test]
    fn test_space_then_line_break() {
        let resp = response(vec![vec![
            word("Dobrá", 0.9, Some("SPACE")),
            word("Káva", 0.7, Some("LINE_BREAK")),
        ]]);
        let rec = reconstruct(&resp);

        assert_eq!(rec.lines.len(), 1);
        assert_eq!(rec.lines[0].text, "Dobrá Káva");
        let confidence = rec.lines[0].confidence.unwrap();
        assert!((confidence - 0.8).abs() < 1e-6);
        assert_eq!(rec.blocks[0].text, "Dobrá Káva");
    }

    #[test]
    fn test_words_without_break_get_single_space() {
        let resp = response(vec![vec![word("Single", 0.9, None), word("Origin", 0.9, None)]]);
        let rec = reconstruct(&resp);
        assert_eq!(rec.lines[0].text, "Single Origin");
    }

    #[test]
    fn test_eol_sure_space_closes_line() {
        let resp = response(vec![vec![
            word("Etiópia", 0.95, Some("EOL_SURE_SPACE")),
            word("Yirgacheffe", 0.85, Some("SURE_SPACE")),
            word("1900m", 0.8, None),
        ]]);
        let rec = reconstruct(&resp);

        let texts: Vec<_> = rec.lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["Etiópia", "Yirgacheffe 1900m"]);
        assert_eq!(rec.blocks[0].text, "Etiópia\nYirgacheffe 1900m");
    }

    #[test]
    fn test_block_and_line_order_preserved() {
        let resp = response(vec![
            vec![word("zeta", 0.1, Some("LINE_BREAK")), word("alpha", 0.99, Some("LINE_BREAK"))],
            vec![word("beta", 0.5, Some("LINE_BREAK"))],
        ]);
        let rec = reconstruct(&resp);

        assert_eq!(rec.blocks.len(), 2);
        let texts: Vec<_> = rec.lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["zeta", "alpha", "beta"]);
        assert_eq!(rec.blocks[1].lines[0].text, "beta");
    }

    #[test]
    fn test_block_confidence_is_mean_of_lines() {
        let resp = response(vec![vec![
            word("a", 0.9, Some("LINE_BREAK")),
            word("b", 0.5, Some("LINE_BREAK")),
        ]]);
        let rec = reconstruct(&resp);
        assert!((rec.blocks[0].confidence.unwrap() - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_empty_word_skips_break_signal() {
        let resp = response(vec![vec![
            word("Arabica", 0.9, None),
            json!({ "symbols": [symbol("", None, Some("LINE_BREAK"))] }),
            word("100%", 0.9, Some("LINE_BREAK")),
        ]]);
        let rec = reconstruct(&resp);

        assert_eq!(rec.lines.len(), 1);
        assert_eq!(rec.lines[0].text, "Arabica 100%");
    }

    #[test]
    fn test_missing_confidence_is_unknown() {
        let resp: AnnotateImageResponse = serde_json::from_value(json!({
            "fullTextAnnotation": { "text": "x", "pages": [{ "blocks": [{ "paragraphs": [{ "words": [
                { "symbols": [{ "text": "x" }] }
            ]}]}]}]}
        }))
        .unwrap();
        let rec = reconstruct(&resp);
        assert_eq!(rec.lines[0].confidence, None);
        assert_eq!(rec.blocks[0].confidence, None);
    }

    #[test]
    fn test_word_confidence_fallback() {
        let resp: AnnotateImageResponse = serde_json::from_value(json!({
            "fullTextAnnotation": { "text": "x", "pages": [{ "blocks": [{ "paragraphs": [{ "words": [
                { "confidence": 0.6, "symbols": [{ "text": "x" }] }
            ]}]}]}]}
        }))
        .unwrap();
        let rec = reconstruct(&resp);
        assert!((rec.lines[0].confidence.unwrap() - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_no_annotation_is_empty() {
        let rec = reconstruct(&AnnotateImageResponse::default());
        assert!(rec.blocks.is_empty());
        assert!(rec.lines.is_empty());
        assert_eq!(raw_text(&AnnotateImageResponse::default()), "");
    }

    #[test]
    fn test_raw_text_falls_back_to_text_annotations() {
        let resp: AnnotateImageResponse = serde_json::from_value(json!({
            "textAnnotations": [{ "description": "Kolumbia\nHuila", "locale": "es" }, { "description": "Kolumbia" }]
        }))
        .unwrap();
        assert_eq!(raw_text(&resp), "Kolumbia\nHuila");
        assert!(reconstruct(&resp).lines.is_empty());
    }
}
