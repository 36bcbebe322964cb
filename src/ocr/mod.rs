//! OCR text extraction for coffee package labels.
//!
//! The pipeline runs in a fixed order:
//! - image normalization (grayscale, denoise, contrast, sharpen)
//! - text detection by the Google Cloud Vision API
//! - line/block reconstruction from the symbol hierarchy
//! - line cleanup and deduplication
//! - language detection (Slovak, Czech, English)
//!
//! [`OcrPipeline::run`] drives all stages and returns an [`OcrResult`].

mod cleaner;
mod error;
mod image_prep;
mod language;
mod pipeline;
mod reconstruct;
mod result;
mod vision;

pub use cleaner::{
    clean_lines, clean_text, fold_key, is_artifact, normalize_line, strip_diacritics, CleanedText,
};
pub use error::OcrError;
pub use image_prep::{decode_payload, encode_payload, strip_data_url, ImageNormalizer};
pub use language::{detect_language, normalize_hints, InvalidHint, Language};
pub use pipeline::OcrPipeline;
pub use reconstruct::{raw_text, reconstruct, Block, Line, Reconstruction};
pub use result::{mean_confidence, OcrMetadata, OcrResult};
pub use vision::{AnnotateImageResponse, BreakType, VisionClient};
