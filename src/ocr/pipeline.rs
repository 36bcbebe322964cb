//! End-to-end OCR pipeline.

use std::time::Instant;

use tracing::{debug, info};

use super::error::OcrError;
use super::image_prep::ImageNormalizer;
use super::reconstruct::{raw_text, reconstruct};
use super::result::OcrResult;
use super::vision::VisionClient;
use crate::config::VisionConfig;

/// Normalizer and recognition client wired together.
///
/// Holds no credentials; the API key is passed to every [`OcrPipeline::run`].
pub struct OcrPipeline {
    normalizer: ImageNormalizer,
    vision: VisionClient,
}

impl OcrPipeline {
    pub fn new(config: VisionConfig) -> Result<Self, OcrError> {
        Ok(Self {
            normalizer: ImageNormalizer::default(),
            vision: VisionClient::new(config)?,
        })
    }

    /// Replace the image normalizer.
    pub fn with_normalizer(mut self, normalizer: ImageNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn normalizer(&self) -> &ImageNormalizer {
        &self.normalizer
    }

    /// Normalize, recognize, reconstruct, clean and package one image.
    ///
    /// `hints` are forwarded to the engine as given and bias language
    /// detection; validate them with [`super::normalize_hints`] first.
    pub async fn run(
        &self,
        image: &str,
        hints: &[String],
        api_key: &str,
    ) -> Result<OcrResult, OcrError> {
        let start = Instant::now();

        let normalized = self.normalizer.normalize_encoded(image)?;
        debug!("Normalized image in {:?}", start.elapsed());

        let response = self.vision.annotate(&normalized, hints, api_key).await?;

        let raw = raw_text(&response);
        let reconstruction = reconstruct(&response);
        let result = OcrResult::assemble(raw, reconstruction, hints);

        info!(
            "OCR finished in {:?}: {} blocks, {} lines, language {}",
            start.elapsed(),
            result.blocks.len(),
            result.lines.len(),
            result.metadata.detected_language
        );

        Ok(result)
    }
}
