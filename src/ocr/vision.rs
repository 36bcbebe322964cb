//! Google Cloud Vision text-detection client.
//!
//! Sends one `images:annotate` request per call and validates the response
//! envelope. Retries and timeouts belong to the caller.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::error::OcrError;
use crate::config::VisionConfig;

/// Outgoing batch request.
#[derive(Debug, Serialize)]
struct AnnotateRequest {
    requests: Vec<AnnotateImageRequest>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateImageRequest {
    image: ImageContent,
    features: Vec<Feature>,
    // An empty hint list changes engine behavior, so the field is omitted instead
    #[serde(skip_serializing_if = "Option::is_none")]
    image_context: Option<ImageContext>,
}

#[derive(Debug, Serialize)]
struct ImageContent {
    content: String,
}

#[derive(Debug, Serialize)]
struct Feature {
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageContext {
    language_hints: Vec<String>,
}

/// Batch response envelope.
#[derive(Debug, Default, Deserialize)]
struct BatchAnnotateResponse {
    #[serde(default)]
    responses: Vec<AnnotateImageResponse>,
    #[serde(default)]
    error: Option<EngineStatus>,
}

/// Per-image response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotateImageResponse {
    #[serde(default)]
    pub full_text_annotation: Option<TextAnnotation>,
    #[serde(default)]
    pub text_annotations: Vec<EntityAnnotation>,
    #[serde(default)]
    pub error: Option<EngineStatus>,
}

/// Error object embedded in an otherwise successful response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineStatus {
    #[serde(default)]
    pub code: Option<i32>,
    #[serde(default)]
    pub message: String,
}

/// Flat annotation; the first entry holds the whole detected text.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntityAnnotation {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub locale: Option<String>,
}

/// Hierarchical annotation: pages → blocks → paragraphs → words → symbols.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TextAnnotation {
    #[serde(default)]
    pub pages: Vec<PageAnnotation>,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageAnnotation {
    #[serde(default)]
    pub blocks: Vec<BlockAnnotation>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BlockAnnotation {
    #[serde(default)]
    pub paragraphs: Vec<ParagraphAnnotation>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParagraphAnnotation {
    #[serde(default)]
    pub words: Vec<WordAnnotation>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WordAnnotation {
    #[serde(default)]
    pub symbols: Vec<SymbolAnnotation>,
    #[serde(default)]
    pub confidence: Option<f32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SymbolAnnotation {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub confidence: Option<f32>,
    #[serde(default)]
    pub property: Option<TextProperty>,
}

impl SymbolAnnotation {
    /// Break type attached to this symbol, if any.
    pub fn break_type(&self) -> Option<BreakType> {
        self.property
            .as_ref()
            .and_then(|p| p.detected_break.as_ref())
            .map(|b| b.kind)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextProperty {
    #[serde(default)]
    pub detected_break: Option<DetectedBreak>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DetectedBreak {
    #[serde(rename = "type", default)]
    pub kind: BreakType,
}

/// Boundary following a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BreakType {
    Space,
    SureSpace,
    EolSureSpace,
    Hyphen,
    LineBreak,
    #[default]
    #[serde(other)]
    Unknown,
}

impl BreakType {
    /// Space that keeps the current line open.
    pub fn is_space(self) -> bool {
        matches!(self, BreakType::Space | BreakType::SureSpace)
    }

    /// Boundary that closes the current line.
    pub fn ends_line(self) -> bool {
        matches!(self, BreakType::LineBreak | BreakType::EolSureSpace)
    }
}

/// Client for the recognition engine.
pub struct VisionClient {
    config: VisionConfig,
    client: Client,
}

impl VisionClient {
    /// Create a client. The credential is passed per call, not stored.
    pub fn new(config: VisionConfig) -> Result<Self, OcrError> {
        let client = Client::builder().build()?;
        Ok(Self { config, client })
    }

    /// Get the config.
    pub fn config(&self) -> &VisionConfig {
        &self.config
    }

    /// Run text detection on a base64 image.
    pub async fn annotate(
        &self,
        image_base64: &str,
        language_hints: &[String],
        api_key: &str,
    ) -> Result<AnnotateImageResponse, OcrError> {
        let request = build_request(image_base64, language_hints, &self.config.feature);

        debug!(
            "Calling recognition engine at {} (hints: {:?})",
            self.config.endpoint, language_hints
        );

        let resp = self
            .client
            .post(&self.config.endpoint)
            .query(&[("key", api_key)])
            .json(&request)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            warn!("Recognition engine returned HTTP {}", status);
            return Err(OcrError::RecognitionTransport {
                status: status.as_u16(),
                body,
            });
        }

        parse_response(&body)
    }
}

fn build_request(image_base64: &str, language_hints: &[String], feature: &str) -> AnnotateRequest {
    let image_context = if language_hints.is_empty() {
        None
    } else {
        Some(ImageContext {
            language_hints: language_hints.to_vec(),
        })
    };

    AnnotateRequest {
        requests: vec![AnnotateImageRequest {
            image: ImageContent {
                content: image_base64.to_string(),
            },
            features: vec![Feature {
                kind: feature.to_string(),
            }],
            image_context,
        }],
    }
}

/// Parse a 2xx body and surface embedded engine errors.
fn parse_response(body: &str) -> Result<AnnotateImageResponse, OcrError> {
    let batch: BatchAnnotateResponse =
        serde_json::from_str(body).map_err(|e| OcrError::Parse(e.to_string()))?;

    if let Some(status) = batch.error {
        return Err(OcrError::RecognitionEngine {
            code: status.code,
            message: status.message,
        });
    }

    let response = batch.responses.into_iter().next().unwrap_or_default();
    if let Some(status) = response.error {
        return Err(OcrError::RecognitionEngine {
            code: status.code,
            message: status.message,
        });
    }

    Ok(response)
}
