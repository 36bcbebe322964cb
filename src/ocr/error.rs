//! Errors raised by the OCR pipeline.

use thiserror::Error;

/// Failures from any pipeline stage.
///
/// The `Display` output is safe to show to end users: engine payloads stay in
/// the variant fields and are only reachable through [`OcrError::diagnostics`].
#[derive(Debug, Error)]
pub enum OcrError {
    /// The transport payload is not valid base64.
    #[error("Invalid image payload: {0}")]
    InvalidPayload(String),

    /// The decoded bytes are not a raster image we can read.
    #[error("Image decode failed: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The recognition engine answered with a non-2xx status.
    #[error("Recognition service returned HTTP {status}")]
    RecognitionTransport { status: u16, body: String },

    /// The recognition engine answered 2xx but embedded an error object.
    #[error("Recognition engine rejected the request")]
    RecognitionEngine { code: Option<i32>, message: String },

    /// The request never produced a response (connect, TLS, body read).
    #[error("Recognition request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The engine response body could not be parsed.
    #[error("Failed to parse recognition response: {0}")]
    Parse(String),
}

impl OcrError {
    /// Raw diagnostic payload for logs (engine error bodies and messages).
    pub fn diagnostics(&self) -> Option<String> {
        match self {
            OcrError::RecognitionTransport { body, .. } => Some(body.clone()),
            OcrError::RecognitionEngine { code, message } => Some(match code {
                Some(code) => format!("code {}: {}", code, message),
                None => message.clone(),
            }),
            OcrError::Parse(msg) => Some(msg.clone()),
            _ => None,
        }
    }

    /// Short machine-readable tag used at the HTTP boundary.
    pub fn code(&self) -> &'static str {
        match self {
            OcrError::InvalidPayload(_) => "invalid_payload",
            OcrError::ImageDecode(_) => "image_decode",
            OcrError::RecognitionTransport { .. } => "recognition_transport",
            OcrError::RecognitionEngine { .. } => "recognition_engine",
            OcrError::Http(_) => "recognition_unreachable",
            OcrError::Parse(_) => "recognition_parse",
        }
    }
}
