//! Image preprocessing ahead of text recognition.
//!
//! The transport form is base64 text, optionally carrying a data-URL prefix
//! (`data:image/png;base64,...`). Normalization is a fixed filter chain; the
//! order matters for reproducible output:
//!
//! 1. EXIF auto-rotate
//! 2. grayscale
//! 3. median filter
//! 4. histogram contrast stretch
//! 5. linear gain/offset
//! 6. 3x3 sharpen
//! 7. PNG encode

use std::io::Cursor;

use base64::Engine;
use image::{DynamicImage, GrayImage, ImageDecoder, ImageFormat, ImageReader};
use imageproc::filter::{median_filter, sharpen3x3};
use tracing::debug;

use super::error::OcrError;

/// Default linear gain applied after the contrast stretch.
pub const DEFAULT_GAIN: f32 = 1.15;
/// Default linear offset applied after the contrast stretch.
pub const DEFAULT_OFFSET: f32 = -8.0;
/// Default median window (7x7, radius 3).
pub const DEFAULT_MEDIAN_WINDOW: u32 = 7;
/// Share of darkest/brightest pixels ignored when stretching, in percent.
pub const DEFAULT_CLIP_PERCENT: f32 = 1.0;

/// Remove a leading `data:<mime>;base64,` marker if present.
pub fn strip_data_url(payload: &str) -> &str {
    let trimmed = payload.trim_start();
    if trimmed.starts_with("data:") {
        if let Some((_, data)) = trimmed.split_once(',') {
            return data;
        }
    }
    trimmed
}

/// Decode a transport payload into raw image bytes.
pub fn decode_payload(payload: &str) -> Result<Vec<u8>, OcrError> {
    let data: String = strip_data_url(payload)
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    if data.is_empty() {
        return Err(OcrError::InvalidPayload("empty image data".to_string()));
    }

    base64::engine::general_purpose::STANDARD
        .decode(data.as_bytes())
        .map_err(|e| OcrError::InvalidPayload(e.to_string()))
}

/// Encode raw bytes into the base64 transport form.
pub fn encode_payload(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// Deterministic grayscale cleanup for recognition input.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageNormalizer {
    /// Median window edge length (odd; 1 disables the filter).
    pub median_window: u32,
    /// Multiplier for the linear adjustment.
    pub gain: f32,
    /// Additive term for the linear adjustment.
    pub offset: f32,
    /// Histogram tail clipped on each side before stretching, in percent.
    pub clip_percent: f32,
}

impl Default for ImageNormalizer {
    fn default() -> Self {
        Self {
            median_window: DEFAULT_MEDIAN_WINDOW,
            gain: DEFAULT_GAIN,
            offset: DEFAULT_OFFSET,
            clip_percent: DEFAULT_CLIP_PERCENT,
        }
    }
}

impl ImageNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the filter chain over encoded image bytes (PNG, JPEG, ...) and
    /// return PNG bytes.
    pub fn normalize(&self, bytes: &[u8]) -> Result<Vec<u8>, OcrError> {
        let image = decode_oriented(bytes)?;
        debug!(
            "Normalizing {}x{} image ({} bytes)",
            image.width(),
            image.height(),
            bytes.len()
        );

        let gray = image.to_luma8();

        let radius = self.median_window / 2;
        let denoised = if radius > 0 {
            median_filter(&gray, radius, radius)
        } else {
            gray
        };

        let stretched = stretch_histogram(&denoised, self.clip_percent);
        let adjusted = linear_adjust(stretched, self.gain, self.offset);
        let sharpened = sharpen3x3(&adjusted);

        encode_png(sharpened)
    }

    /// Decode the transport payload, normalize it, and re-encode to base64.
    pub fn normalize_encoded(&self, payload: &str) -> Result<String, OcrError> {
        let bytes = decode_payload(payload)?;
        let png = self.normalize(&bytes)?;
        Ok(encode_payload(&png))
    }
}

/// Decode bytes and apply the EXIF orientation tag, if any.
fn decode_oriented(bytes: &[u8]) -> Result<DynamicImage, OcrError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(image::ImageError::IoError)?;

    let mut decoder = reader.into_decoder()?;
    let orientation = decoder.orientation()?;
    let mut image = DynamicImage::from_decoder(decoder)?;
    image.apply_orientation(orientation);
    Ok(image)
}

/// Stretch the luminance range so the clipped histogram spans 0..=255.
fn stretch_histogram(image: &GrayImage, clip_percent: f32) -> GrayImage {
    let mut histogram = [0u64; 256];
    for pixel in image.pixels() {
        histogram[pixel.0[0] as usize] += 1;
    }

    let total: u64 = histogram.iter().sum();
    if total == 0 {
        return image.clone();
    }
    let clip = (total as f64 * f64::from(clip_percent.max(0.0)) / 100.0) as u64;

    let mut low = 0u8;
    let mut seen = 0u64;
    for (value, count) in histogram.iter().enumerate() {
        seen += count;
        if seen > clip {
            low = value as u8;
            break;
        }
    }

    let mut high = 255u8;
    seen = 0;
    for (value, count) in histogram.iter().enumerate().rev() {
        seen += count;
        if seen > clip {
            high = value as u8;
            break;
        }
    }

    // Flat image: nothing to stretch
    if high <= low {
        return image.clone();
    }

    let scale = 255.0 / f32::from(high - low);
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        let value = pixel.0[0].clamp(low, high);
        pixel.0[0] = (f32::from(value - low) * scale).round().min(255.0) as u8;
    }
    out
}

/// Apply `value * gain + offset`, clamped to the u8 range.
fn linear_adjust(mut image: GrayImage, gain: f32, offset: f32) -> GrayImage {
    for pixel in image.pixels_mut() {
        let adjusted = f32::from(pixel.0[0]) * gain + offset;
        pixel.0[0] = adjusted.round().clamp(0.0, 255.0) as u8;
    }
    image
}

fn encode_png(image: GrayImage) -> Result<Vec<u8>, OcrError> {
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageLuma8(image).write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}
