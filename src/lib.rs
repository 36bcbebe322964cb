//! brewlens - OCR text extraction for coffee package labels.
//!
//! Takes a photo of a coffee bag label, cleans it up, sends it to the Google
//! Cloud Vision API, and returns structured, deduplicated text with a
//! detected language.

pub mod cli;
pub mod config;
pub mod llm;
pub mod ocr;
pub mod server;
