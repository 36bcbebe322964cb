//! One-shot OCR command.

use std::path::Path;

use console::style;
use serde::Serialize;

use crate::config::Config;
use crate::llm::LlmClient;
use crate::ocr::{encode_payload, normalize_hints, OcrPipeline, OcrResult};

#[derive(Serialize)]
struct ScanOutput<'a> {
    #[serde(flatten)]
    result: &'a OcrResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    correction: Option<String>,
}

/// Run the pipeline on an image file and print JSON to stdout.
pub async fn cmd_scan(
    config: &Config,
    file: &Path,
    hints: &[String],
    correct: bool,
    pretty: bool,
) -> anyhow::Result<()> {
    let Some(api_key) = config.vision.api_key() else {
        anyhow::bail!("Vision API key not configured (set VISION_API_KEY)");
    };

    let hints = normalize_hints(hints)?;
    let bytes = tokio::fs::read(file)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", file.display(), e))?;

    eprintln!(
        "{} Scanning {} ({} bytes)",
        style("→").cyan(),
        file.display(),
        bytes.len()
    );

    let pipeline = OcrPipeline::new(config.vision.clone())?;
    let result = match pipeline.run(&encode_payload(&bytes), &hints, api_key).await {
        Ok(result) => result,
        Err(e) => {
            eprintln!("  {} {}", style("✗").red(), e);
            if let Some(details) = e.diagnostics() {
                eprintln!("    {}", style(details).dim());
            }
            return Err(e.into());
        }
    };

    if result.is_empty() {
        eprintln!("  {} No text detected", style("!").yellow());
    } else {
        eprintln!(
            "  {} {} lines, language {}",
            style("✓").green(),
            result.cleaned_lines.len(),
            result.metadata.detected_language
        );
    }

    let correction = if correct && !result.is_empty() {
        let client = LlmClient::new(config.llm.clone())?;
        let correction = client.correct(&result.cleaned_text).await?;
        if !correction.is_corrected() {
            eprintln!("  {} LLM correction not applied", style("!").yellow());
        }
        Some(correction.into_text(&result.cleaned_text))
    } else {
        None
    };

    let output = ScanOutput {
        result: &result,
        correction,
    };
    let json = if pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    println!("{}", json);

    Ok(())
}
