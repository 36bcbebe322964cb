//! LLM client for correcting recognized label text.
//!
//! Talks to any OpenAI-compatible chat completions API.

mod config;

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub use config::{LlmConfig, DEFAULT_CORRECTION_PROMPT};

/// Outcome of a correction attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Correction {
    /// The model returned a corrected text.
    Corrected(String),
    /// Correction did not run or produced nothing; keep the input.
    PassThrough,
}

impl Correction {
    /// Resolve to the text to use, given the original.
    pub fn into_text(self, original: &str) -> String {
        match self {
            Correction::Corrected(text) => text,
            Correction::PassThrough => original.to_string(),
        }
    }

    pub fn is_corrected(&self) -> bool {
        matches!(self, Correction::Corrected(_))
    }
}

/// LLM client for text correction.
pub struct LlmClient {
    config: LlmConfig,
    client: Client,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl LlmClient {
    /// Create a new LLM client with the given configuration.
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::Connection(e.to_string()))?;

        Ok(Self { config, client })
    }

    /// Get the config.
    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// Correct OCR text.
    ///
    /// Passes through when the client is disabled or has no key, when the
    /// text is blank, or when the model answers with nothing.
    pub async fn correct(&self, text: &str) -> Result<Correction, LlmError> {
        if !self.config.is_configured() || text.trim().is_empty() {
            return Ok(Correction::PassThrough);
        }

        let truncated = self.truncate_content(text);
        let prompt = self.config.get_prompt().replace("{text}", truncated);

        debug!("Requesting correction for {} chars", truncated.len());
        let response = self.call_chat(&prompt).await?;

        let corrected = response.trim();
        if corrected.is_empty() {
            return Ok(Correction::PassThrough);
        }

        info!("LLM correction applied ({} -> {} chars)", text.len(), corrected.len());
        Ok(Correction::Corrected(corrected.to_string()))
    }

    /// Truncate content to configured maximum (UTF-8 safe).
    fn truncate_content<'a>(&self, text: &'a str) -> &'a str {
        if text.len() <= self.config.max_content_chars {
            return text;
        }
        let mut end = self.config.max_content_chars;
        while end > 0 && !text.is_char_boundary(end) {
            end -= 1;
        }
        &text[..end]
    }

    async fn call_chat(&self, prompt: &str) -> Result<String, LlmError> {
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let url = self.config.completions_url();
        let api_key = self.config.api_key.as_deref().unwrap_or_default();
        let resp = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Connection(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("HTTP {}: {}", status, body)));
        }

        let chat: ChatResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        Ok(chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }
}

/// Errors that can occur during LLM operations.
#[derive(Debug)]
pub enum LlmError {
    /// Failed to connect to LLM service
    Connection(String),
    /// API returned an error
    Api(String),
    /// Failed to parse response
    Parse(String),
}

impl std::fmt::Display for LlmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmError::Connection(msg) => write!(f, "Connection error: {}", msg),
            LlmError::Api(msg) => write!(f, "API error: {}", msg),
            LlmError::Parse(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl std::error::Error for LlmError {}
