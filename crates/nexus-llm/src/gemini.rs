//! Gemini Provider Implementation
//!
//! Calls the Generative Language REST API (`models/{model}:generateContent`).
//!
//! # Features
//!
//! - Blocking HTTP client with a per-request timeout
//! - Retry with exponential backoff for transient (unavailable) failures
//! - Safety blocks detected from `promptFeedback.blockReason` and
//!   candidate `finishReason`, falling back to the classification table
//!
//! The client is blocking: build and drop the provider outside an async
//! context and call it from a blocking task.
//!
//! # Examples
//!
//! ```no_run
//! use nexus_llm::GeminiProvider;
//! use nexus_domain::traits::LlmProvider;
//!
//! let provider = GeminiProvider::new("api-key", "gemini-1.5-flash-latest").unwrap();
//! let text = provider.generate("Say hello").unwrap();
//! ```

use crate::{ErrorKind, LlmError};
use nexus_domain::traits::LlmProvider as LlmProviderTrait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Default API endpoint
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash-latest";

/// Default timeout for a single HTTP request (seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 90;

/// Default number of attempts
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Finish reasons that mean the completion was withheld
const BLOCKING_FINISH_REASONS: &[&str] = &["SAFETY", "PROHIBITED_CONTENT", "BLOCKLIST", "SPII"];

/// Gemini API provider
pub struct GeminiProvider {
    endpoint: String,
    model: String,
    api_key: String,
    client: reqwest::blocking::Client,
    max_retries: u32,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

impl GeminiProvider {
    /// Create a new provider with the default endpoint and timeout
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, LlmError> {
        Self::with_timeout(api_key, model, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a new provider with an explicit per-request timeout
    pub fn with_timeout(
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(LlmError::Unavailable("API key not configured".to_string()));
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Unknown(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: model.into(),
            api_key,
            client,
            max_retries: DEFAULT_MAX_RETRIES,
        })
    }

    /// Override the API endpoint (e.g. for a proxy)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the maximum number of attempts
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }

    /// One HTTP round trip
    fn call_once(&self, prompt: &str) -> Result<String, LlmError> {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(self.url())
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .unwrap_or_else(|_| "Unknown error".to_string());
            let message = format!("HTTP {}: {}", status.as_u16(), error_text);
            return Err(match status.as_u16() {
                429 | 500 | 502 | 503 | 504 => match crate::classify(&message) {
                    ErrorKind::SafetyBlocked => LlmError::SafetyBlocked(message),
                    _ => LlmError::Unavailable(message),
                },
                _ => LlmError::from_message(message),
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .map_err(|e| LlmError::Unknown(format!("Failed to parse response: {}", e)))?;

        extract_text(parsed)
    }
}

/// Pull the completion text out of a response, detecting safety blocks
fn extract_text(response: GenerateResponse) -> Result<String, LlmError> {
    if let Some(reason) = response
        .prompt_feedback
        .and_then(|feedback| feedback.block_reason)
    {
        return Err(LlmError::SafetyBlocked(format!("prompt blocked: {}", reason)));
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::Unknown("response has no candidates".to_string()))?;

    let text: String = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    if text.is_empty() {
        if let Some(reason) = candidate.finish_reason {
            if BLOCKING_FINISH_REASONS.contains(&reason.as_str()) {
                return Err(LlmError::SafetyBlocked(format!("completion blocked: {}", reason)));
            }
            return Err(LlmError::Unknown(format!("empty completion (finish reason {})", reason)));
        }
        return Err(LlmError::Unknown("empty completion".to_string()));
    }

    Ok(text)
}

fn map_transport_error(e: reqwest::Error) -> LlmError {
    if e.is_timeout() {
        LlmError::Timeout(format!("Request failed: {}", e))
    } else if e.is_connect() {
        LlmError::Unavailable(format!("Request failed: {}", e))
    } else {
        LlmError::from_message(format!("Request failed: {}", e))
    }
}

impl LlmProviderTrait for GeminiProvider {
    type Error = LlmError;

    fn generate(&self, prompt: &str) -> Result<String, Self::Error> {
        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.call_once(prompt) {
                Ok(text) => {
                    debug!(model = %self.model, chars = text.len(), "completion received");
                    return Ok(text);
                }
                Err(LlmError::Unavailable(message)) if attempts < self.max_retries => {
                    // Exponential backoff: 1s, 2s, 4s, ...
                    let delay = Duration::from_secs(2u64.pow(attempts - 1));
                    warn!(attempt = attempts, "generation unavailable, retrying in {:?}: {}", delay, message);
                    std::thread::sleep(delay);
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
