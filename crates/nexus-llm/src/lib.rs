//! Nexus LLM Provider Layer
//!
//! Implementations of the `LlmProvider` trait from `nexus-domain`, plus the
//! error taxonomy the pipeline uses to decide how a failed call is reported.
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic, scriptable mock for testing
//! - `GeminiProvider`: Google Generative Language REST API
//!
//! # Error classification
//!
//! The generation service does not always expose a structured error type.
//! Provider errors are therefore mapped onto [`ErrorKind`] through an explicit
//! substring table (see [`classify`]). Nothing outside this crate inspects
//! error text.
//!
//! # Examples
//!
//! ```
//! use nexus_llm::MockProvider;
//! use nexus_domain::traits::LlmProvider;
//!
//! let provider = MockProvider::new("[]");
//! let result = provider.generate("test prompt").unwrap();
//! assert_eq!(result, "[]");
//! ```

#![warn(missing_docs)]

pub mod classify;
pub mod gemini;

use nexus_domain::traits::LlmProvider as LlmProviderTrait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

pub use classify::{classify, ErrorKind};
pub use gemini::GeminiProvider;

/// Errors that can occur during a generation call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    /// Service unreachable, overloaded or rate limited
    #[error("Generation service unavailable: {0}")]
    Unavailable(String),

    /// The call did not complete in time
    #[error("Generation timed out: {0}")]
    Timeout(String),

    /// The prompt or the completion was blocked by a safety policy
    #[error("Request blocked by safety filters: {0}")]
    SafetyBlocked(String),

    /// Anything else
    #[error("Generation error: {0}")]
    Unknown(String),
}

impl LlmError {
    /// Build an error of the given kind
    pub fn from_kind(kind: ErrorKind, message: impl Into<String>) -> Self {
        let message = message.into();
        match kind {
            ErrorKind::Unavailable => LlmError::Unavailable(message),
            ErrorKind::Timeout => LlmError::Timeout(message),
            ErrorKind::SafetyBlocked => LlmError::SafetyBlocked(message),
            ErrorKind::Unknown => LlmError::Unknown(message),
        }
    }

    /// Classify a raw error message from a provider
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::from_kind(classify(&message), message)
    }

    /// Timeout raised by the caller's own deadline
    pub fn deadline_exceeded(limit: Duration) -> Self {
        LlmError::Timeout(format!("no response within {}s", limit.as_secs()))
    }

    /// Kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            LlmError::Unavailable(_) => ErrorKind::Unavailable,
            LlmError::Timeout(_) => ErrorKind::Timeout,
            LlmError::SafetyBlocked(_) => ErrorKind::SafetyBlocked,
            LlmError::Unknown(_) => ErrorKind::Unknown,
        }
    }
}

/// Scripted outcome for a prompt
#[derive(Debug, Clone)]
enum Scripted {
    Reply(String),
    Fail(LlmError),
}

/// Mock LLM provider for deterministic testing
///
/// Returns pre-configured responses without making any network calls.
/// Resolution order for each call:
///
/// 1. the first rule whose needle is contained in the prompt,
/// 2. the next queued outcome,
/// 3. the default response.
///
/// # Examples
///
/// ```
/// use nexus_llm::{LlmError, MockProvider};
/// use nexus_domain::traits::LlmProvider;
///
/// // Simple fixed response
/// let provider = MockProvider::new("Fixed response");
/// assert_eq!(provider.generate("any prompt").unwrap(), "Fixed response");
///
/// // Rules keyed on prompt content
/// let mut provider = MockProvider::default();
/// provider.add_response("login", "[]");
/// provider.add_error("checkout", LlmError::SafetyBlocked("blocked".into()));
/// assert_eq!(provider.generate("story about login").unwrap(), "[]");
/// assert!(provider.generate("story about checkout").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    rules: Arc<Mutex<Vec<(String, Scripted)>>>,
    queue: Arc<Mutex<VecDeque<Scripted>>>,
    prompts: Arc<Mutex<Vec<String>>>,
    delay: Option<Duration>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            rules: Arc::new(Mutex::new(Vec::new())),
            queue: Arc::new(Mutex::new(VecDeque::new())),
            prompts: Arc::new(Mutex::new(Vec::new())),
            delay: None,
        }
    }

    /// Create a provider that fails every call with the given error
    pub fn failing(error: LlmError) -> Self {
        let provider = Self::default();
        provider.rules.lock().unwrap().push((String::new(), Scripted::Fail(error)));
        provider
    }

    /// Respond with `response` whenever the prompt contains `needle`
    pub fn add_response(&mut self, needle: impl Into<String>, response: impl Into<String>) {
        self.rules
            .lock()
            .unwrap()
            .push((needle.into(), Scripted::Reply(response.into())));
    }

    /// Fail with `error` whenever the prompt contains `needle`
    pub fn add_error(&mut self, needle: impl Into<String>, error: LlmError) {
        self.rules
            .lock()
            .unwrap()
            .push((needle.into(), Scripted::Fail(error)));
    }

    /// Queue a response for the next call that matches no rule
    pub fn push_response(&self, response: impl Into<String>) {
        self.queue
            .lock()
            .unwrap()
            .push_back(Scripted::Reply(response.into()));
    }

    /// Queue a failure for the next call that matches no rule
    pub fn push_error(&self, error: LlmError) {
        self.queue.lock().unwrap().push_back(Scripted::Fail(error));
    }

    /// Sleep this long before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Get the number of times generate was called
    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    /// Prompts received so far, in call order
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    /// Forget recorded prompts
    pub fn reset_call_count(&self) {
        self.prompts.lock().unwrap().clear();
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

impl LlmProviderTrait for MockProvider {
    type Error = LlmError;

    fn generate(&self, prompt: &str) -> Result<String, Self::Error> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }

        let rule = self
            .rules
            .lock()
            .unwrap()
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, scripted)| scripted.clone());

        let scripted = match rule {
            Some(scripted) => scripted,
            None => match self.queue.lock().unwrap().pop_front() {
                Some(scripted) => scripted,
                None => Scripted::Reply(self.default_response.clone()),
            },
        };

        match scripted {
            Scripted::Reply(text) => Ok(text),
            Scripted::Fail(error) => Err(error),
        }
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}
