//! Error types for the pipelines

use nexus_llm::LlmError;
use thiserror::Error;

/// Errors that can occur while generating QA artifacts
///
/// Per-fragment variants (`Generation`, `ExtractionFailed`) are absorbed
/// by the pipeline loop; the rest end the request.
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// Input is empty or below the minimum length
    #[error("Input text is empty or too short: {length} chars (min: {min})")]
    EmptyOrTooShortInput {
        /// Non-whitespace characters found
        length: usize,
        /// Configured minimum
        min: usize,
    },

    /// Text exceeds maximum length
    #[error("Text too long: {0} chars (max: {1})")]
    TextTooLong(usize, usize),

    /// Generation call failed for one fragment
    #[error("Generation failed: {0}")]
    Generation(#[from] LlmError),

    /// Response held no structured content
    #[error("No structured content found in a {0}-char response")]
    ExtractionFailed(usize),

    /// Every fragment was blocked by the service's safety filters
    #[error("Security error: the request was blocked by safety filters")]
    SafetyBlocked,

    /// No fragment produced anything usable
    #[error("No usable records: none of {fragments} fragment(s) produced results ({detail})")]
    NoUsableRecords {
        /// Fragments attempted
        fragments: usize,
        /// Last per-fragment failure, or why nothing was produced
        detail: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ExtractorError {
    /// Whether the error only concerns one fragment
    pub fn is_per_fragment(&self) -> bool {
        matches!(
            self,
            ExtractorError::Generation(_) | ExtractorError::ExtractionFailed(_)
        )
    }
}
