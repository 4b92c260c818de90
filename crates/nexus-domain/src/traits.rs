//! Trait definitions for external interactions
//!
//! The text-generation service is the only effectful collaborator of the
//! pipeline. Implementations live in `nexus-llm`.

/// Trait for text-generation providers
///
/// A provider turns a prompt into free-form text. It is not assumed to
/// support any structured-output mode, streaming or batching.
pub trait LlmProvider {
    /// Error type for generation calls
    type Error;

    /// Generate a completion for the prompt
    fn generate(&self, prompt: &str) -> Result<String, Self::Error>;

    /// Name of the underlying model, for logs and metadata
    fn model_name(&self) -> &str {
        "llm"
    }
}
