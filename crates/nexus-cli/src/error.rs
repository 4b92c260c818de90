//! Error types for the CLI application.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Source document could not be read
    #[error("{0}")]
    Reader(#[from] nexus_formats::ReaderError),

    /// Artifact could not be written
    #[error("{0}")]
    Writer(#[from] nexus_formats::WriterError),

    /// Generation client could not be created
    #[error("{0}")]
    Llm(#[from] nexus_llm::LlmError),

    /// Generation pipeline failed
    #[error("{0}")]
    Generation(#[from] nexus_extractor::ExtractorError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
