//! Error types for document reading and artifact writing

use thiserror::Error;

/// Errors that can occur while reading a source document
#[derive(Error, Debug)]
pub enum ReaderError {
    /// Extension is neither `.docx` nor `.pdf`
    #[error("Unsupported format: {0} (use .docx or .pdf)")]
    UnsupportedFormat(String),

    /// File could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Word document is not a readable package
    #[error("Word document extraction failed: {0}")]
    Docx(String),

    /// PDF text extraction failed
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
}

/// Errors that can occur while writing artifacts
#[derive(Error, Debug)]
pub enum WriterError {
    /// JSON serialization failed
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Archive could not be written
    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Underlying write failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Unknown output format name
    #[error("Unknown output format: {0} (expected json, csv or xlsx)")]
    UnknownFormat(String),
}
