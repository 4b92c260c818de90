//! Nexus Formats
//!
//! Reads source documents (`.docx`, `.pdf`) into plain text and writes the
//! generated artifacts: test matrices as CSV, JSON or a spreadsheet, user
//! stories as text or a word document, and zip bundles of several files.
//!
//! Writers only format; choosing paths and writing to disk is left to the
//! caller.

#![warn(missing_docs)]

mod bundle;
mod error;
mod matrix;
mod ooxml;
mod reader;
mod stories;

pub use bundle::{bundle, render_all, Artifact};
pub use error::{ReaderError, WriterError};
pub use matrix::{to_csv, to_json, to_xlsx, OutputFormat, LIST_SEPARATOR};
pub use reader::{read_bytes, read_document, DocumentFormat};
pub use stories::{separator, stories_to_docx, stories_to_text, DEFAULT_TITLE};
