//! Source document reading
//!
//! Word documents yield their paragraphs in order, with each table row as
//! one line of ` | `-separated cells. PDFs yield the text of every page;
//! pages without a text layer contribute nothing.

use crate::error::ReaderError;
use quick_xml::events::Event;
use std::io::{Cursor, Read};
use std::path::Path;
use tracing::debug;

/// Maximum decompressed bytes read from one zip entry
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

/// Supported source document formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// Office Open XML word document (`.docx`)
    Docx,
    /// Portable Document Format (`.pdf`)
    Pdf,
}

impl DocumentFormat {
    /// Detect the format from a file extension, case-insensitively
    pub fn from_path(path: &Path) -> Result<Self, ReaderError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("docx") => Ok(DocumentFormat::Docx),
            Some("pdf") => Ok(DocumentFormat::Pdf),
            _ => Err(ReaderError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Read the text of a `.docx` or `.pdf` file.
///
/// The extension is checked before the file is opened.
pub fn read_document(path: &Path) -> Result<String, ReaderError> {
    let format = DocumentFormat::from_path(path)?;
    let bytes = std::fs::read(path)?;
    let text = read_bytes(&bytes, format)?;
    debug!("Read {} chars from {}", text.chars().count(), path.display());
    Ok(text)
}

/// Extract text from document bytes of a known format
pub fn read_bytes(bytes: &[u8], format: DocumentFormat) -> Result<String, ReaderError> {
    match format {
        DocumentFormat::Docx => read_docx(bytes),
        DocumentFormat::Pdf => {
            pdf_extract::extract_text_from_mem(bytes).map_err(|e| ReaderError::Pdf(e.to_string()))
        }
    }
}

fn read_docx(bytes: &[u8]) -> Result<String, ReaderError> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| ReaderError::Docx(e.to_string()))?;
    let entry = archive
        .by_name("word/document.xml")
        .map_err(|_| ReaderError::Docx("word/document.xml not found".to_string()))?;

    let mut xml = Vec::new();
    entry
        .take(MAX_XML_ENTRY_BYTES)
        .read_to_end(&mut xml)
        .map_err(|e| ReaderError::Docx(e.to_string()))?;
    if xml.len() as u64 >= MAX_XML_ENTRY_BYTES {
        return Err(ReaderError::Docx("word/document.xml exceeds size limit".to_string()));
    }

    document_text(&xml)
}

/// Walk `word/document.xml`, collecting paragraph and table-cell text
fn document_text(xml: &[u8]) -> Result<String, ReaderError> {
    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();

    let mut lines: Vec<String> = Vec::new();
    let mut paragraph = String::new();
    let mut in_text = false;
    let mut table_depth = 0usize;
    let mut cell: Vec<String> = Vec::new();
    let mut row: Vec<String> = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"t" => in_text = true,
                b"tbl" => table_depth += 1,
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"tab" => paragraph.push('\t'),
                b"br" | b"cr" => paragraph.push('\n'),
                _ => {}
            },
            Ok(Event::Text(text)) if in_text => {
                let text = text.unescape().map_err(|e| ReaderError::Docx(e.to_string()))?;
                paragraph.push_str(&text);
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => {
                    let text = std::mem::take(&mut paragraph);
                    if table_depth > 0 {
                        if !text.trim().is_empty() {
                            cell.push(text.trim().to_string());
                        }
                    } else {
                        lines.push(text);
                    }
                }
                b"tc" => row.push(std::mem::take(&mut cell).join(" ")),
                b"tr" => {
                    let cells = std::mem::take(&mut row);
                    if cells.iter().any(|c| !c.is_empty()) {
                        lines.push(cells.join(" | "));
                    }
                }
                b"tbl" => table_depth = table_depth.saturating_sub(1),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(ReaderError::Docx(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    Ok(lines.join("\n"))
}
