//! Shared helpers for zip packages and XML text

use crate::error::WriterError;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Write named entries into an in-memory zip archive, in order
pub(crate) fn write_zip<'a, I>(entries: I) -> Result<Vec<u8>, WriterError>
where
    I: IntoIterator<Item = (&'a str, &'a [u8])>,
{
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, bytes) in entries {
        writer.start_file(name, options)?;
        writer.write_all(bytes)?;
    }

    Ok(writer.finish()?.into_inner())
}

/// Escape text for element content, dropping characters XML 1.0 forbids
pub(crate) fn xml_text(text: &str) -> String {
    let allowed: String = text
        .chars()
        .filter(|&c| matches!(c, '\t' | '\n' | '\r') || c >= ' ')
        .collect();
    quick_xml::escape::escape(allowed.as_str()).into_owned()
}

/// Spreadsheet column name for a 0-based index ("A", ..., "Z", "AA", ...)
pub(crate) fn column_name(mut index: usize) -> String {
    let mut name = Vec::new();
    loop {
        name.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    name.reverse();
    String::from_utf8_lossy(&name).into_owned()
}
