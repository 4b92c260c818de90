//! Test-matrix writers: delimited text, JSON and spreadsheet
//!
//! Every writer is total over a well-formed collection. An empty collection
//! still yields a valid file (header only, `[]`, or a header-only sheet).

use crate::error::WriterError;
use crate::ooxml::{column_name, write_zip, xml_text};
use nexus_domain::{TestCase, FIELD_NAMES};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Separator for list-valued fields in tabular formats
pub const LIST_SEPARATOR: &str = " | ";

/// Matrix output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    /// Pretty-printed JSON array, lists kept as arrays
    Json,
    /// Comma-separated values with a header row
    Csv,
    /// Single-sheet spreadsheet workbook
    Xlsx,
}

impl OutputFormat {
    /// All formats, in bundle order
    pub const ALL: [OutputFormat; 3] = [OutputFormat::Json, OutputFormat::Csv, OutputFormat::Xlsx];

    /// File extension, without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Xlsx => "xlsx",
        }
    }

    /// Render records in this format
    pub fn render(&self, records: &[TestCase]) -> Result<Vec<u8>, WriterError> {
        match self {
            OutputFormat::Json => to_json(records),
            OutputFormat::Csv => Ok(to_csv(records)),
            OutputFormat::Xlsx => to_xlsx(records),
        }
    }

    /// Parse a comma-separated list such as "json,csv"
    pub fn parse_list(s: &str) -> Result<Vec<Self>, WriterError> {
        let mut formats = Vec::new();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let format = part.parse()?;
            if !formats.contains(&format) {
                formats.push(format);
            }
        }
        Ok(formats)
    }
}

impl FromStr for OutputFormat {
    type Err = WriterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            "xlsx" | "excel" => Ok(OutputFormat::Xlsx),
            other => Err(WriterError::UnknownFormat(other.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// CSV with a header row; lists joined with [`LIST_SEPARATOR`]
pub fn to_csv(records: &[TestCase]) -> Vec<u8> {
    let mut out = String::new();
    push_csv_row(&mut out, FIELD_NAMES.iter().copied());
    for record in records {
        let row = record.to_row(LIST_SEPARATOR);
        push_csv_row(&mut out, row.iter().map(String::as_str));
    }
    out.into_bytes()
}

fn push_csv_row<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>) {
    let cells: Vec<String> = cells.map(csv_cell).collect();
    out.push_str(&cells.join(","));
    out.push_str("\r\n");
}

/// Quote a cell when it holds a comma, quote or line break
fn csv_cell(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// JSON array, four-space indented, non-ASCII kept as is
pub fn to_json(records: &[TestCase]) -> Result<Vec<u8>, WriterError> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    records.serialize(&mut serializer)?;
    out.push(b'\n');
    Ok(out)
}

const XLSX_CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
<Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>
</Types>"#;

const XLSX_ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#;

const XLSX_WORKBOOK: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<sheets><sheet name="Matriz" sheetId="1" r:id="rId1"/></sheets>
</workbook>"#;

const XLSX_WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
</Relationships>"#;

/// Single-sheet workbook with a header row and one row per record.
///
/// Cells are inline strings, so no shared-string table is needed.
pub fn to_xlsx(records: &[TestCase]) -> Result<Vec<u8>, WriterError> {
    let sheet = worksheet_xml(records);
    write_zip([
        ("[Content_Types].xml", XLSX_CONTENT_TYPES.as_bytes()),
        ("_rels/.rels", XLSX_ROOT_RELS.as_bytes()),
        ("xl/workbook.xml", XLSX_WORKBOOK.as_bytes()),
        ("xl/_rels/workbook.xml.rels", XLSX_WORKBOOK_RELS.as_bytes()),
        ("xl/worksheets/sheet1.xml", sheet.as_bytes()),
    ])
}

fn worksheet_xml(records: &[TestCase]) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
         <worksheet xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\"><sheetData>",
    );

    let header = FIELD_NAMES.iter().map(|name| name.to_string()).collect::<Vec<_>>();
    push_sheet_row(&mut xml, 1, &header);
    for (i, record) in records.iter().enumerate() {
        push_sheet_row(&mut xml, i + 2, &record.to_row(LIST_SEPARATOR));
    }

    xml.push_str("</sheetData></worksheet>");
    xml
}

fn push_sheet_row(xml: &mut String, number: usize, cells: &[String]) {
    xml.push_str(&format!("<row r=\"{}\">", number));
    for (col, value) in cells.iter().enumerate() {
        xml.push_str(&format!(
            "<c r=\"{}{}\" t=\"inlineStr\"><is><t xml:space=\"preserve\">{}</t></is></c>",
            column_name(col),
            number,
            xml_text(value)
        ));
    }
    xml.push_str("</row>");
}
