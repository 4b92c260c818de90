//! User-story writers: plain text and word document

use crate::error::WriterError;
use crate::ooxml::{write_zip, xml_text};

/// Line written between consecutive stories
pub fn separator() -> String {
    "─".repeat(50)
}

/// Document title for a set of stories
pub const DEFAULT_TITLE: &str = "Historias de Usuario Generadas";

/// Stories as plain text, separated by a rule line
pub fn stories_to_text(stories: &[String]) -> String {
    let rule = format!("\n\n{}\n\n", separator());
    let mut out = stories
        .iter()
        .map(|story| story.trim())
        .collect::<Vec<_>>()
        .join(&rule);
    out.push('\n');
    out
}

const DOCX_CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
</Types>"#;

const DOCX_ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#;

/// Stories as a word document.
///
/// The title comes first. A story that already carries a "HISTORIA #" header
/// or box rules is written as is; any other gets a "Historia #n" heading.
/// Each story is followed by a rule line between blank paragraphs.
pub fn stories_to_docx(title: &str, stories: &[String]) -> Result<Vec<u8>, WriterError> {
    let mut body = String::new();
    body.push_str(&heading(title, 32));

    for (i, story) in stories.iter().enumerate() {
        let story = story.trim();
        if !(story.contains("HISTORIA") && story.contains('#')) && !story.contains('═') {
            body.push_str(&heading(&format!("Historia #{}", i + 1), 26));
        }
        body.push_str(&paragraph(story));
        body.push_str(&paragraph(""));
        body.push_str(&paragraph(&separator()));
        body.push_str(&paragraph(""));
    }

    let document = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
         <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
         <w:body>{}</w:body></w:document>",
        body
    );

    write_zip([
        ("[Content_Types].xml", DOCX_CONTENT_TYPES.as_bytes()),
        ("_rels/.rels", DOCX_ROOT_RELS.as_bytes()),
        ("word/document.xml", document.as_bytes()),
    ])
}

/// Bold paragraph; `half_points` is the font size in half points
fn heading(text: &str, half_points: u32) -> String {
    format!(
        "<w:p><w:r><w:rPr><w:b/><w:sz w:val=\"{}\"/></w:rPr><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>",
        half_points,
        xml_text(text)
    )
}

/// One paragraph; line breaks inside `text` become `<w:br/>`
fn paragraph(text: &str) -> String {
    if text.is_empty() {
        return "<w:p/>".to_string();
    }
    let runs = text
        .lines()
        .map(|line| format!("<w:t xml:space=\"preserve\">{}</w:t>", xml_text(line)))
        .collect::<Vec<_>>()
        .join("<w:br/>");
    format!("<w:p><w:r>{}</w:r></w:p>", runs)
}
