//! Packaging several rendered artifacts into one archive

use crate::error::WriterError;
use crate::matrix::OutputFormat;
use crate::ooxml::write_zip;
use nexus_domain::TestCase;

/// A named file ready to be written or archived
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// File name, including extension
    pub name: String,
    /// File content
    pub bytes: Vec<u8>,
}

impl Artifact {
    /// Render the records in one format as `<base_name>.<ext>`
    pub fn render(base_name: &str, format: OutputFormat, records: &[TestCase]) -> Result<Self, WriterError> {
        Ok(Self {
            name: format!("{}.{}", base_name, format.extension()),
            bytes: format.render(records)?,
        })
    }
}

/// Render every requested format
pub fn render_all(
    base_name: &str,
    formats: &[OutputFormat],
    records: &[TestCase],
) -> Result<Vec<Artifact>, WriterError> {
    formats
        .iter()
        .map(|&format| Artifact::render(base_name, format, records))
        .collect()
}

/// Zip archive named `<base_name>.zip` holding the given artifacts
pub fn bundle(base_name: &str, artifacts: &[Artifact]) -> Result<Artifact, WriterError> {
    let bytes = write_zip(
        artifacts
            .iter()
            .map(|artifact| (artifact.name.as_str(), artifact.bytes.as_slice())),
    )?;
    Ok(Artifact {
        name: format!("{}.zip", base_name),
        bytes,
    })
}
