//! Nexus Extractor
//!
//! Turns requirement documents into QA artifacts: test-case matrices and
//! user stories, through a text-generation model.
//!
//! # Architecture
//!
//! ```text
//! Text → Segmenter → {Prompt → LLM → Extract} per fragment → Normalizer → Records
//! ```
//!
//! # Key Features
//!
//! - **Segmentation**: size-bounded or story-marker-bounded fragments
//! - **Tolerant Extraction**: fenced blocks, stray prose, trailing commas and
//!   wrapper objects are all recovered
//! - **Normalization**: every field defaulted, lists coerced, kinds filtered
//! - **Deduplication**: fuzzy matching on a title/kind/category fingerprint
//! - **Isolated Failures**: a failed fragment is logged and skipped
//!
//! # Example Usage
//!
//! ```no_run
//! use nexus_extractor::{MatrixRequest, MatrixResponse, PipelineConfig, QaGenerator};
//! use nexus_domain::KindSet;
//! use nexus_llm::MockProvider;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let llm = MockProvider::new("[]");
//! let generator = QaGenerator::new(llm, PipelineConfig::default())?;
//!
//! let request = MatrixRequest {
//!     text: "El usuario inicia sesión con correo y contraseña.".to_string(),
//!     kinds: KindSet::both(),
//!     ..Default::default()
//! };
//!
//! match generator.generate_test_matrix(request).await {
//!     MatrixResponse::Success { records, counts } => {
//!         println!("{} test cases ({} functional)", records.len(), counts.functional);
//!     }
//!     MatrixResponse::Error { message } => eprintln!("{}", message),
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod chunking;
mod config;
mod error;
mod fields;
mod normalize;
mod parser;
mod pipeline;
mod prompt;
mod similarity;
mod stories;
mod types;

#[cfg(test)]
mod tests;

pub use chunking::Segmenter;
pub use config::{PipelineConfig, RecordDefaults, SegmentMode, DEFAULT_MARKER_PATTERN};
pub use error::ExtractorError;
pub use fields::RawRecord;
pub use normalize::{dedupe, fingerprint, Normalizer, TaggedRecord};
pub use parser::extract_records;
pub use pipeline::QaGenerator;
pub use prompt::{PromptBuilder, StoryPromptBuilder};
pub use similarity::ratio as similarity_ratio;
pub use stories::{parse_functionalities, renumber, split_stories};
pub use types::{
    Fragment, FragmentFailure, MatrixCounts, MatrixRequest, MatrixResponse, MatrixResult,
    StoryRequest, StoryResponse, StoryResult,
};
