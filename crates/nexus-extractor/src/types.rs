//! Request and response types for the pipelines

use crate::error::ExtractorError;
use nexus_domain::{KindSet, StoryType, TestCase, TestKind};
use serde::Serialize;

/// A bounded slice of a document, sent as one prompt's payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    /// 0-based position in the document
    pub index: usize,

    /// Fragment text
    pub text: String,

    /// Marker label of the story the fragment belongs to
    pub label: String,
}

impl Fragment {
    /// Length in characters
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Whether the fragment has nothing to process
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Request to generate a test matrix
#[derive(Debug, Clone, Default)]
pub struct MatrixRequest {
    /// Extracted document text
    pub text: String,

    /// Kinds of tests to generate
    pub kinds: KindSet,

    /// System or business context
    pub context: Option<String>,

    /// Flow under test
    pub flow: Option<String>,

    /// Story label for text that precedes any marker
    pub story_hint: Option<String>,

    /// Target role (configured default when absent)
    pub role: Option<String>,
}

/// Request to generate user stories
#[derive(Debug, Clone, Default)]
pub struct StoryRequest {
    /// Extracted document text
    pub text: String,

    /// Role the stories are written for (configured default when absent)
    pub role: Option<String>,

    /// Kind of stories
    pub story_type: StoryType,

    /// Business context
    pub business_context: Option<String>,
}

/// Counts reported with a generated matrix
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MatrixCounts {
    /// Final number of test cases
    pub total: usize,

    /// Functional test cases
    pub functional: usize,

    /// Non-functional test cases
    pub non_functional: usize,

    /// Fragments the document was split into
    pub fragments: usize,

    /// Fragments whose generation or extraction failed
    pub failed_fragments: usize,
}

impl MatrixCounts {
    /// Count the kinds in a record collection
    pub fn tally(records: &[TestCase], fragments: usize, failed_fragments: usize) -> Self {
        let functional = records
            .iter()
            .filter(|r| r.kind == TestKind::Functional)
            .count();
        Self {
            total: records.len(),
            functional,
            non_functional: records.len() - functional,
            fragments,
            failed_fragments,
        }
    }
}

/// A fragment that produced nothing, and why
#[derive(Debug)]
pub struct FragmentFailure {
    /// 0-based fragment index
    pub index: usize,

    /// Total fragments in the request
    pub total: usize,

    /// Story label of the fragment
    pub label: String,

    /// What went wrong
    pub error: ExtractorError,
}

/// Result of a successful matrix generation
#[derive(Debug)]
pub struct MatrixResult {
    /// Normalized, deduplicated test cases with sequential ids
    pub records: Vec<TestCase>,

    /// Counts
    pub counts: MatrixCounts,

    /// Fragments that failed and were skipped
    pub failures: Vec<FragmentFailure>,

    /// Model that produced the records
    pub model_name: String,
}

/// Result of a successful story generation
#[derive(Debug)]
pub struct StoryResult {
    /// Story blocks with sequential markers
    pub stories: Vec<String>,

    /// Generation calls that failed and were skipped
    pub failures: Vec<FragmentFailure>,

    /// Model that produced the stories
    pub model_name: String,
}

/// Outcome of `generate_test_matrix`, as exposed to callers
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum MatrixResponse {
    /// Records were produced
    Success {
        /// Final test cases
        records: Vec<TestCase>,
        /// Counts
        counts: MatrixCounts,
    },
    /// The request failed as a whole
    Error {
        /// Human-readable reason
        message: String,
    },
}

/// Outcome of `generate_user_stories`, as exposed to callers
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum StoryResponse {
    /// Stories were produced
    Success {
        /// Story blocks
        stories: Vec<String>,
    },
    /// The request failed as a whole
    Error {
        /// Human-readable reason
        message: String,
    },
}

impl From<Result<MatrixResult, ExtractorError>> for MatrixResponse {
    fn from(result: Result<MatrixResult, ExtractorError>) -> Self {
        match result {
            Ok(result) => MatrixResponse::Success {
                records: result.records,
                counts: result.counts,
            },
            Err(e) => MatrixResponse::Error {
                message: e.to_string(),
            },
        }
    }
}

impl From<Result<StoryResult, ExtractorError>> for StoryResponse {
    fn from(result: Result<StoryResult, ExtractorError>) -> Self {
        match result {
            Ok(result) => StoryResponse::Success {
                stories: result.stories,
            },
            Err(e) => StoryResponse::Error {
                message: e.to_string(),
            },
        }
    }
}
