//! Nexus Domain Layer
//!
//! Core record model for turning requirement documents into QA artifacts.
//! Only depends on `serde`, because records are exported as JSON, CSV and
//! spreadsheet rows by the outer crates.
//!
//! ## Key Concepts
//!
//! - **Test Case**: one row of a test matrix, with a fixed and ordered field set
//! - **Test Kind**: functional or non-functional
//! - **Category**: enumerated, conditioned on the test kind
//! - **Story Type**: which kind of user stories to generate
//!
//! Trait definitions for the text-generation seam live in [`traits`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod category;
pub mod kind;
pub mod priority;
pub mod story;
pub mod test_case;
pub mod text;
pub mod traits;

// Re-exports for convenience
pub use category::Category;
pub use kind::{KindSelection, KindSet, TestKind};
pub use priority::Priority;
pub use story::StoryType;
pub use test_case::{TestCase, FIELD_NAMES};
