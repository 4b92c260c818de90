//! Command implementations.

pub mod config;
pub mod matrix;
pub mod stories;

pub use self::config::execute_config;
pub use self::matrix::execute_matrix;
pub use self::stories::execute_stories;

use std::path::Path;

/// File name without directory or extension, for output names
fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("document")
        .to_string()
}
