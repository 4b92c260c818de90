//! Story types for user-story generation

use crate::text::fold_key;
use serde::{Deserialize, Serialize};

/// Kind of user stories to generate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StoryType {
    /// Functional user stories (role / want / benefit with scenarios)
    #[default]
    UserStory,

    /// Non-functional stories (requirement / metrics / quality category)
    Feature,
}

impl StoryType {
    /// Machine name
    pub fn as_str(&self) -> &'static str {
        match self {
            StoryType::UserStory => "user-story",
            StoryType::Feature => "feature",
        }
    }

    /// Parse a story type; anything unrecognised is a functional user story
    pub fn parse_or_default(s: &str) -> Self {
        match fold_key(s).as_str() {
            "caracteristica" | "feature" | "no funcional" | "non functional" => StoryType::Feature,
            _ => StoryType::UserStory,
        }
    }
}
