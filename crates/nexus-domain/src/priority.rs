//! Test case priority

use crate::text::fold_key;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Priority of a test case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Priority {
    /// Must run in every cycle
    #[serde(rename = "Alta")]
    High,

    /// Default priority
    #[default]
    #[serde(rename = "Media")]
    Medium,

    /// Run when time allows
    #[serde(rename = "Baja")]
    Low,
}

impl Priority {
    /// Label used in prompts and exports
    pub fn label(&self) -> &'static str {
        match self {
            Priority::High => "Alta",
            Priority::Medium => "Media",
            Priority::Low => "Baja",
        }
    }

    /// Parse a priority from Spanish or English text
    pub fn parse(s: &str) -> Option<Self> {
        match fold_key(s).as_str() {
            "alta" | "high" | "critica" | "critical" | "urgente" => Some(Priority::High),
            "media" | "medium" | "normal" | "moderada" => Some(Priority::Medium),
            "baja" | "low" | "menor" => Some(Priority::Low),
            _ => None,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
