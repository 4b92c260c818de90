//! Configuration for the generation pipelines

use nexus_domain::KindSet;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How a document is cut into fragments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SegmentMode {
    /// Pack sentences greedily up to the size bound
    #[default]
    SizeBounded,
    /// Start a new group at every story marker line, then pack lines
    MarkerBounded,
}

/// Values substituted for missing or empty test-case fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordDefaults {
    /// Title when the model gives none
    pub title: String,
    /// Description when the model gives none
    pub description: String,
    /// Preconditions when the model gives none
    pub preconditions: String,
    /// Test level
    pub level: String,
    /// Execution kind
    pub execution: String,
    /// Target environment
    pub environment: String,
    /// Test cycle
    pub cycle: String,
    /// Tracker issue type
    pub issue_type: String,
    /// Single step used when no step survives coercion
    pub step_placeholder: String,
    /// Single expected result used when none survives coercion
    pub result_placeholder: String,
}

impl Default for RecordDefaults {
    fn default() -> Self {
        Self {
            title: "Caso de prueba sin título".to_string(),
            description: "Sin descripción".to_string(),
            preconditions: "Ninguna".to_string(),
            level: "UAT".to_string(),
            execution: "Manual".to_string(),
            environment: "QA".to_string(),
            cycle: "Ciclo 1".to_string(),
            issue_type: "Test Case".to_string(),
            step_placeholder: "Paso por definir".to_string(),
            result_placeholder: "Resultado por definir".to_string(),
        }
    }
}

/// Configuration for the pipelines
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Maximum input text length (characters)
    pub max_text_length: usize,

    /// Minimum non-whitespace input length (characters)
    pub min_text_length: usize,

    /// Maximum time for a single generation call (seconds)
    pub generation_timeout_secs: u64,

    /// Fragment size bound for the test-matrix pipeline (characters)
    pub matrix_fragment_size: usize,

    /// Fragment size bound for the user-story pipeline (characters)
    pub story_fragment_size: usize,

    /// Story fragments longer than this go through the two-phase flow
    pub story_direct_limit: usize,

    /// Functionalities per story batch in the two-phase flow
    pub story_batch_size: usize,

    /// Fingerprint similarity at or above which two test cases are duplicates
    pub similarity_threshold: f64,

    /// Regular expression recognising story marker lines
    pub marker_pattern: String,

    /// Role used when the caller gives none
    pub default_role: String,

    /// Label for fragments that precede any marker
    pub default_story_label: String,

    /// Kinds requested when the caller gives none
    pub default_kinds: KindSet,

    /// Test-case field defaults
    pub defaults: RecordDefaults,
}

/// Default marker: "STORY #3:" or "HISTORIA #3:" at the start of a line
pub const DEFAULT_MARKER_PATTERN: &str = r"(?i)^\s*(?:STORY|HISTORIA)\s*#\s*\d+\s*:";

impl PipelineConfig {
    /// Get the generation timeout as a Duration
    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }

    /// Compile the marker pattern
    pub fn marker_regex(&self) -> Result<Regex, String> {
        Regex::new(&self.marker_pattern)
            .map_err(|e| format!("invalid marker_pattern: {}", e))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_text_length == 0 {
            return Err("max_text_length must be greater than 0".to_string());
        }
        if self.min_text_length > self.max_text_length {
            return Err("min_text_length cannot exceed max_text_length".to_string());
        }
        if self.matrix_fragment_size == 0 || self.story_fragment_size == 0 {
            return Err("fragment sizes must be greater than 0".to_string());
        }
        if self.matrix_fragment_size > self.max_text_length {
            return Err("matrix_fragment_size cannot exceed max_text_length".to_string());
        }
        if self.story_direct_limit < self.story_fragment_size {
            return Err("story_direct_limit cannot be below story_fragment_size".to_string());
        }
        if self.story_batch_size == 0 {
            return Err("story_batch_size must be greater than 0".to_string());
        }
        if self.generation_timeout_secs == 0 {
            return Err("generation_timeout_secs must be greater than 0".to_string());
        }
        if !(self.similarity_threshold > 0.0 && self.similarity_threshold <= 1.0) {
            return Err(format!(
                "similarity_threshold {} out of range (0.0, 1.0]",
                self.similarity_threshold
            ));
        }
        if self.default_role.trim().is_empty() {
            return Err("default_role cannot be empty".to_string());
        }
        if self.default_story_label.trim().is_empty() {
            return Err("default_story_label cannot be empty".to_string());
        }
        self.marker_regex()?;
        Ok(())
    }
}

impl Default for PipelineConfig {
    /// Default configuration with balanced settings
    fn default() -> Self {
        Self {
            max_text_length: 200_000,
            min_text_length: 20,
            generation_timeout_secs: 120,
            matrix_fragment_size: 4_000,
            story_fragment_size: 3_000,
            story_direct_limit: 5_000,
            story_batch_size: 5,
            similarity_threshold: 0.85,
            marker_pattern: DEFAULT_MARKER_PATTERN.to_string(),
            default_role: "Usuario".to_string(),
            default_story_label: "general story".to_string(),
            default_kinds: KindSet::both(),
            defaults: RecordDefaults::default(),
        }
    }
}

impl PipelineConfig {
    /// Aggressive preset: shorter timeouts, smaller fragments, looser dedup
    pub fn aggressive() -> Self {
        Self {
            generation_timeout_secs: 60,
            matrix_fragment_size: 2_000,
            story_fragment_size: 2_000,
            story_direct_limit: 3_000,
            similarity_threshold: 0.80,
            ..Self::default()
        }
    }

    /// Lenient preset: longer timeouts, larger fragments, stricter dedup
    pub fn lenient() -> Self {
        Self {
            max_text_length: 500_000,
            generation_timeout_secs: 300,
            matrix_fragment_size: 8_000,
            story_fragment_size: 5_000,
            story_direct_limit: 8_000,
            similarity_threshold: 0.92,
            ..Self::default()
        }
    }

    /// Take the size, timeout and threshold values of `preset`, keeping
    /// this config's role, labels, kinds, marker and record defaults
    pub fn with_tuning_of(self, preset: Self) -> Self {
        Self {
            max_text_length: preset.max_text_length,
            generation_timeout_secs: preset.generation_timeout_secs,
            matrix_fragment_size: preset.matrix_fragment_size,
            story_fragment_size: preset.story_fragment_size,
            story_direct_limit: preset.story_direct_limit,
            story_batch_size: preset.story_batch_size,
            similarity_threshold: preset.similarity_threshold,
            ..self
        }
    }
}
