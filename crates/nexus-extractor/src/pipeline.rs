//! Test-matrix and user-story pipelines

use crate::chunking::Segmenter;
use crate::config::{PipelineConfig, SegmentMode};
use crate::error::ExtractorError;
use crate::fields::RawRecord;
use crate::normalize::{Normalizer, TaggedRecord};
use crate::parser::extract_records;
use crate::prompt::{PromptBuilder, StoryPromptBuilder};
use crate::stories::{parse_functionalities, renumber, split_stories};
use crate::types::{
    Fragment, FragmentFailure, MatrixCounts, MatrixRequest, MatrixResponse, MatrixResult,
    StoryRequest, StoryResponse, StoryResult,
};
use nexus_domain::traits::LlmProvider;
use nexus_llm::LlmError;
use regex::Regex;
use std::sync::Arc;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Generates test matrices and user stories from document text
///
/// Fragments are processed one at a time. A fragment whose call or
/// extraction fails is logged and skipped; the request only fails when no
/// fragment produced anything.
pub struct QaGenerator<L>
where
    L: LlmProvider,
{
    llm_provider: Arc<L>,
    config: PipelineConfig,
    marker: Regex,
}

impl<L> QaGenerator<L>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: Into<LlmError>,
{
    /// Create a generator, validating the configuration
    pub fn new(llm_provider: L, config: PipelineConfig) -> Result<Self, ExtractorError> {
        config.validate().map_err(ExtractorError::Config)?;
        let marker = config.marker_regex().map_err(ExtractorError::Config)?;

        Ok(Self {
            llm_provider: Arc::new(llm_provider),
            config,
            marker,
        })
    }

    /// Active configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Name of the underlying model
    pub fn model_name(&self) -> String {
        self.llm_provider.model_name().to_string()
    }

    /// Generate a test matrix. Never fails: errors become an error response.
    pub async fn generate_test_matrix(&self, request: MatrixRequest) -> MatrixResponse {
        self.try_generate_test_matrix(request).await.into()
    }

    /// Generate user stories. Never fails: errors become an error response.
    pub async fn generate_user_stories(&self, request: StoryRequest) -> StoryResponse {
        self.try_generate_user_stories(request).await.into()
    }

    /// Generate a test matrix, keeping per-fragment failures for inspection
    pub async fn try_generate_test_matrix(
        &self,
        request: MatrixRequest,
    ) -> Result<MatrixResult, ExtractorError> {
        let kinds = request.kinds;
        if kinds.is_empty() {
            info!("No test kinds requested, nothing to generate");
            return Ok(MatrixResult {
                records: Vec::new(),
                counts: MatrixCounts::default(),
                failures: Vec::new(),
                model_name: self.model_name(),
            });
        }

        self.validate_text(&request.text)?;

        let leading_label = request
            .story_hint
            .as_deref()
            .map(str::trim)
            .filter(|hint| !hint.is_empty())
            .unwrap_or(self.config.default_story_label.as_str())
            .to_string();
        let fragments = Segmenter::new(
            SegmentMode::MarkerBounded,
            self.config.matrix_fragment_size,
            leading_label,
        )
        .with_marker(self.marker.clone())
        .segment(&request.text);
        let total = fragments.len();
        let role = self.role(request.role.as_deref());

        info!(
            "Starting matrix generation: {} chars, {} fragment(s), kinds {:?}",
            request.text.chars().count(),
            total,
            kinds.kinds()
        );

        let mut raw = Vec::new();
        let mut failures = Vec::new();

        for fragment in fragments.iter().filter(|f| !f.is_blank()) {
            let Some(prompt) = PromptBuilder::new(fragment, kinds)
                .with_role(role.as_str())
                .with_context(request.context.clone())
                .with_flow(request.flow.clone())
                .with_total(total)
                .build()
            else {
                continue;
            };
            debug!("Prompt length for fragment {}: {} chars", fragment.index + 1, prompt.len());

            match self.generate_records(&prompt).await {
                Ok(records) => {
                    debug!(
                        "Fragment {}/{} ({}) produced {} raw record(s)",
                        fragment.index + 1,
                        total,
                        fragment.label,
                        records.len()
                    );
                    raw.extend(
                        records
                            .into_iter()
                            .map(|record| TaggedRecord::new(record, fragment.label.as_str())),
                    );
                }
                Err(error) => failures.push(skip_fragment(fragment, total, None, error)),
            }
        }

        if raw.is_empty() {
            return Err(terminal_error(total, &failures));
        }

        let records = Normalizer::new(&self.config).normalize(raw, kinds);
        if records.is_empty() {
            return Err(ExtractorError::NoUsableRecords {
                fragments: total,
                detail: format!("no records of the requested kinds {:?}", kinds.kinds()),
            });
        }
        let counts = MatrixCounts::tally(&records, total, failures.len());

        info!(
            "Matrix complete: {} test case(s) ({} functional, {} non-functional), {} of {} fragment(s) failed",
            counts.total, counts.functional, counts.non_functional, counts.failed_fragments, total
        );

        Ok(MatrixResult {
            records,
            counts,
            failures,
            model_name: self.model_name(),
        })
    }

    /// Generate user stories, keeping per-call failures for inspection
    pub async fn try_generate_user_stories(
        &self,
        request: StoryRequest,
    ) -> Result<StoryResult, ExtractorError> {
        self.validate_text(&request.text)?;

        let role = self.role(request.role.as_deref());
        let builder = StoryPromptBuilder::new(role, request.story_type)
            .with_business_context(request.business_context.clone());
        let fragments = Segmenter::new(
            SegmentMode::SizeBounded,
            self.config.story_fragment_size,
            self.config.default_story_label.as_str(),
        )
        .segment(&request.text);
        let total = fragments.len();

        info!(
            "Starting story generation: {} chars, {} fragment(s), type {}",
            request.text.chars().count(),
            total,
            request.story_type.as_str()
        );

        let mut stories = Vec::new();
        let mut failures = Vec::new();

        for fragment in fragments.iter().filter(|f| !f.is_blank()) {
            if fragment.char_len() > self.config.story_direct_limit {
                self.two_phase_stories(fragment, total, &builder, &mut stories, &mut failures)
                    .await;
            } else {
                let prompt = builder.direct(&fragment.text);
                match self.generate_stories(&prompt).await {
                    Ok(blocks) => stories.extend(blocks),
                    Err(error) => failures.push(skip_fragment(fragment, total, None, error)),
                }
            }
        }

        if stories.is_empty() {
            return Err(terminal_error(total, &failures));
        }

        let stories = renumber(stories, 1);
        info!(
            "Story generation complete: {} story(ies), {} call(s) failed",
            stories.len(),
            failures.len()
        );

        Ok(StoryResult {
            stories,
            failures,
            model_name: self.model_name(),
        })
    }

    /// Analysis call listing the functionalities, then one call per batch
    async fn two_phase_stories(
        &self,
        fragment: &Fragment,
        total: usize,
        builder: &StoryPromptBuilder,
        stories: &mut Vec<String>,
        failures: &mut Vec<FragmentFailure>,
    ) {
        info!(
            "Fragment {}/{} has {} chars, listing functionalities first",
            fragment.index + 1,
            total,
            fragment.char_len()
        );

        let analysis = match self.call_llm(&builder.analysis(&fragment.text)).await {
            Ok(analysis) => analysis,
            Err(error) => {
                failures.push(skip_fragment(fragment, total, Some("analysis"), error));
                return;
            }
        };

        let functionalities = parse_functionalities(&analysis);
        if functionalities.is_empty() {
            warn!(
                "Analysis of fragment {}/{} listed no functionalities, using a direct prompt",
                fragment.index + 1,
                total
            );
            match self.generate_stories(&builder.direct(&fragment.text)).await {
                Ok(blocks) => stories.extend(blocks),
                Err(error) => failures.push(skip_fragment(fragment, total, None, error)),
            }
            return;
        }

        let batch_size = self.config.story_batch_size;
        let batches = functionalities.len().div_ceil(batch_size);
        info!("Identified {} functionalities, {} batch(es)", functionalities.len(), batches);

        for (batch, slice) in functionalities.chunks(batch_size).enumerate() {
            let prompt = builder.batch(slice, batch * batch_size, &fragment.text);
            match self.generate_stories(&prompt).await {
                Ok(blocks) => stories.extend(blocks),
                Err(error) => {
                    let stage = format!("batch {}/{}", batch + 1, batches);
                    failures.push(skip_fragment(fragment, total, Some(stage.as_str()), error));
                }
            }
        }
    }

    async fn generate_records(&self, prompt: &str) -> Result<Vec<RawRecord>, ExtractorError> {
        let response = self.call_llm(prompt).await?;
        debug!("LLM response length: {} chars", response.len());
        extract_records(&response).ok_or_else(|| ExtractorError::ExtractionFailed(response.chars().count()))
    }

    async fn generate_stories(&self, prompt: &str) -> Result<Vec<String>, ExtractorError> {
        let response = self.call_llm(prompt).await?;
        let blocks = split_stories(&response);
        if blocks.is_empty() {
            return Err(ExtractorError::ExtractionFailed(response.chars().count()));
        }
        Ok(blocks)
    }

    /// One generation call under the configured deadline.
    ///
    /// Providers are blocking, so the call runs on the blocking pool. A call
    /// that misses the deadline is abandoned, not cancelled.
    async fn call_llm(&self, prompt: &str) -> Result<String, ExtractorError> {
        let llm = Arc::clone(&self.llm_provider);
        let prompt = prompt.to_string();
        let limit = self.config.generation_timeout();

        let task = tokio::task::spawn_blocking(move || -> Result<String, LlmError> {
            llm.generate(&prompt).map_err(Into::into)
        });

        match timeout(limit, task).await {
            Err(_) => Err(LlmError::deadline_exceeded(limit).into()),
            Ok(Err(join_error)) => Err(LlmError::Unknown(format!("Task join error: {}", join_error)).into()),
            Ok(Ok(result)) => result.map_err(ExtractorError::from),
        }
    }

    fn validate_text(&self, text: &str) -> Result<(), ExtractorError> {
        let length = text.chars().filter(|c| !c.is_whitespace()).count();
        let min = self.config.min_text_length.max(1);
        if length < min {
            return Err(ExtractorError::EmptyOrTooShortInput { length, min });
        }

        let total = text.chars().count();
        if total > self.config.max_text_length {
            return Err(ExtractorError::TextTooLong(total, self.config.max_text_length));
        }
        Ok(())
    }

    fn role(&self, requested: Option<&str>) -> String {
        requested
            .map(str::trim)
            .filter(|role| !role.is_empty())
            .unwrap_or(self.config.default_role.as_str())
            .to_string()
    }
}

/// Log a per-fragment failure and turn it into a record of the failure
fn skip_fragment(
    fragment: &Fragment,
    total: usize,
    stage: Option<&str>,
    error: ExtractorError,
) -> FragmentFailure {
    let label = match stage {
        Some(stage) => format!("{} ({})", fragment.label, stage),
        None => fragment.label.clone(),
    };
    warn!(
        fragment = fragment.index + 1,
        total,
        story = %label,
        "Skipping fragment: {}",
        error
    );
    FragmentFailure {
        index: fragment.index,
        total,
        label,
        error,
    }
}

/// Error for a request in which no fragment produced anything
fn terminal_error(fragments: usize, failures: &[FragmentFailure]) -> ExtractorError {
    let all_blocked = !failures.is_empty()
        && failures
            .iter()
            .all(|f| matches!(f.error, ExtractorError::Generation(LlmError::SafetyBlocked(_))));
    if all_blocked {
        return ExtractorError::SafetyBlocked;
    }

    let detail = failures
        .last()
        .map(|f| f.error.to_string())
        .unwrap_or_else(|| "the model returned no results".to_string());
    ExtractorError::NoUsableRecords { fragments, detail }
}
