//! Stories command implementation.

use super::matrix::write_artifacts;
use crate::cli::StoryArgs;
use crate::error::Result;
use crate::output::Formatter;
use nexus_domain::traits::LlmProvider;
use nexus_domain::StoryType;
use nexus_extractor::{QaGenerator, StoryRequest, StoryResult};
use nexus_formats::{read_document, stories_to_docx, stories_to_text, Artifact, DEFAULT_TITLE};
use nexus_llm::LlmError;
use std::path::PathBuf;

/// Execute the stories command.
pub async fn execute_stories<L>(
    args: StoryArgs,
    generator: &QaGenerator<L>,
    formatter: &Formatter,
) -> Result<()>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: Into<LlmError>,
{
    let (result, files) = run_stories(args, generator).await?;
    println!("{}", formatter.format_stories(&result, &files)?);
    Ok(())
}

/// Read the document, generate the stories and write them out.
pub async fn run_stories<L>(
    args: StoryArgs,
    generator: &QaGenerator<L>,
) -> Result<(StoryResult, Vec<PathBuf>)>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: Into<LlmError>,
{
    let text = read_document(&args.file)?;
    let story_type = StoryType::parse_or_default(&args.story_type);

    let request = StoryRequest {
        text,
        role: args.role,
        story_type,
        business_context: args.business_context,
    };
    let result = generator.try_generate_user_stories(request).await?;

    let base_name = args
        .name
        .unwrap_or_else(|| format!("{}_stories", super::file_stem(&args.file)));
    let artifact = if args.docx {
        let title = match story_type {
            StoryType::UserStory => DEFAULT_TITLE,
            StoryType::Feature => "Historias No Funcionales Generadas",
        };
        Artifact {
            name: format!("{}.docx", base_name),
            bytes: stories_to_docx(title, &result.stories)?,
        }
    } else {
        Artifact {
            name: format!("{}.txt", base_name),
            bytes: stories_to_text(&result.stories).into_bytes(),
        }
    };

    let files = write_artifacts(&args.out, &[artifact])?;
    Ok((result, files))
}
