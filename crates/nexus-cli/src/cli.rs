//! CLI command definitions and argument parsing.

use clap::{Args, Parser, Subcommand};
use nexus_extractor::PipelineConfig;
use std::path::PathBuf;

/// Nexus - Generate QA test matrices and user stories from requirement documents.
#[derive(Debug, Parser)]
#[command(name = "nexus")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path (default: ~/.nexus/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Pipeline tuning preset, overriding the configured sizes and timeouts
    #[arg(long, value_enum, global = true)]
    pub preset: Option<CliPreset>,

    /// API key for the generation service
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (written file paths only)
    Quiet,
}

/// Pipeline tuning presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliPreset {
    /// Smaller fragments, shorter timeouts, looser deduplication
    Aggressive,
    /// Larger fragments, longer timeouts, stricter deduplication
    Lenient,
}

impl CliPreset {
    /// Apply the preset's tuning to a configured pipeline
    pub fn apply(self, pipeline: PipelineConfig) -> PipelineConfig {
        let preset = match self {
            CliPreset::Aggressive => PipelineConfig::aggressive(),
            CliPreset::Lenient => PipelineConfig::lenient(),
        };
        pipeline.with_tuning_of(preset)
    }
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a test-case matrix from a .docx or .pdf document
    Matrix(MatrixArgs),

    /// Generate user stories from a .docx or .pdf document
    Stories(StoryArgs),

    /// Manage the configuration file
    Config(ConfigArgs),
}

/// Arguments for the matrix command.
#[derive(Debug, Args)]
pub struct MatrixArgs {
    /// Requirement document (.docx or .pdf)
    pub file: PathBuf,

    /// Test kinds to generate (e.g. "functional,non-functional")
    #[arg(short, long)]
    pub kinds: Option<String>,

    /// System context passed to the model
    #[arg(long)]
    pub context: Option<String>,

    /// Flow under test
    #[arg(long)]
    pub flow: Option<String>,

    /// Story label for text before any story marker
    #[arg(long)]
    pub story: Option<String>,

    /// Role the test cases are written for
    #[arg(long)]
    pub role: Option<String>,

    /// Output directory
    #[arg(short, long, default_value = ".")]
    pub out: PathBuf,

    /// Output formats (json,csv,xlsx)
    #[arg(long)]
    pub formats: Option<String>,

    /// Package all formats in a single zip archive
    #[arg(long)]
    pub zip: bool,

    /// Base name of the output files (default: <file stem>_test_matrix)
    #[arg(long)]
    pub name: Option<String>,
}

/// Arguments for the stories command.
#[derive(Debug, Args)]
pub struct StoryArgs {
    /// Requirement document (.docx or .pdf)
    pub file: PathBuf,

    /// Role the stories are written for
    #[arg(short, long)]
    pub role: Option<String>,

    /// Story type: "user-story" or "feature"
    #[arg(short = 't', long, default_value = "user-story")]
    pub story_type: String,

    /// Business context passed to the model
    #[arg(long)]
    pub business_context: Option<String>,

    /// Output directory
    #[arg(short, long, default_value = ".")]
    pub out: PathBuf,

    /// Write a .docx document instead of plain text
    #[arg(long)]
    pub docx: bool,

    /// Base name of the output file (default: <file stem>_stories)
    #[arg(long)]
    pub name: Option<String>,
}

/// Arguments for configuration management.
#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Write a configuration file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,

    /// Print the configuration file path
    Path,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}
