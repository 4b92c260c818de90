//! Nexus CLI - QA test matrices and user stories from requirement documents.

use clap::Parser;
use nexus_cli::commands;
use nexus_cli::{Cli, Command, Config, Formatter};
use nexus_extractor::QaGenerator;
use nexus_llm::GeminiProvider;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> nexus_cli::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = Config::resolve_path(cli.config.as_deref())?;
    let mut config = Config::load_from(&config_path)?;
    if let Some(preset) = cli.preset {
        config.pipeline = preset.apply(config.pipeline);
    }

    // Determine output format
    let format = cli.format.map(Into::into).unwrap_or(config.settings.format);
    let color_enabled = !cli.no_color && config.settings.color;
    let formatter = Formatter::new(format, color_enabled);

    match cli.command {
        Command::Config(args) => commands::execute_config(args, &config_path, &config, &formatter),
        command => {
            // The provider's HTTP client is blocking: build it, and let it
            // drop, outside the async runtime.
            let api_key = config.provider.resolve_api_key(cli.api_key.as_deref())?;
            let provider = GeminiProvider::with_timeout(
                api_key,
                config.provider.model.as_str(),
                Duration::from_secs(config.provider.request_timeout_secs),
            )?
            .with_endpoint(config.provider.endpoint.as_str())
            .with_max_retries(config.provider.max_retries);
            let generator = QaGenerator::new(provider, config.pipeline.clone())?;

            let runtime = tokio::runtime::Runtime::new()?;
            match command {
                Command::Matrix(args) => runtime.block_on(commands::execute_matrix(
                    args,
                    &generator,
                    &config,
                    &formatter,
                )),
                Command::Stories(args) => {
                    runtime.block_on(commands::execute_stories(args, &generator, &formatter))
                }
                Command::Config(_) => unreachable!(),
            }
        }
    }
}

/// Log to stderr; RUST_LOG wins over the verbosity flag
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}
