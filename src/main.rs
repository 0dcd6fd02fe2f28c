//! District Digest - LLM-powered analysis of school improvement plans
//!
//! A CLI tool that groups UIP action steps by district, asks a local
//! Ollama model to analyze each district, and synthesizes the district
//! analyses into one cross-district report.
//!
//! Exit codes:
//!   0 - Success (individual districts may have been skipped)
//!   1 - Runtime error (bad input table, config, synthesis failure, etc.)
//!   2 - Report synthesized but could not be written to the output file

mod analysis;
mod cli;
mod config;
mod error;
mod llm;
mod models;
mod pipeline;
mod report;
mod source;

use anyhow::{Context, Result};
use cli::Args;
use config::{Config, CONFIG_FILE_NAME};
use llm::{GenerationParams, OllamaClient, OllamaConfig};
use pipeline::{Pipeline, PipelineOptions, PipelineOutcome};
use report::ReportPublisher;
use source::RecordStore;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Number of action steps shown per district in a dry run.
const DRY_RUN_PREVIEW: usize = 3;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Config is read before logging so `general.verbose` can set the level
    let (mut config, config_source) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    init_logging(&args, &config);

    info!("District Digest v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    config_source.log();

    match run(args, config).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .district-digest.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to customize the input table, model, and output path.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// `RUST_LOG` takes precedence when set. Logs go to stderr so the report
/// echoed on stdout stays clean.
fn init_logging(args: &Args, config: &Config) {
    let level = args.log_level(config.general.verbose);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Warning: failed to set tracing subscriber: {}", e);
    }
}

/// Run the complete analysis workflow. Returns the exit code.
async fn run(args: Args, config: Config) -> Result<i32> {
    let input = PathBuf::from(&config.general.input);

    if args.dry_run {
        return handle_dry_run(&input, &config);
    }

    let generator = OllamaClient::new(OllamaConfig {
        ollama_url: config.model.ollama_url.clone(),
        model_name: config.model.name.clone(),
        timeout_seconds: config.model.timeout_seconds,
    })?;

    if !args.quiet {
        println!("🤖 Analyzing action steps");
        println!("   Input: {}", input.display());
        println!("   Model: {}", config.model.name);
        println!("   Ollama: {}", config.model.ollama_url);
        println!("   District order: {}", config.general.district_order);
        println!("   Timeout: {}s per call\n", config.model.timeout_seconds);
    }

    let options = PipelineOptions {
        district_order: config.general.district_order,
        params: GenerationParams::deterministic(config.general.response_format),
        show_progress: !args.quiet,
    };
    let publisher = ReportPublisher::new(&config.general.output);
    let mut pipeline = Pipeline::new(&generator, publisher, options);

    let outcome = pipeline.run(&input).await?;
    debug!("Final pipeline stage: {:?}", pipeline.stages().last());

    let stdout = std::io::stdout();
    report_outcome(&args, &config.general.output, &outcome, &mut stdout.lock())
}

/// Print the report and run summary for a finished pipeline. Returns the exit code.
///
/// An unpublished report is printed before anything else can fail. A run
/// summary that cannot be written is logged and does not change the exit code.
fn report_outcome<W: Write>(
    args: &Args,
    output: &str,
    outcome: &PipelineOutcome,
    out: &mut W,
) -> Result<i32> {
    if args.echo_report() {
        writeln!(out, "\n{}\n", outcome.report.text)?;
    }

    let exit_code = match outcome.publish_error {
        Some(ref e) => {
            eprintln!("\n⛔ {}", e);
            if !args.echo_report() {
                // The report exists nowhere else, so print it regardless.
                writeln!(out, "{}", outcome.report.text)?;
            }
            2
        }
        None => 0,
    };

    if !args.quiet {
        writeln!(out, "📊 Run Summary:")?;
        writeln!(out, "{}", report::generate_summary_text(&outcome.summary))?;
    }

    if let Some(ref summary_path) = args.summary_json {
        match report::write_summary_json(&outcome.summary, summary_path) {
            Ok(()) => info!("Wrote run summary to {}", summary_path.display()),
            Err(e) => warn!("{:#}", e),
        }
    }

    if exit_code == 0 && !args.quiet {
        writeln!(out, "\n✅ Analysis complete! Report saved to: {}", output)?;
    }

    Ok(exit_code)
}

/// Handle --dry-run: load and group the table, print what would be analyzed, exit.
fn handle_dry_run(input: &Path, config: &Config) -> Result<i32> {
    println!("\n🔍 Dry run: grouping action steps (no model calls)...\n");

    let store = RecordStore::load(input)?;
    let groups = analysis::partition_by_district(store.records(), config.general.district_order);

    println!("   Loaded {} action steps", store.len());

    if store.is_empty() {
        println!("   No districts found.");
    } else {
        println!("   Found {} districts that would be analyzed:\n", groups.len());
        for group in &groups {
            println!("     🏫 {} ({} action steps)", group.district, group.len());
            for record in group.records.iter().take(DRY_RUN_PREVIEW) {
                println!("        - {}", record.step);
            }
            if group.len() > DRY_RUN_PREVIEW {
                println!("        ... and {} more", group.len() - DRY_RUN_PREVIEW);
            }
        }
        println!(
            "\n   Total: {} districts, {} model calls",
            groups.len(),
            groups.len() + 1
        );
    }

    println!("\n✅ Dry run complete. No model calls were made.");
    Ok(0)
}

/// Where the effective configuration came from.
#[derive(Debug)]
enum ConfigSource {
    Explicit(PathBuf),
    DefaultFile,
    BuiltIn,
    /// The default file exists but could not be read.
    Fallback(String),
}

impl ConfigSource {
    /// Logs the source. Called once logging is up.
    fn log(&self) {
        match self {
            ConfigSource::Explicit(path) => info!("Loaded config from: {}", path.display()),
            ConfigSource::DefaultFile => info!("Loaded default config from {}", CONFIG_FILE_NAME),
            ConfigSource::BuiltIn => debug!("No config file found, using defaults"),
            ConfigSource::Fallback(reason) => warn!("Failed to load config: {}", reason),
        }
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<(Config, ConfigSource)> {
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, ConfigSource::Explicit(config_path.clone())));
    }

    match Config::load_default() {
        Ok(Some(config)) => Ok((config, ConfigSource::DefaultFile)),
        Ok(None) => Ok((Config::default(), ConfigSource::BuiltIn)),
        Err(e) => Ok((Config::default(), ConfigSource::Fallback(format!("{:#}", e)))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PublishError;
    use crate::models::{FinalReport, RunSummary};
    use clap::Parser;
    use std::io;
    use tempfile::TempDir;

    fn outcome(publish_error: Option<PublishError>) -> PipelineOutcome {
        PipelineOutcome {
            report: FinalReport {
                text: "Cross-district themes: coaching.".to_string(),
            },
            summary: RunSummary::new(PathBuf::from("ActionSteps.csv"), "llama3.2:latest".to_string()),
            publish_error,
        }
    }

    fn unwritable_report() -> PublishError {
        PublishError {
            path: PathBuf::from("/missing/district_report.txt"),
            source: io::Error::new(io::ErrorKind::NotFound, "no such directory"),
        }
    }

    #[test]
    fn test_unpublished_report_survives_summary_write_failure() {
        let dir = TempDir::new().unwrap();
        let summary_path = dir.path().join("absent").join("summary.json");
        let args = Args::parse_from([
            "district-digest",
            "--no-echo",
            "--summary-json",
            summary_path.to_str().unwrap(),
        ]);

        let mut out = Vec::new();
        let code = report_outcome(&args, "district_report.txt", &outcome(Some(unwritable_report())), &mut out)
            .unwrap();

        assert_eq!(code, 2);
        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("Cross-district themes: coaching."));
        assert!(!summary_path.exists());
    }

    #[test]
    fn test_summary_write_failure_keeps_success_exit_code() {
        let dir = TempDir::new().unwrap();
        let summary_path = dir.path().join("absent").join("summary.json");
        let args = Args::parse_from([
            "district-digest",
            "--quiet",
            "--summary-json",
            summary_path.to_str().unwrap(),
        ]);

        let mut out = Vec::new();
        let code = report_outcome(&args, "district_report.txt", &outcome(None), &mut out).unwrap();

        assert_eq!(code, 0);
        assert!(out.is_empty());
    }

    #[test]
    fn test_published_run_writes_summary_json() {
        let dir = TempDir::new().unwrap();
        let summary_path = dir.path().join("summary.json");
        let args = Args::parse_from([
            "district-digest",
            "--summary-json",
            summary_path.to_str().unwrap(),
        ]);

        let mut out = Vec::new();
        let code = report_outcome(&args, "district_report.txt", &outcome(None), &mut out).unwrap();

        assert_eq!(code, 0);
        assert!(summary_path.exists());
        let printed = String::from_utf8(out).unwrap();
        assert_eq!(printed.matches("Cross-district themes").count(), 1);
        assert!(printed.contains("Report saved to: district_report.txt"));
    }

    #[test]
    fn test_explicit_config_path_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[general]\nverbose = true\n").unwrap();
        let args = Args::parse_from(["district-digest", "--config", path.to_str().unwrap()]);

        let (config, source) = load_config(&args).unwrap();

        assert!(config.general.verbose);
        assert!(matches!(source, ConfigSource::Explicit(ref p) if p == &path));
        assert_eq!(args.log_level(config.general.verbose), tracing::Level::DEBUG);
    }
}
