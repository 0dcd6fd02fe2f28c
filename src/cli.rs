//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation.

use crate::llm::ResponseFormat;
use crate::models::DistrictOrder;
use clap::Parser;
use std::path::PathBuf;

/// District Digest - LLM-powered analysis of school improvement action steps
///
/// Reads a UIP action-step table, analyzes each district with a local
/// model, and synthesizes one cross-district report.
///
/// Examples:
///   district-digest --input ActionSteps.csv
///   district-digest -i ActionSteps.csv -o report.txt --model llama3.2:latest
///   district-digest -i ActionSteps.csv --district-order alphabetical
///   district-digest -i ActionSteps.csv --dry-run
///   district-digest --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Action-step CSV file to analyze
    ///
    /// Defaults to the config file value, or ActionSteps.csv.
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Output file for the synthesized report
    ///
    /// The file holds the model's prose verbatim, whatever its extension.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Ollama model to use for analysis
    #[arg(short, long, env = "DISTRICT_DIGEST_MODEL")]
    pub model: Option<String>,

    /// Ollama API endpoint URL
    #[arg(long, env = "OLLAMA_URL")]
    pub ollama_url: Option<String>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .district-digest.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Request timeout in seconds for each model call
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Order in which districts are analyzed
    #[arg(long, value_name = "ORDER")]
    pub district_order: Option<DistrictOrder>,

    /// Output format requested from the model (text, json)
    #[arg(long, value_name = "FORMAT")]
    pub response_format: Option<ResponseFormat>,

    /// Also write a JSON run summary to this file
    #[arg(long, value_name = "FILE")]
    pub summary_json: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Do not print the final report to stdout
    #[arg(long)]
    pub no_echo: bool,

    /// Dry run: load and group the table without calling the model
    ///
    /// Shows which districts would be analyzed and exits.
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .district-digest.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if let Some(ref url) = self.ollama_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Ollama URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Some(ref input) = self.input {
            if input.is_dir() {
                return Err(format!("Input path is a directory: {}", input.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `config_verbose` is `general.verbose` from the config file. `--quiet`
    /// overrides both.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Whether the final report should be echoed to stdout.
    pub fn echo_report(&self) -> bool {
        !self.no_echo && !self.quiet
    }
}
