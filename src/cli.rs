//! Command-line interface argument parsing.
//!
//! Every option that also exists in the configuration file is an `Option`
//! here, so only flags given explicitly override the file.

use crate::report::{DetailLevel, Language, OutputFormat};
use clap::Parser;
use std::path::PathBuf;

/// Portfolio Triage - LLM-assisted risk and priority triage for project portfolios
///
/// Scores every project of a portfolio on urgency, importance, complexity,
/// risk and data quality, flags critical projects and writes a management
/// report. Runs against a local Ollama model.
///
/// Examples:
///   portfolio-triage --portfolio 42 --source-url https://pm.example.com/api/v1
///   portfolio-triage --portfolio 42 --input export.json --language de
///   portfolio-triage --portfolio 42 --input export.json --format json --detail summary
///   portfolio-triage --portfolio 42 --input export.json --dry-run
///   portfolio-triage --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Identifier of the portfolio to analyze
    #[arg(short, long, value_name = "ID", required_unless_present = "init_config")]
    pub portfolio: Option<String>,

    /// Read projects from a JSON export instead of the project API
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Base URL of the project-management API
    #[arg(long, value_name = "URL", env = "PORTFOLIO_SOURCE_URL")]
    pub source_url: Option<String>,

    /// Bearer token for the project-management API
    #[arg(long, value_name = "TOKEN", env = "PORTFOLIO_SOURCE_TOKEN", hide_env_values = true)]
    pub source_token: Option<String>,

    /// Ollama model to use for scoring
    ///
    /// Can also be set via PORTFOLIO_MODEL or .portfolio-triage.toml.
    #[arg(short, long, env = "PORTFOLIO_MODEL")]
    pub model: Option<String>,

    /// Ollama API endpoint URL
    #[arg(long, value_name = "URL", env = "OLLAMA_URL")]
    pub ollama_url: Option<String>,

    /// Output file path for the report
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Report language (en, de)
    #[arg(long, value_name = "LANG")]
    pub language: Option<Language>,

    /// Report detail level (summary, full)
    #[arg(long, value_name = "LEVEL")]
    pub detail: Option<DetailLevel>,

    /// Number of projects scored concurrently
    #[arg(long, value_name = "NUM")]
    pub concurrency: Option<usize>,

    /// Temperature for LLM responses (0.0 - 1.0)
    ///
    /// Lower values produce more consistent scores.
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Model request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .portfolio-triage.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Dry run: fetch and validate the portfolio without calling the LLM
    ///
    /// Shows each project's phase, data-quality flag and warnings, then exits.
    #[arg(long)]
    pub dry_run: bool,

    /// Exit with code 2 when at least one project is critical
    ///
    /// Useful for scheduled pipelines that should alert on critical projects.
    #[arg(long)]
    pub fail_on_critical: bool,

    /// Generate a default .portfolio-triage.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// The portfolio id; empty if not set (validate first).
    pub fn portfolio_id(&self) -> &str {
        self.portfolio.as_deref().unwrap_or("")
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.portfolio_id().trim().is_empty() {
            return Err("A portfolio id is required (--portfolio)".to_string());
        }

        if let Some(ref url) = self.source_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Source URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(ref input) = self.input {
            if !input.is_file() {
                return Err(format!("Input file does not exist: {}", input.display()));
            }
        }

        // The model is not contacted on a dry run
        if !self.dry_run {
            if let Some(ref url) = self.ollama_url {
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    return Err("Ollama URL must start with 'http://' or 'https://'".to_string());
                }
            }
        }

        if let Some(temperature) = self.temperature {
            if !(0.0..=1.0).contains(&temperature) {
                return Err("Temperature must be between 0.0 and 1.0".to_string());
            }
        }

        if self.concurrency == Some(0) {
            return Err("Concurrency must be at least 1".to_string());
        }

        if self.timeout == Some(0) {
            return Err("Timeout must be at least 1 second".to_string());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `config_verbose` is `general.verbose` from the config file; `--quiet`
    /// wins over it.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            portfolio: Some("42".to_string()),
            input: None,
            source_url: Some("https://pm.example.com/api/v1".to_string()),
            source_token: None,
            model: None,
            ollama_url: None,
            output: None,
            format: None,
            language: None,
            detail: None,
            concurrency: None,
            temperature: None,
            timeout: None,
            config: None,
            verbose: false,
            quiet: false,
            dry_run: false,
            fail_on_critical: false,
            init_config: false,
        }
    }

    #[test]
    fn test_parse_from_command_line() {
        let args = Args::try_parse_from([
            "portfolio-triage",
            "--portfolio",
            "7",
            "--language",
            "de",
            "--format",
            "json",
            "--detail",
            "summary",
            "--fail-on-critical",
        ])
        .unwrap();

        assert_eq!(args.portfolio_id(), "7");
        assert_eq!(args.language, Some(Language::De));
        assert_eq!(args.format, Some(OutputFormat::Json));
        assert_eq!(args.detail, Some(DetailLevel::Summary));
        assert!(args.fail_on_critical);
    }

    #[test]
    fn test_portfolio_required_unless_init_config() {
        assert!(Args::try_parse_from(["portfolio-triage"]).is_err());
        assert!(Args::try_parse_from(["portfolio-triage", "--init-config"]).is_ok());
    }

    #[test]
    fn test_validation_ok() {
        assert!(make_args().validate().is_ok());
    }

    #[test]
    fn test_validation_invalid_source_url() {
        let mut args = make_args();
        args.source_url = Some("pm.example.com".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_missing_input_file() {
        let mut args = make_args();
        args.input = Some(PathBuf::from("/nonexistent/export.json"));
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_ranges() {
        let mut args = make_args();
        args.temperature = Some(1.5);
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.concurrency = Some(0);
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.timeout = Some(0);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(false), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(false), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(false), tracing::Level::ERROR);
    }

    #[test]
    fn test_config_verbose_raises_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(true), tracing::Level::DEBUG);

        args.quiet = true;
        assert_eq!(args.log_level(true), tracing::Level::ERROR);
    }
}
