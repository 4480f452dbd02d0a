//! Portfolio Triage - LLM-assisted risk and priority triage
//!
//! A CLI tool that fetches the projects of a portfolio, scores them with a
//! local Ollama model, applies deterministic criticality and ranking rules
//! and writes a management report.
//!
//! Exit codes:
//!   0 - Success (no critical projects, or no --fail-on-critical set)
//!   1 - Runtime error (source unreachable, config, cancellation, etc.)
//!   2 - Critical projects found and --fail-on-critical set

mod analysis;
mod cli;
mod config;
mod error;
mod llm;
mod models;
mod report;
mod scoring;
mod source;

use analysis::Pipeline;
use anyhow::{Context, Result};
use cli::Args;
use config::{Config, CONFIG_FILE_NAME};
use llm::{OllamaConfig, OllamaProvider};
use models::{AnalysisOutcome, StatusColor};
use report::{renderer_for, RenderOptions};
use scoring::normalizer::{normalize_scores, project_phase};
use scoring::validator;
use source::{FileSource, HttpSource, ProjectSource};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // The config file may turn on verbose logging, so it is read first.
    let (config, origin) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    init_logging(args.log_level(config.general.verbose));

    info!("Portfolio Triage v{}", env!("CARGO_PKG_VERSION"));
    origin.log();
    debug!("Arguments: {:?}", args);

    match run_triage(args, config).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Triage failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            if let Some(analysis_error) = e.downcast_ref::<error::AnalysisError>() {
                if analysis_error.is_retryable() {
                    eprintln!("   The failure may be temporary; running again may succeed.");
                }
            }
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default configuration file.
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
    println!("   Edit it to customize the model, source, scoring thresholds and report.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run the complete triage workflow. Returns the exit code (0 or 2).
async fn run_triage(args: Args, mut config: Config) -> Result<i32> {
    config.merge_with_args(&args);
    config
        .scoring
        .validate()
        .context("Invalid [scoring] configuration")?;

    let portfolio_id = args.portfolio_id().to_string();
    let source = build_source(&args, &config)?;

    if args.dry_run {
        return handle_dry_run(source.as_ref(), &portfolio_id).await;
    }

    println!("📥 Portfolio {} from {}", portfolio_id, source.describe());
    println!("🤖 Model: {} at {}", config.model.name, config.model.ollama_url);
    println!(
        "   Concurrency: {} | Timeout: {}s | Language: {}",
        config.general.concurrency, config.model.timeout_seconds, config.report.language
    );

    let provider = OllamaProvider::new(OllamaConfig::from_model_config(
        &config.model,
        config.report.language,
    ))?;

    let pipeline = Pipeline::new(Arc::new(provider), config.scoring.clone())
        .with_concurrency(config.general.concurrency)
        .with_progress(!args.quiet);

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling analysis");
            interrupt.cancel();
        }
    });

    println!("\n🔬 Scoring projects...");
    let outcome = pipeline.run(source.as_ref(), &portfolio_id, &cancel).await?;

    println!("\n📝 Generating report...");
    let renderer = renderer_for(config.report.format);
    let options = RenderOptions {
        language: config.report.language,
        detail: config.report.detail,
    };
    let content = renderer.render(&outcome.analysis, &options)?;

    let output = output_path(
        &config.general.output,
        args.output.is_some(),
        renderer.file_extension(),
    );
    std::fs::write(&output, &content)
        .with_context(|| format!("Failed to write report to {}", output.display()))?;
    debug!("Wrote {} bytes ({})", content.len(), renderer.media_type());

    print_summary(&outcome, &output);

    if args.fail_on_critical && outcome.analysis.statistics.critical_count > 0 {
        eprintln!(
            "\n⛔ {} critical project(s) found. Failing (exit code 2).",
            outcome.analysis.statistics.critical_count
        );
        return Ok(2);
    }

    Ok(0)
}

/// Pick the project source: a local export if given, the API otherwise.
fn build_source(args: &Args, config: &Config) -> Result<Box<dyn ProjectSource>> {
    if let Some(ref input) = args.input {
        info!("Using export file: {}", input.display());
        return Ok(Box::new(FileSource::new(input.clone())));
    }

    Ok(Box::new(HttpSource::from_config(&config.source)?))
}

/// Report path for the chosen format.
///
/// An explicitly given path is used as is. A configured default gets the
/// extension of the output format.
fn output_path(configured: &str, explicit: bool, extension: &str) -> PathBuf {
    let mut path = PathBuf::from(configured);
    let matches = path
        .extension()
        .map(|ext| ext == extension)
        .unwrap_or(false);

    if !explicit && !matches {
        path.set_extension(extension);
    }
    path
}

/// Handle --dry-run: fetch and validate the portfolio, no LLM calls.
async fn handle_dry_run(source: &dyn ProjectSource, portfolio_id: &str) -> Result<i32> {
    println!("\n🔍 Dry run: fetching portfolio {} (no LLM calls)...\n", portfolio_id);

    let portfolio = source.fetch_portfolio(portfolio_id).await?;
    println!(
        "   Portfolio \"{}\" with {} projects:\n",
        portfolio.name,
        portfolio.projects.len()
    );

    // Neutral scores: only the record-level rules are meaningful here.
    let neutral = normalize_scores(None);
    let mut inconsistent = 0;
    for record in &portfolio.projects {
        let validation = validator::validate(record, &neutral);
        if validation.flag.is_flagged() {
            inconsistent += 1;
        }

        println!(
            "     📄 {} ({}): phase {:?}, data quality {}",
            record.name,
            record.id,
            project_phase(record.status.as_deref()),
            validation.flag
        );
        if record.lacks_progress_data() {
            println!("        {} no status, progress or milestone data", StatusColor::Gray.emoji());
        }
        for warning in &validation.warnings {
            println!("        ⚠️  {}", warning);
        }
    }

    println!(
        "\n   Total: {} projects, {} with inconsistent data",
        portfolio.projects.len(),
        inconsistent
    );
    println!("\n✅ Dry run complete. No LLM calls were made.");
    Ok(0)
}

fn print_summary(outcome: &AnalysisOutcome, output: &Path) {
    let analysis = &outcome.analysis;
    let stats = &analysis.statistics;
    let telemetry = &outcome.telemetry;

    println!("\n📊 Triage Summary: {}", analysis.portfolio_name);
    println!("   Projects: {}", stats.project_count);
    println!("   Critical: {}", stats.critical_count);
    let distribution: Vec<String> = [
        StatusColor::Red,
        StatusColor::Yellow,
        StatusColor::Green,
        StatusColor::Gray,
    ]
    .iter()
    .map(|color| format!("{} {}", color.emoji(), stats.color_count(*color)))
    .collect();
    println!("   - {}", distribution.join(" | "));

    for project in analysis.critical_projects() {
        println!(
            "     🔴 {} (priority {})",
            project.project_name, project.priority_score
        );
    }

    if !analysis.data_warnings.is_empty() {
        println!("   Data warnings: {}", analysis.data_warnings.len());
    }
    if telemetry.is_degraded() {
        println!(
            "   ⚠️  Degraded: {} project(s) with placeholder analysis{}",
            telemetry.fallback_projects,
            if telemetry.summary_fallback {
                ", generated executive summary"
            } else {
                ""
            }
        );
    }
    println!("   Duration: {:.1}s", telemetry.duration_seconds);
    println!("\n✅ Triage complete! Report saved to: {}", output.display());
}

/// Where the configuration came from.
#[derive(Debug, PartialEq)]
enum ConfigOrigin {
    Explicit(PathBuf),
    DefaultFile,
    Defaults,
    /// The default file exists but could not be used.
    Unreadable(String),
}

impl ConfigOrigin {
    fn log(&self) {
        match self {
            ConfigOrigin::Explicit(path) => info!("Loaded config from: {}", path.display()),
            ConfigOrigin::DefaultFile => info!("Loaded default config from {}", CONFIG_FILE_NAME),
            ConfigOrigin::Defaults => debug!("No config file found, using defaults"),
            ConfigOrigin::Unreadable(e) => warn!("Failed to load config: {}", e),
        }
    }
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is set up; the origin is logged afterwards.
fn load_config(args: &Args) -> Result<(Config, ConfigOrigin)> {
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, ConfigOrigin::Explicit(config_path.clone())));
    }

    Ok(match Config::load_default() {
        Ok(Some(config)) => (config, ConfigOrigin::DefaultFile),
        Ok(None) => (Config::default(), ConfigOrigin::Defaults),
        Err(e) => (Config::default(), ConfigOrigin::Unreadable(format!("{:#}", e))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path_follows_format() {
        assert_eq!(
            output_path("portfolio_report.md", false, "json"),
            PathBuf::from("portfolio_report.json")
        );
        assert_eq!(
            output_path("portfolio_report.md", false, "md"),
            PathBuf::from("portfolio_report.md")
        );
        assert_eq!(output_path("report", false, "md"), PathBuf::from("report.md"));
    }

    #[test]
    fn test_explicit_config_verbose_is_honored() {
        use clap::Parser;
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"[general]\nverbose = true\n").unwrap();
        let path = file.path().display().to_string();
        let path = path.as_str();

        let args = Args::try_parse_from(["portfolio-triage", "-p", "7", "--config", path]).unwrap();
        let (config, origin) = load_config(&args).unwrap();
        assert!(config.general.verbose);
        assert_eq!(origin, ConfigOrigin::Explicit(file.path().to_path_buf()));
        assert_eq!(args.log_level(config.general.verbose), tracing::Level::DEBUG);

        let args =
            Args::try_parse_from(["portfolio-triage", "-p", "7", "--config", path, "-q"]).unwrap();
        let (config, _) = load_config(&args).unwrap();
        assert_eq!(args.log_level(config.general.verbose), tracing::Level::ERROR);
    }

    #[test]
    fn test_explicit_output_path_is_kept() {
        assert_eq!(
            output_path("out/q3.txt", true, "json"),
            PathBuf::from("out/q3.txt")
        );
    }
}
