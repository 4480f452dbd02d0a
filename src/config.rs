//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.portfolio-triage.toml` files.

use crate::report::{DetailLevel, Language, OutputFormat};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = ".portfolio-triage.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Model settings.
    #[serde(default)]
    pub model: ModelConfig,

    /// Project source settings.
    #[serde(default)]
    pub source: SourceConfig,

    /// Scoring weights and thresholds.
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,

    /// Number of projects scored concurrently.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            verbose: false,
            concurrency: default_concurrency(),
        }
    }
}

fn default_output() -> String {
    "portfolio_report.md".to_string()
}

fn default_concurrency() -> usize {
    4
}

/// LLM model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model name.
    #[serde(default = "default_model")]
    pub name: String,

    /// Ollama API URL.
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,

    /// Temperature for generation.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Request timeout in seconds.
    #[serde(default = "default_model_timeout")]
    pub timeout_seconds: u64,

    /// Number of retries on transport failure.
    #[serde(default = "default_retries")]
    pub retries: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model(),
            ollama_url: default_ollama_url(),
            temperature: default_temperature(),
            timeout_seconds: default_model_timeout(),
            retries: default_retries(),
        }
    }
}

fn default_model() -> String {
    "llama3.2:latest".to_string()
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_temperature() -> f32 {
    0.1
}

fn default_model_timeout() -> u64 {
    300
}

fn default_retries() -> usize {
    2
}

/// Project source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Base URL of the project-management API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Bearer token for the API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_source_timeout")]
    pub timeout_seconds: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            token: None,
            timeout_seconds: default_source_timeout(),
        }
    }
}

fn default_source_timeout() -> u64 {
    30
}

/// Weights and thresholds of the scoring rules.
///
/// Priority = `urgency_weight*U + importance_weight*I + risk_weight*R`,
/// minus `data_quality_penalty` when the project carries a data-quality flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "default_two")]
    pub urgency_weight: i32,

    #[serde(default = "default_two")]
    pub importance_weight: i32,

    #[serde(default = "default_one")]
    pub risk_weight: i32,

    #[serde(default = "default_one")]
    pub data_quality_penalty: i32,

    /// Minimum risk for the risk-and-importance rule.
    #[serde(default = "default_four")]
    pub critical_risk: u8,

    /// Minimum importance for the risk-and-importance rule.
    #[serde(default = "default_four")]
    pub critical_importance: u8,

    /// Urgency that makes a project critical on its own.
    #[serde(default = "default_five")]
    pub critical_urgency: u8,

    /// Progress (percent) below which inconsistent data makes a project critical.
    #[serde(default = "default_stalled_progress")]
    pub stalled_progress_percent: f64,

    /// Minimum risk for the yellow "at risk" tier.
    #[serde(default = "default_three")]
    pub at_risk_threshold: u8,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            urgency_weight: 2,
            importance_weight: 2,
            risk_weight: 1,
            data_quality_penalty: 1,
            critical_risk: 4,
            critical_importance: 4,
            critical_urgency: 5,
            stalled_progress_percent: default_stalled_progress(),
            at_risk_threshold: 3,
        }
    }
}

fn default_one() -> i32 {
    1
}

fn default_two() -> i32 {
    2
}

fn default_three() -> u8 {
    3
}

fn default_four() -> u8 {
    4
}

fn default_five() -> u8 {
    5
}

fn default_stalled_progress() -> f64 {
    10.0
}

impl ScoringConfig {
    /// Reject weights and thresholds outside their meaningful range.
    pub fn validate(&self) -> Result<()> {
        let weights = [
            ("urgency_weight", self.urgency_weight),
            ("importance_weight", self.importance_weight),
            ("risk_weight", self.risk_weight),
            ("data_quality_penalty", self.data_quality_penalty),
        ];
        for (name, weight) in weights {
            if weight < 0 {
                bail!("scoring.{} must not be negative (got {})", name, weight);
            }
        }

        let thresholds = [
            ("critical_risk", self.critical_risk),
            ("critical_importance", self.critical_importance),
            ("critical_urgency", self.critical_urgency),
            ("at_risk_threshold", self.at_risk_threshold),
        ];
        for (name, threshold) in thresholds {
            if !(1..=5).contains(&threshold) {
                bail!("scoring.{} must be between 1 and 5 (got {})", name, threshold);
            }
        }

        if !(0.0..=100.0).contains(&self.stalled_progress_percent) {
            bail!(
                "scoring.stalled_progress_percent must be between 0 and 100 (got {})",
                self.stalled_progress_percent
            );
        }

        Ok(())
    }
}

/// Report generation settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Output format.
    #[serde(default)]
    pub format: OutputFormat,

    /// Report language.
    #[serde(default)]
    pub language: Language,

    /// Amount of per-project detail.
    #[serde(default)]
    pub detail: DetailLevel,
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref model) = args.model {
            self.model.name = model.clone();
        }
        if let Some(ref url) = args.ollama_url {
            self.model.ollama_url = url.clone();
        }
        if let Some(temperature) = args.temperature {
            self.model.temperature = temperature;
        }
        if let Some(timeout) = args.timeout {
            self.model.timeout_seconds = timeout;
        }

        if let Some(ref url) = args.source_url {
            self.source.base_url = Some(url.clone());
        }
        if let Some(ref token) = args.source_token {
            self.source.token = Some(token.clone());
        }

        if let Some(concurrency) = args.concurrency {
            self.general.concurrency = concurrency;
        }
        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }

        if let Some(format) = args.format {
            self.report.format = format;
        }
        if let Some(language) = args.language {
            self.report.language = language;
        }
        if let Some(detail) = args.detail {
            self.report.detail = detail;
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}
