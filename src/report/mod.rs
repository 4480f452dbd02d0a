//! Report rendering.
//!
//! Renderers consume a finished [`PortfolioAnalysis`] and never re-derive
//! any score: rendering is presentation only.

pub mod json;
pub mod markdown;

use crate::models::PortfolioAnalysis;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use json::JsonRenderer;
pub use markdown::MarkdownRenderer;

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

/// Language of report labels and model-written text.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// English (default)
    #[default]
    En,
    /// German
    De,
}

impl Language {
    /// Language name as used in model instructions.
    pub fn name(&self) -> &'static str {
        match self {
            Language::En => "English",
            Language::De => "German",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::En => write!(f, "en"),
            Language::De => write!(f, "de"),
        }
    }
}

/// How much per-project detail a report carries.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum DetailLevel {
    /// Statistics and ranking only
    Summary,
    /// Everything, including per-project analysis (default)
    #[default]
    Full,
}

/// Options shared by all renderers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    pub language: Language,
    pub detail: DetailLevel,
}

/// A report format.
pub trait ReportRenderer {
    /// MIME type of the produced artifact.
    fn media_type(&self) -> &'static str;

    /// File extension without the dot.
    fn file_extension(&self) -> &'static str;

    /// Render the analysis into a downloadable artifact.
    fn render(&self, analysis: &PortfolioAnalysis, options: &RenderOptions) -> Result<Vec<u8>>;
}

/// The renderer for an output format.
pub fn renderer_for(format: OutputFormat) -> Box<dyn ReportRenderer> {
    match format {
        OutputFormat::Markdown => Box::new(MarkdownRenderer),
        OutputFormat::Json => Box::new(JsonRenderer),
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::models::{
        CriticalityReason, DataQualityFlag, DimensionScore, DimensionScores, PortfolioAnalysis,
        PortfolioStatistics, ProjectScore, StatusColor,
    };
    use chrono::{TimeZone, Utc};

    fn dim(value: u8, justification: Option<&str>) -> DimensionScore {
        DimensionScore {
            value,
            justification: justification.map(String::from),
        }
    }

    pub fn analysis() -> PortfolioAnalysis {
        let critical = ProjectScore {
            project_id: "101".to_string(),
            project_name: "ERP Migration".to_string(),
            owner: Some("A. Weber".to_string()),
            status_label: Some("Completed".to_string()),
            scores: DimensionScores {
                urgency: dim(4, Some("Go-live in six weeks")),
                importance: dim(5, None),
                complexity: dim(4, None),
                risk: dim(4, Some("Vendor support ends")),
                data_quality: dim(2, None),
            },
            priority_score: 21,
            is_critical: true,
            criticality_reasons: vec![
                CriticalityReason::HighRiskHighImportance,
                CriticalityReason::InconsistentWithoutProgress,
            ],
            status_color: StatusColor::Red,
            data_quality_flag: DataQualityFlag::Inconsistent,
            progress_percent: Some(0.0),
            milestones_total: Some(4),
            milestones_completed: Some(0),
            milestones_delayed: Some(2),
            planned_effort_hours: Some(1200.0),
            actual_effort_hours: Some(310.0),
            summary: "Status contradicts milestone data.".to_string(),
            analysis: "The project is reported as completed while no milestone was reached."
                .to_string(),
            warnings: vec!["DATA ERROR: marked as completed, but 0 of 4 milestones reached"
                .to_string()],
        };

        let healthy = ProjectScore {
            project_id: "102".to_string(),
            project_name: "Intranet Refresh".to_string(),
            owner: None,
            status_label: Some("In progress".to_string()),
            scores: DimensionScores {
                urgency: dim(2, None),
                importance: dim(2, None),
                complexity: dim(2, None),
                risk: dim(1, None),
                data_quality: dim(4, None),
            },
            priority_score: 9,
            is_critical: false,
            criticality_reasons: Vec::new(),
            status_color: StatusColor::Green,
            data_quality_flag: DataQualityFlag::None,
            progress_percent: Some(60.0),
            milestones_total: Some(3),
            milestones_completed: Some(2),
            milestones_delayed: None,
            planned_effort_hours: Some(200.0),
            actual_effort_hours: Some(120.0),
            summary: "On track.".to_string(),
            analysis: "Delivery follows the plan with a small buffer.".to_string(),
            warnings: Vec::new(),
        };

        PortfolioAnalysis {
            portfolio_id: "7".to_string(),
            portfolio_name: "IT 2026".to_string(),
            generated_at: Utc
                .with_ymd_and_hms(2026, 3, 2, 9, 30, 0)
                .unwrap(),
            model_used: "llama3.2:latest".to_string(),
            projects: vec![critical, healthy],
            statistics: PortfolioStatistics {
                project_count: 2,
                critical_count: 1,
                avg_urgency: 3.0,
                avg_importance: 3.5,
                avg_complexity: 3.0,
                avg_risk: 2.5,
                avg_data_quality: 3.0,
                avg_progress: Some(30.0),
                inconsistent_count: 1,
                fallback_count: 0,
                green_count: 1,
                yellow_count: 0,
                red_count: 1,
                gray_count: 0,
            },
            executive_summary: "One of two projects needs immediate attention.".to_string(),
            recommendations: vec![
                "Reconcile the ERP milestone data with the project office.".to_string(),
            ],
            risk_clusters: vec!["Vendor dependency".to_string()],
            data_warnings: vec![
                "[ERP Migration] DATA ERROR: marked as completed, but 0 of 4 milestones reached"
                    .to_string(),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renderer_for_format() {
        assert_eq!(renderer_for(OutputFormat::Json).file_extension(), "json");
        assert_eq!(renderer_for(OutputFormat::Markdown).media_type(), "text/markdown");
    }

    #[test]
    fn test_option_serialization() {
        assert_eq!(serde_json::to_string(&Language::De).unwrap(), "\"de\"");
        assert_eq!(serde_json::to_string(&DetailLevel::Summary).unwrap(), "\"summary\"");
        assert_eq!(Language::De.name(), "German");
    }
}
