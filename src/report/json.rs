//! JSON report generation.

use super::{DetailLevel, RenderOptions, ReportRenderer};
use crate::models::{DataQualityFlag, PortfolioAnalysis, PortfolioStatistics, StatusColor};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Renders the analysis as pretty-printed JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer;

/// Compact view used for summary-level reports.
#[derive(Debug, Serialize)]
struct SummaryView<'a> {
    portfolio_id: &'a str,
    portfolio_name: &'a str,
    generated_at: DateTime<Utc>,
    model_used: &'a str,
    language: super::Language,
    statistics: &'a PortfolioStatistics,
    executive_summary: &'a str,
    recommendations: &'a [String],
    ranking: Vec<RankingEntry<'a>>,
}

#[derive(Debug, Serialize)]
struct RankingEntry<'a> {
    rank: usize,
    project_id: &'a str,
    project_name: &'a str,
    priority_score: i32,
    is_critical: bool,
    status_color: StatusColor,
    data_quality_flag: DataQualityFlag,
}

impl ReportRenderer for JsonRenderer {
    fn media_type(&self) -> &'static str {
        "application/json"
    }

    fn file_extension(&self) -> &'static str {
        "json"
    }

    fn render(&self, analysis: &PortfolioAnalysis, options: &RenderOptions) -> Result<Vec<u8>> {
        let json = match options.detail {
            DetailLevel::Full => serde_json::to_vec_pretty(analysis),
            DetailLevel::Summary => serde_json::to_vec_pretty(&summary_view(analysis, options)),
        };
        json.context("Failed to serialize JSON report")
    }
}

fn summary_view<'a>(analysis: &'a PortfolioAnalysis, options: &RenderOptions) -> SummaryView<'a> {
    SummaryView {
        portfolio_id: &analysis.portfolio_id,
        portfolio_name: &analysis.portfolio_name,
        generated_at: analysis.generated_at,
        model_used: &analysis.model_used,
        language: options.language,
        statistics: &analysis.statistics,
        executive_summary: &analysis.executive_summary,
        recommendations: &analysis.recommendations,
        ranking: analysis
            .projects
            .iter()
            .enumerate()
            .map(|(i, p)| RankingEntry {
                rank: i + 1,
                project_id: &p.project_id,
                project_name: &p.project_name,
                priority_score: p.priority_score,
                is_critical: p.is_critical,
                status_color: p.status_color,
                data_quality_flag: p.data_quality_flag,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::fixtures;
    use serde_json::Value;

    #[test]
    fn test_full_json_round_trips() {
        let analysis = fixtures::analysis();
        let bytes = JsonRenderer
            .render(&analysis, &RenderOptions::default())
            .unwrap();

        let parsed: PortfolioAnalysis = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed, analysis);
    }

    #[test]
    fn test_summary_json_is_slim() {
        let analysis = fixtures::analysis();
        let options = RenderOptions {
            detail: DetailLevel::Summary,
            ..RenderOptions::default()
        };
        let bytes = JsonRenderer.render(&analysis, &options).unwrap();
        let json: Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(json["ranking"][0]["project_id"], "101");
        assert_eq!(json["ranking"][0]["status_color"], "red");
        assert_eq!(json["ranking"][0]["data_quality_flag"], "inconsistent");
        assert_eq!(json["ranking"][1]["rank"], 2);
        assert_eq!(json["language"], "en");
        assert!(json.get("projects").is_none());
        assert!(!String::from_utf8(bytes).unwrap().contains("no milestone was reached"));
    }
}
