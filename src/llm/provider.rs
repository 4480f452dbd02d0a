//! The scoring and narrative collaborator boundary.

use crate::error::ProviderError;
use crate::models::{
    DataQualityFlag, DimensionScores, PortfolioStatistics, ProjectScore, RawProjectRecord,
    StatusColor,
};
use crate::scoring::normalizer::{clean_text, RawDimensionValues};
use async_trait::async_trait;
use chrono::NaiveDate;

/// Longest free-text field passed to the model.
const MAX_FIELD_CHARS: usize = 800;
/// Longest per-project analysis passed into the portfolio summary.
const MAX_ANALYSIS_CHARS: usize = 600;

/// Everything the model sees about one project.
///
/// Only constructed from a full record, so a project is never scored from
/// its name or id alone.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectBrief {
    id: String,
    name: String,
    owner: Option<String>,
    status: Option<String>,
    progress_percent: Option<f64>,
    planned_effort_hours: Option<f64>,
    actual_effort_hours: Option<f64>,
    milestones_total: Option<u32>,
    milestones_completed: Option<u32>,
    milestones_delayed: Option<u32>,
    end_date: Option<NaiveDate>,
    status_text: Option<String>,
    description: Option<String>,
    risk_notes: Option<String>,
}

impl ProjectBrief {
    pub fn from_record(record: &RawProjectRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            owner: record.owner.clone(),
            status: record.status.clone(),
            progress_percent: record.progress_percent,
            planned_effort_hours: record.planned_effort_hours,
            actual_effort_hours: record.actual_effort_hours,
            milestones_total: record.milestones_total,
            milestones_completed: record.milestones_completed,
            milestones_delayed: record.milestones_delayed,
            end_date: record.end_date,
            status_text: clean_text(record.status_text.as_deref(), MAX_FIELD_CHARS),
            description: clean_text(record.description.as_deref(), MAX_FIELD_CHARS),
            risk_notes: clean_text(record.risk_notes.as_deref(), MAX_FIELD_CHARS),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Render the project facts as a Markdown fact sheet for a prompt.
    pub fn fact_sheet(&self) -> String {
        let mut lines = vec![format!("### Project: {} (ID: {})", self.name, self.id), String::new()];

        if let Some(ref owner) = self.owner {
            lines.push(format!("- Owner: {}", owner));
        }
        lines.push(format!(
            "- Status: {}",
            self.status.as_deref().unwrap_or("not reported")
        ));
        lines.push(match self.progress_percent {
            Some(p) => format!("- Progress: {:.0}%", p),
            None => "- Progress: not reported".to_string(),
        });
        if self.planned_effort_hours.is_some() || self.actual_effort_hours.is_some() {
            lines.push(format!(
                "- Effort: {} actual / {} planned",
                hours(self.actual_effort_hours),
                hours(self.planned_effort_hours)
            ));
        }
        if let Some(total) = self.milestones_total {
            lines.push(format!(
                "- Milestones: {}/{} completed, {} delayed",
                self.milestones_completed.unwrap_or(0),
                total,
                self.milestones_delayed.unwrap_or(0)
            ));
        }
        if let Some(end) = self.end_date {
            lines.push(format!("- Planned end: {}", end));
        }
        if let Some(ref text) = self.status_text {
            lines.push(format!("- Status report: {}", text));
        }
        if let Some(ref text) = self.description {
            lines.push(format!("- Scope: {}", text));
        }
        if let Some(ref text) = self.risk_notes {
            lines.push(format!("- Known problems: {}", text));
        }

        lines.join("\n")
    }
}

fn hours(value: Option<f64>) -> String {
    value
        .map(|h| format!("{:.0}h", h))
        .unwrap_or_else(|| "n/a".to_string())
}

/// The model's view of one project, before normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectAssessment {
    pub dimensions: RawDimensionValues,
    /// Explicit criticality asserted by the model.
    pub is_critical: Option<bool>,
    pub summary: String,
    pub analysis: String,
}

/// One scored project as passed into the portfolio summary.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredProjectLine {
    pub id: String,
    pub name: String,
    pub scores: DimensionScores,
    pub is_critical: bool,
    pub status_color: StatusColor,
    pub data_quality_flag: DataQualityFlag,
    pub analysis: String,
}

impl From<&ProjectScore> for ScoredProjectLine {
    fn from(p: &ProjectScore) -> Self {
        let analysis = if p.data_quality_flag == DataQualityFlag::FallbackContent {
            String::new()
        } else {
            clean_text(Some(&p.analysis), MAX_ANALYSIS_CHARS).unwrap_or_default()
        };

        Self {
            id: p.project_id.clone(),
            name: p.project_name.clone(),
            scores: p.scores.clone(),
            is_critical: p.is_critical,
            status_color: p.status_color,
            data_quality_flag: p.data_quality_flag,
            analysis,
        }
    }
}

/// The already computed portfolio, as passed to the narrative call.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioBrief {
    pub portfolio_name: String,
    pub projects: Vec<ScoredProjectLine>,
    pub statistics: PortfolioStatistics,
}

/// Portfolio-level narrative produced by the model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PortfolioNarrative {
    pub executive_summary: String,
    /// In the order returned by the model; not yet truncated.
    pub recommendations: Vec<String>,
    pub risk_clusters: Vec<String>,
}

/// A non-deterministic scoring backend.
#[async_trait]
pub trait ScoreProvider: Send + Sync {
    /// Name of the backing model, recorded in the analysis.
    fn name(&self) -> &str;

    /// Score one project.
    async fn score_project(&self, brief: &ProjectBrief) -> Result<ProjectAssessment, ProviderError>;

    /// Write the executive summary and recommendations for scored projects.
    async fn summarize(&self, brief: &PortfolioBrief) -> Result<PortfolioNarrative, ProviderError>;
}
