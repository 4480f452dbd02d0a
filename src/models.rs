//! Data models for the portfolio triage pipeline.
//!
//! This module contains the raw source records, the derived per-project
//! scores and the portfolio-level aggregate consumed by the renderers.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A raw project record as delivered by the project source.
///
/// Nothing here is trusted: every field may be missing, zero or
/// contradictory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawProjectRecord {
    /// Source identifier of the project.
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    /// Project name.
    pub name: String,
    /// Project owner / manager.
    #[serde(default, alias = "ownerName")]
    pub owner: Option<String>,
    /// Textual status label (e.g. "In progress", "Abgeschlossen").
    #[serde(default, alias = "statusLabel")]
    pub status: Option<String>,
    /// Overall progress in percent.
    #[serde(default, alias = "progressPercent")]
    pub progress_percent: Option<f64>,
    /// Planned effort in hours.
    #[serde(default, alias = "plannedEffortHours")]
    pub planned_effort_hours: Option<f64>,
    /// Actual (booked) effort in hours.
    #[serde(default, alias = "actualEffortHours")]
    pub actual_effort_hours: Option<f64>,
    /// Number of milestones defined.
    #[serde(default, alias = "milestonesTotal")]
    pub milestones_total: Option<u32>,
    /// Number of milestones reached.
    #[serde(default, alias = "milestonesCompleted")]
    pub milestones_completed: Option<u32>,
    /// Number of milestones past their planned date.
    #[serde(default, alias = "milestonesDelayed")]
    pub milestones_delayed: Option<u32>,
    /// Free-text risk notes.
    #[serde(default, alias = "riskNotes", alias = "problemMemo")]
    pub risk_notes: Option<String>,
    /// Free-text status memo.
    #[serde(default, alias = "statusText", alias = "statusMemo")]
    pub status_text: Option<String>,
    /// Scope / subject description.
    #[serde(default, alias = "subjectMemo")]
    pub description: Option<String>,
    /// Planned end date.
    #[serde(default, alias = "endDate")]
    pub end_date: Option<NaiveDate>,
}

/// Source systems send ids as numbers or strings.
fn de_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

/// Whether any status, progress or milestone value exists. Projects without
/// one cannot be assessed.
fn has_progress_data(
    status: Option<&str>,
    progress_percent: Option<f64>,
    milestones_total: Option<u32>,
    milestones_completed: Option<u32>,
) -> bool {
    status.map(|s| !s.trim().is_empty()).unwrap_or(false)
        || progress_percent.is_some()
        || milestones_total.is_some()
        || milestones_completed.is_some()
}

impl RawProjectRecord {
    /// Returns true when neither status, progress nor milestone data exists.
    pub fn lacks_progress_data(&self) -> bool {
        !has_progress_data(
            self.status.as_deref(),
            self.progress_percent,
            self.milestones_total,
            self.milestones_completed,
        )
    }
}

/// One of the five scored axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Urgency,
    Importance,
    Complexity,
    Risk,
    DataQuality,
}

impl Dimension {
    /// All dimensions in report order.
    pub const ALL: [Dimension; 5] = [
        Dimension::Urgency,
        Dimension::Importance,
        Dimension::Complexity,
        Dimension::Risk,
        Dimension::DataQuality,
    ];

    /// Short code used in tables (U/I/C/R/DQ).
    pub fn code(&self) -> &'static str {
        match self {
            Dimension::Urgency => "U",
            Dimension::Importance => "I",
            Dimension::Complexity => "C",
            Dimension::Risk => "R",
            Dimension::DataQuality => "DQ",
        }
    }

    /// Key used in model payloads.
    pub fn key(&self) -> &'static str {
        match self {
            Dimension::Urgency => "urgency",
            Dimension::Importance => "importance",
            Dimension::Complexity => "complexity",
            Dimension::Risk => "risk",
            Dimension::DataQuality => "data_quality",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dimension::Urgency => write!(f, "Urgency"),
            Dimension::Importance => write!(f, "Importance"),
            Dimension::Complexity => write!(f, "Complexity"),
            Dimension::Risk => write!(f, "Risk"),
            Dimension::DataQuality => write!(f, "Data Quality"),
        }
    }
}

/// A normalized dimension value on the 1-5 scale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionScore {
    /// Ordinal value in `[1, 5]`.
    pub value: u8,
    /// Short justification from the model, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub justification: Option<String>,
}

/// The full U/I/C/R/DQ tuple of a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionScores {
    pub urgency: DimensionScore,
    pub importance: DimensionScore,
    pub complexity: DimensionScore,
    pub risk: DimensionScore,
    pub data_quality: DimensionScore,
}

impl DimensionScores {
    /// Borrow the score of one dimension.
    pub fn get(&self, dimension: Dimension) -> &DimensionScore {
        match dimension {
            Dimension::Urgency => &self.urgency,
            Dimension::Importance => &self.importance,
            Dimension::Complexity => &self.complexity,
            Dimension::Risk => &self.risk,
            Dimension::DataQuality => &self.data_quality,
        }
    }

    /// The ordinal value of one dimension.
    pub fn value(&self, dimension: Dimension) -> u8 {
        self.get(dimension).value
    }
}

/// Traffic-light status of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusColor {
    Green,
    Yellow,
    Red,
    Gray,
}

impl fmt::Display for StatusColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusColor::Green => write!(f, "green"),
            StatusColor::Yellow => write!(f, "yellow"),
            StatusColor::Red => write!(f, "red"),
            StatusColor::Gray => write!(f, "gray"),
        }
    }
}

impl StatusColor {
    /// Returns an emoji representation of the color.
    pub fn emoji(&self) -> &'static str {
        match self {
            StatusColor::Green => "🟢",
            StatusColor::Yellow => "🟡",
            StatusColor::Red => "🔴",
            StatusColor::Gray => "⚪",
        }
    }
}

/// Marker for untrustworthy source or generated data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DataQualityFlag {
    #[default]
    None,
    /// The source record contradicts itself.
    Inconsistent,
    /// The analysis text is a placeholder or a duplicate of another project's.
    FallbackContent,
}

impl DataQualityFlag {
    pub fn is_flagged(&self) -> bool {
        !matches!(self, DataQualityFlag::None)
    }
}

impl fmt::Display for DataQualityFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataQualityFlag::None => write!(f, "none"),
            DataQualityFlag::Inconsistent => write!(f, "inconsistent"),
            DataQualityFlag::FallbackContent => write!(f, "fallback-content"),
        }
    }
}

/// Why a project was classified as critical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriticalityReason {
    /// Risk and importance both at or above their thresholds.
    HighRiskHighImportance,
    /// Inconsistent data with (near) zero progress.
    InconsistentWithoutProgress,
    /// Urgency at the top of the scale.
    MaximumUrgency,
    /// The model flagged the project as critical.
    ModelAssessment,
}

impl fmt::Display for CriticalityReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CriticalityReason::HighRiskHighImportance => write!(f, "high risk and importance"),
            CriticalityReason::InconsistentWithoutProgress => {
                write!(f, "inconsistent data without progress")
            }
            CriticalityReason::MaximumUrgency => write!(f, "maximum urgency"),
            CriticalityReason::ModelAssessment => write!(f, "model assessment"),
        }
    }
}

/// The derived score of a single project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectScore {
    /// Source identifier.
    pub project_id: String,
    /// Project name.
    pub project_name: String,
    /// Project owner, passed through from the source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    /// Textual status, passed through from the source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_label: Option<String>,
    /// Normalized U/I/C/R/DQ scores.
    pub scores: DimensionScores,
    /// Ranking score derived from the dimensions and the data-quality flag.
    pub priority_score: i32,
    /// Whether the project needs immediate management attention.
    pub is_critical: bool,
    /// Rules that made the project critical.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub criticality_reasons: Vec<CriticalityReason>,
    /// Traffic-light status.
    pub status_color: StatusColor,
    /// Data-quality marker.
    pub data_quality_flag: DataQualityFlag,
    /// Progress in percent, as delivered by the source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestones_total: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestones_completed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestones_delayed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub planned_effort_hours: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_effort_hours: Option<f64>,
    /// One-line verdict from the model.
    #[serde(default)]
    pub summary: String,
    /// Narrative analysis, unique to this project.
    pub analysis: String,
    /// Human-readable data warnings.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl ProjectScore {
    /// Same check as [`RawProjectRecord::lacks_progress_data`] on the
    /// passed-through source fields.
    pub fn lacks_progress_data(&self) -> bool {
        !has_progress_data(
            self.status_label.as_deref(),
            self.progress_percent,
            self.milestones_total,
            self.milestones_completed,
        )
    }

    /// Milestones as "completed/total", if known.
    pub fn milestone_ratio(&self) -> Option<String> {
        self.milestones_total
            .map(|total| format!("{}/{}", self.milestones_completed.unwrap_or(0), total))
    }
}

/// Portfolio-wide statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioStatistics {
    /// Number of projects analyzed.
    pub project_count: usize,
    /// Number of critical projects.
    pub critical_count: usize,
    pub avg_urgency: f64,
    pub avg_importance: f64,
    pub avg_complexity: f64,
    pub avg_risk: f64,
    pub avg_data_quality: f64,
    /// Mean progress over projects that report progress.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_progress: Option<f64>,
    /// Projects flagged `inconsistent`.
    pub inconsistent_count: usize,
    /// Projects flagged `fallback-content`.
    pub fallback_count: usize,
    pub green_count: usize,
    pub yellow_count: usize,
    pub red_count: usize,
    pub gray_count: usize,
}

impl PortfolioStatistics {
    /// Mean of one dimension.
    pub fn average(&self, dimension: Dimension) -> f64 {
        match dimension {
            Dimension::Urgency => self.avg_urgency,
            Dimension::Importance => self.avg_importance,
            Dimension::Complexity => self.avg_complexity,
            Dimension::Risk => self.avg_risk,
            Dimension::DataQuality => self.avg_data_quality,
        }
    }

    /// Number of projects with the given color.
    pub fn color_count(&self, color: StatusColor) -> usize {
        match color {
            StatusColor::Green => self.green_count,
            StatusColor::Yellow => self.yellow_count,
            StatusColor::Red => self.red_count,
            StatusColor::Gray => self.gray_count,
        }
    }
}

/// The finished analysis of one portfolio run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioAnalysis {
    /// Portfolio identifier.
    pub portfolio_id: String,
    /// Portfolio name.
    pub portfolio_name: String,
    /// When the analysis was produced.
    pub generated_at: DateTime<Utc>,
    /// Name of the model that produced the narrative parts.
    pub model_used: String,
    /// Projects in ranking order.
    pub projects: Vec<ProjectScore>,
    /// Aggregated statistics.
    pub statistics: PortfolioStatistics,
    /// Management summary.
    pub executive_summary: String,
    /// At most three recommendations, in the order given by the model.
    pub recommendations: Vec<String>,
    /// Cross-project risk patterns identified by the model.
    #[serde(default)]
    pub risk_clusters: Vec<String>,
    /// All project warnings, prefixed with the project name.
    #[serde(default)]
    pub data_warnings: Vec<String>,
}

impl PortfolioAnalysis {
    /// Critical projects in ranking order.
    pub fn critical_projects(&self) -> impl Iterator<Item = &ProjectScore> {
        self.projects.iter().filter(|p| p.is_critical)
    }
}

/// Kind of a non-fatal quality event recorded during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QualityEventKind {
    /// The model failed for this project; placeholder content was used.
    ScoringDegraded { reason: String },
    /// The source record contradicts itself.
    DataInconsistency { rule: String },
    /// The analysis text duplicated another project's.
    DuplicateContent { duplicate_of: String },
}

/// A non-fatal event tied to one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityEvent {
    pub project_id: String,
    #[serde(flatten)]
    pub kind: QualityEventKind,
}

/// Run-level telemetry describing partial degradation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunTelemetry {
    /// All quality events, in project input order.
    pub events: Vec<QualityEvent>,
    /// Projects whose analysis text is a placeholder.
    pub fallback_projects: usize,
    /// Whether the summary call failed and a generated summary was used.
    pub summary_fallback: bool,
    /// Wall-clock duration of the run in seconds.
    pub duration_seconds: f64,
}

impl RunTelemetry {
    /// Number of events of the given kind.
    pub fn count(&self, matches: impl Fn(&QualityEventKind) -> bool) -> usize {
        self.events.iter().filter(|e| matches(&e.kind)).count()
    }

    /// Whether any part of the run degraded.
    pub fn is_degraded(&self) -> bool {
        self.fallback_projects > 0 || self.summary_fallback
    }
}

/// Success envelope returned by the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOutcome {
    pub analysis: PortfolioAnalysis,
    pub telemetry: RunTelemetry,
}
