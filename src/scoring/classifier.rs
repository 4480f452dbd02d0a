//! Criticality classification.

use crate::config::ScoringConfig;
use crate::models::{CriticalityReason, DataQualityFlag, DimensionScores};

/// The critical flag together with every rule that fired.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Classification {
    pub is_critical: bool,
    pub reasons: Vec<CriticalityReason>,
}

/// Decide whether a project is critical.
///
/// The rules are OR-ed, so a model assessment of `false` never overrides a
/// rule that fired. A missing progress value counts as no progress.
pub fn classify(
    scores: &DimensionScores,
    flag: DataQualityFlag,
    progress_percent: Option<f64>,
    model_critical: Option<bool>,
    config: &ScoringConfig,
) -> Classification {
    let mut reasons = Vec::new();

    if scores.risk.value >= config.critical_risk
        && scores.importance.value >= config.critical_importance
    {
        reasons.push(CriticalityReason::HighRiskHighImportance);
    }

    let progress = progress_percent.unwrap_or(0.0);
    if flag == DataQualityFlag::Inconsistent && progress < config.stalled_progress_percent {
        reasons.push(CriticalityReason::InconsistentWithoutProgress);
    }

    if scores.urgency.value >= config.critical_urgency {
        reasons.push(CriticalityReason::MaximumUrgency);
    }

    if model_critical == Some(true) {
        reasons.push(CriticalityReason::ModelAssessment);
    }

    Classification {
        is_critical: !reasons.is_empty(),
        reasons,
    }
}
