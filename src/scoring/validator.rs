//! Sanity checks for contradictory source data.
//!
//! The per-record rules run during the per-project pass. Duplicate-content
//! detection needs every analysis text of the run and is exposed separately
//! for the batch pass.

use super::normalizer::{collapse_whitespace, project_phase, ProjectPhase};
use crate::models::{DataQualityFlag, DimensionScores, RawProjectRecord};
use std::collections::HashMap;
use std::fmt;

/// The record-level rule that marked a project inconsistent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InconsistencyRule {
    /// Status says completed, yet none of the defined milestones was reached.
    CompletedWithoutMilestones,
    /// Zero progress and zero milestones on a project that should have started.
    NoProgress,
}

impl fmt::Display for InconsistencyRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InconsistencyRule::CompletedWithoutMilestones => {
                write!(f, "completed_without_milestones")
            }
            InconsistencyRule::NoProgress => write!(f, "no_progress"),
        }
    }
}

/// Result of validating one record.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Validation {
    pub flag: DataQualityFlag,
    pub rule: Option<InconsistencyRule>,
    /// Observations that do not change the flag.
    pub warnings: Vec<String>,
}

/// Apply the record-level rules, first match wins.
pub fn validate(record: &RawProjectRecord, scores: &DimensionScores) -> Validation {
    let phase = project_phase(record.status.as_deref());
    let rule = inconsistency(record, phase);

    let mut warnings = Vec::new();
    if let Some(rule) = rule {
        warnings.push(describe(rule, record));
    }
    warnings.extend(data_warnings(record, scores, phase));

    Validation {
        flag: if rule.is_some() {
            DataQualityFlag::Inconsistent
        } else {
            DataQualityFlag::None
        },
        rule,
        warnings,
    }
}

fn inconsistency(record: &RawProjectRecord, phase: ProjectPhase) -> Option<InconsistencyRule> {
    // Missing counts are unknown, not zero.
    let none_reached = record.milestones_completed == Some(0);
    let total_milestones = record.milestones_total.unwrap_or(0);

    if phase == ProjectPhase::Completed && none_reached && total_milestones > 0 {
        return Some(InconsistencyRule::CompletedWithoutMilestones);
    }

    if record.progress_percent == Some(0.0)
        && none_reached
        && phase != ProjectPhase::NotStarted
    {
        return Some(InconsistencyRule::NoProgress);
    }

    None
}

fn describe(rule: InconsistencyRule, record: &RawProjectRecord) -> String {
    match rule {
        InconsistencyRule::CompletedWithoutMilestones => format!(
            "DATA ERROR: marked as completed, but 0 of {} milestones reached",
            record.milestones_total.unwrap_or(0)
        ),
        InconsistencyRule::NoProgress => {
            "DATA ERROR: 0% progress and no milestone reached on a started project".to_string()
        }
    }
}

fn data_warnings(
    record: &RawProjectRecord,
    scores: &DimensionScores,
    phase: ProjectPhase,
) -> Vec<String> {
    let mut warnings = Vec::new();
    let actual = record.actual_effort_hours.unwrap_or(0.0);
    let planned = record.planned_effort_hours.unwrap_or(0.0);

    if phase == ProjectPhase::Active && actual <= 0.0 {
        warnings.push("Incomplete data: no effort booked".to_string());
    }

    if actual > 0.0 && planned <= 0.0 {
        warnings.push("No planned effort: variance cannot be computed".to_string());
    }

    if scores.data_quality.value <= 2 {
        warnings.push("Limited data quality: interpret the assessment with care".to_string());
    }

    let delayed = record.milestones_delayed.unwrap_or(0);
    if let Some(progress) = record.progress_percent {
        if progress >= 90.0 && delayed > 0 {
            warnings.push(format!(
                "{:.0}% complete, but {} milestone(s) delayed",
                progress, delayed
            ));
        }
    }

    warnings
}

/// A text that repeats an earlier project's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Duplicate {
    /// Index of the repeating text.
    pub index: usize,
    /// Index of the first occurrence.
    pub original: usize,
}

/// Find texts that are identical to an earlier one after whitespace
/// normalization. `None` entries are skipped.
///
/// The first occurrence keeps its text; every later match is reported.
pub fn find_duplicates<'a, I>(texts: I) -> Vec<Duplicate>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut duplicates = Vec::new();

    for (index, text) in texts.into_iter().enumerate() {
        let Some(text) = text else { continue };
        let key = collapse_whitespace(text);
        if key.is_empty() {
            continue;
        }
        match seen.get(&key) {
            Some(&original) => duplicates.push(Duplicate { index, original }),
            None => {
                seen.insert(key, index);
            }
        }
    }

    duplicates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::normalizer::normalize_scores;

    fn record(status: Option<&str>) -> RawProjectRecord {
        RawProjectRecord {
            id: "1".to_string(),
            name: "Test".to_string(),
            status: status.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn test_completed_without_milestones() {
        let mut r = record(Some("Completed"));
        r.milestones_total = Some(4);
        r.milestones_completed = Some(0);
        r.progress_percent = Some(0.0);

        let v = validate(&r, &normalize_scores(None));
        assert_eq!(v.flag, DataQualityFlag::Inconsistent);
        assert_eq!(v.rule, Some(InconsistencyRule::CompletedWithoutMilestones));
        assert!(v.warnings[0].contains("0 of 4"));
    }

    #[test]
    fn test_no_progress_rule() {
        let mut r = record(Some("In progress"));
        r.progress_percent = Some(0.0);
        r.milestones_completed = Some(0);
        let v = validate(&r, &normalize_scores(None));
        assert_eq!(v.rule, Some(InconsistencyRule::NoProgress));

        // explicitly not started
        r.status = Some("Not started".to_string());
        let v = validate(&r, &normalize_scores(None));
        assert_eq!(v.flag, DataQualityFlag::None);

        // status missing still counts as started
        r.status = None;
        let v = validate(&r, &normalize_scores(None));
        assert_eq!(v.flag, DataQualityFlag::Inconsistent);
    }

    #[test]
    fn test_missing_progress_is_not_zero() {
        let mut r = record(Some("In progress"));
        r.milestones_completed = Some(0);
        let v = validate(&r, &normalize_scores(None));
        assert_eq!(v.flag, DataQualityFlag::None);
        assert!(v.rule.is_none());
    }

    #[test]
    fn test_missing_milestone_count_is_not_zero() {
        let mut r = record(Some("Completed"));
        r.milestones_total = Some(4);
        let v = validate(&r, &normalize_scores(None));
        assert_eq!(v.flag, DataQualityFlag::None);
        assert!(v.warnings.iter().all(|w| !w.starts_with("DATA ERROR")));

        r.status = Some("In progress".to_string());
        r.progress_percent = Some(0.0);
        let v = validate(&r, &normalize_scores(None));
        assert!(v.rule.is_none());
    }

    #[test]
    fn test_negated_completed_status_is_consistent() {
        for status in ["Incomplete", "Not completed", "Abandoned", "Nicht abgeschlossen"] {
            let mut r = record(Some(status));
            r.progress_percent = Some(5.0);
            r.milestones_total = Some(4);
            r.milestones_completed = Some(0);

            let v = validate(&r, &normalize_scores(None));
            assert_eq!(v.flag, DataQualityFlag::None, "{status}");
            assert!(v.warnings.iter().all(|w| !w.starts_with("DATA ERROR")), "{status}");
        }
    }

    #[test]
    fn test_warnings() {
        let mut r = record(Some("Active"));
        r.progress_percent = Some(95.0);
        r.milestones_completed = Some(3);
        r.milestones_delayed = Some(1);
        r.actual_effort_hours = Some(0.0);

        let mut scores = normalize_scores(None);
        scores.data_quality.value = 2;

        let v = validate(&r, &scores);
        assert_eq!(v.flag, DataQualityFlag::None);
        assert_eq!(v.warnings.len(), 3);
        assert!(v.warnings.iter().any(|w| w.contains("no effort booked")));
        assert!(v.warnings.iter().any(|w| w.contains("1 milestone(s) delayed")));

        r.actual_effort_hours = Some(40.0);
        let v = validate(&r, &normalize_scores(None));
        assert!(v.warnings.iter().any(|w| w.contains("No planned effort")));
    }

    #[test]
    fn test_find_duplicates() {
        let texts = vec![
            Some("Budget is  on track."),
            Some("Vendor delayed."),
            None,
            Some("Budget is on track.\n"),
            Some("Budget is on track."),
        ];

        let dups = find_duplicates(texts);
        assert_eq!(
            dups,
            vec![
                Duplicate { index: 3, original: 0 },
                Duplicate { index: 4, original: 0 },
            ]
        );
    }

    #[test]
    fn test_find_duplicates_ignores_blank() {
        assert!(find_duplicates(vec![Some(" "), Some("")]).is_empty());
    }
}
