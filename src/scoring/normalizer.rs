//! Score and text normalization.
//!
//! Maps raw or model-provided dimension values onto the 1-5 scale and
//! cleans the free-text fields of source records. Nothing in here fails:
//! bad input degrades to the neutral default.

use crate::models::{Dimension, DimensionScore, DimensionScores};
use regex::Regex;
use std::sync::OnceLock;

/// Lowest ordinal value.
pub const SCALE_MIN: u8 = 1;
/// Highest ordinal value.
pub const SCALE_MAX: u8 = 5;

/// Dimension values as reported by the model, before normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawDimensionValues {
    pub urgency: RawDimension,
    pub importance: RawDimension,
    pub complexity: RawDimension,
    pub risk: RawDimension,
    pub data_quality: RawDimension,
}

/// One unnormalized dimension value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawDimension {
    pub value: Option<f64>,
    pub justification: Option<String>,
}

impl RawDimensionValues {
    pub fn get(&self, dimension: Dimension) -> &RawDimension {
        match dimension {
            Dimension::Urgency => &self.urgency,
            Dimension::Importance => &self.importance,
            Dimension::Complexity => &self.complexity,
            Dimension::Risk => &self.risk,
            Dimension::DataQuality => &self.data_quality,
        }
    }

    pub fn get_mut(&mut self, dimension: Dimension) -> &mut RawDimension {
        match dimension {
            Dimension::Urgency => &mut self.urgency,
            Dimension::Importance => &mut self.importance,
            Dimension::Complexity => &mut self.complexity,
            Dimension::Risk => &mut self.risk,
            Dimension::DataQuality => &mut self.data_quality,
        }
    }
}

/// Lifecycle phase derived from the textual status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectPhase {
    NotStarted,
    Active,
    Completed,
    Unknown,
}

const NOT_STARTED_KEYWORDS: &[&str] = &[
    "not started",
    "nicht gestartet",
    "nicht begonnen",
    "planning",
    "in planung",
    "geplant",
    "prephase",
    "vorbereitung",
];

const COMPLETED_KEYWORDS: &[&str] = &[
    "completed",
    "abgeschlossen",
    "fertig",
    "beendet",
    "closed",
    "done",
    "finished",
    "erledigt",
];

const ACTIVE_KEYWORDS: &[&str] = &[
    "in progress",
    "active",
    "running",
    "on track",
    "at risk",
    "in bearbeitung",
    "läuft",
    "aktiv",
    "umsetzung",
    "durchführung",
];

/// Words that turn a following completed keyword into its opposite.
/// "in" and "un" cover hyphenated prefixes such as "un-finished".
const NEGATIONS: &[&str] = &["not", "nicht", "noch", "kein", "keine", "never", "nie", "in", "un"];

/// How many words before a keyword a negation may appear ("not yet done").
const NEGATION_WINDOW: usize = 2;

/// The value used when a dimension has no usable source value.
pub fn neutral_value(_dimension: Dimension) -> u8 {
    3
}

/// Round, clamp and default a single raw value.
pub fn normalize_value(dimension: Dimension, raw: Option<f64>) -> u8 {
    match raw {
        Some(v) if v.is_finite() => {
            v.round().clamp(f64::from(SCALE_MIN), f64::from(SCALE_MAX)) as u8
        }
        _ => neutral_value(dimension),
    }
}

fn normalize_dimension(dimension: Dimension, raw: Option<&RawDimension>) -> DimensionScore {
    DimensionScore {
        value: normalize_value(dimension, raw.and_then(|r| r.value)),
        justification: raw
            .and_then(|r| r.justification.as_deref())
            .map(str::trim)
            .filter(|j| !j.is_empty())
            .map(String::from),
    }
}

/// Produce the fully populated 5-tuple from optional model values.
pub fn normalize_scores(raw: Option<&RawDimensionValues>) -> DimensionScores {
    let dim = |d: Dimension| normalize_dimension(d, raw.map(|r| r.get(d)));
    DimensionScores {
        urgency: dim(Dimension::Urgency),
        importance: dim(Dimension::Importance),
        complexity: dim(Dimension::Complexity),
        risk: dim(Dimension::Risk),
        data_quality: dim(Dimension::DataQuality),
    }
}

/// Classify a textual status into a lifecycle phase.
///
/// Keywords match whole words only, so "Incomplete" and "Abandoned" do not
/// count as completed. A negated completed keyword ("Not completed",
/// "Nicht abgeschlossen") is ignored.
pub fn project_phase(status: Option<&str>) -> ProjectPhase {
    let status = match status.map(str::trim) {
        Some(s) if !s.is_empty() => s.to_lowercase(),
        _ => return ProjectPhase::Unknown,
    };
    let words: Vec<&str> = status
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    let mentions = |keywords: &[&str]| {
        keywords
            .iter()
            .any(|k| !phrase_positions(&words, k).is_empty())
    };

    // "not started" must win over the negation check below
    if mentions(NOT_STARTED_KEYWORDS) {
        ProjectPhase::NotStarted
    } else if COMPLETED_KEYWORDS.iter().any(|k| {
        phrase_positions(&words, k)
            .into_iter()
            .any(|at| !is_negated(&words, at))
    }) {
        ProjectPhase::Completed
    } else if mentions(ACTIVE_KEYWORDS) {
        ProjectPhase::Active
    } else {
        ProjectPhase::Unknown
    }
}

/// Start indices where the words of `phrase` appear in sequence.
fn phrase_positions(words: &[&str], phrase: &str) -> Vec<usize> {
    let needle: Vec<&str> = phrase.split_whitespace().collect();
    if needle.is_empty() || needle.len() > words.len() {
        return Vec::new();
    }
    words
        .windows(needle.len())
        .enumerate()
        .filter(|(_, window)| *window == needle.as_slice())
        .map(|(start, _)| start)
        .collect()
}

fn is_negated(words: &[&str], at: usize) -> bool {
    words[at.saturating_sub(NEGATION_WINDOW)..at]
        .iter()
        .any(|w| NEGATIONS.contains(w))
}

fn html_tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"<[^>]+>").expect("valid regex"))
}

/// Collapse all whitespace runs into single spaces and trim.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strip HTML, decode common entities, collapse whitespace and truncate.
///
/// Returns `None` when nothing readable remains.
pub fn clean_text(text: Option<&str>, max_chars: usize) -> Option<String> {
    let text = text?;
    let stripped = html_tag_pattern().replace_all(text, " ");
    let decoded = stripped
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'");
    let collapsed = collapse_whitespace(&decoded);

    if collapsed.is_empty() {
        return None;
    }

    if collapsed.chars().count() > max_chars {
        let keep = max_chars.saturating_sub(3);
        let mut truncated: String = collapsed.chars().take(keep).collect();
        truncated.push_str("...");
        Some(truncated)
    } else {
        Some(collapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(value: Option<f64>) -> RawDimension {
        RawDimension {
            value,
            justification: None,
        }
    }

    #[test]
    fn test_normalize_value_clamps_and_rounds() {
        assert_eq!(normalize_value(Dimension::Risk, Some(0.0)), 1);
        assert_eq!(normalize_value(Dimension::Risk, Some(-3.0)), 1);
        assert_eq!(normalize_value(Dimension::Risk, Some(9.0)), 5);
        assert_eq!(normalize_value(Dimension::Risk, Some(3.6)), 4);
        assert_eq!(normalize_value(Dimension::Risk, Some(2.0)), 2);
    }

    #[test]
    fn test_missing_values_default_to_neutral() {
        assert_eq!(normalize_value(Dimension::Urgency, None), 3);
        assert_eq!(normalize_value(Dimension::Urgency, Some(f64::NAN)), 3);
        assert_eq!(normalize_value(Dimension::Urgency, Some(f64::INFINITY)), 3);

        let scores = normalize_scores(None);
        for dimension in Dimension::ALL {
            assert_eq!(scores.value(dimension), 3);
            assert!(scores.get(dimension).justification.is_none());
        }
    }

    #[test]
    fn test_normalize_scores_keeps_justification() {
        let mut values = RawDimensionValues::default();
        values.risk = RawDimension {
            value: Some(7.0),
            justification: Some("  vendor insolvency  ".to_string()),
        };
        values.urgency = raw(Some(2.0));
        values.data_quality.justification = Some("   ".to_string());

        let scores = normalize_scores(Some(&values));
        assert_eq!(scores.risk.value, 5);
        assert_eq!(scores.risk.justification.as_deref(), Some("vendor insolvency"));
        assert_eq!(scores.urgency.value, 2);
        assert_eq!(scores.importance.value, 3);
        assert!(scores.data_quality.justification.is_none());
    }

    #[test]
    fn test_project_phase() {
        assert_eq!(project_phase(Some("Completed")), ProjectPhase::Completed);
        assert_eq!(project_phase(Some("Abgeschlossen")), ProjectPhase::Completed);
        assert_eq!(project_phase(Some("Not started")), ProjectPhase::NotStarted);
        assert_eq!(project_phase(Some("In Planung")), ProjectPhase::NotStarted);
        assert_eq!(project_phase(Some("In Bearbeitung")), ProjectPhase::Active);
        assert_eq!(project_phase(Some("On hold")), ProjectPhase::Unknown);
        assert_eq!(project_phase(Some("")), ProjectPhase::Unknown);
        assert_eq!(project_phase(None), ProjectPhase::Unknown);
    }

    #[test]
    fn test_project_phase_ignores_negated_and_partial_words() {
        for status in [
            "Incomplete",
            "Not completed",
            "Abandoned",
            "Nicht abgeschlossen",
            "noch nicht fertig",
            "unfinished",
            "un-finished",
            "not yet done",
        ] {
            assert_ne!(
                project_phase(Some(status)),
                ProjectPhase::Completed,
                "{status} must not read as completed"
            );
        }
        assert_eq!(project_phase(Some("Not completed, in progress")), ProjectPhase::Active);
        assert_eq!(project_phase(Some("DONE")), ProjectPhase::Completed);
        assert_eq!(project_phase(Some("Closed (2026-03)")), ProjectPhase::Completed);
        assert_eq!(project_phase(Some("not_started")), ProjectPhase::NotStarted);
    }

    #[test]
    fn test_clean_text() {
        let cleaned = clean_text(Some("<p>Budget&nbsp;&amp; scope</p>\n\n  unclear"), 200);
        assert_eq!(cleaned.as_deref(), Some("Budget & scope unclear"));

        assert_eq!(clean_text(Some("<br/>  "), 200), None);
        assert_eq!(clean_text(None, 200), None);

        let truncated = clean_text(Some("abcdefghij"), 8).unwrap();
        assert_eq!(truncated, "abcde...");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \n\t b  c "), "a b c");
    }
}
