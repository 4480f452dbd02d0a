//! Priority scoring and the ranking order.

use crate::config::ScoringConfig;
use crate::models::{DataQualityFlag, DimensionScores, ProjectScore};
use std::cmp::Ordering;

/// Weighted priority of a project.
///
/// Flagged projects lose `data_quality_penalty` points so that
/// untrustworthy data does not dominate the top of the ranking.
pub fn priority_score(
    scores: &DimensionScores,
    flag: DataQualityFlag,
    config: &ScoringConfig,
) -> i32 {
    let weighted = config.urgency_weight * i32::from(scores.urgency.value)
        + config.importance_weight * i32::from(scores.importance.value)
        + config.risk_weight * i32::from(scores.risk.value);

    if flag.is_flagged() {
        weighted - config.data_quality_penalty
    } else {
        weighted
    }
}

/// Ranking comparator: critical first, then priority descending, then name
/// ascending. The project id settles identical names.
pub fn compare(a: &ProjectScore, b: &ProjectScore) -> Ordering {
    b.is_critical
        .cmp(&a.is_critical)
        .then_with(|| b.priority_score.cmp(&a.priority_score))
        .then_with(|| a.project_name.cmp(&b.project_name))
        .then_with(|| a.project_id.cmp(&b.project_id))
}

/// Sort projects into ranking order.
pub fn rank(projects: &mut [ProjectScore]) {
    projects.sort_by(compare);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StatusColor;
    use crate::scoring::normalizer::normalize_scores;

    fn project(id: &str, name: &str, critical: bool, priority: i32) -> ProjectScore {
        ProjectScore {
            project_id: id.to_string(),
            project_name: name.to_string(),
            owner: None,
            status_label: None,
            scores: normalize_scores(None),
            priority_score: priority,
            is_critical: critical,
            criticality_reasons: Vec::new(),
            status_color: StatusColor::Green,
            data_quality_flag: DataQualityFlag::None,
            progress_percent: None,
            milestones_total: None,
            milestones_completed: None,
            milestones_delayed: None,
            planned_effort_hours: None,
            actual_effort_hours: None,
            summary: String::new(),
            analysis: String::new(),
            warnings: Vec::new(),
        }
    }

    #[test]
    fn test_priority_score_weights() {
        let cfg = ScoringConfig::default();
        let mut scores = normalize_scores(None);
        scores.urgency.value = 4;
        scores.importance.value = 5;
        scores.risk.value = 2;

        // 2*4 + 2*5 + 1*2
        assert_eq!(priority_score(&scores, DataQualityFlag::None, &cfg), 20);
        assert_eq!(priority_score(&scores, DataQualityFlag::Inconsistent, &cfg), 19);
        assert_eq!(priority_score(&scores, DataQualityFlag::FallbackContent, &cfg), 19);

        let custom = ScoringConfig {
            risk_weight: 3,
            data_quality_penalty: 0,
            ..ScoringConfig::default()
        };
        assert_eq!(priority_score(&scores, DataQualityFlag::Inconsistent, &custom), 24);
    }

    #[test]
    fn test_rank_order() {
        let mut projects = vec![
            project("1", "Zeta", false, 20),
            project("2", "Alpha", false, 20),
            project("3", "Low but critical", true, 5),
            project("4", "High", false, 25),
            project("5", "Alpha", false, 20),
        ];

        rank(&mut projects);
        let ids: Vec<&str> = projects.iter().map(|p| p.project_id.as_str()).collect();
        assert_eq!(ids, vec!["3", "4", "2", "5", "1"]);
    }

    #[test]
    fn test_rank_is_input_order_independent() {
        let base = vec![
            project("1", "B", false, 10),
            project("2", "A", true, 10),
            project("3", "C", false, 12),
        ];
        let mut forward = base.clone();
        let mut reversed: Vec<_> = base.into_iter().rev().collect();

        rank(&mut forward);
        rank(&mut reversed);
        assert_eq!(forward, reversed);
    }
}
